use crate::core::catalog::Catalog;
use crate::models::BiomarkerDefinition;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Name resolution failures; both exclude the measurement, neither aborts a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("No biomarker matches '{0}'")]
    NotFound(String),

    #[error("'{raw_name}' matches several biomarkers equally well: {}", candidates.join(", "))]
    Ambiguous {
        raw_name: String,
        candidates: Vec<String>,
    },
}

/// Smallest share of the label's words the winning alias must cover
pub const MIN_COVERAGE: f64 = 0.5;

/// Split a label into lowercase words
///
/// Hyphenated compounds stay one word, so `"Non-HDL"` never reads as `"HDL"`.
/// `"C-Reactive Protein (hs)"` becomes `{"c-reactive", "hs", "protein"}`.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|word| word.trim_matches('-'))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect()
}

/// Resolve a free-text measurement label to a catalog entry
///
/// An entry matches when every token of one of its aliases appears as a whole
/// word in the label, so `ph` never matches `lymphocyte`. The entry with the
/// largest matching alias wins; equally specific entries are ambiguous and
/// nothing is guessed. Outside an exact name, the winning alias must cover at
/// least [`MIN_COVERAGE`] of the label's words: `"Glucose tolerance test"`
/// names a different test than the alias `glucose`.
pub fn resolve(catalog: &Catalog, raw_name: &str) -> Result<Arc<BiomarkerDefinition>, MatchError> {
    if let Some(exact) = catalog.get(raw_name) {
        return Ok(Arc::clone(exact));
    }

    let tokens = tokenize(raw_name);
    if tokens.is_empty() {
        return Err(MatchError::NotFound(raw_name.to_string()));
    }

    let mut best_specificity = 0;
    let mut best: Vec<&Arc<BiomarkerDefinition>> = Vec::new();

    for definition in catalog.iter() {
        let Some(specificity) = definition.specificity_for(&tokens) else {
            continue;
        };

        if specificity > best_specificity {
            best_specificity = specificity;
            best.clear();
            best.push(definition);
        } else if specificity == best_specificity {
            best.push(definition);
        }
    }

    let coverage = best_specificity as f64 / tokens.len() as f64;
    if coverage < MIN_COVERAGE {
        if let Some(partial) = best.first() {
            tracing::debug!(
                "'{}' only partially matches {} ({:.0}% of words)",
                raw_name,
                partial.canonical_name,
                coverage * 100.0
            );
        }
        return Err(MatchError::NotFound(raw_name.to_string()));
    }

    match best.as_slice() {
        [] => Err(MatchError::NotFound(raw_name.to_string())),
        [only] => Ok(Arc::clone(only)),
        several => Err(MatchError::Ambiguous {
            raw_name: raw_name.to_string(),
            candidates: several
                .iter()
                .map(|definition| definition.canonical_name.clone())
                .collect(),
        }),
    }
}
