use crate::models::{
    BiomarkerImpact, CorrelationGroup, GradeThresholds, GroupBonus, OverallScoreReport, ScoringParams,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Aggregation bucket; independent biomarkers never share one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Shared(CorrelationGroup),
    Solo(usize),
}

impl GroupKey {
    fn of(impact: &BiomarkerImpact) -> Self {
        match impact.group() {
            CorrelationGroup::Independent => GroupKey::Solo(impact.biomarker.catalog_index),
            group => GroupKey::Shared(group),
        }
    }
}

/// Larger bonus first, then catalog order, then input order
fn rank(impacts: &[BiomarkerImpact], a: usize, b: usize) -> Ordering {
    impacts[b]
        .bonus_years
        .partial_cmp(&impacts[a].bonus_years)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            impacts[a]
                .biomarker
                .catalog_index
                .cmp(&impacts[b].biomarker.catalog_index)
        })
        .then_with(|| a.cmp(&b))
}

/// Combines per-biomarker impacts into one report without double counting
///
/// # Steps
/// 1. Partition impacts by correlation group
/// 2. Keep the largest bonus of each group
/// 3. Sum the group maxima into `total_bonus_years`
/// 4. Blend the optimized fraction with the remaining upside into the score
#[derive(Debug, Clone)]
pub struct Aggregator {
    params: ScoringParams,
    grades: GradeThresholds,
}

impl Aggregator {
    pub fn new(params: ScoringParams, grades: GradeThresholds) -> Self {
        Self { params, grades }
    }

    pub fn aggregate(&self, impacts: Vec<BiomarkerImpact>) -> OverallScoreReport {
        if impacts.is_empty() {
            return OverallScoreReport {
                subject_age: 0,
                overall_score: 0,
                grade: self.grades.grade_for(0),
                total_bonus_years: 0.0,
                top_opportunity: None,
                optimized_count: 0,
                opportunities_count: 0,
                group_bonuses: vec![],
                priorities: vec![],
                per_biomarker_breakdown: impacts,
                omissions: vec![],
            };
        }

        // (best member index, member count) per group
        let mut groups: BTreeMap<GroupKey, (usize, usize)> = BTreeMap::new();
        for idx in 0..impacts.len() {
            groups
                .entry(GroupKey::of(&impacts[idx]))
                .and_modify(|(best, members)| {
                    *members += 1;
                    if rank(&impacts, idx, *best) == Ordering::Less {
                        *best = idx;
                    }
                })
                .or_insert((idx, 1));
        }

        let group_bonuses: Vec<GroupBonus> = groups
            .iter()
            .map(|(key, &(best, members))| {
                let impact = &impacts[best];
                let group = match key {
                    GroupKey::Shared(group) => *group,
                    GroupKey::Solo(_) => CorrelationGroup::Independent,
                };
                GroupBonus {
                    group,
                    biomarker: impact.name().to_string(),
                    bonus_years: impact.bonus_years,
                    members,
                }
            })
            .collect();

        let total_bonus_years: f64 = group_bonuses.iter().map(|g| g.bonus_years).sum();

        let optimized_count = impacts.iter().filter(|i| i.is_optimal).count();
        let optimized_fraction = optimized_count as f64 / impacts.len() as f64;
        let overall_score = self.blend(optimized_fraction, total_bonus_years, group_bonuses.len());

        let mut priorities: Vec<usize> = (0..impacts.len()).filter(|&idx| !impacts[idx].is_optimal).collect();
        priorities.sort_by(|&a, &b| rank(&impacts, a, b));

        let top_opportunity = priorities
            .first()
            .map(|&idx| &impacts[idx])
            .filter(|impact| impact.bonus_years > 0.0)
            .cloned();

        tracing::debug!(
            "Aggregated {} impacts into {} groups: total bonus {:.2} years, score {}",
            impacts.len(),
            group_bonuses.len(),
            total_bonus_years,
            overall_score
        );

        OverallScoreReport {
            subject_age: 0,
            overall_score,
            grade: self.grades.grade_for(overall_score),
            total_bonus_years,
            top_opportunity,
            optimized_count,
            opportunities_count: priorities.len(),
            group_bonuses,
            priorities,
            per_biomarker_breakdown: impacts,
            omissions: vec![],
        }
    }

    /// Weighted blend of "already optimal" and "upside left"
    ///
    /// The upside term is 1 minus the total bonus over the largest total the
    /// present groups could reach, so the score falls as bonus years grow
    /// and rises with the optimized fraction.
    fn blend(&self, optimized_fraction: f64, total_bonus_years: f64, group_count: usize) -> u8 {
        let weight = self.params.optimized_weight.clamp(0.0, 1.0);
        let ceiling = self.params.max_bonus_years * group_count as f64;
        let upside = if ceiling > 0.0 {
            (1.0 - total_bonus_years / ceiling).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let score = 100.0 * (weight * optimized_fraction + (1.0 - weight) * upside);
        score.round().clamp(0.0, 100.0) as u8
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(ScoringParams::default(), GradeThresholds::default())
    }
}
