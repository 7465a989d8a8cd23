use serde::{Deserialize, Serialize};

use super::domain::{verdict_of, LenderEvaluation, LenderGroup, LenderId};

/// Evaluations partitioned into display buckets, each ordered best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LenderGroups {
    pub best_fit: Vec<LenderEvaluation>,
    pub also_consider: Vec<LenderEvaluation>,
    pub possible_but_risky: Vec<LenderEvaluation>,
    pub not_suitable: Vec<LenderEvaluation>,
}

impl LenderGroups {
    pub fn group(&self, group: LenderGroup) -> &[LenderEvaluation] {
        match group {
            LenderGroup::BestFit => &self.best_fit,
            LenderGroup::AlsoConsider => &self.also_consider,
            LenderGroup::PossibleButRisky => &self.possible_but_risky,
            LenderGroup::NotSuitable => &self.not_suitable,
        }
    }

    fn group_mut(&mut self, group: LenderGroup) -> &mut Vec<LenderEvaluation> {
        match group {
            LenderGroup::BestFit => &mut self.best_fit,
            LenderGroup::AlsoConsider => &mut self.also_consider,
            LenderGroup::PossibleButRisky => &mut self.possible_but_risky,
            LenderGroup::NotSuitable => &mut self.not_suitable,
        }
    }

    /// First best fit, else first "also consider". Riskier buckets never yield a pick.
    pub fn top_pick(&self) -> Option<&LenderEvaluation> {
        self.best_fit.first().or_else(|| self.also_consider.first())
    }

    pub fn find(&self, lender_id: &LenderId) -> Option<&LenderEvaluation> {
        self.iter().find(|evaluation| &evaluation.lender_id == lender_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LenderEvaluation> {
        self.best_fit
            .iter()
            .chain(&self.also_consider)
            .chain(&self.possible_but_risky)
            .chain(&self.not_suitable)
    }

    pub fn len(&self) -> usize {
        self.best_fit.len()
            + self.also_consider.len()
            + self.possible_but_risky.len()
            + self.not_suitable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LenderRecommendationGrouper;

impl LenderRecommendationGrouper {
    /// Partition by verdict. Fit scores are passed through untouched; within a
    /// group the sort is stable, so equal scores keep their upstream order.
    pub fn classify(evaluations: Vec<LenderEvaluation>) -> LenderGroups {
        let mut groups = LenderGroups::default();
        for evaluation in evaluations {
            let group = verdict_of(&evaluation).group();
            groups.group_mut(group).push(evaluation);
        }

        for group in [
            LenderGroup::BestFit,
            LenderGroup::AlsoConsider,
            LenderGroup::PossibleButRisky,
            LenderGroup::NotSuitable,
        ] {
            groups
                .group_mut(group)
                .sort_by(|a, b| b.fit_score.cmp(&a.fit_score));
        }

        groups
    }
}
