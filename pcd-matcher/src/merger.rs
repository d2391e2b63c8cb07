use pcd_core::matching::{MatchCandidate, MatchResult};

/// Running best-match table with one slot per survey id.
///
/// The outcome depends only on the multiset of merged candidates: a smaller
/// distance always wins and exact ties go to the lower cloud point index.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    results: Vec<MatchResult>,
    merged: u64,
}

impl ResultMerger {
    pub fn new(survey_len: usize) -> Self {
        Self {
            results: vec![MatchResult::default(); survey_len],
            merged: 0,
        }
    }

    pub fn merge_one(&mut self, candidate: &MatchCandidate) -> bool {
        self.merged += 1;
        let slot = &mut self.results[candidate.survey_id];
        if slot.is_improved_by(candidate) {
            slot.best_distance = candidate.distance;
            slot.best = Some(candidate.cloud);
            true
        } else {
            false
        }
    }

    /// Folds a batch of candidates in, returning how many slots improved.
    pub fn merge(&mut self, candidates: &[MatchCandidate]) -> usize {
        candidates
            .iter()
            .filter(|candidate| self.merge_one(candidate))
            .count()
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }

    pub fn merged_count(&self) -> u64 {
        self.merged
    }

    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_found()).count()
    }
}
