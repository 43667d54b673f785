//! Alert detectors. Every detector is a pure function of the resolved
//! geometry, the alignment evidence and the hit list; detectors are
//! independent and order-insensitive, and all alert coordinates come from
//! mapper/resolver outputs so the detail strings and the structured
//! coordinates always agree.

pub mod feature;
pub mod sequence;

use vigil_core::EngineConfig;
use vigil_core::models::{Alert, AlertKind, Hit, Model, SequenceBundle, Strand};

/// Read-only inputs shared by every detector for one sequence.
pub struct DetectionContext<'a> {
    pub model: &'a Model,
    pub bundle: &'a SequenceBundle,
    pub cfg: &'a EngineConfig,
}

impl DetectionContext<'_> {
    /// Build an alert with its effective fatality resolved up front.
    pub fn alert(&self, kind: AlertKind, feature: Option<usize>) -> Alert {
        let fatal = self.cfg.effective_fatal(kind.code());
        Alert::new(kind, feature, fatal)
    }

    /// Strand of the best-scoring hit, when any hits exist.
    pub fn winning_strand(&self) -> Option<Strand> {
        self.bundle
            .hits
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(|h| h.strand)
    }

    pub fn winning_hits(&self) -> Vec<&Hit> {
        match self.winning_strand() {
            Some(strand) => self
                .bundle
                .hits
                .iter()
                .filter(|h| h.strand == strand)
                .collect(),
            None => vec![],
        }
    }

    /// Merged, ascending sequence intervals covered by winning-strand hits.
    pub fn covered_intervals(&self) -> Vec<(u64, u64)> {
        let mut spans: Vec<(u64, u64)> = self
            .winning_hits()
            .iter()
            .map(|h| (h.seq.lo(), h.seq.hi()))
            .collect();
        spans.sort_unstable();
        let mut merged: Vec<(u64, u64)> = vec![];
        for (lo, hi) in spans {
            match merged.last_mut() {
                Some((_, last_hi)) if lo <= *last_hi + 1 => *last_hi = (*last_hi).max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        merged
    }

    /// Ascending intervals of the sequence not covered by any winning-strand
    /// hit. The whole sequence when there are no hits.
    pub fn uncovered_intervals(&self) -> Vec<(u64, u64)> {
        let n = self.bundle.seq_len();
        if n == 0 {
            return vec![];
        }
        let mut gaps = vec![];
        let mut cursor = 1u64;
        for (lo, hi) in self.covered_intervals() {
            if lo > cursor {
                gaps.push((cursor, lo - 1));
            }
            cursor = cursor.max(hi + 1);
        }
        if cursor <= n {
            gaps.push((cursor, n));
        }
        gaps
    }
}
