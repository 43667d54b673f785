use serde::{Deserialize, Serialize};

use crate::models::range::SeqRange;

/// An insertion or deletion observed in a protein-based local alignment,
/// positioned in sequence nucleotide coordinates.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProteinIndel {
    pub query_pos: u64,
    pub len: u64,
}

///
/// A local alignment of a translated query region against one reference
/// protein subject, used as the second, independent evidence track for CDS
/// validation. Multiple subjects may exist per CDS (the reference
/// translation plus representative variants); consumers take the best by
/// bit score.
///
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ProteinAlignment {
    pub subject: String,
    pub score: f64,
    /// Aligned query region in sequence nucleotide coordinates, oriented
    /// with the CDS strand.
    pub query: SeqRange,
    /// Aligned subject region in amino-acid coordinates.
    pub subject_span: (u64, u64),
    /// Sequence positions (first base of codon) where the translated query
    /// contains a stop codon.
    #[serde(default)]
    pub query_stops: Vec<u64>,
    #[serde(default)]
    pub inserts: Vec<ProteinIndel>,
    #[serde(default)]
    pub deletes: Vec<ProteinIndel>,
}

/// Best hit by bit score, ties broken by order.
pub fn best(hits: &[ProteinAlignment]) -> Option<&ProteinAlignment> {
    hits.iter().reduce(|best, h| {
        if h.score > best.score { h } else { best }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn hit(subject: &str, score: f64) -> ProteinAlignment {
        ProteinAlignment {
            subject: subject.to_string(),
            score,
            query: SeqRange::forward(1, 300),
            subject_span: (1, 100),
            query_stops: vec![],
            inserts: vec![],
            deletes: vec![],
        }
    }

    #[rstest]
    fn test_best_by_score_ties_by_order() {
        let hits = vec![hit("a", 50.0), hit("b", 80.0), hit("c", 80.0)];
        assert_eq!(best(&hits).unwrap().subject, "b");
        assert!(best(&[]).is_none());
    }
}
