use serde::{Deserialize, Serialize};

use crate::models::range::{SeqRange, Strand};

///
/// A local alignment span from the similarity search stage, used only for
/// sequence-level coverage, duplication and strand checks. The sequence span
/// is oriented by the hit strand; the model span is always ascending.
///
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub seq: SeqRange,
    pub model: SeqRange,
    pub strand: Strand,
    pub score: f64,
}

impl Hit {
    pub fn new(seq: SeqRange, model: SeqRange, strand: Strand, score: f64) -> Self {
        Hit {
            seq,
            model,
            strand,
            score,
        }
    }
}
