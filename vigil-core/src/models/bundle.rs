use std::collections::HashMap;

use crate::models::alignment::Alignment;
use crate::models::hit::Hit;
use crate::models::protein::ProteinAlignment;

///
/// Everything the engine needs to evaluate one sequence: the residues, the
/// nucleotide alignment to the model (absent when the aligner could not
/// place the sequence at all), the protein-based alignments keyed by CDS
/// feature index, and the similarity hit list. Built by the caller from the
/// external alignment/search stages; consumed read-only.
///
#[derive(Debug, Clone)]
pub struct SequenceBundle {
    pub name: String,
    pub seq: Vec<u8>,
    pub alignment: Option<Alignment>,
    pub proteins: HashMap<usize, Vec<ProteinAlignment>>,
    pub hits: Vec<Hit>,
}

impl SequenceBundle {
    pub fn new(name: String, seq: Vec<u8>) -> Self {
        SequenceBundle {
            name,
            seq,
            alignment: None,
            proteins: HashMap::new(),
            hits: vec![],
        }
    }

    pub fn seq_len(&self) -> u64 {
        self.seq.len() as u64
    }

    /// Residue at a 1-based position, uppercased.
    pub fn residue(&self, pos: u64) -> Option<u8> {
        if pos < 1 {
            return None;
        }
        self.seq
            .get(pos as usize - 1)
            .map(|b| b.to_ascii_uppercase())
    }

    /// Protein-based alignments for a CDS feature, if the search stage
    /// produced any.
    pub fn proteins_for(&self, feature: usize) -> Option<&[ProteinAlignment]> {
        self.proteins.get(&feature).map(|v| v.as_slice())
    }
}
