use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlignmentError {
    #[error("Aligned model positions must increase: sequence position {0}")]
    NonMonotonic(u64),

    #[error("Model position {0} is outside model length {1}")]
    ModelPosOutOfBounds(u64, u64),
}

/// One sequence position in the alignment: either aligned to a model
/// position (with an optional per-position confidence in [0,1]), or part of
/// an inserted run anchored after a model position (0 for a 5' overhang).
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum SeqCol {
    Aligned { model_pos: u64, conf: Option<f64> },
    Inserted { after: u64 },
}

/// One model position as seen from the sequence: aligned 1:1, deleted in the
/// sequence (flanked by the nearest aligned sequence positions on either
/// side, 0 when there is none), or outside the aligned span entirely.
#[derive(PartialEq, Debug, Clone)]
pub enum ModelCol {
    Aligned { seq_pos: u64, conf: Option<f64> },
    Gap { flank5: u64, flank3: u64 },
    Unaligned,
}

/// One insertion or deletion reconstructed from the alignment. For an
/// insertion, `model_pos` is the anchor the run is inserted after and
/// `seq_pos` is the first inserted base; for a deletion, `model_pos` is the
/// first deleted model position and `seq_pos` the aligned base immediately
/// 5' of the deletion (0 when there is none).
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct IndelEvent {
    pub model_pos: u64,
    pub seq_pos: u64,
    pub len: u64,
}

///
/// Per-sequence nucleotide alignment of the full sequence to the model.
/// Built once from the external aligner's per-position trace; the model-side
/// column view and the insert/delete event lists are derived at construction
/// so every consumer sees the same indel geometry.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Alignment {
    model_len: u64,
    seq_cols: Vec<SeqCol>,
    model_cols: Vec<ModelCol>,
    inserts: Vec<IndelEvent>,
    deletes: Vec<IndelEvent>,
    has_confidence: bool,
}

impl Alignment {
    pub fn new(model_len: u64, mut seq_cols: Vec<SeqCol>) -> Result<Self, AlignmentError> {
        let mut model_cols = vec![ModelCol::Unaligned; model_len as usize];
        let mut last_model_pos = 0u64;
        let mut has_confidence = false;

        for (i, col) in seq_cols.iter_mut().enumerate() {
            let seq_pos = i as u64 + 1;
            match col {
                SeqCol::Aligned { model_pos, conf } => {
                    let m = *model_pos;
                    if m < 1 || m > model_len {
                        return Err(AlignmentError::ModelPosOutOfBounds(m, model_len));
                    }
                    if m <= last_model_pos {
                        return Err(AlignmentError::NonMonotonic(seq_pos));
                    }
                    model_cols[m as usize - 1] = ModelCol::Aligned {
                        seq_pos,
                        conf: *conf,
                    };
                    if conf.is_some() {
                        has_confidence = true;
                    }
                    last_model_pos = m;
                }
                SeqCol::Inserted { after } => {
                    // anchors are recomputed from the walk so they are always
                    // consistent with the aligned columns
                    *after = last_model_pos;
                }
            }
        }

        let mut aln = Alignment {
            model_len,
            seq_cols,
            model_cols,
            inserts: vec![],
            deletes: vec![],
            has_confidence,
        };
        aln.derive_gaps();
        aln.derive_events();
        Ok(aln)
    }

    /// Interior model columns with no sequence counterpart become gaps with
    /// their flanking aligned sequence positions; exterior ones stay
    /// unaligned.
    fn derive_gaps(&mut self) {
        let first = self
            .model_cols
            .iter()
            .position(|c| matches!(c, ModelCol::Aligned { .. }));
        let last = self
            .model_cols
            .iter()
            .rposition(|c| matches!(c, ModelCol::Aligned { .. }));
        let (first, last) = match (first, last) {
            (Some(f), Some(l)) => (f, l),
            _ => return, // nothing aligned at all
        };

        let mut flank5 = 0u64;
        let mut flanks5 = vec![0u64; self.model_cols.len()];
        for (i, col) in self.model_cols.iter().enumerate() {
            if let ModelCol::Aligned { seq_pos, .. } = col {
                flank5 = *seq_pos;
            }
            flanks5[i] = flank5;
        }
        let mut flank3 = 0u64;
        let mut flanks3 = vec![0u64; self.model_cols.len()];
        for (i, col) in self.model_cols.iter().enumerate().rev() {
            if let ModelCol::Aligned { seq_pos, .. } = col {
                flank3 = *seq_pos;
            }
            flanks3[i] = flank3;
        }

        for i in first..=last {
            if matches!(self.model_cols[i], ModelCol::Unaligned) {
                self.model_cols[i] = ModelCol::Gap {
                    flank5: flanks5[i],
                    flank3: flanks3[i],
                };
            }
        }
    }

    fn derive_events(&mut self) {
        // insertions: maximal runs of inserted sequence columns
        let mut i = 0usize;
        while i < self.seq_cols.len() {
            if let SeqCol::Inserted { after } = self.seq_cols[i] {
                let start = i;
                while i < self.seq_cols.len()
                    && matches!(self.seq_cols[i], SeqCol::Inserted { .. })
                {
                    i += 1;
                }
                self.inserts.push(IndelEvent {
                    model_pos: after,
                    seq_pos: start as u64 + 1,
                    len: (i - start) as u64,
                });
            } else {
                i += 1;
            }
        }

        // deletions: maximal runs of gap model columns
        let mut i = 0usize;
        while i < self.model_cols.len() {
            if let ModelCol::Gap { flank5, .. } = self.model_cols[i] {
                let start = i;
                while i < self.model_cols.len()
                    && matches!(self.model_cols[i], ModelCol::Gap { .. })
                {
                    i += 1;
                }
                self.deletes.push(IndelEvent {
                    model_pos: start as u64 + 1,
                    seq_pos: flank5,
                    len: (i - start) as u64,
                });
            } else {
                i += 1;
            }
        }
    }

    pub fn seq_len(&self) -> u64 {
        self.seq_cols.len() as u64
    }

    pub fn model_len(&self) -> u64 {
        self.model_len
    }

    /// Whether the aligner supplied per-position confidence values.
    pub fn has_confidence(&self) -> bool {
        self.has_confidence
    }

    pub fn seq_col(&self, pos: u64) -> Option<&SeqCol> {
        if pos < 1 {
            return None;
        }
        self.seq_cols.get(pos as usize - 1)
    }

    pub fn model_col(&self, pos: u64) -> Option<&ModelCol> {
        if pos < 1 {
            return None;
        }
        self.model_cols.get(pos as usize - 1)
    }

    /// First and last model positions covered by the alignment.
    pub fn aligned_model_span(&self) -> Option<(u64, u64)> {
        let first = self
            .model_cols
            .iter()
            .position(|c| matches!(c, ModelCol::Aligned { .. }))?;
        let last = self
            .model_cols
            .iter()
            .rposition(|c| matches!(c, ModelCol::Aligned { .. }))?;
        Some((first as u64 + 1, last as u64 + 1))
    }

    pub fn inserts(&self) -> &[IndelEvent] {
        &self.inserts
    }

    pub fn deletes(&self) -> &[IndelEvent] {
        &self.deletes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn aligned(model_pos: u64, conf: f64) -> SeqCol {
        SeqCol::Aligned {
            model_pos,
            conf: Some(conf),
        }
    }

    #[rstest]
    fn test_simple_alignment() {
        // seq pos 1..4 align to model 11..14
        let cols = (11..=14).map(|m| aligned(m, 0.9)).collect();
        let aln = Alignment::new(20, cols).unwrap();
        assert_eq!(aln.seq_len(), 4);
        assert_eq!(aln.aligned_model_span(), Some((11, 14)));
        assert!(aln.has_confidence());
        assert_eq!(
            aln.model_col(12),
            Some(&ModelCol::Aligned {
                seq_pos: 2,
                conf: Some(0.9)
            })
        );
        assert_eq!(aln.model_col(10), Some(&ModelCol::Unaligned));
        assert!(aln.inserts().is_empty());
        assert!(aln.deletes().is_empty());
    }

    #[rstest]
    fn test_insertion_run_is_anchored() {
        // model 5,6 then 3 inserted bases then model 7
        let cols = vec![
            aligned(5, 0.9),
            aligned(6, 0.9),
            SeqCol::Inserted { after: 999 }, // anchor is recomputed
            SeqCol::Inserted { after: 999 },
            SeqCol::Inserted { after: 999 },
            aligned(7, 0.9),
        ];
        let aln = Alignment::new(10, cols).unwrap();
        assert_eq!(
            aln.inserts(),
            &[IndelEvent {
                model_pos: 6,
                seq_pos: 3,
                len: 3
            }]
        );
        assert_eq!(aln.seq_col(4), Some(&SeqCol::Inserted { after: 6 }));
    }

    #[rstest]
    fn test_deletion_run_has_flanks() {
        // model 1,2 aligned; model 3,4,5 deleted; model 6 aligned
        let cols = vec![aligned(1, 0.8), aligned(2, 0.8), aligned(6, 0.8)];
        let aln = Alignment::new(6, cols).unwrap();
        assert_eq!(
            aln.deletes(),
            &[IndelEvent {
                model_pos: 3,
                seq_pos: 2,
                len: 3
            }]
        );
        assert_eq!(
            aln.model_col(4),
            Some(&ModelCol::Gap {
                flank5: 2,
                flank3: 3
            })
        );
    }

    #[rstest]
    fn test_confidence_unavailable() {
        let cols = vec![
            SeqCol::Aligned {
                model_pos: 1,
                conf: None,
            },
            SeqCol::Aligned {
                model_pos: 2,
                conf: None,
            },
        ];
        let aln = Alignment::new(5, cols).unwrap();
        assert!(!aln.has_confidence());
    }

    #[rstest]
    fn test_non_monotonic_rejected() {
        let cols = vec![aligned(5, 0.9), aligned(4, 0.9)];
        let err = Alignment::new(10, cols).unwrap_err();
        assert!(matches!(err, AlignmentError::NonMonotonic(2)));
    }

    #[rstest]
    fn test_model_pos_out_of_bounds_rejected() {
        let cols = vec![aligned(11, 0.9)];
        let err = Alignment::new(10, cols).unwrap_err();
        assert!(matches!(err, AlignmentError::ModelPosOutOfBounds(11, 10)));
    }
}
