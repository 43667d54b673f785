//! Bidirectional translation between sequence and model coordinate spaces
//! from an alignment trace.
//!
//! Three boundary conditions are expressed distinctly: a model position that
//! is a gap in the sequence (deletion), a model position covered by an
//! inserted run with no 1:1 counterpart, and a plain 1:1 aligned position
//! with its confidence. A range fully outside the aligned span maps to
//! `Unmapped`, which callers must treat as indefinite, never as an error.

use vigil_core::models::{Alignment, ModelCol, SeqCol, SeqRange, Strand};

/// How a single model position maps onto the sequence.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum PosMapping {
    Aligned { seq_pos: u64, conf: Option<f64> },
    Gap { flank5: u64, flank3: u64 },
    Unmapped,
}

/// How a single sequence position maps onto the model.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum SeqPosMapping {
    Aligned { model_pos: u64, conf: Option<f64> },
    /// Inside an inserted run; `after` is the single anchoring model
    /// position the run is inserted after (0 for a 5' overhang).
    Inserted { after: u64 },
    OutOfRange,
}

/// Classification of a degenerate single-position boundary query.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum BoundaryClass {
    Gap { flank5: u64, flank3: u64 },
    Low { seq_pos: u64, conf: f64 },
    /// Aligned, but the aligner supplied no confidence values.
    Unknown { seq_pos: u64 },
    Valid { seq_pos: u64, conf: f64 },
    Unmapped,
}

/// A model range successfully mapped to sequence coordinates. `trimmed_5p`/
/// `trimmed_3p` count model positions at either oriented end that had no
/// aligned sequence counterpart (gaps or unaligned overhang).
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct MappedRange {
    pub seq: SeqRange,
    pub trimmed_5p: u64,
    pub trimmed_3p: u64,
}

/// Outcome of mapping a model range.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum RangeMapping {
    Mapped(MappedRange),
    /// Every model position in the range is a gap in the sequence.
    Deleted { flank5: u64, flank3: u64 },
    /// The range lies entirely outside the aligned span.
    Unmapped,
}

///
/// Position translator for one sequence's alignment. All alert coordinates
/// are computed through this type so the structured ranges and the detail
/// strings can never disagree.
///
pub struct CoordMapper<'a> {
    aln: &'a Alignment,
}

impl<'a> CoordMapper<'a> {
    pub fn new(aln: &'a Alignment) -> Self {
        CoordMapper { aln }
    }

    pub fn alignment(&self) -> &Alignment {
        self.aln
    }

    pub fn map_model_pos(&self, pos: u64) -> PosMapping {
        match self.aln.model_col(pos) {
            Some(ModelCol::Aligned { seq_pos, conf }) => PosMapping::Aligned {
                seq_pos: *seq_pos,
                conf: *conf,
            },
            Some(ModelCol::Gap { flank5, flank3 }) => PosMapping::Gap {
                flank5: *flank5,
                flank3: *flank3,
            },
            _ => PosMapping::Unmapped,
        }
    }

    pub fn map_seq_pos(&self, pos: u64) -> SeqPosMapping {
        match self.aln.seq_col(pos) {
            Some(SeqCol::Aligned { model_pos, conf }) => SeqPosMapping::Aligned {
                model_pos: *model_pos,
                conf: *conf,
            },
            Some(SeqCol::Inserted { after }) => SeqPosMapping::Inserted { after: *after },
            None => SeqPosMapping::OutOfRange,
        }
    }

    /// Map a model range (oriented by its strand) to the corresponding
    /// sequence range. Minus-strand queries yield descending sequence
    /// coordinates.
    pub fn map_model_range(&self, range: &SeqRange) -> RangeMapping {
        let (lo, hi) = (range.lo(), range.hi());

        let mut first_aligned: Option<(u64, u64)> = None; // (model, seq)
        let mut last_aligned: Option<(u64, u64)> = None;
        let mut first_gap: Option<(u64, u64)> = None; // (flank5, flank3)
        let mut last_gap: Option<(u64, u64)> = None;

        for m in lo..=hi {
            match self.map_model_pos(m) {
                PosMapping::Aligned { seq_pos, .. } => {
                    if first_aligned.is_none() {
                        first_aligned = Some((m, seq_pos));
                    }
                    last_aligned = Some((m, seq_pos));
                }
                PosMapping::Gap { flank5, flank3 } => {
                    if first_gap.is_none() {
                        first_gap = Some((flank5, flank3));
                    }
                    last_gap = Some((flank5, flank3));
                }
                PosMapping::Unmapped => {}
            }
        }

        match (first_aligned, last_aligned) {
            (Some((m_lo, s_lo)), Some((m_hi, s_hi))) => {
                let trimmed_lo = m_lo - lo;
                let trimmed_hi = hi - m_hi;
                let (seq, trimmed_5p, trimmed_3p) = match range.strand {
                    Strand::Plus => (SeqRange::forward(s_lo, s_hi), trimmed_lo, trimmed_hi),
                    Strand::Minus => (SeqRange::reverse(s_hi, s_lo), trimmed_hi, trimmed_lo),
                };
                RangeMapping::Mapped(MappedRange {
                    seq,
                    trimmed_5p,
                    trimmed_3p,
                })
            }
            _ => match (first_gap, last_gap) {
                (Some((flank5, _)), Some((_, flank3))) => RangeMapping::Deleted { flank5, flank3 },
                _ => RangeMapping::Unmapped,
            },
        }
    }

    /// Inverse mapping: a sequence range to the model range it aligns to.
    /// Positions inside insertions contribute nothing; a range consisting
    /// only of inserted positions maps to `Unmapped` range-wise (its anchor
    /// is available through [`map_seq_pos`](Self::map_seq_pos)).
    pub fn map_seq_range(&self, range: &SeqRange) -> RangeMapping {
        let (lo, hi) = (range.lo(), range.hi());

        let mut first_aligned: Option<(u64, u64)> = None; // (seq, model)
        let mut last_aligned: Option<(u64, u64)> = None;
        for s in lo..=hi {
            if let SeqPosMapping::Aligned { model_pos, .. } = self.map_seq_pos(s) {
                if first_aligned.is_none() {
                    first_aligned = Some((s, model_pos));
                }
                last_aligned = Some((s, model_pos));
            }
        }

        match (first_aligned, last_aligned) {
            (Some((s_lo, m_lo)), Some((s_hi, m_hi))) => {
                let trimmed_lo = s_lo - lo;
                let trimmed_hi = hi - s_hi;
                let (model, trimmed_5p, trimmed_3p) = match range.strand {
                    Strand::Plus => (SeqRange::forward(m_lo, m_hi), trimmed_lo, trimmed_hi),
                    Strand::Minus => (SeqRange::reverse(m_hi, m_lo), trimmed_hi, trimmed_lo),
                };
                RangeMapping::Mapped(MappedRange {
                    seq: model,
                    trimmed_5p,
                    trimmed_3p,
                })
            }
            _ => RangeMapping::Unmapped,
        }
    }

    /// Classify a single model boundary position: gap, low-confidence,
    /// unknown-confidence (aligner gave no values) or valid.
    pub fn classify_boundary(&self, model_pos: u64, threshold: f64) -> BoundaryClass {
        match self.map_model_pos(model_pos) {
            PosMapping::Unmapped => BoundaryClass::Unmapped,
            PosMapping::Gap { flank5, flank3 } => BoundaryClass::Gap { flank5, flank3 },
            PosMapping::Aligned { seq_pos, conf } => match conf {
                None => BoundaryClass::Unknown { seq_pos },
                Some(c) if c < threshold => BoundaryClass::Low { seq_pos, conf: c },
                Some(c) => BoundaryClass::Valid { seq_pos, conf: c },
            },
        }
    }
}
