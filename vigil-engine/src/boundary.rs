//! Per-feature boundary resolution: predicted sequence spans, reading-frame
//! analysis, codon checks and the protein-vs-nucleotide endpoint comparison.
//!
//! Everything a detector needs about one feature instance is computed here
//! once, through the coordinate mapper, so alert coordinates and detail
//! strings always agree.

use vigil_core::EngineConfig;
use vigil_core::models::{
    Alignment, IndelEvent, Model, ProteinIndel, SeqRange, SequenceBundle, Strand, protein,
};
use vigil_core::utils::{codon_at, is_ambiguous};

use crate::coords::{BoundaryClass, CoordMapper, MappedRange, RangeMapping};

/// How much of the feature is deleted in the sequence.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum DeletionClass {
    None,
    /// Some segments of a multi-segment feature are wholly deleted;
    /// `(segment index, deleted length)` per section.
    Sections(Vec<(usize, u64)>),
    /// Every model position of the feature is a gap in the sequence.
    Whole { len: u64 },
}

/// Confidence class of a frameshift candidate region.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FrameConfidence {
    High(f64),
    Low(f64),
    /// Alignment produced without probabilistic scoring.
    Unknown,
}

/// A contiguous run of aligned codons in a non-dominant frame, bounded by
/// the indel events that caused the shift.
#[derive(PartialEq, Debug, Clone)]
pub struct FrameshiftRegion {
    pub seq: SeqRange,
    pub model: SeqRange,
    pub frame: u8,
    pub dominant: u8,
    pub confidence: FrameConfidence,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct CodonCheck {
    pub codon: Option<String>,
    pub valid: bool,
}

/// Protein-based alignment compared against the nucleotide prediction.
#[derive(PartialEq, Debug, Clone)]
pub struct ProteinComparison {
    /// Nucleotides at the 5' end the protein alignment fails to cover.
    pub short5: u64,
    /// Nucleotides the protein alignment extends past the 5' prediction.
    pub long5: u64,
    pub short3: u64,
    pub long3: u64,
    /// 5'-most in-query stop codon 5' of the predicted stop, if any.
    pub early_stop: Option<u64>,
    pub inserts: Vec<ProteinIndel>,
    pub deletes: Vec<ProteinIndel>,
}

///
/// Everything resolved about one feature instance on one sequence.
///
#[derive(PartialEq, Debug, Clone)]
pub struct FeatureGeometry {
    pub feature: usize,
    /// Mapped span per declared segment, in declaration (5'→3') order.
    pub segment_spans: Vec<Option<MappedRange>>,
    /// Overall predicted span, oriented by the feature strand.
    pub span: Option<SeqRange>,
    /// Total mapped length across segments.
    pub mapped_len: u64,
    pub deletion: DeletionClass,
    /// True when no part of the feature is inside the aligned span.
    pub unmapped: bool,
    pub boundary5: BoundaryClass,
    pub boundary3: BoundaryClass,
    // CDS-only fields
    pub start_codon: Option<CodonCheck>,
    pub stop_codon: Option<CodonCheck>,
    /// First in-frame stop 3' of the predicted stop (first base position).
    pub next_stop: Option<u64>,
    /// First in-frame stop 5' of the predicted stop, from the nucleotides.
    pub early_stop_nt: Option<(u64, String)>,
    pub len_multiple_of_3: bool,
    pub dominant_frame: Option<u8>,
    pub frameshifts: Vec<FrameshiftRegion>,
    pub protein: Option<ProteinComparison>,
    /// Ambiguous-nucleotide run touching the 5' boundary: run length plus
    /// its mapped model span.
    pub ambig5: Option<(u64, Vec<SeqRange>)>,
    pub ambig3: Option<(u64, Vec<SeqRange>)>,
    /// Nucleotide insertions anchored inside the feature.
    pub inserts: Vec<IndelEvent>,
    /// Nucleotide deletion runs clipped to the feature (len is the part
    /// inside the feature).
    pub deletes: Vec<IndelEvent>,
}

impl FeatureGeometry {
    fn empty(feature: usize, n_segments: usize) -> Self {
        FeatureGeometry {
            feature,
            segment_spans: vec![None; n_segments],
            span: None,
            mapped_len: 0,
            deletion: DeletionClass::None,
            unmapped: true,
            boundary5: BoundaryClass::Unmapped,
            boundary3: BoundaryClass::Unmapped,
            start_codon: None,
            stop_codon: None,
            next_stop: None,
            early_stop_nt: None,
            len_multiple_of_3: false,
            dominant_frame: None,
            frameshifts: vec![],
            protein: None,
            ambig5: None,
            ambig3: None,
            inserts: vec![],
            deletes: vec![],
        }
    }

    /// Position of the first base of the predicted stop codon, if the span
    /// is long enough to hold one.
    pub fn predicted_stop_first_base(&self) -> Option<u64> {
        let span = self.span?;
        if span.len() < 3 {
            return None;
        }
        Some(match span.strand {
            Strand::Plus => span.end - 2,
            Strand::Minus => span.end + 2,
        })
    }
}

/// Step `n` codons/nucleotides toward 3' on the given strand.
fn ahead(pos: u64, n: u64, strand: Strand) -> Option<u64> {
    match strand {
        Strand::Plus => Some(pos + n),
        Strand::Minus => pos.checked_sub(n),
    }
}

/// Whether `a` is strictly 5' of `b` in the strand's reading direction.
fn is_5p_of(a: u64, b: u64, strand: Strand) -> bool {
    match strand {
        Strand::Plus => a < b,
        Strand::Minus => a > b,
    }
}

/// Resolve the geometry of one feature instance.
pub fn resolve(
    feature_idx: usize,
    model: &Model,
    bundle: &SequenceBundle,
    cfg: &EngineConfig,
) -> FeatureGeometry {
    let feature = model.feature(feature_idx);
    let mut geom = FeatureGeometry::empty(feature_idx, feature.coords.len());

    let Some(aln) = bundle.alignment.as_ref() else {
        return geom;
    };
    let mapper = CoordMapper::new(aln);
    let strand = feature.strand();

    // segment mapping and deletion classification
    let mut deleted_sections: Vec<(usize, u64)> = vec![];
    let mut any_mapped = false;
    let mut any_deleted = false;
    for (seg, range) in feature.coords.iter().enumerate() {
        match mapper.map_model_range(range) {
            RangeMapping::Mapped(m) => {
                geom.mapped_len += m.seq.len();
                geom.segment_spans[seg] = Some(m);
                any_mapped = true;
            }
            RangeMapping::Deleted { .. } => {
                deleted_sections.push((seg, range.len()));
                any_deleted = true;
            }
            RangeMapping::Unmapped => {}
        }
    }

    geom.unmapped = !any_mapped && !any_deleted;
    geom.deletion = if any_mapped {
        if deleted_sections.is_empty() {
            DeletionClass::None
        } else {
            DeletionClass::Sections(deleted_sections)
        }
    } else if any_deleted {
        DeletionClass::Whole {
            len: feature.length(),
        }
    } else {
        DeletionClass::None
    };

    if let (Some(first), Some(last)) = (
        geom.segment_spans.iter().flatten().next(),
        geom.segment_spans.iter().flatten().last(),
    ) {
        geom.span = Some(SeqRange::new(
            first.seq.five_prime(),
            last.seq.three_prime(),
            strand,
        ));
    }

    // boundary classes at the declared feature endpoints
    if let (Some(head), Some(tail)) = (feature.coords.first(), feature.coords.last()) {
        geom.boundary5 = mapper.classify_boundary(head.five_prime(), cfg.boundary_conf);
        geom.boundary3 = mapper.classify_boundary(tail.three_prime(), cfg.boundary_conf);
    }

    resolve_indels(&mut geom, feature.coords.as_slice(), aln);
    resolve_ambiguity(&mut geom, bundle, &mapper, strand);

    if feature.is_cds() && geom.span.is_some() {
        resolve_frames(&mut geom, feature.coords.as_slice(), aln, strand, cfg);
        resolve_codons(&mut geom, bundle, strand, cfg);
        resolve_protein(&mut geom, feature_idx, bundle, strand);
    }

    geom
}

/// Indel events anchored inside the feature's model segments. Deletion runs
/// are clipped to the overlapping part.
fn resolve_indels(geom: &mut FeatureGeometry, coords: &[SeqRange], aln: &Alignment) {
    for ev in aln.inserts() {
        // an insertion after model position m sits inside the feature when
        // m and m+1 are both within one segment
        let inside = coords
            .iter()
            .any(|seg| ev.model_pos >= seg.lo() && ev.model_pos < seg.hi());
        if inside {
            geom.inserts.push(*ev);
        }
    }
    for ev in aln.deletes() {
        let ev_range = SeqRange::forward(ev.model_pos, ev.model_pos + ev.len - 1);
        // one clipped event per overlapping segment, anchored at the start of
        // the overlap so the event's model range never extends past the feature
        for seg in coords {
            if let Some(overlap) = seg.overlap_range(&ev_range) {
                geom.deletes.push(IndelEvent {
                    model_pos: overlap.lo(),
                    seq_pos: ev.seq_pos,
                    len: overlap.len(),
                });
            }
        }
    }
}

/// Maximal ambiguous-nucleotide runs touching either predicted boundary.
fn resolve_ambiguity(
    geom: &mut FeatureGeometry,
    bundle: &SequenceBundle,
    mapper: &CoordMapper,
    strand: Strand,
) {
    let Some(span) = geom.span else {
        return;
    };

    let run_from = |start: u64, inward: Strand| -> u64 {
        let mut run = 0u64;
        let mut pos = Some(start);
        while let Some(p) = pos {
            if !span.contains(p) {
                break;
            }
            match bundle.residue(p) {
                Some(b) if is_ambiguous(b) => run += 1,
                _ => break,
            }
            pos = ahead(p, 1, inward);
        }
        run
    };

    let run5 = run_from(span.five_prime(), strand);
    if run5 > 0 {
        let end = ahead(span.five_prime(), run5 - 1, strand).unwrap_or(span.five_prime());
        let seq_run = SeqRange::new(span.five_prime(), end, strand);
        let model = match mapper.map_seq_range(&seq_run) {
            RangeMapping::Mapped(m) => vec![m.seq],
            _ => vec![],
        };
        geom.ambig5 = Some((run5, model));
    }

    let run3 = run_from(span.three_prime(), strand.opposite());
    if run3 > 0 {
        let start = ahead(span.three_prime(), run3 - 1, strand.opposite())
            .unwrap_or(span.three_prime());
        let seq_run = SeqRange::new(start, span.three_prime(), strand);
        let model = match mapper.map_seq_range(&seq_run) {
            RangeMapping::Mapped(m) => vec![m.seq],
            _ => vec![],
        };
        geom.ambig3 = Some((run3, model));
    }
}

/// Dominant-frame analysis over the aligned pairs of the CDS.
///
/// Each aligned (sequence, model) pair lies on a diagonal identified by
/// `(seq - model) mod 3`; the diagonal holding the plurality of pairs is the
/// dominant frame, and any same-diagonal run of at least one codon off the
/// dominant diagonal is a frameshift candidate region.
fn resolve_frames(
    geom: &mut FeatureGeometry,
    coords: &[SeqRange],
    aln: &Alignment,
    strand: Strand,
    cfg: &EngineConfig,
) {
    let mapper = CoordMapper::new(aln);

    // aligned pairs in 5'→3' feature order
    let mut pairs: Vec<(u64, u64, Option<f64>)> = vec![];
    for seg in coords {
        let (lo, hi) = (seg.lo(), seg.hi());
        let walk: Box<dyn Iterator<Item = u64>> = match strand {
            Strand::Plus => Box::new(lo..=hi),
            Strand::Minus => Box::new((lo..=hi).rev()),
        };
        for m in walk {
            if let crate::coords::PosMapping::Aligned { seq_pos, conf } = mapper.map_model_pos(m) {
                pairs.push((seq_pos, m, conf));
            }
        }
    }
    if pairs.is_empty() {
        return;
    }

    let diag = |s: u64, m: u64| ((s as i64 - m as i64).rem_euclid(3)) as u8;

    let mut counts = [0usize; 3];
    for (s, m, _) in &pairs {
        counts[diag(*s, *m) as usize] += 1;
    }
    let dominant = (0u8..3)
        .max_by_key(|&f| counts[f as usize])
        .unwrap_or(0);
    geom.dominant_frame = Some(dominant);

    // contiguous same-diagonal runs off the dominant diagonal, >= 1 codon
    let mut i = 0usize;
    while i < pairs.len() {
        let f = diag(pairs[i].0, pairs[i].1);
        let start = i;
        while i < pairs.len() && diag(pairs[i].0, pairs[i].1) == f {
            i += 1;
        }
        if f == dominant || i - start < 3 {
            continue;
        }
        let run = &pairs[start..i];
        let (s_first, m_first) = (run[0].0, run[0].1);
        let (s_last, m_last) = (run[run.len() - 1].0, run[run.len() - 1].1);
        let confidence = if run.iter().all(|(_, _, c)| c.is_some()) {
            let mean =
                run.iter().filter_map(|(_, _, c)| *c).sum::<f64>() / run.len() as f64;
            if mean >= cfg.frameshift_conf {
                FrameConfidence::High(mean)
            } else {
                FrameConfidence::Low(mean)
            }
        } else {
            FrameConfidence::Unknown
        };
        geom.frameshifts.push(FrameshiftRegion {
            seq: SeqRange::new(s_first, s_last, strand),
            model: match strand {
                Strand::Plus => SeqRange::forward(m_first, m_last),
                Strand::Minus => SeqRange::reverse(m_first, m_last),
            },
            frame: f,
            dominant,
            confidence,
        });
    }
}

/// Start/stop codon validity, the 3' scan for a late stop, the 5' scan for
/// an early stop, and the length-multiple-of-3 check.
fn resolve_codons(
    geom: &mut FeatureGeometry,
    bundle: &SequenceBundle,
    strand: Strand,
    cfg: &EngineConfig,
) {
    let Some(span) = geom.span else {
        return;
    };
    let start = span.five_prime();

    let start_codon = codon_at(&bundle.seq, start, strand);
    geom.start_codon = Some(CodonCheck {
        valid: start_codon
            .as_deref()
            .is_some_and(|c| cfg.is_start_codon(c)),
        codon: start_codon,
    });

    geom.len_multiple_of_3 = geom.mapped_len % 3 == 0;

    let Some(stop_first) = geom.predicted_stop_first_base() else {
        geom.stop_codon = Some(CodonCheck {
            codon: None,
            valid: false,
        });
        return;
    };

    let stop_codon = codon_at(&bundle.seq, stop_first, strand);
    let stop_valid = stop_codon
        .as_deref()
        .is_some_and(|c| cfg.is_stop_codon(c));
    geom.stop_codon = Some(CodonCheck {
        valid: stop_valid,
        codon: stop_codon,
    });

    // 5' scan: first in-frame stop before the predicted one
    let mut pos = Some(start);
    while let Some(p) = pos {
        if !is_5p_of(p, stop_first, strand) {
            break;
        }
        match codon_at(&bundle.seq, p, strand) {
            Some(c) if cfg.is_stop_codon(&c) => {
                geom.early_stop_nt = Some((p, c));
                break;
            }
            Some(_) => {}
            None => break,
        }
        pos = ahead(p, 3, strand);
    }

    // 3' scan: only when the predicted stop is invalid. The walk stays in
    // the frame anchored at the start codon, which diverges from the frame
    // of the predicted stop when the mapped length is not a multiple of 3.
    if !stop_valid {
        let mut pos = Some(start);
        while let Some(p) = pos {
            if is_5p_of(stop_first, p, strand) {
                match codon_at(&bundle.seq, p, strand) {
                    Some(c) if cfg.is_stop_codon(&c) => {
                        geom.next_stop = Some(p);
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            pos = ahead(p, 3, strand);
        }
    }
}

/// Protein-based alignment vs the nucleotide prediction at both ends.
fn resolve_protein(
    geom: &mut FeatureGeometry,
    feature_idx: usize,
    bundle: &SequenceBundle,
    strand: Strand,
) {
    let Some(span) = geom.span else {
        return;
    };
    let Some(best) = bundle.proteins_for(feature_idx).and_then(protein::best) else {
        return;
    };

    let (cds5, cds3) = (span.five_prime(), span.three_prime());
    let (p5, p3) = (best.query.five_prime(), best.query.three_prime());

    let gap_5p = |a: u64, b: u64| if is_5p_of(a, b, strand) { dist(a, b) } else { 0 };
    let short5 = gap_5p(cds5, p5);
    let long5 = gap_5p(p5, cds5);
    let short3 = if is_5p_of(p3, cds3, strand) {
        dist(p3, cds3)
    } else {
        0
    };
    let long3 = if is_5p_of(cds3, p3, strand) {
        dist(cds3, p3)
    } else {
        0
    };

    let early_stop = geom.predicted_stop_first_base().and_then(|stop_first| {
        let mut stops: Vec<u64> = best
            .query_stops
            .iter()
            .copied()
            .filter(|&s| is_5p_of(s, stop_first, strand))
            .collect();
        stops.sort_by_key(|&s| dist(span.five_prime(), s));
        stops.first().copied()
    });

    geom.protein = Some(ProteinComparison {
        short5,
        long5,
        short3,
        long3,
        early_stop,
        inserts: best.inserts.clone(),
        deletes: best.deletes.clone(),
    });
}

fn dist(a: u64, b: u64) -> u64 {
    a.abs_diff(b)
}
