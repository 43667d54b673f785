//! Feature-scoped detectors, driven by one [`FeatureGeometry`] per feature
//! instance plus the model's parent/adjacency declarations.

use std::collections::HashSet;

use vigil_core::models::{Alert, AlertKind, SeqRange, Strand};

use crate::boundary::{DeletionClass, FeatureGeometry, FrameConfidence};
use crate::coords::BoundaryClass;
use crate::detectors::DetectionContext;

fn step3(pos: u64, n: u64, strand: Strand) -> Option<u64> {
    match strand {
        Strand::Plus => Some(pos + n),
        Strand::Minus => pos.checked_sub(n),
    }
}

/// Oriented 3-nt codon range starting at `first`, clipped at the sequence
/// 5' edge on the minus strand.
fn codon_range(first: u64, strand: Strand) -> SeqRange {
    match step3(first, 2, strand) {
        Some(end) if end >= 1 => SeqRange::new(first, end, strand),
        _ => SeqRange::new(first, first, strand),
    }
}

/// All single-feature alerts for one resolved geometry.
pub fn alerts(ctx: &DetectionContext, geom: &FeatureGeometry) -> Vec<Alert> {
    let feature = ctx.model.feature(geom.feature);
    let idx = Some(geom.feature);
    let strand = feature.strand();
    let mut out = vec![];

    if geom.unmapped {
        out.push(
            ctx.alert(AlertKind::IndefiniteAnnotation, idx)
                .with_model_coords(feature.coords.clone()),
        );
        return out;
    }

    match &geom.deletion {
        DeletionClass::None => {}
        DeletionClass::Whole { len } => {
            out.push(
                ctx.alert(AlertKind::DeletionFeature { len: *len }, idx)
                    .with_model_coords(feature.coords.clone()),
            );
            return out;
        }
        DeletionClass::Sections(sections) => {
            for (segment, len) in sections {
                out.push(
                    ctx.alert(
                        AlertKind::DeletionSection {
                            segment: *segment,
                            len: *len,
                        },
                        idx,
                    )
                    .with_model_coords(vec![feature.coords[*segment]]),
                );
            }
        }
    }

    for region in &geom.frameshifts {
        let kind = match region.confidence {
            FrameConfidence::High(conf) => AlertKind::FrameshiftHighConf {
                shifted_frame: region.frame,
                dominant_frame: region.dominant,
                conf,
            },
            FrameConfidence::Low(conf) => AlertKind::FrameshiftLowConf {
                shifted_frame: region.frame,
                dominant_frame: region.dominant,
                conf,
            },
            FrameConfidence::Unknown => AlertKind::FrameshiftUnknownConf {
                shifted_frame: region.frame,
                dominant_frame: region.dominant,
            },
        };
        out.push(
            ctx.alert(kind, idx)
                .with_seq_coords(vec![region.seq])
                .with_model_coords(vec![region.model]),
        );
    }

    codon_alerts(ctx, geom, &mut out);
    boundary_alerts(ctx, geom, &mut out);
    protein_alerts(ctx, geom, &mut out);
    indel_alerts(ctx, geom, &mut out);
    ambiguity_alerts(ctx, geom, &mut out);
    lowsim_alerts(ctx, geom, strand, &mut out);

    out
}

fn codon_alerts(ctx: &DetectionContext, geom: &FeatureGeometry, out: &mut Vec<Alert>) {
    let idx = Some(geom.feature);
    let strand = ctx.model.feature(geom.feature).strand();
    let Some(span) = geom.span else {
        return;
    };

    if let Some(check) = &geom.start_codon {
        if !check.valid {
            let codon = check.codon.clone().unwrap_or_else(|| "-".into());
            out.push(
                ctx.alert(AlertKind::MutStart { codon }, idx)
                    .with_seq_coords(vec![codon_range(span.five_prime(), strand)]),
            );
        }
    }

    let stop_valid = geom.stop_codon.as_ref().is_some_and(|c| c.valid);
    if let (Some(check), Some(predicted)) = (&geom.stop_codon, geom.predicted_stop_first_base()) {
        if !check.valid {
            let codon = check.codon.clone().unwrap_or_else(|| "-".into());
            out.push(
                ctx.alert(AlertKind::MutEndCodon { codon }, idx)
                    .with_seq_coords(vec![codon_range(predicted, strand)]),
            );
            match geom.next_stop {
                Some(first_stop) => out.push(
                    ctx.alert(
                        AlertKind::MutEndExtended {
                            predicted,
                            first_stop,
                        },
                        idx,
                    )
                    .with_seq_coords(vec![codon_range(first_stop, strand)]),
                ),
                None => {
                    let scanned_through = match strand {
                        Strand::Plus => ctx.bundle.seq_len(),
                        Strand::Minus => 1,
                    };
                    out.push(
                        ctx.alert(AlertKind::MutEndNoStop { scanned_through }, idx)
                            .with_seq_coords(vec![SeqRange::new(
                                predicted,
                                scanned_through,
                                strand,
                            )]),
                    );
                }
            }
        }
    }

    if !stop_valid && geom.stop_codon.is_some() && !geom.len_multiple_of_3 {
        out.push(
            ctx.alert(
                AlertKind::UnexpectedLength {
                    len: geom.mapped_len,
                },
                idx,
            )
            .with_seq_coords(vec![span]),
        );
    }

    if let (Some((first_stop, codon)), Some(predicted)) =
        (&geom.early_stop_nt, geom.predicted_stop_first_base())
    {
        out.push(
            ctx.alert(
                AlertKind::EarlyStopNuc {
                    predicted,
                    first_stop: *first_stop,
                    codon: codon.clone(),
                },
                idx,
            )
            .with_seq_coords(vec![codon_range(*first_stop, strand)]),
        );
    }
}

fn boundary_alerts(ctx: &DetectionContext, geom: &FeatureGeometry, out: &mut Vec<Alert>) {
    let feature = ctx.model.feature(geom.feature);
    let idx = Some(geom.feature);
    let coding = feature.is_cds();
    let threshold = ctx.cfg.boundary_conf;

    let ends = [
        (&geom.boundary5, feature.coords.first().map(|r| r.five_prime()), true),
        (&geom.boundary3, feature.coords.last().map(|r| r.three_prime()), false),
    ];
    for (class, model_pos, is_5p) in ends {
        let model_coords = model_pos
            .map(|p| vec![SeqRange::new(p, p, feature.strand())])
            .unwrap_or_default();
        match class {
            BoundaryClass::Gap { .. } => {
                let kind = if is_5p {
                    AlertKind::Boundary5Gap
                } else {
                    AlertKind::Boundary3Gap
                };
                out.push(ctx.alert(kind, idx).with_model_coords(model_coords));
            }
            BoundaryClass::Low { seq_pos, conf } => {
                let kind = match (is_5p, coding) {
                    (true, true) => AlertKind::Boundary5LowConfCoding {
                        conf: *conf,
                        threshold,
                    },
                    (true, false) => AlertKind::Boundary5LowConfNonCoding {
                        conf: *conf,
                        threshold,
                    },
                    (false, true) => AlertKind::Boundary3LowConfCoding {
                        conf: *conf,
                        threshold,
                    },
                    (false, false) => AlertKind::Boundary3LowConfNonCoding {
                        conf: *conf,
                        threshold,
                    },
                };
                out.push(
                    ctx.alert(kind, idx)
                        .with_seq_coords(vec![SeqRange::new(
                            *seq_pos,
                            *seq_pos,
                            feature.strand(),
                        )])
                        .with_model_coords(model_coords),
                );
            }
            // a valid boundary, an unscored alignment, or a boundary outside
            // the aligned span (already covered by indfantn/deletin alerts)
            BoundaryClass::Valid { .. }
            | BoundaryClass::Unknown { .. }
            | BoundaryClass::Unmapped => {}
        }
    }
}

fn protein_alerts(ctx: &DetectionContext, geom: &FeatureGeometry, out: &mut Vec<Alert>) {
    let idx = Some(geom.feature);
    let strand = ctx.model.feature(geom.feature).strand();
    let Some(prot) = &geom.protein else {
        return;
    };
    let Some(span) = geom.span else {
        return;
    };

    let end_region = |anchor: u64, len: u64, inward: Strand| -> Vec<SeqRange> {
        match len.checked_sub(1).and_then(|n| step3(anchor, n, inward)) {
            Some(far) if far >= 1 => vec![SeqRange::new(anchor, far, inward)],
            _ => vec![],
        }
    };

    let tol5 = ctx.cfg.prot_tolerance_5p;
    let tol3 = ctx.cfg.prot_tolerance_3p;
    if prot.short5 > tol5 {
        out.push(
            ctx.alert(
                AlertKind::ProteinShort5 {
                    diff: prot.short5,
                    tolerance: tol5,
                },
                idx,
            )
            .with_seq_coords(end_region(span.five_prime(), prot.short5, strand)),
        );
    }
    if prot.long5 > tol5 {
        out.push(ctx.alert(
            AlertKind::ProteinLong5 {
                diff: prot.long5,
                tolerance: tol5,
            },
            idx,
        ));
    }
    if prot.short3 > tol3 {
        out.push(
            ctx.alert(
                AlertKind::ProteinShort3 {
                    diff: prot.short3,
                    tolerance: tol3,
                },
                idx,
            )
            .with_seq_coords(end_region(
                span.three_prime(),
                prot.short3,
                strand.opposite(),
            )),
        );
    }
    if prot.long3 > tol3 {
        out.push(ctx.alert(
            AlertKind::ProteinLong3 {
                diff: prot.long3,
                tolerance: tol3,
            },
            idx,
        ));
    }

    if let (Some(first_stop), Some(predicted)) =
        (prot.early_stop, geom.predicted_stop_first_base())
    {
        out.push(
            ctx.alert(
                AlertKind::EarlyStopProt {
                    predicted,
                    first_stop,
                },
                idx,
            )
            .with_seq_coords(vec![codon_range(first_stop, strand)]),
        );
    }

    for ins in &prot.inserts {
        if ins.len > ctx.cfg.max_prot_insert {
            out.push(
                ctx.alert(
                    AlertKind::InsertionProt {
                        len: ins.len,
                        max: ctx.cfg.max_prot_insert,
                    },
                    idx,
                )
                .with_seq_coords(vec![SeqRange::forward(
                    ins.query_pos,
                    ins.query_pos + ins.len - 1,
                )]),
            );
        }
    }
    for del in &prot.deletes {
        if del.len > ctx.cfg.max_prot_delete {
            out.push(
                ctx.alert(
                    AlertKind::DeletionProt {
                        len: del.len,
                        max: ctx.cfg.max_prot_delete,
                    },
                    idx,
                )
                .with_seq_coords(vec![SeqRange::forward(del.query_pos, del.query_pos)]),
            );
        }
    }
}

fn indel_alerts(ctx: &DetectionContext, geom: &FeatureGeometry, out: &mut Vec<Alert>) {
    let idx = Some(geom.feature);
    for ev in &geom.inserts {
        if ev.len > ctx.cfg.max_nt_insert {
            out.push(
                ctx.alert(
                    AlertKind::InsertionNuc {
                        len: ev.len,
                        max: ctx.cfg.max_nt_insert,
                    },
                    idx,
                )
                .with_seq_coords(vec![SeqRange::forward(ev.seq_pos, ev.seq_pos + ev.len - 1)])
                .with_model_coords(vec![SeqRange::forward(ev.model_pos, ev.model_pos)]),
            );
        }
    }
    for ev in &geom.deletes {
        if ev.len > ctx.cfg.max_nt_delete {
            out.push(
                ctx.alert(
                    AlertKind::DeletionNuc {
                        len: ev.len,
                        max: ctx.cfg.max_nt_delete,
                    },
                    idx,
                )
                .with_seq_coords(vec![SeqRange::forward(ev.seq_pos, ev.seq_pos)])
                .with_model_coords(vec![SeqRange::forward(
                    ev.model_pos,
                    ev.model_pos + ev.len - 1,
                )]),
            );
        }
    }
}

fn ambiguity_alerts(ctx: &DetectionContext, geom: &FeatureGeometry, out: &mut Vec<Alert>) {
    let idx = Some(geom.feature);
    let strand = ctx.model.feature(geom.feature).strand();
    let Some(span) = geom.span else {
        return;
    };

    if let Some((run, model)) = &geom.ambig5 {
        if *run >= ctx.cfg.min_ambig_run {
            let end = step3(span.five_prime(), run - 1, strand).unwrap_or(span.five_prime());
            out.push(
                ctx.alert(AlertKind::AmbigFeature5 { run: *run }, idx)
                    .with_seq_coords(vec![SeqRange::new(span.five_prime(), end, strand)])
                    .with_model_coords(model.clone()),
            );
        }
    }
    if let Some((run, model)) = &geom.ambig3 {
        if *run >= ctx.cfg.min_ambig_run {
            let start = step3(span.three_prime(), run - 1, strand.opposite())
                .unwrap_or(span.three_prime());
            out.push(
                ctx.alert(AlertKind::AmbigFeature3 { run: *run }, idx)
                    .with_seq_coords(vec![SeqRange::new(start, span.three_prime(), strand)])
                    .with_model_coords(model.clone()),
            );
        }
    }
}

/// Low-similarity regions of the feature's predicted span: sequence stretches
/// uncovered by any winning-strand hit, clipped to the span, at or above the
/// minimum length.
fn lowsim_alerts(
    ctx: &DetectionContext,
    geom: &FeatureGeometry,
    strand: Strand,
    out: &mut Vec<Alert>,
) {
    let idx = Some(geom.feature);
    let Some(span) = geom.span else {
        return;
    };
    if ctx.bundle.hits.is_empty() {
        return;
    }

    for (lo, hi) in ctx.uncovered_intervals() {
        let clip_lo = lo.max(span.lo());
        let clip_hi = hi.min(span.hi());
        if clip_lo > clip_hi {
            continue;
        }
        let len = clip_hi - clip_lo + 1;
        if len < ctx.cfg.min_lowsim_len {
            continue;
        }
        let region = SeqRange::forward(clip_lo, clip_hi);
        let touches_5p = region.contains(span.five_prime());
        let touches_3p = region.contains(span.three_prime());
        let kind = if touches_5p {
            AlertKind::LowSimFeature5 { len }
        } else if touches_3p {
            AlertKind::LowSimFeature3 { len }
        } else {
            AlertKind::LowSimFeatureInternal { len }
        };
        out.push(
            ctx.alert(kind, idx)
                .with_seq_coords(vec![SeqRange::new(
                    match strand {
                        Strand::Plus => clip_lo,
                        Strand::Minus => clip_hi,
                    },
                    match strand {
                        Strand::Plus => clip_hi,
                        Strand::Minus => clip_lo,
                    },
                    strand,
                )]),
        );
    }
}

/// Adjacency check for mature peptides declared back-to-back under the same
/// parent CDS: predicted spans must abut by exactly one position on the same
/// strand.
pub fn adjacency_alerts(ctx: &DetectionContext, geoms: &[FeatureGeometry]) -> Vec<Alert> {
    let mut out = vec![];
    for a in geoms {
        let fa = ctx.model.feature(a.feature);
        if !fa.is_mat_peptide() {
            continue;
        }
        for b in geoms {
            if a.feature == b.feature {
                continue;
            }
            let fb = ctx.model.feature(b.feature);
            if !fb.is_mat_peptide()
                || fa.parent != fb.parent
                || fa.strand() != fb.strand()
            {
                continue;
            }
            // declared adjacency in model space: a ends right before b starts
            let declared_adjacent = fa
                .coords
                .last()
                .zip(fb.coords.first())
                .is_some_and(|(ea, sb)| {
                    step3(ea.three_prime(), 1, fa.strand()) == Some(sb.five_prime())
                });
            if !declared_adjacent {
                continue;
            }
            let (Some(span_a), Some(span_b)) = (a.span, b.span) else {
                continue;
            };
            let expected = step3(span_a.three_prime(), 1, fa.strand());
            if expected == Some(span_b.five_prime()) {
                continue;
            }
            let gap = match fa.strand() {
                Strand::Plus => span_b.five_prime() as i64 - span_a.three_prime() as i64 - 1,
                Strand::Minus => span_a.three_prime() as i64 - span_b.five_prime() as i64 - 1,
            };
            let (lo, hi) = (
                span_a.three_prime().min(span_b.five_prime()),
                span_a.three_prime().max(span_b.five_prime()),
            );
            out.push(
                ctx.alert(AlertKind::PeptideAdjacency { gap }, Some(a.feature))
                    .with_seq_coords(vec![SeqRange::forward(lo, hi)]),
            );
        }
    }
    out
}

/// Replace a mature peptide's own findings with a single translation alert
/// when its parent CDS carries any fatal alert.
pub fn translation_alerts(
    ctx: &DetectionContext,
    fatal_cds: &HashSet<usize>,
) -> Vec<Alert> {
    let mut out = vec![];
    for (idx, feature) in ctx.model.features.iter().enumerate() {
        if !feature.is_mat_peptide() {
            continue;
        }
        let Some(parent) = feature.parent else {
            continue;
        };
        if fatal_cds.contains(&parent) {
            out.push(
                ctx.alert(AlertKind::PeptideTranslation, Some(idx))
                    .with_model_coords(feature.coords.clone()),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::EngineConfig;
    use vigil_core::models::{
        AlertCode, Feature, FeatureType, IndelEvent, Model, ProteinIndel, SequenceBundle,
    };

    use crate::boundary::ProteinComparison;
    use crate::coords::BoundaryClass;

    fn gene_model() -> Model {
        Model::new(
            "m".into(),
            100,
            vec![Feature::new(
                FeatureType::Gene,
                vec![SeqRange::forward(1, 100)],
            )],
        )
        .unwrap()
    }

    /// Mapped, alert-free geometry for the model's single feature.
    fn base_geometry() -> FeatureGeometry {
        FeatureGeometry {
            feature: 0,
            segment_spans: vec![None],
            span: Some(SeqRange::forward(1, 100)),
            mapped_len: 100,
            deletion: DeletionClass::None,
            unmapped: false,
            boundary5: BoundaryClass::Valid {
                seq_pos: 1,
                conf: 0.95,
            },
            boundary3: BoundaryClass::Valid {
                seq_pos: 100,
                conf: 0.95,
            },
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

    fn clean_protein() -> ProteinComparison {
        ProteinComparison {
            short5: 0,
            long5: 0,
            short3: 0,
            long3: 0,
            early_stop: None,
            inserts: vec![],
            deletes: vec![],
        }
    }

    fn codes(alerts: &[Alert]) -> Vec<AlertCode> {
        alerts.iter().map(|a| a.code()).collect()
    }

    #[rstest]
    #[case(27, vec![])]
    #[case(28, vec![AlertCode::Insertnn])]
    fn test_nt_insertion_at_and_over_maximum(
        #[case] len: u64,
        #[case] expected: Vec<AlertCode>,
    ) {
        let model = gene_model();
        let cfg = EngineConfig::default();
        let b = SequenceBundle::new("s1".into(), vec![b'A'; 100]);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut geom = base_geometry();
        geom.inserts = vec![IndelEvent {
            model_pos: 50,
            seq_pos: 51,
            len,
        }];
        let mut out = vec![];
        indel_alerts(&ctx, &geom, &mut out);
        assert_eq!(codes(&out), expected);
    }

    #[rstest]
    #[case(27, vec![])]
    #[case(28, vec![AlertCode::Deletinn])]
    fn test_nt_deletion_at_and_over_maximum(
        #[case] len: u64,
        #[case] expected: Vec<AlertCode>,
    ) {
        let model = gene_model();
        let cfg = EngineConfig::default();
        let b = SequenceBundle::new("s1".into(), vec![b'A'; 100]);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut geom = base_geometry();
        geom.deletes = vec![IndelEvent {
            model_pos: 40,
            seq_pos: 39,
            len,
        }];
        let mut out = vec![];
        indel_alerts(&ctx, &geom, &mut out);
        assert_eq!(codes(&out), expected);
        if len == 28 {
            assert_eq!(out[0].model_coords, vec![SeqRange::forward(40, 67)]);
            assert_eq!(out[0].detail(), "28>27");
        }
    }

    #[rstest]
    #[case(27, vec![])]
    #[case(28, vec![AlertCode::Insertnp])]
    fn test_protein_insertion_at_and_over_maximum(
        #[case] len: u64,
        #[case] expected: Vec<AlertCode>,
    ) {
        let model = gene_model();
        let cfg = EngineConfig::default();
        let b = SequenceBundle::new("s1".into(), vec![b'A'; 100]);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut geom = base_geometry();
        let mut prot = clean_protein();
        prot.inserts = vec![ProteinIndel { query_pos: 30, len }];
        geom.protein = Some(prot);
        let mut out = vec![];
        protein_alerts(&ctx, &geom, &mut out);
        assert_eq!(codes(&out), expected);
    }

    #[rstest]
    #[case(27, vec![])]
    #[case(28, vec![AlertCode::Deletinp])]
    fn test_protein_deletion_at_and_over_maximum(
        #[case] len: u64,
        #[case] expected: Vec<AlertCode>,
    ) {
        let model = gene_model();
        let cfg = EngineConfig::default();
        let b = SequenceBundle::new("s1".into(), vec![b'A'; 100]);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut geom = base_geometry();
        let mut prot = clean_protein();
        prot.deletes = vec![ProteinIndel { query_pos: 30, len }];
        geom.protein = Some(prot);
        let mut out = vec![];
        protein_alerts(&ctx, &geom, &mut out);
        assert_eq!(codes(&out), expected);
    }
}
