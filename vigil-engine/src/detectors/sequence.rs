//! Sequence-scoped detectors over the similarity-search hit list and the
//! raw residues: duplicated model regions, discontinuous hit order,
//! opposite-strand evidence, overall coverage, terminal ambiguity and
//! low-similarity stretches.

use vigil_core::models::{Alert, AlertKind, SeqRange, Strand};
use vigil_core::utils::is_ambiguous;

use crate::detectors::DetectionContext;

/// All sequence-level alerts for one bundle.
pub fn alerts(ctx: &DetectionContext) -> Vec<Alert> {
    let mut out = vec![];
    duplicate_region(ctx, &mut out);
    discontinuous(ctx, &mut out);
    indefinite_strand(ctx, &mut out);
    low_coverage(ctx, &mut out);
    terminal_ambiguity(ctx, &mut out);
    lowsim(ctx, &mut out);
    out
}

/// Two hits whose model spans overlap by at least the configured minimum:
/// the same model region is annotated twice in the sequence.
fn duplicate_region(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let hits = &ctx.bundle.hits;
    for i in 0..hits.len() {
        for j in i + 1..hits.len() {
            let Some(overlap) = hits[i].model.overlap_range(&hits[j].model) else {
                continue;
            };
            if overlap.len() < ctx.cfg.min_dup_overlap {
                continue;
            }
            out.push(
                ctx.alert(
                    AlertKind::DuplicateRegion {
                        overlap: overlap.len(),
                        min: ctx.cfg.min_dup_overlap,
                    },
                    None,
                )
                .with_seq_coords(vec![hits[i].seq, hits[j].seq])
                .with_model_coords(vec![overlap]),
            );
        }
    }
}

/// Winning-strand hits whose sequence order disagrees with their model
/// order, counted as inversions over the sequence-sorted hit list.
fn discontinuous(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let Some(strand) = ctx.winning_strand() else {
        return;
    };
    let mut hits = ctx.winning_hits();
    if hits.len() < 2 {
        return;
    }
    hits.sort_by_key(|h| h.seq.lo());

    let mut inversions = 0usize;
    for i in 0..hits.len() {
        for j in i + 1..hits.len() {
            let inverted = match strand {
                Strand::Plus => hits[j].model.lo() < hits[i].model.lo(),
                Strand::Minus => hits[j].model.lo() > hits[i].model.lo(),
            };
            if inverted {
                inversions += 1;
            }
        }
    }
    if inversions > 0 {
        out.push(
            ctx.alert(AlertKind::DiscontinuousSimilarity { inversions }, None)
                .with_seq_coords(hits.iter().map(|h| h.seq).collect()),
        );
    }
}

/// A hit on the strand opposite the best-scoring one, strong enough to make
/// the overall strand call indefinite.
fn indefinite_strand(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let Some(winning) = ctx.winning_strand() else {
        return;
    };
    for hit in &ctx.bundle.hits {
        if hit.strand != winning && hit.score >= ctx.cfg.min_opp_strand_score {
            out.push(
                ctx.alert(
                    AlertKind::IndefiniteStrand {
                        score: hit.score,
                        min: ctx.cfg.min_opp_strand_score,
                    },
                    None,
                )
                .with_seq_coords(vec![hit.seq])
                .with_model_coords(vec![hit.model]),
            );
        }
    }
}

fn low_coverage(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let n = ctx.bundle.seq_len();
    if n == 0 || ctx.bundle.hits.is_empty() {
        return;
    }
    let covered: u64 = ctx
        .covered_intervals()
        .iter()
        .map(|(lo, hi)| hi - lo + 1)
        .sum();
    let fraction = covered as f64 / n as f64;
    if fraction < ctx.cfg.min_coverage {
        out.push(ctx.alert(
            AlertKind::LowCoverage {
                fraction,
                min: ctx.cfg.min_coverage,
            },
            None,
        ));
    }
}

/// Maximal ambiguous-nucleotide runs touching either end of the sequence.
fn terminal_ambiguity(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let n = ctx.bundle.seq_len();
    if n == 0 {
        return;
    }

    let mut run5 = 0u64;
    while run5 < n {
        match ctx.bundle.residue(run5 + 1) {
            Some(b) if is_ambiguous(b) => run5 += 1,
            _ => break,
        }
    }
    if run5 >= ctx.cfg.min_ambig_run {
        out.push(
            ctx.alert(AlertKind::AmbigSeq5 { run: run5 }, None)
                .with_seq_coords(vec![SeqRange::forward(1, run5)]),
        );
    }

    // the whole-sequence run is reported once, at the 5' end
    if run5 == n {
        return;
    }

    let mut run3 = 0u64;
    while run3 < n {
        match ctx.bundle.residue(n - run3) {
            Some(b) if is_ambiguous(b) => run3 += 1,
            _ => break,
        }
    }
    if run3 >= ctx.cfg.min_ambig_run {
        out.push(
            ctx.alert(AlertKind::AmbigSeq3 { run: run3 }, None)
                .with_seq_coords(vec![SeqRange::forward(n - run3 + 1, n)]),
        );
    }
}

/// Stretches of the sequence uncovered by any winning-strand hit, at or
/// above the minimum length, classified by which sequence end they touch.
fn lowsim(ctx: &DetectionContext, out: &mut Vec<Alert>) {
    let n = ctx.bundle.seq_len();
    if n == 0 || ctx.bundle.hits.is_empty() {
        return;
    }
    for (lo, hi) in ctx.uncovered_intervals() {
        let len = hi - lo + 1;
        if len < ctx.cfg.min_lowsim_len {
            continue;
        }
        let kind = if lo == 1 {
            AlertKind::LowSimSeq5 { len }
        } else if hi == n {
            AlertKind::LowSimSeq3 { len }
        } else {
            AlertKind::LowSimSeqInternal { len }
        };
        out.push(
            ctx.alert(kind, None)
                .with_seq_coords(vec![SeqRange::forward(lo, hi)]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::EngineConfig;
    use vigil_core::models::{AlertCode, Hit, Model, SequenceBundle};

    fn hit(seq: (u64, u64), model: (u64, u64), strand: Strand, score: f64) -> Hit {
        Hit::new(
            SeqRange::new(seq.0, seq.1, strand),
            SeqRange::forward(model.0, model.1),
            strand,
            score,
        )
    }

    fn empty_model() -> Model {
        Model::new("m".into(), 1000, vec![]).unwrap()
    }

    fn bundle_with_hits(len: usize, hits: Vec<Hit>) -> SequenceBundle {
        let mut b = SequenceBundle::new("s1".into(), vec![b'A'; len]);
        b.hits = hits;
        b
    }

    fn codes(alerts: &[Alert]) -> Vec<AlertCode> {
        alerts.iter().map(|a| a.code()).collect()
    }

    #[rstest]
    fn test_duplicate_region_fires_once_per_pair() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        // model spans 1..100 and 64..200 share 37 positions
        let b = bundle_with_hits(
            220,
            vec![
                hit((1, 100), (1, 100), Strand::Plus, 50.0),
                hit((101, 220), (64, 200), Strand::Plus, 45.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        duplicate_region(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Dupregin]);
        assert_eq!(out[0].model_coords, vec![SeqRange::forward(64, 100)]);
        assert_eq!(
            out[0].seq_coords,
            vec![SeqRange::forward(1, 100), SeqRange::forward(101, 220)]
        );
    }

    #[rstest]
    fn test_duplicate_overlap_below_minimum_is_silent() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        // 19-position overlap, minimum is 20
        let b = bundle_with_hits(
            200,
            vec![
                hit((1, 100), (1, 100), Strand::Plus, 50.0),
                hit((101, 200), (82, 181), Strand::Plus, 45.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        duplicate_region(&ctx, &mut out);
        assert_eq!(out, vec![]);
    }

    #[rstest]
    fn test_discontinuous_hit_order() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        // sequence order 1..50 then 60..110, model order reversed
        let b = bundle_with_hits(
            110,
            vec![
                hit((1, 50), (200, 249), Strand::Plus, 50.0),
                hit((60, 110), (1, 51), Strand::Plus, 45.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        discontinuous(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Discontn]);
    }

    #[rstest]
    fn test_indefinite_strand_needs_minimum_score() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        let b = bundle_with_hits(
            300,
            vec![
                hit((1, 200), (1, 200), Strand::Plus, 80.0),
                hit((300, 250), (400, 450), Strand::Minus, 25.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        indefinite_strand(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Indfstrn]);

        // one unit under the minimum
        let b = bundle_with_hits(
            300,
            vec![
                hit((1, 200), (1, 200), Strand::Plus, 80.0),
                hit((300, 250), (400, 450), Strand::Minus, 24.9),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        indefinite_strand(&ctx, &mut out);
        assert_eq!(out, vec![]);
    }

    #[rstest]
    fn test_low_coverage_fraction() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        // 500 of 1000 covered, minimum fraction 0.9
        let b = bundle_with_hits(1000, vec![hit((1, 500), (1, 500), Strand::Plus, 60.0)]);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        low_coverage(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Lowcovrg]);
        // opposite-strand hits do not count toward coverage
        let b = bundle_with_hits(
            1000,
            vec![
                hit((1, 500), (1, 500), Strand::Plus, 60.0),
                hit((1000, 501), (501, 1000), Strand::Minus, 10.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        low_coverage(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Lowcovrg]);
    }

    #[rstest]
    fn test_terminal_ambiguity_runs() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        let mut seq = vec![b'N'; 6];
        seq.extend(vec![b'A'; 20]);
        seq.extend(vec![b'N'; 5]);
        let mut b = SequenceBundle::new("s1".into(), seq);
        b.hits = vec![];
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        terminal_ambiguity(&ctx, &mut out);
        assert_eq!(codes(&out), vec![AlertCode::Ambgnt5s, AlertCode::Ambgnt3s]);
        assert_eq!(out[0].seq_coords, vec![SeqRange::forward(1, 6)]);
        assert_eq!(out[1].seq_coords, vec![SeqRange::forward(27, 31)]);
    }

    #[rstest]
    fn test_terminal_ambiguity_short_run_silent() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        let mut seq = vec![b'N'; 4];
        seq.extend(vec![b'A'; 20]);
        let b = SequenceBundle::new("s1".into(), seq);
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        terminal_ambiguity(&ctx, &mut out);
        assert_eq!(out, vec![]);
    }

    #[rstest]
    fn test_lowsim_classified_by_end() {
        let model = empty_model();
        let cfg = EngineConfig::default();
        // covered 21..60 and 81..180 of 200: gaps 1..20, 61..80, 181..200
        let b = bundle_with_hits(
            200,
            vec![
                hit((21, 60), (1, 40), Strand::Plus, 50.0),
                hit((81, 180), (41, 140), Strand::Plus, 55.0),
            ],
        );
        let ctx = DetectionContext {
            model: &model,
            bundle: &b,
            cfg: &cfg,
        };
        let mut out = vec![];
        lowsim(&ctx, &mut out);
        assert_eq!(
            codes(&out),
            vec![
                AlertCode::Lowsim5s,
                AlertCode::Lowsimis,
                AlertCode::Lowsim3s
            ]
        );
    }
}
