//! The per-sequence evaluation driver: geometry resolution, detection,
//! alternative selection, exception filtering, non-essential demotion and
//! aggregation, in that order. Sequences are independent, so batch
//! evaluation fans out over rayon with per-sequence fault isolation.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use rayon::prelude::*;

use vigil_core::EngineConfig;
use vigil_core::models::{Alert, AlertCode, AlertKind, Model, SequenceBundle};

use crate::boundary::{self, DeletionClass, FeatureGeometry};
use crate::detectors::{self, DetectionContext};
use crate::exceptions;
use crate::nonessential;
use crate::selector::{self, Selection};
use crate::verdict::{self, AnnotatedFeature, Verdict};

///
/// One engine per run: the model and configuration are immutable and shared
/// by reference across worker threads.
///
pub struct Engine {
    model: Model,
    config: EngineConfig,
}

impl Engine {
    pub fn new(model: Model, config: EngineConfig) -> Self {
        Engine { model, config }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate one sequence bundle into a verdict.
    pub fn evaluate(&self, bundle: &SequenceBundle) -> Verdict {
        let ctx = DetectionContext {
            model: &self.model,
            bundle,
            cfg: &self.config,
        };

        let geoms: Vec<FeatureGeometry> = (0..self.model.features.len())
            .map(|i| boundary::resolve(i, &self.model, bundle, &self.config))
            .collect();

        // per-feature detection; followers track another set and are never
        // independently scored
        let mut by_feature: HashMap<usize, Vec<Alert>> = HashMap::new();
        for geom in &geoms {
            if self.model.feature(geom.feature).follows.is_some() {
                continue;
            }
            by_feature.insert(geom.feature, detectors::feature::alerts(&ctx, geom));
        }
        for alert in detectors::feature::adjacency_alerts(&ctx, &geoms) {
            if let Some(idx) = alert.feature {
                by_feature.entry(idx).or_default().push(alert);
            }
        }

        // alternative selection on the raw counts, then losing members and
        // their alerts are discarded
        let selection = selector::select(&self.model, &by_feature);
        by_feature.retain(|&idx, _| selection.keeps(&self.model, idx));

        let mut ordered: Vec<usize> = by_feature.keys().copied().collect();
        ordered.sort_unstable();
        let mut alerts: Vec<Alert> = vec![];
        for idx in ordered {
            if let Some(list) = by_feature.remove(&idx) {
                alerts.extend(list);
            }
        }

        // exceptions run before the translatability check so a tolerated
        // indel does not poison child peptides
        let mut alerts = exceptions::apply(&self.model, alerts);

        let fatal_cds: HashSet<usize> = alerts
            .iter()
            .filter(|a| a.fatal)
            .filter_map(|a| a.feature)
            .filter(|&i| self.model.features[i].is_cds())
            .collect();
        if !fatal_cds.is_empty() {
            let affected: HashSet<usize> = self
                .model
                .features
                .iter()
                .enumerate()
                .filter(|(_, f)| {
                    f.is_mat_peptide() && f.parent.is_some_and(|p| fatal_cds.contains(&p))
                })
                .map(|(i, _)| i)
                .collect();
            alerts.retain(|a| a.feature.is_none_or(|i| !affected.contains(&i)));
            alerts.extend(detectors::feature::translation_alerts(&ctx, &fatal_cds));
        }

        nonessential::demote(&self.model, &mut alerts);
        alerts.extend(detectors::sequence::alerts(&ctx));

        debug!(
            "{}: {} alert(s), {} alternative set(s) resolved",
            bundle.name,
            alerts.len(),
            selection.chosen.len()
        );

        let features = self.feature_table(&selection, &geoms, &alerts);
        verdict::aggregate(
            bundle.name.clone(),
            self.model.id.clone(),
            selection.chosen,
            alerts,
            features,
        )
    }

    /// Evaluate a batch in parallel. Output order follows input order; a
    /// panic inside one sequence's evaluation becomes an internal-error
    /// alert on that sequence and never halts the run.
    pub fn evaluate_all(&self, bundles: &[SequenceBundle]) -> Vec<Verdict> {
        bundles
            .par_iter()
            .map(|bundle| {
                panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(bundle)))
                    .unwrap_or_else(|payload| self.fault_verdict(bundle, payload))
            })
            .collect()
    }

    fn fault_verdict(
        &self,
        bundle: &SequenceBundle,
        payload: Box<dyn std::any::Any + Send>,
    ) -> Verdict {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unidentified detector fault".into());
        warn!("internal fault while evaluating {}: {}", bundle.name, message);
        let alert = Alert::new(
            AlertKind::InternalError { message },
            None,
            self.config.effective_fatal(AlertCode::Intrnerr),
        );
        verdict::aggregate(
            bundle.name.clone(),
            self.model.id.clone(),
            HashMap::new(),
            vec![alert],
            vec![],
        )
    }

    /// Output feature table: selected, mappable, not wholly deleted. A
    /// follower gene takes the coordinates of the chosen member of the set
    /// it tracks.
    fn feature_table(
        &self,
        selection: &Selection,
        geoms: &[FeatureGeometry],
        alerts: &[Alert],
    ) -> Vec<AnnotatedFeature> {
        let mut table = vec![];
        for (idx, feature) in self.model.features.iter().enumerate() {
            if !selection.keeps(&self.model, idx) {
                continue;
            }
            let source = match &feature.follows {
                Some(set) => match selection.chosen.get(set) {
                    Some(&chosen) => &geoms[chosen],
                    None => continue,
                },
                None => &geoms[idx],
            };
            if source.unmapped || matches!(source.deletion, DeletionClass::Whole { .. }) {
                continue;
            }
            let seq_coords: Vec<_> = source
                .segment_spans
                .iter()
                .flatten()
                .map(|m| m.seq)
                .collect();
            if seq_coords.is_empty() {
                continue;
            }
            table.push(AnnotatedFeature {
                feature: idx,
                ftype: nonessential::output_type(&self.model, idx, alerts),
                name: feature.name(),
                seq_coords,
            });
        }
        table
    }
}
