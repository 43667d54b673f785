//! Alternative feature selection: each alternative set resolves to exactly
//! one member per sequence, chosen by fewest fatal alerts with ties broken
//! by declaration order.

use std::collections::HashMap;

use vigil_core::models::{Alert, FeatureDefinition, Model};

/// Per-sequence outcome of alternative-set resolution.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Selection {
    /// Alternative-set id → index of the selected member.
    pub chosen: HashMap<String, usize>,
}

impl Selection {
    /// Whether a feature survives selection: plain features always do,
    /// alternative-set members only when chosen.
    pub fn keeps(&self, model: &Model, feature_idx: usize) -> bool {
        match &model.features[feature_idx].alternative_set {
            None => true,
            Some(set) => self.chosen.get(set) == Some(&feature_idx),
        }
    }
}

/// Resolve every alternative set against the per-feature alert lists.
///
/// The fatal count is taken over the raw detection output, before exception
/// filtering, so competing members are scored on identical footing.
pub fn select(model: &Model, alerts_by_feature: &HashMap<usize, Vec<Alert>>) -> Selection {
    let mut selection = Selection::default();
    for def in model.definitions() {
        let FeatureDefinition::Alternative(members) = def else {
            continue;
        };
        let fatal_count = |idx: usize| {
            alerts_by_feature
                .get(&idx)
                .map(|alerts| alerts.iter().filter(|a| a.fatal).count())
                .unwrap_or(0)
        };
        // strict less-than keeps the earliest-declared member on ties
        let mut best = members[0];
        for &m in &members[1..] {
            if fatal_count(m) < fatal_count(best) {
                best = m;
            }
        }
        if let Some(set) = &model.features[best].alternative_set {
            selection.chosen.insert(set.clone(), best);
        }
    }
    selection
}
