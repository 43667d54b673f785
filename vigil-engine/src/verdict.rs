//! Pass/fail aggregation and the per-sequence verdict handed to report
//! writers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use vigil_core::models::{Alert, FeatureType, SeqRange};

/// One feature-table entry, carried on the verdict for the external writer.
/// Unmapped and wholly deleted features never appear here.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedFeature {
    pub feature: usize,
    /// Output type, downgraded to `misc_feature` for a demoted non-essential
    /// feature.
    pub ftype: FeatureType,
    pub name: String,
    /// Predicted sequence spans, one per mapped segment.
    pub seq_coords: Vec<SeqRange>,
}

///
/// Everything the engine concludes about one sequence.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Verdict {
    pub seq_name: String,
    pub model_id: String,
    pub pass: bool,
    /// Set when the sequence fails but every failing alert attaches to a
    /// feature absent from the output table, so the failure has no visible
    /// cause there.
    pub hidden_failure: bool,
    /// Alternative-set id → selected member index.
    pub chosen: HashMap<String, usize>,
    pub alerts: Vec<Alert>,
    pub features: Vec<AnnotatedFeature>,
}

/// Combine surviving alerts and the output feature table into a verdict.
pub fn aggregate(
    seq_name: String,
    model_id: String,
    chosen: HashMap<String, usize>,
    alerts: Vec<Alert>,
    features: Vec<AnnotatedFeature>,
) -> Verdict {
    let failing: Vec<&Alert> = alerts
        .iter()
        .filter(|a| a.counts_toward_failure())
        .collect();
    let pass = failing.is_empty();
    let hidden_failure = !pass
        && failing.iter().all(|a| match a.feature {
            // sequence-scoped failures are always visible
            None => false,
            Some(idx) => !features.iter().any(|f| f.feature == idx),
        });
    Verdict {
        seq_name,
        model_id,
        pass,
        hidden_failure,
        chosen,
        alerts,
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::models::AlertKind;

    fn fatal_alert(feature: Option<usize>) -> Alert {
        Alert::new(AlertKind::MutStart { codon: "ATT".into() }, feature, true)
    }

    fn table_entry(feature: usize) -> AnnotatedFeature {
        AnnotatedFeature {
            feature,
            ftype: FeatureType::Cds,
            name: "orf1".into(),
            seq_coords: vec![SeqRange::forward(1, 30)],
        }
    }

    #[rstest]
    fn test_pass_with_no_fatal_alerts() {
        let alerts = vec![Alert::new(
            AlertKind::AmbigFeature5 { run: 6 },
            Some(0),
            false,
        )];
        let v = aggregate("s1".into(), "m".into(), HashMap::new(), alerts, vec![
            table_entry(0),
        ]);
        assert!(v.pass);
        assert!(!v.hidden_failure);
    }

    #[rstest]
    fn test_fail_with_visible_cause() {
        let v = aggregate(
            "s1".into(),
            "m".into(),
            HashMap::new(),
            vec![fatal_alert(Some(0))],
            vec![table_entry(0)],
        );
        assert!(!v.pass);
        assert!(!v.hidden_failure);
    }

    #[rstest]
    fn test_hidden_failure_when_feature_not_in_table() {
        let v = aggregate(
            "s1".into(),
            "m".into(),
            HashMap::new(),
            vec![fatal_alert(Some(3))],
            vec![table_entry(0)],
        );
        assert!(!v.pass);
        assert!(v.hidden_failure);
    }

    #[rstest]
    fn test_sequence_scoped_failure_is_visible() {
        let v = aggregate(
            "s1".into(),
            "m".into(),
            HashMap::new(),
            vec![fatal_alert(None)],
            vec![],
        );
        assert!(!v.pass);
        assert!(!v.hidden_failure);
    }

    #[rstest]
    fn test_demoted_alert_does_not_fail() {
        let mut alert = fatal_alert(Some(0));
        alert.demoted = true;
        let v = aggregate(
            "s1".into(),
            "m".into(),
            HashMap::new(),
            vec![alert],
            vec![table_entry(0)],
        );
        assert!(v.pass);
    }
}
