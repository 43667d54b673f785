//! Non-essential feature handling: fatal alerts on a feature flagged
//! non-essential are demoted for aggregation, keeping the fatal flag on the
//! record, and the feature's reported type is downgraded to `misc_feature`.

use vigil_core::models::{Alert, FeatureType, Model};

/// Mark every fatal alert on a non-essential feature as demoted. The alert
/// keeps its content and its fatal flag; only pass/fail stops counting it.
pub fn demote(model: &Model, alerts: &mut [Alert]) {
    for alert in alerts.iter_mut() {
        if let Some(idx) = alert.feature {
            if alert.fatal && model.features[idx].non_essential {
                alert.demoted = true;
            }
        }
    }
}

/// Reported output type for a feature, accounting for the downgrade of a
/// non-essential feature that carries any demoted alert.
pub fn output_type(model: &Model, feature_idx: usize, alerts: &[Alert]) -> FeatureType {
    let feature = &model.features[feature_idx];
    let demoted_here = alerts
        .iter()
        .any(|a| a.feature == Some(feature_idx) && a.demoted);
    if feature.non_essential && demoted_here {
        FeatureType::Misc
    } else {
        feature.ftype
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::models::{AlertKind, Feature, SeqRange};

    fn model(non_essential: bool) -> Model {
        let mut f = Feature::new(FeatureType::Cds, vec![SeqRange::forward(1, 30)]);
        f.non_essential = non_essential;
        Model::new("m".into(), 100, vec![f]).unwrap()
    }

    fn fatal_alert() -> Alert {
        Alert::new(AlertKind::MutStart { codon: "ATT".into() }, Some(0), true)
    }

    #[rstest]
    fn test_fatal_alert_demoted_but_flag_kept() {
        let model = model(true);
        let mut alerts = vec![fatal_alert()];
        demote(&model, &mut alerts);
        assert!(alerts[0].fatal);
        assert!(alerts[0].demoted);
        assert!(!alerts[0].counts_toward_failure());
        assert_eq!(output_type(&model, 0, &alerts), FeatureType::Misc);
    }

    #[rstest]
    fn test_essential_feature_untouched() {
        let model = model(false);
        let mut alerts = vec![fatal_alert()];
        demote(&model, &mut alerts);
        assert!(!alerts[0].demoted);
        assert!(alerts[0].counts_toward_failure());
        assert_eq!(output_type(&model, 0, &alerts), FeatureType::Cds);
    }

    #[rstest]
    fn test_clean_nonessential_keeps_type() {
        let model = model(true);
        let alerts: Vec<Alert> = vec![];
        assert_eq!(output_type(&model, 0, &alerts), FeatureType::Cds);
    }
}
