//! Model-declared alert exceptions: a feature may tolerate a specific alert
//! kind inside a bounded model window up to a declared magnitude.

use vigil_core::models::{Alert, Model};

/// Whether a declared exception suppresses this alert: the kind matches, the
/// alert's model coordinates fall inside the window, and its magnitude does
/// not exceed the declared maximum.
fn suppressed(model: &Model, alert: &Alert) -> bool {
    let Some(idx) = alert.feature else {
        return false;
    };
    let Some(magnitude) = alert.kind.magnitude() else {
        return false;
    };
    if alert.model_coords.is_empty() {
        return false;
    }
    model.features[idx].exceptions_for(alert.code()).any(|exc| {
        magnitude <= exc.max_magnitude
            && alert
                .model_coords
                .iter()
                .all(|r| r.lo() >= exc.window.lo() && r.hi() <= exc.window.hi())
    })
}

/// Drop every alert a declared exception covers; all others pass through
/// unchanged, in order.
pub fn apply(model: &Model, alerts: Vec<Alert>) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|a| !suppressed(model, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::models::{
        AlertCode, AlertException, AlertKind, Feature, FeatureType, SeqRange,
    };

    fn model_with_exception(window: SeqRange, max: u64) -> Model {
        let mut f = Feature::new(FeatureType::Cds, vec![SeqRange::forward(1, 300)]);
        f.exceptions.push(AlertException {
            code: AlertCode::Deletinn,
            window,
            max_magnitude: max,
        });
        Model::new("m".into(), 400, vec![f]).unwrap()
    }

    fn deletion_alert(len: u64, model_lo: u64, model_hi: u64) -> Alert {
        Alert::new(AlertKind::DeletionNuc { len, max: 27 }, Some(0), true)
            .with_model_coords(vec![SeqRange::forward(model_lo, model_hi)])
    }

    #[rstest]
    fn test_magnitude_at_maximum_suppressed() {
        let model = model_with_exception(SeqRange::forward(100, 200), 72);
        let out = apply(&model, vec![deletion_alert(72, 110, 181)]);
        assert_eq!(out, vec![]);
    }

    #[rstest]
    fn test_magnitude_one_over_maximum_survives() {
        let model = model_with_exception(SeqRange::forward(100, 200), 72);
        let out = apply(&model, vec![deletion_alert(73, 110, 182)]);
        assert_eq!(out.len(), 1);
    }

    #[rstest]
    fn test_one_position_outside_window_survives() {
        let model = model_with_exception(SeqRange::forward(100, 200), 72);
        let out = apply(&model, vec![deletion_alert(72, 130, 201)]);
        assert_eq!(out.len(), 1);
    }

    #[rstest]
    fn test_kind_mismatch_survives() {
        let model = model_with_exception(SeqRange::forward(100, 200), 72);
        let alert = Alert::new(AlertKind::InsertionNuc { len: 40, max: 27 }, Some(0), true)
            .with_model_coords(vec![SeqRange::forward(110, 110)]);
        let out = apply(&model, vec![alert]);
        assert_eq!(out.len(), 1);
    }

    #[rstest]
    fn test_sequence_scoped_alert_untouched() {
        let model = model_with_exception(SeqRange::forward(100, 200), 72);
        let alert = Alert::new(
            AlertKind::DuplicateRegion {
                overlap: 37,
                min: 20,
            },
            None,
            true,
        );
        let out = apply(&model, vec![alert]);
        assert_eq!(out.len(), 1);
    }
}
