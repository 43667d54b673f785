//! Tab-separated report records: one line per alert instance and one
//! catalog line per alert code, with a stable field order.

use std::collections::HashSet;

use vigil_core::models::{Alert, AlertCode, Model, format_ranges, ranges_len};

use crate::verdict::Verdict;

/// One alert instance line: sequence name, model name, feature type, feature
/// name, feature index, code, fatal `yes`/`no`, short description, sequence
/// coordinates with their total length, model coordinates with theirs, and
/// the free-text detail.
pub fn alert_record(verdict: &Verdict, alert: &Alert, model: &Model) -> String {
    let (ftype, fname, fidx) = match alert.feature {
        Some(idx) => {
            let feature = &model.features[idx];
            (
                feature.ftype.to_string(),
                feature.name(),
                idx.to_string(),
            )
        }
        None => ("-".into(), "-".into(), "-".into()),
    };
    let fatal = if alert.fatal { "yes" } else { "no" };
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        verdict.seq_name,
        verdict.model_id,
        ftype,
        fname,
        fidx,
        alert.code(),
        fatal,
        alert.code().short_desc(),
        format_ranges(&alert.seq_coords),
        ranges_len(&alert.seq_coords),
        format_ranges(&alert.model_coords),
        ranges_len(&alert.model_coords),
        alert.detail(),
    )
}

/// All alert lines for one verdict, in detection order.
pub fn alert_records(verdict: &Verdict, model: &Model) -> Vec<String> {
    verdict
        .alerts
        .iter()
        .map(|a| alert_record(verdict, a, model))
        .collect()
}

/// One catalog line per alert code: index, code, default fatality, short
/// description, scope, instance count, distinct-sequence count, long
/// description.
pub fn catalog_records(verdicts: &[Verdict]) -> Vec<String> {
    AlertCode::ALL
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let mut instances = 0usize;
            let mut seqs: HashSet<&str> = HashSet::new();
            for v in verdicts {
                for a in &v.alerts {
                    if a.code() == *code {
                        instances += 1;
                        seqs.insert(v.seq_name.as_str());
                    }
                }
            }
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                i + 1,
                code,
                if code.default_fatal() { "yes" } else { "no" },
                code.short_desc(),
                code.scope(),
                instances,
                seqs.len(),
                code.long_desc(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use vigil_core::models::{AlertKind, Feature, FeatureType, SeqRange};

    fn toy_model() -> Model {
        let mut f = Feature::new(FeatureType::Cds, vec![SeqRange::forward(21, 1022)]);
        f.product = Some("polyprotein".into());
        Model::new("toy".into(), 1200, vec![f]).unwrap()
    }

    fn toy_verdict(alerts: Vec<Alert>) -> Verdict {
        Verdict {
            seq_name: "s1".into(),
            model_id: "toy".into(),
            pass: false,
            hidden_failure: false,
            chosen: HashMap::new(),
            alerts,
            features: vec![],
        }
    }

    #[rstest]
    fn test_feature_alert_record_fields() {
        let model = toy_model();
        let alert = Alert::new(AlertKind::MutStart { codon: "ATT".into() }, Some(0), true)
            .with_seq_coords(vec![SeqRange::forward(21, 23)]);
        let verdict = toy_verdict(vec![alert]);
        let line = alert_record(&verdict, &verdict.alerts[0], &model);
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(
            fields,
            vec![
                "s1",
                "toy",
                "CDS",
                "polyprotein",
                "0",
                "mutstart",
                "yes",
                "MUTATION_AT_START",
                "21..23:+",
                "3",
                "-",
                "0",
                "ATT is not a valid start codon",
            ]
        );
    }

    #[rstest]
    fn test_sequence_alert_record_uses_placeholders() {
        let model = toy_model();
        let alert = Alert::new(
            AlertKind::DuplicateRegion {
                overlap: 37,
                min: 20,
            },
            None,
            true,
        )
        .with_model_coords(vec![SeqRange::forward(64, 100)]);
        let verdict = toy_verdict(vec![alert]);
        let line = alert_record(&verdict, &verdict.alerts[0], &model);
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[2], "-");
        assert_eq!(fields[3], "-");
        assert_eq!(fields[4], "-");
        assert_eq!(fields[5], "dupregin");
        assert_eq!(fields[10], "64..100:+");
        assert_eq!(fields[11], "37");
    }

    #[rstest]
    fn test_catalog_counts_instances_and_sequences() {
        let a = Alert::new(AlertKind::MutStart { codon: "ATT".into() }, Some(0), true);
        let verdicts = vec![
            toy_verdict(vec![a.clone(), a.clone()]),
            {
                let mut v = toy_verdict(vec![a.clone()]);
                v.seq_name = "s2".into();
                v
            },
            {
                let mut v = toy_verdict(vec![]);
                v.seq_name = "s3".into();
                v
            },
        ];
        let lines = catalog_records(&verdicts);
        assert_eq!(lines.len(), AlertCode::ALL.len());
        let mutstart = lines
            .iter()
            .find(|l| l.contains("\tmutstart\t"))
            .expect("mutstart line");
        let fields: Vec<&str> = mutstart.split('\t').collect();
        assert_eq!(fields[5], "3");
        assert_eq!(fields[6], "2");
    }
}
