use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use log::info;
use serde::Deserialize;

use vigil_core::EngineConfig;
use vigil_core::models::{
    Alignment, AlertCode, Hit, Model, ProteinAlignment, SeqCol, SequenceBundle,
};
use vigil_engine::{Engine, report};

/// On-disk form of one sequence bundle. The alignment is carried as raw
/// per-position columns; the derived views are rebuilt on load.
#[derive(Deserialize)]
struct BundleSpec {
    name: String,
    seq: String,
    #[serde(default)]
    alignment: Option<Vec<SeqCol>>,
    #[serde(default)]
    proteins: HashMap<usize, Vec<ProteinAlignment>>,
    #[serde(default)]
    hits: Vec<Hit>,
}

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let model_path = matches
        .get_one::<String>("model")
        .expect("--model is required");
    let bundles_path = matches
        .get_one::<String>("bundles")
        .expect("--bundles is required");

    let model = load_model(model_path)?;
    let bundles = load_bundles(bundles_path, &model)?;
    let config = load_config(matches)?;

    info!(
        "evaluating {} sequence(s) against model {} ({} feature(s))",
        bundles.len(),
        model.id,
        model.features.len()
    );

    let engine = Engine::new(model, config);
    let verdicts = engine.evaluate_all(&bundles);

    let mut lines = vec![];
    for verdict in &verdicts {
        let status = if verdict.pass {
            "pass"
        } else if verdict.hidden_failure {
            "fail (hidden cause)"
        } else {
            "fail"
        };
        info!(
            "{}: {}, {} alert(s), {} feature(s) annotated",
            verdict.seq_name,
            status,
            verdict.alerts.len(),
            verdict.features.len()
        );
        lines.extend(report::alert_records(verdict, engine.model()));
    }
    write_lines(&lines, matches.get_one::<String>("output"))?;

    if let Some(catalog_path) = matches.get_one::<String>("catalog") {
        let catalog = report::catalog_records(&verdicts);
        fs::write(catalog_path, catalog.join("\n") + "\n")
            .with_context(|| format!("Failed to write catalog to {}", catalog_path))?;
    }

    let failed = verdicts.iter().filter(|v| !v.pass).count();
    info!("{} of {} sequence(s) failed", failed, verdicts.len());
    Ok(())
}

fn load_model(path: &str) -> Result<Model> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file {}", path))?;
    let raw: Model = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse model file {}", path))?;
    // re-run declaration validation; serde only checks shape
    Model::new(raw.id, raw.length, raw.features)
        .map_err(|e| anyhow!("Invalid model declaration in {}: {}", path, e))
}

fn load_bundles(path: &str, model: &Model) -> Result<Vec<SequenceBundle>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle file {}", path))?;
    let specs: Vec<BundleSpec> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse bundle file {}", path))?;
    specs
        .into_iter()
        .map(|spec| {
            let mut bundle = SequenceBundle::new(spec.name.clone(), spec.seq.into_bytes());
            if let Some(cols) = spec.alignment {
                bundle.alignment = Some(
                    Alignment::new(model.length, cols)
                        .map_err(|e| anyhow!("Invalid alignment for {}: {}", spec.name, e))?,
                );
            }
            bundle.proteins = spec.proteins;
            bundle.hits = spec.hits;
            Ok(bundle)
        })
        .collect()
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path))?
        }
        None => EngineConfig::default(),
    };
    if let Some(overrides) = matches.get_many::<String>("fatal") {
        for spec in overrides {
            let (code, flag) = parse_fatal_override(spec)?;
            config.set_fatal_override(code, flag);
        }
    }
    Ok(config)
}

/// Parse one `code=yes|no` fatality override.
fn parse_fatal_override(spec: &str) -> Result<(AlertCode, bool)> {
    let (code, flag) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("Override must be code=yes|no, got {:?}", spec))?;
    let code: AlertCode = code
        .parse()
        .map_err(|e| anyhow!("Bad override {:?}: {}", spec, e))?;
    let flag = match flag {
        "yes" => true,
        "no" => false,
        other => return Err(anyhow!("Override value must be yes or no, got {:?}", other)),
    };
    Ok((code, flag))
}

fn write_lines(lines: &[String], output: Option<&String>) -> Result<()> {
    match output {
        Some(path) => {
            let mut body = lines.join("\n");
            if !body.is_empty() {
                body.push('\n');
            }
            fs::write(Path::new(path), body)
                .with_context(|| format!("Failed to write report to {}", path))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for line in lines {
                writeln!(handle, "{}", line)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_parse_fatal_override() {
        let (code, flag) = parse_fatal_override("mutstart=no").unwrap();
        assert_eq!(code, AlertCode::Mutstart);
        assert!(!flag);
        assert!(parse_fatal_override("mutstart").is_err());
        assert!(parse_fatal_override("nonsense=yes").is_err());
        assert!(parse_fatal_override("mutstart=maybe").is_err());
    }

    #[test]
    fn test_load_model_validates_declarations() {
        let good = write_temp(
            r#"{"id":"toy","length":9,"features":[
                {"ftype":"CDS","coords":[{"start":1,"end":9,"strand":"+"}],
                 "parent":null,"product":null,"gene":null,"alternative_set":null,
                 "follows":null,"non_essential":false,"exceptions":[]}]}"#,
        );
        let model = load_model(good.path().to_str().unwrap()).unwrap();
        assert_eq!(model.id, "toy");
        assert_eq!(model.features.len(), 1);

        // segment beyond the declared model length must abort loading
        let bad = write_temp(
            r#"{"id":"toy","length":5,"features":[
                {"ftype":"CDS","coords":[{"start":1,"end":9,"strand":"+"}],
                 "parent":null,"product":null,"gene":null,"alternative_set":null,
                 "follows":null,"non_essential":false,"exceptions":[]}]}"#,
        );
        assert!(load_model(bad.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_load_bundles_rebuilds_alignment() {
        let model = Model::new("toy".into(), 3, vec![]).unwrap();
        let f = write_temp(
            r#"[{"name":"s1","seq":"ATG",
                "alignment":[
                    {"Aligned":{"model_pos":1,"conf":0.9}},
                    {"Aligned":{"model_pos":2,"conf":0.9}},
                    {"Aligned":{"model_pos":3,"conf":0.9}}]}]"#,
        );
        let bundles = load_bundles(f.path().to_str().unwrap(), &model).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].name, "s1");
        assert!(bundles[0].alignment.is_some());
        assert!(bundles[0].hits.is_empty());
    }
}
