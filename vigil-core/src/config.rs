use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::alert::AlertCode;

///
/// Run-level engine configuration: numeric thresholds for the detectors plus
/// the alert fatality override list. Constructed once per run, immutable
/// afterwards, and threaded through every detector call by reference; never
/// a process-wide singleton.
///
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest tolerated insertion in the nucleotide alignment of a feature.
    pub max_nt_insert: u64,
    /// Longest tolerated deletion in the nucleotide alignment of a feature.
    pub max_nt_delete: u64,
    /// Longest tolerated insertion in a protein-based alignment.
    pub max_prot_insert: u64,
    /// Longest tolerated deletion in a protein-based alignment.
    pub max_prot_delete: u64,
    /// Minimum fraction of the sequence covered by hits on the winning strand.
    pub min_coverage: f64,
    /// Minimum model-span overlap for two hits to count as a duplicate region.
    pub min_dup_overlap: u64,
    /// Minimum score for an opposite-strand hit to raise an alert.
    pub min_opp_strand_score: f64,
    /// Mean confidence at or above which a frameshift region is high-confidence.
    pub frameshift_conf: f64,
    /// Per-position confidence below which a feature boundary is indefinite.
    pub boundary_conf: f64,
    /// Tolerated 5' distance between protein and nucleotide CDS endpoints.
    pub prot_tolerance_5p: u64,
    /// Tolerated 3' distance between protein and nucleotide CDS endpoints.
    pub prot_tolerance_3p: u64,
    /// Shortest reportable run of ambiguous nucleotides at a boundary.
    pub min_ambig_run: u64,
    /// Shortest reportable region without similarity to the model.
    pub min_lowsim_len: u64,
    pub start_codons: Vec<String>,
    pub stop_codons: Vec<String>,
    /// Alert code → forced fatality, applied over the default table.
    #[serde(default)]
    fatal_overrides: HashMap<AlertCode, bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_nt_insert: 27,
            max_nt_delete: 27,
            max_prot_insert: 27,
            max_prot_delete: 27,
            min_coverage: 0.9,
            min_dup_overlap: 20,
            min_opp_strand_score: 25.0,
            frameshift_conf: 0.8,
            boundary_conf: 0.8,
            prot_tolerance_5p: 5,
            prot_tolerance_3p: 8,
            min_ambig_run: 5,
            min_lowsim_len: 15,
            start_codons: vec!["ATG".to_string()],
            stop_codons: vec!["TAA".to_string(), "TAG".to_string(), "TGA".to_string()],
            fatal_overrides: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn set_fatal_override(&mut self, code: AlertCode, fatal: bool) {
        self.fatal_overrides.insert(code, fatal);
    }

    pub fn with_fatal_override(mut self, code: AlertCode, fatal: bool) -> Self {
        self.set_fatal_override(code, fatal);
        self
    }

    /// Fatality of a code under the default table plus this run's overrides.
    pub fn effective_fatal(&self, code: AlertCode) -> bool {
        self.fatal_overrides
            .get(&code)
            .copied()
            .unwrap_or_else(|| code.default_fatal())
    }

    pub fn is_start_codon(&self, codon: &str) -> bool {
        self.start_codons.iter().any(|c| c == codon)
    }

    pub fn is_stop_codon(&self, codon: &str) -> bool {
        self.stop_codons.iter().any(|c| c == codon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_default_fatality_follows_table() {
        let cfg = EngineConfig::default();
        assert!(cfg.effective_fatal(AlertCode::Mutstart));
        assert!(!cfg.effective_fatal(AlertCode::Ambgnt5f));
    }

    #[rstest]
    fn test_override_flips_fatality() {
        let cfg = EngineConfig::default()
            .with_fatal_override(AlertCode::Mutstart, false)
            .with_fatal_override(AlertCode::Ambgnt5f, true);
        assert!(!cfg.effective_fatal(AlertCode::Mutstart));
        assert!(cfg.effective_fatal(AlertCode::Ambgnt5f));
    }

    #[rstest]
    fn test_codon_sets() {
        let cfg = EngineConfig::default();
        assert!(cfg.is_start_codon("ATG"));
        assert!(!cfg.is_start_codon("ATT"));
        assert!(cfg.is_stop_codon("TAA"));
        assert!(!cfg.is_stop_codon("TAC"));
    }
}
