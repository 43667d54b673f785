use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::models::alert::AlertCode;
use crate::models::range::{SeqRange, Strand};

/// Type of an annotated feature.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "CDS")]
    Cds,
    #[serde(rename = "gene")]
    Gene,
    #[serde(rename = "mat_peptide")]
    MatPeptide,
    #[serde(rename = "ncRNA")]
    NcRna,
    /// Output downgrade target for non-essential features with problems.
    #[serde(rename = "misc_feature")]
    Misc,
}

impl Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeatureType::Cds => "CDS",
            FeatureType::Gene => "gene",
            FeatureType::MatPeptide => "mat_peptide",
            FeatureType::NcRna => "ncRNA",
            FeatureType::Misc => "misc_feature",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for FeatureType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CDS" => Ok(FeatureType::Cds),
            "gene" => Ok(FeatureType::Gene),
            "mat_peptide" => Ok(FeatureType::MatPeptide),
            "ncRNA" => Ok(FeatureType::NcRna),
            "misc_feature" => Ok(FeatureType::Misc),
            _ => Err(ModelError::UnknownFeatureType(s.to_string())),
        }
    }
}

/// A model-declared suppression of one alert kind inside a model window, up
/// to a maximum magnitude. Textual declaration form is
/// `kind:start..end:strand:max_magnitude`.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AlertException {
    pub code: AlertCode,
    pub window: SeqRange,
    pub max_magnitude: u64,
}

impl FromStr for AlertException {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ModelError::RangeParseError(s.to_string());
        // kind:start..end:strand:max
        let (code, rest) = s.split_once(':').ok_or_else(err)?;
        let (window, max) = rest.rsplit_once(':').ok_or_else(err)?;
        Ok(AlertException {
            code: code.parse()?,
            window: window.parse()?,
            max_magnitude: max.parse().map_err(|_| err())?,
        })
    }
}

///
/// One feature declared on a model: type, model-space coordinate segments in
/// 5'→3' order, and the optional parent / alternative-set / exception
/// metadata the engine consumes.
///
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub ftype: FeatureType,
    /// Model-space segments, 5'→3' along the feature strand.
    pub coords: Vec<SeqRange>,
    /// Index of the parent feature (e.g. mat_peptide → parent CDS).
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub gene: Option<String>,
    /// Features sharing an id compete; exactly one member is selected per
    /// sequence, members ordered by declaration.
    #[serde(default)]
    pub alternative_set: Option<String>,
    /// Alternative-set id whose chosen member this feature's coordinates
    /// track (gene follows CDS); such a feature is never scored itself.
    #[serde(default)]
    pub follows: Option<String>,
    #[serde(default)]
    pub non_essential: bool,
    #[serde(default)]
    pub exceptions: Vec<AlertException>,
}

impl Feature {
    pub fn new(ftype: FeatureType, coords: Vec<SeqRange>) -> Self {
        Feature {
            ftype,
            coords,
            parent: None,
            product: None,
            gene: None,
            alternative_set: None,
            follows: None,
            non_essential: false,
            exceptions: vec![],
        }
    }

    /// Display name: product, else gene label, else the type label.
    pub fn name(&self) -> String {
        self.product
            .clone()
            .or_else(|| self.gene.clone())
            .unwrap_or_else(|| self.ftype.to_string())
    }

    /// Strand of the feature; segments of one feature share a strand.
    pub fn strand(&self) -> Strand {
        self.coords
            .first()
            .map(|r| r.strand)
            .unwrap_or(Strand::Plus)
    }

    /// Lowest and highest model position covered by any segment.
    pub fn model_span(&self) -> Option<(u64, u64)> {
        let lo = self.coords.iter().map(|r| r.lo()).min()?;
        let hi = self.coords.iter().map(|r| r.hi()).max()?;
        Some((lo, hi))
    }

    /// Total declared length across segments.
    pub fn length(&self) -> u64 {
        self.coords.iter().map(|r| r.len()).sum()
    }

    pub fn is_cds(&self) -> bool {
        self.ftype == FeatureType::Cds
    }

    pub fn is_mat_peptide(&self) -> bool {
        self.ftype == FeatureType::MatPeptide
    }

    /// Exceptions declared for a given alert code.
    pub fn exceptions_for(&self, code: AlertCode) -> impl Iterator<Item = &AlertException> {
        self.exceptions.iter().filter(move |e| e.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_feature_name_precedence() {
        let mut f = Feature::new(FeatureType::Cds, vec![SeqRange::forward(1, 9)]);
        assert_eq!(f.name(), "CDS");
        f.gene = Some("N".into());
        assert_eq!(f.name(), "N");
        f.product = Some("nucleocapsid protein".into());
        assert_eq!(f.name(), "nucleocapsid protein");
    }

    #[rstest]
    fn test_model_span_multi_segment() {
        let f = Feature::new(
            FeatureType::Cds,
            vec![SeqRange::forward(10, 20), SeqRange::forward(30, 41)],
        );
        assert_eq!(f.model_span(), Some((10, 41)));
        assert_eq!(f.length(), 23);
    }

    #[rstest]
    #[case("deletinn:100..200:+:72", AlertCode::Deletinn, 100, 200, 72)]
    #[case("insertnn:5..5:+:3", AlertCode::Insertnn, 5, 5, 3)]
    fn test_parse_exception(
        #[case] text: &str,
        #[case] code: AlertCode,
        #[case] start: u64,
        #[case] end: u64,
        #[case] max: u64,
    ) {
        let e: AlertException = text.parse().unwrap();
        assert_eq!(e.code, code);
        assert_eq!(e.window, SeqRange::forward(start, end));
        assert_eq!(e.max_magnitude, max);
    }

    #[rstest]
    fn test_parse_exception_rejects_garbage() {
        assert!("deletinn:100..200:+".parse::<AlertException>().is_err());
        assert!("nosuchcd:100..200:+:5".parse::<AlertException>().is_err());
    }
}
