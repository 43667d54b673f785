use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ModelError;
use crate::models::range::SeqRange;

/// Whether an alert describes a single feature or the sequence as a whole.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AlertScope {
    Feature,
    Sequence,
}

impl Display for AlertScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertScope::Feature => write!(f, "feature"),
            AlertScope::Sequence => write!(f, "sequence"),
        }
    }
}

///
/// The closed set of alert codes. Every code is a stable fixed-width
/// identifier; the default fatality, scope and descriptions live here so the
/// catalog and the fatality table are derived from one place.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub enum AlertCode {
    // feature scope
    Fsthicnf,
    Fstlocnf,
    Fstukcnf,
    Mutstart,
    Mutendcd,
    Mutendns,
    Mutendex,
    Unexleng,
    Cdsstopn,
    Cdsstopp,
    Indf5gap,
    Indf5lcc,
    Indf5lcn,
    Indf5pst,
    Indf5plg,
    Indf3gap,
    Indf3lcc,
    Indf3lcn,
    Indf3pst,
    Indf3plg,
    Insertnn,
    Insertnp,
    Deletinn,
    Deletinp,
    Deletins,
    Deletinf,
    Ambgnt5f,
    Ambgnt3f,
    Pepadjcy,
    Peptrans,
    Lowsim5f,
    Lowsimif,
    Lowsim3f,
    Indfantn,
    // sequence scope
    Dupregin,
    Discontn,
    Indfstrn,
    Lowcovrg,
    Ambgnt5s,
    Ambgnt3s,
    Lowsim5s,
    Lowsimis,
    Lowsim3s,
    Intrnerr,
}

impl AlertCode {
    /// Every code, in catalog order.
    pub const ALL: [AlertCode; 44] = [
        AlertCode::Fsthicnf,
        AlertCode::Fstlocnf,
        AlertCode::Fstukcnf,
        AlertCode::Mutstart,
        AlertCode::Mutendcd,
        AlertCode::Mutendns,
        AlertCode::Mutendex,
        AlertCode::Unexleng,
        AlertCode::Cdsstopn,
        AlertCode::Cdsstopp,
        AlertCode::Indf5gap,
        AlertCode::Indf5lcc,
        AlertCode::Indf5lcn,
        AlertCode::Indf5pst,
        AlertCode::Indf5plg,
        AlertCode::Indf3gap,
        AlertCode::Indf3lcc,
        AlertCode::Indf3lcn,
        AlertCode::Indf3pst,
        AlertCode::Indf3plg,
        AlertCode::Insertnn,
        AlertCode::Insertnp,
        AlertCode::Deletinn,
        AlertCode::Deletinp,
        AlertCode::Deletins,
        AlertCode::Deletinf,
        AlertCode::Ambgnt5f,
        AlertCode::Ambgnt3f,
        AlertCode::Pepadjcy,
        AlertCode::Peptrans,
        AlertCode::Lowsim5f,
        AlertCode::Lowsimif,
        AlertCode::Lowsim3f,
        AlertCode::Indfantn,
        AlertCode::Dupregin,
        AlertCode::Discontn,
        AlertCode::Indfstrn,
        AlertCode::Lowcovrg,
        AlertCode::Ambgnt5s,
        AlertCode::Ambgnt3s,
        AlertCode::Lowsim5s,
        AlertCode::Lowsimis,
        AlertCode::Lowsim3s,
        AlertCode::Intrnerr,
    ];

    /// The stable fixed-width identifier.
    pub fn code(&self) -> &'static str {
        match self {
            AlertCode::Fsthicnf => "fsthicnf",
            AlertCode::Fstlocnf => "fstlocnf",
            AlertCode::Fstukcnf => "fstukcnf",
            AlertCode::Mutstart => "mutstart",
            AlertCode::Mutendcd => "mutendcd",
            AlertCode::Mutendns => "mutendns",
            AlertCode::Mutendex => "mutendex",
            AlertCode::Unexleng => "unexleng",
            AlertCode::Cdsstopn => "cdsstopn",
            AlertCode::Cdsstopp => "cdsstopp",
            AlertCode::Indf5gap => "indf5gap",
            AlertCode::Indf5lcc => "indf5lcc",
            AlertCode::Indf5lcn => "indf5lcn",
            AlertCode::Indf5pst => "indf5pst",
            AlertCode::Indf5plg => "indf5plg",
            AlertCode::Indf3gap => "indf3gap",
            AlertCode::Indf3lcc => "indf3lcc",
            AlertCode::Indf3lcn => "indf3lcn",
            AlertCode::Indf3pst => "indf3pst",
            AlertCode::Indf3plg => "indf3plg",
            AlertCode::Insertnn => "insertnn",
            AlertCode::Insertnp => "insertnp",
            AlertCode::Deletinn => "deletinn",
            AlertCode::Deletinp => "deletinp",
            AlertCode::Deletins => "deletins",
            AlertCode::Deletinf => "deletinf",
            AlertCode::Ambgnt5f => "ambgnt5f",
            AlertCode::Ambgnt3f => "ambgnt3f",
            AlertCode::Pepadjcy => "pepadjcy",
            AlertCode::Peptrans => "peptrans",
            AlertCode::Lowsim5f => "lowsim5f",
            AlertCode::Lowsimif => "lowsimif",
            AlertCode::Lowsim3f => "lowsim3f",
            AlertCode::Indfantn => "indfantn",
            AlertCode::Dupregin => "dupregin",
            AlertCode::Discontn => "discontn",
            AlertCode::Indfstrn => "indfstrn",
            AlertCode::Lowcovrg => "lowcovrg",
            AlertCode::Ambgnt5s => "ambgnt5s",
            AlertCode::Ambgnt3s => "ambgnt3s",
            AlertCode::Lowsim5s => "lowsim5s",
            AlertCode::Lowsimis => "lowsimis",
            AlertCode::Lowsim3s => "lowsim3s",
            AlertCode::Intrnerr => "intrnerr",
        }
    }

    pub fn scope(&self) -> AlertScope {
        match self {
            AlertCode::Dupregin
            | AlertCode::Discontn
            | AlertCode::Indfstrn
            | AlertCode::Lowcovrg
            | AlertCode::Ambgnt5s
            | AlertCode::Ambgnt3s
            | AlertCode::Lowsim5s
            | AlertCode::Lowsimis
            | AlertCode::Lowsim3s
            | AlertCode::Intrnerr => AlertScope::Sequence,
            _ => AlertScope::Feature,
        }
    }

    /// Default fatality; a run-level override table may flip any entry.
    pub fn default_fatal(&self) -> bool {
        !matches!(
            self,
            AlertCode::Indf5lcn
                | AlertCode::Indf5plg
                | AlertCode::Indf3lcn
                | AlertCode::Indf3plg
                | AlertCode::Ambgnt5f
                | AlertCode::Ambgnt3f
                | AlertCode::Lowsim5f
                | AlertCode::Lowsimif
                | AlertCode::Lowsim3f
                | AlertCode::Ambgnt5s
                | AlertCode::Ambgnt3s
                | AlertCode::Lowsim5s
                | AlertCode::Lowsimis
                | AlertCode::Lowsim3s
        )
    }

    pub fn short_desc(&self) -> &'static str {
        match self {
            AlertCode::Fsthicnf => "POSSIBLE_FRAMESHIFT_HIGH_CONF",
            AlertCode::Fstlocnf => "POSSIBLE_FRAMESHIFT_LOW_CONF",
            AlertCode::Fstukcnf => "POSSIBLE_FRAMESHIFT",
            AlertCode::Mutstart => "MUTATION_AT_START",
            AlertCode::Mutendcd => "MUTATION_AT_END",
            AlertCode::Mutendns => "MUTATION_AT_END",
            AlertCode::Mutendex => "MUTATION_AT_END",
            AlertCode::Unexleng => "UNEXPECTED_LENGTH",
            AlertCode::Cdsstopn => "CDS_HAS_STOP_CODON",
            AlertCode::Cdsstopp => "CDS_HAS_STOP_CODON",
            AlertCode::Indf5gap => "INDEFINITE_ANNOTATION_START",
            AlertCode::Indf5lcc => "INDEFINITE_ANNOTATION_START",
            AlertCode::Indf5lcn => "INDEFINITE_ANNOTATION_START",
            AlertCode::Indf5pst => "INDEFINITE_ANNOTATION_START",
            AlertCode::Indf5plg => "INDEFINITE_ANNOTATION_START",
            AlertCode::Indf3gap => "INDEFINITE_ANNOTATION_END",
            AlertCode::Indf3lcc => "INDEFINITE_ANNOTATION_END",
            AlertCode::Indf3lcn => "INDEFINITE_ANNOTATION_END",
            AlertCode::Indf3pst => "INDEFINITE_ANNOTATION_END",
            AlertCode::Indf3plg => "INDEFINITE_ANNOTATION_END",
            AlertCode::Insertnn => "INSERTION_OF_NT",
            AlertCode::Insertnp => "INSERTION_OF_NT",
            AlertCode::Deletinn => "DELETION_OF_NT",
            AlertCode::Deletinp => "DELETION_OF_NT",
            AlertCode::Deletins => "DELETION_OF_FEATURE_SECTION",
            AlertCode::Deletinf => "DELETION_OF_FEATURE",
            AlertCode::Ambgnt5f => "AMBIGUITY_AT_FEATURE_START",
            AlertCode::Ambgnt3f => "AMBIGUITY_AT_FEATURE_END",
            AlertCode::Pepadjcy => "PEPTIDE_ADJACENCY_PROBLEM",
            AlertCode::Peptrans => "PEPTIDE_TRANSLATION_PROBLEM",
            AlertCode::Lowsim5f => "LOW_FEATURE_SIMILARITY_START",
            AlertCode::Lowsimif => "LOW_FEATURE_SIMILARITY",
            AlertCode::Lowsim3f => "LOW_FEATURE_SIMILARITY_END",
            AlertCode::Indfantn => "INDEFINITE_ANNOTATION",
            AlertCode::Dupregin => "DUPLICATE_REGIONS",
            AlertCode::Discontn => "DISCONTINUOUS_SIMILARITY",
            AlertCode::Indfstrn => "INDEFINITE_STRAND",
            AlertCode::Lowcovrg => "LOW_COVERAGE",
            AlertCode::Ambgnt5s => "AMBIGUITY_AT_START",
            AlertCode::Ambgnt3s => "AMBIGUITY_AT_END",
            AlertCode::Lowsim5s => "LOW_SIMILARITY_START",
            AlertCode::Lowsimis => "LOW_SIMILARITY",
            AlertCode::Lowsim3s => "LOW_SIMILARITY_END",
            AlertCode::Intrnerr => "UNEXPECTED_ERROR",
        }
    }

    pub fn long_desc(&self) -> &'static str {
        match self {
            AlertCode::Fsthicnf => {
                "high confidence possible frameshift in CDS (frame not maintained consistently)"
            }
            AlertCode::Fstlocnf => {
                "low confidence possible frameshift in CDS (frame not maintained consistently)"
            }
            AlertCode::Fstukcnf => {
                "possible frameshift in CDS, alignment confidence unavailable"
            }
            AlertCode::Mutstart => "expected start codon could not be identified",
            AlertCode::Mutendcd => "expected stop codon could not be identified, predicted CDS stop by homology is invalid",
            AlertCode::Mutendns => "expected stop codon could not be identified, no in-frame stop codon exists 3' of predicted stop position",
            AlertCode::Mutendex => "expected stop codon could not be identified, first in-frame stop exists 3' of predicted stop position",
            AlertCode::Unexleng => "length of complete coding feature is not a multiple of 3",
            AlertCode::Cdsstopn => "in-frame stop codon exists 5' of stop position predicted by homology to model",
            AlertCode::Cdsstopp => "stop codon in protein-based alignment 5' of stop position predicted by homology to model",
            AlertCode::Indf5gap => "alignment to model is a gap at 5' boundary",
            AlertCode::Indf5lcc => "alignment to model has low confidence at 5' boundary for feature that is or matches a CDS",
            AlertCode::Indf5lcn => "alignment to model has low confidence at 5' boundary for feature that does not match a CDS",
            AlertCode::Indf5pst => "protein-based alignment does not extend close enough to nucleotide-based alignment 5' endpoint",
            AlertCode::Indf5plg => "protein-based alignment extends past nucleotide-based alignment 5' endpoint",
            AlertCode::Indf3gap => "alignment to model is a gap at 3' boundary",
            AlertCode::Indf3lcc => "alignment to model has low confidence at 3' boundary for feature that is or matches a CDS",
            AlertCode::Indf3lcn => "alignment to model has low confidence at 3' boundary for feature that does not match a CDS",
            AlertCode::Indf3pst => "protein-based alignment does not extend close enough to nucleotide-based alignment 3' endpoint",
            AlertCode::Indf3plg => "protein-based alignment extends past nucleotide-based alignment 3' endpoint",
            AlertCode::Insertnn => "too large of an insertion in nucleotide-based alignment of CDS feature",
            AlertCode::Insertnp => "too large of an insertion in protein-based alignment",
            AlertCode::Deletinn => "too large of a deletion in nucleotide-based alignment of CDS feature",
            AlertCode::Deletinp => "too large of a deletion in protein-based alignment",
            AlertCode::Deletins => "internal section of a feature is deleted in sequence",
            AlertCode::Deletinf => "feature is entirely deleted in sequence",
            AlertCode::Ambgnt5f => "ambiguous nucleotides at 5' boundary of feature",
            AlertCode::Ambgnt3f => "ambiguous nucleotides at 3' boundary of feature",
            AlertCode::Pepadjcy => "predictions of two mat_peptides expected to be adjacent are not adjacent",
            AlertCode::Peptrans => "mat_peptide may not be translated because its parent CDS has a problem",
            AlertCode::Lowsim5f => "region within annotated feature at 5' end of sequence lacks significant similarity",
            AlertCode::Lowsimif => "internal region within annotated feature lacks significant similarity",
            AlertCode::Lowsim3f => "region within annotated feature at 3' end of sequence lacks significant similarity",
            AlertCode::Indfantn => "feature coordinates could not be mapped from the model alignment",
            AlertCode::Dupregin => "similarity to a model region occurs more than once in the sequence",
            AlertCode::Discontn => "order of sequence hits disagrees with order of model hits",
            AlertCode::Indfstrn => "significant similarity detected on both strands",
            AlertCode::Lowcovrg => "low fraction of the sequence covered by similarity hits on the winning strand",
            AlertCode::Ambgnt5s => "ambiguous nucleotides at 5' end of sequence",
            AlertCode::Ambgnt3s => "ambiguous nucleotides at 3' end of sequence",
            AlertCode::Lowsim5s => "region at 5' end of sequence lacks significant similarity",
            AlertCode::Lowsimis => "internal region of sequence lacks significant similarity",
            AlertCode::Lowsim3s => "region at 3' end of sequence lacks significant similarity",
            AlertCode::Intrnerr => "unexpected internal failure while evaluating this sequence",
        }
    }
}

impl Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AlertCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertCode::ALL
            .iter()
            .find(|c| c.code() == s)
            .copied()
            .ok_or_else(|| ModelError::UnknownAlertCode(s.to_string()))
    }
}

impl Serialize for AlertCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for AlertCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

///
/// The structured evidence behind an alert: one variant per alert code, so the
/// detail string and the magnitude used by the exception filter are computed
/// in exactly one place, with exhaustiveness checking when codes are added.
///
#[derive(PartialEq, Debug, Clone)]
pub enum AlertKind {
    FrameshiftHighConf { shifted_frame: u8, dominant_frame: u8, conf: f64 },
    FrameshiftLowConf { shifted_frame: u8, dominant_frame: u8, conf: f64 },
    FrameshiftUnknownConf { shifted_frame: u8, dominant_frame: u8 },
    MutStart { codon: String },
    MutEndCodon { codon: String },
    MutEndNoStop { scanned_through: u64 },
    MutEndExtended { predicted: u64, first_stop: u64 },
    UnexpectedLength { len: u64 },
    EarlyStopNuc { predicted: u64, first_stop: u64, codon: String },
    EarlyStopProt { predicted: u64, first_stop: u64 },
    Boundary5Gap,
    Boundary5LowConfCoding { conf: f64, threshold: f64 },
    Boundary5LowConfNonCoding { conf: f64, threshold: f64 },
    ProteinShort5 { diff: u64, tolerance: u64 },
    ProteinLong5 { diff: u64, tolerance: u64 },
    Boundary3Gap,
    Boundary3LowConfCoding { conf: f64, threshold: f64 },
    Boundary3LowConfNonCoding { conf: f64, threshold: f64 },
    ProteinShort3 { diff: u64, tolerance: u64 },
    ProteinLong3 { diff: u64, tolerance: u64 },
    InsertionNuc { len: u64, max: u64 },
    InsertionProt { len: u64, max: u64 },
    DeletionNuc { len: u64, max: u64 },
    DeletionProt { len: u64, max: u64 },
    DeletionSection { segment: usize, len: u64 },
    DeletionFeature { len: u64 },
    AmbigFeature5 { run: u64 },
    AmbigFeature3 { run: u64 },
    PeptideAdjacency { gap: i64 },
    PeptideTranslation,
    LowSimFeature5 { len: u64 },
    LowSimFeatureInternal { len: u64 },
    LowSimFeature3 { len: u64 },
    IndefiniteAnnotation,
    DuplicateRegion { overlap: u64, min: u64 },
    DiscontinuousSimilarity { inversions: usize },
    IndefiniteStrand { score: f64, min: f64 },
    LowCoverage { fraction: f64, min: f64 },
    AmbigSeq5 { run: u64 },
    AmbigSeq3 { run: u64 },
    LowSimSeq5 { len: u64 },
    LowSimSeqInternal { len: u64 },
    LowSimSeq3 { len: u64 },
    InternalError { message: String },
}

impl AlertKind {
    pub fn code(&self) -> AlertCode {
        match self {
            AlertKind::FrameshiftHighConf { .. } => AlertCode::Fsthicnf,
            AlertKind::FrameshiftLowConf { .. } => AlertCode::Fstlocnf,
            AlertKind::FrameshiftUnknownConf { .. } => AlertCode::Fstukcnf,
            AlertKind::MutStart { .. } => AlertCode::Mutstart,
            AlertKind::MutEndCodon { .. } => AlertCode::Mutendcd,
            AlertKind::MutEndNoStop { .. } => AlertCode::Mutendns,
            AlertKind::MutEndExtended { .. } => AlertCode::Mutendex,
            AlertKind::UnexpectedLength { .. } => AlertCode::Unexleng,
            AlertKind::EarlyStopNuc { .. } => AlertCode::Cdsstopn,
            AlertKind::EarlyStopProt { .. } => AlertCode::Cdsstopp,
            AlertKind::Boundary5Gap => AlertCode::Indf5gap,
            AlertKind::Boundary5LowConfCoding { .. } => AlertCode::Indf5lcc,
            AlertKind::Boundary5LowConfNonCoding { .. } => AlertCode::Indf5lcn,
            AlertKind::ProteinShort5 { .. } => AlertCode::Indf5pst,
            AlertKind::ProteinLong5 { .. } => AlertCode::Indf5plg,
            AlertKind::Boundary3Gap => AlertCode::Indf3gap,
            AlertKind::Boundary3LowConfCoding { .. } => AlertCode::Indf3lcc,
            AlertKind::Boundary3LowConfNonCoding { .. } => AlertCode::Indf3lcn,
            AlertKind::ProteinShort3 { .. } => AlertCode::Indf3pst,
            AlertKind::ProteinLong3 { .. } => AlertCode::Indf3plg,
            AlertKind::InsertionNuc { .. } => AlertCode::Insertnn,
            AlertKind::InsertionProt { .. } => AlertCode::Insertnp,
            AlertKind::DeletionNuc { .. } => AlertCode::Deletinn,
            AlertKind::DeletionProt { .. } => AlertCode::Deletinp,
            AlertKind::DeletionSection { .. } => AlertCode::Deletins,
            AlertKind::DeletionFeature { .. } => AlertCode::Deletinf,
            AlertKind::AmbigFeature5 { .. } => AlertCode::Ambgnt5f,
            AlertKind::AmbigFeature3 { .. } => AlertCode::Ambgnt3f,
            AlertKind::PeptideAdjacency { .. } => AlertCode::Pepadjcy,
            AlertKind::PeptideTranslation => AlertCode::Peptrans,
            AlertKind::LowSimFeature5 { .. } => AlertCode::Lowsim5f,
            AlertKind::LowSimFeatureInternal { .. } => AlertCode::Lowsimif,
            AlertKind::LowSimFeature3 { .. } => AlertCode::Lowsim3f,
            AlertKind::IndefiniteAnnotation => AlertCode::Indfantn,
            AlertKind::DuplicateRegion { .. } => AlertCode::Dupregin,
            AlertKind::DiscontinuousSimilarity { .. } => AlertCode::Discontn,
            AlertKind::IndefiniteStrand { .. } => AlertCode::Indfstrn,
            AlertKind::LowCoverage { .. } => AlertCode::Lowcovrg,
            AlertKind::AmbigSeq5 { .. } => AlertCode::Ambgnt5s,
            AlertKind::AmbigSeq3 { .. } => AlertCode::Ambgnt3s,
            AlertKind::LowSimSeq5 { .. } => AlertCode::Lowsim5s,
            AlertKind::LowSimSeqInternal { .. } => AlertCode::Lowsimis,
            AlertKind::LowSimSeq3 { .. } => AlertCode::Lowsim3s,
            AlertKind::InternalError { .. } => AlertCode::Intrnerr,
        }
    }

    /// The quantitative evidence string carried on the alert record.
    pub fn detail(&self) -> String {
        match self {
            AlertKind::FrameshiftHighConf { shifted_frame, dominant_frame, conf } => {
                format!(
                    "frame {} vs dominant frame {}, avg confidence {:.3}",
                    shifted_frame, dominant_frame, conf
                )
            }
            AlertKind::FrameshiftLowConf { shifted_frame, dominant_frame, conf } => {
                format!(
                    "frame {} vs dominant frame {}, avg confidence {:.3}",
                    shifted_frame, dominant_frame, conf
                )
            }
            AlertKind::FrameshiftUnknownConf { shifted_frame, dominant_frame } => {
                format!(
                    "frame {} vs dominant frame {}, confidence unavailable",
                    shifted_frame, dominant_frame
                )
            }
            AlertKind::MutStart { codon } => format!("{} is not a valid start codon", codon),
            AlertKind::MutEndCodon { codon } => format!("{} is not a valid stop codon", codon),
            AlertKind::MutEndNoStop { scanned_through } => {
                format!("no in-frame stop codon through position {}", scanned_through)
            }
            AlertKind::MutEndExtended { predicted, first_stop } => {
                format!(
                    "first in-frame stop at {} is 3' of predicted stop at {}",
                    first_stop, predicted
                )
            }
            AlertKind::UnexpectedLength { len } => format!("{} is not a multiple of 3", len),
            AlertKind::EarlyStopNuc { predicted, first_stop, codon } => {
                format!(
                    "{} at {} is 5' of predicted stop at {}",
                    codon, first_stop, predicted
                )
            }
            AlertKind::EarlyStopProt { predicted, first_stop } => {
                format!(
                    "protein alignment stop at {} is 5' of predicted stop at {}",
                    first_stop, predicted
                )
            }
            AlertKind::Boundary5Gap => "5' boundary is a gap in the alignment".to_string(),
            AlertKind::Boundary5LowConfCoding { conf, threshold }
            | AlertKind::Boundary5LowConfNonCoding { conf, threshold } => {
                format!("{:.3}<{:.3}", conf, threshold)
            }
            AlertKind::ProteinShort5 { diff, tolerance }
            | AlertKind::ProteinShort3 { diff, tolerance }
            | AlertKind::ProteinLong5 { diff, tolerance }
            | AlertKind::ProteinLong3 { diff, tolerance } => {
                format!("{}>{}", diff, tolerance)
            }
            AlertKind::Boundary3Gap => "3' boundary is a gap in the alignment".to_string(),
            AlertKind::Boundary3LowConfCoding { conf, threshold }
            | AlertKind::Boundary3LowConfNonCoding { conf, threshold } => {
                format!("{:.3}<{:.3}", conf, threshold)
            }
            AlertKind::InsertionNuc { len, max }
            | AlertKind::InsertionProt { len, max }
            | AlertKind::DeletionNuc { len, max }
            | AlertKind::DeletionProt { len, max } => format!("{}>{}", len, max),
            AlertKind::DeletionSection { segment, len } => {
                format!("segment {} deleted ({} nt)", segment + 1, len)
            }
            AlertKind::DeletionFeature { len } => format!("{} nt deleted", len),
            AlertKind::AmbigFeature5 { run }
            | AlertKind::AmbigFeature3 { run }
            | AlertKind::AmbigSeq5 { run }
            | AlertKind::AmbigSeq3 { run } => format!("{} ambiguous nt", run),
            AlertKind::PeptideAdjacency { gap } => {
                if *gap >= 0 {
                    format!("{} nt inserted between adjacent peptides", gap)
                } else {
                    format!("{} nt overlap between adjacent peptides", -gap)
                }
            }
            AlertKind::PeptideTranslation => {
                "parent CDS has a fatal alert".to_string()
            }
            AlertKind::LowSimFeature5 { len }
            | AlertKind::LowSimFeatureInternal { len }
            | AlertKind::LowSimFeature3 { len }
            | AlertKind::LowSimSeq5 { len }
            | AlertKind::LowSimSeqInternal { len }
            | AlertKind::LowSimSeq3 { len } => format!("{} nt without similarity", len),
            AlertKind::IndefiniteAnnotation => {
                "feature is outside the aligned span".to_string()
            }
            AlertKind::DuplicateRegion { overlap, min } => format!("{}>={}", overlap, min),
            AlertKind::DiscontinuousSimilarity { inversions } => {
                format!("{} hit order inversions", inversions)
            }
            AlertKind::IndefiniteStrand { score, min } => format!("{:.1}>={:.1}", score, min),
            AlertKind::LowCoverage { fraction, min } => format!("{:.3}<{:.3}", fraction, min),
            AlertKind::InternalError { message } => message.clone(),
        }
    }

    /// Magnitude compared against an exception's declared maximum, for the
    /// kinds where a maximum makes sense.
    pub fn magnitude(&self) -> Option<u64> {
        match self {
            AlertKind::InsertionNuc { len, .. }
            | AlertKind::InsertionProt { len, .. }
            | AlertKind::DeletionNuc { len, .. }
            | AlertKind::DeletionProt { len, .. }
            | AlertKind::DeletionSection { len, .. }
            | AlertKind::DeletionFeature { len } => Some(*len),
            AlertKind::AmbigFeature5 { run }
            | AlertKind::AmbigFeature3 { run }
            | AlertKind::AmbigSeq5 { run }
            | AlertKind::AmbigSeq3 { run } => Some(*run),
            AlertKind::PeptideAdjacency { gap } => Some(gap.unsigned_abs()),
            AlertKind::LowSimFeature5 { len }
            | AlertKind::LowSimFeatureInternal { len }
            | AlertKind::LowSimFeature3 { len }
            | AlertKind::LowSimSeq5 { len }
            | AlertKind::LowSimSeqInternal { len }
            | AlertKind::LowSimSeq3 { len } => Some(*len),
            _ => None,
        }
    }
}

///
/// One structured finding about one sequence. Immutable once created: the
/// exception filter may drop it and the non-essential handler may demote it,
/// but its content never changes.
///
#[derive(PartialEq, Debug, Clone)]
pub struct Alert {
    pub kind: AlertKind,
    /// Effective fatality, resolved from the default table plus the run-level
    /// override list at creation time.
    pub fatal: bool,
    /// Set by the non-essential handler; a demoted alert keeps its fatal flag
    /// on the record but is excluded from pass/fail.
    pub demoted: bool,
    /// Feature index in the model, or None for sequence-scoped alerts.
    pub feature: Option<usize>,
    pub seq_coords: Vec<SeqRange>,
    pub model_coords: Vec<SeqRange>,
}

impl Alert {
    /// `fatal` is the effective fatality under the run's config, resolved by
    /// the caller via [`EngineConfig::effective_fatal`](crate::config::EngineConfig::effective_fatal).
    pub fn new(kind: AlertKind, feature: Option<usize>, fatal: bool) -> Self {
        Alert {
            kind,
            fatal,
            demoted: false,
            feature,
            seq_coords: vec![],
            model_coords: vec![],
        }
    }

    pub fn code(&self) -> AlertCode {
        self.kind.code()
    }

    pub fn detail(&self) -> String {
        self.kind.detail()
    }

    /// Whether this alert makes the sequence fail.
    pub fn counts_toward_failure(&self) -> bool {
        self.fatal && !self.demoted
    }

    pub fn with_seq_coords(mut self, coords: Vec<SeqRange>) -> Self {
        self.seq_coords = coords;
        self
    }

    pub fn with_model_coords(mut self, coords: Vec<SeqRange>) -> Self {
        self.model_coords = coords;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_codes_are_fixed_width() {
        for code in AlertCode::ALL {
            assert_eq!(code.code().len(), 8, "code {} is not 8 chars", code);
        }
    }

    #[rstest]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in AlertCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code);
        }
    }

    #[rstest]
    #[case("mutstart", AlertCode::Mutstart)]
    #[case("dupregin", AlertCode::Dupregin)]
    #[case("indf5pst", AlertCode::Indf5pst)]
    fn test_roundtrip_parse(#[case] text: &str, #[case] code: AlertCode) {
        assert_eq!(text.parse::<AlertCode>().unwrap(), code);
        assert_eq!(code.to_string(), text);
    }

    #[rstest]
    fn test_unknown_code_rejected() {
        assert!("nosuchcd".parse::<AlertCode>().is_err());
    }

    #[rstest]
    fn test_kind_maps_to_code_and_scope() {
        let kind = AlertKind::DuplicateRegion { overlap: 37, min: 20 };
        assert_eq!(kind.code(), AlertCode::Dupregin);
        assert_eq!(kind.code().scope(), AlertScope::Sequence);
        let kind = AlertKind::MutStart { codon: "ATT".into() };
        assert_eq!(kind.code().scope(), AlertScope::Feature);
    }

    #[rstest]
    fn test_detail_formats() {
        let kind = AlertKind::ProteinShort5 { diff: 9, tolerance: 5 };
        assert_eq!(kind.detail(), "9>5");
        let kind = AlertKind::MutStart { codon: "ATT".into() };
        assert_eq!(kind.detail(), "ATT is not a valid start codon");
        let kind = AlertKind::InsertionNuc { len: 28, max: 27 };
        assert_eq!(kind.detail(), "28>27");
        assert_eq!(kind.magnitude(), Some(28));
    }

    #[rstest]
    fn test_magnitude_absent_for_non_indel_kinds() {
        assert_eq!(AlertKind::Boundary5Gap.magnitude(), None);
        assert_eq!(
            AlertKind::MutStart { codon: "ATT".into() }.magnitude(),
            None
        );
    }
}
