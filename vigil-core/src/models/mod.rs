pub mod alert;
pub mod alignment;
pub mod bundle;
pub mod feature;
pub mod hit;
pub mod model;
pub mod protein;
pub mod range;

// re-export for cleaner imports
pub use self::alert::{Alert, AlertCode, AlertKind, AlertScope};
pub use self::alignment::{Alignment, AlignmentError, IndelEvent, ModelCol, SeqCol};
pub use self::bundle::SequenceBundle;
pub use self::feature::{AlertException, Feature, FeatureType};
pub use self::hit::Hit;
pub use self::model::{FeatureDefinition, Model};
pub use self::protein::{ProteinAlignment, ProteinIndel};
pub use self::range::{SeqRange, Strand, format_ranges, parse_ranges, ranges_len};
