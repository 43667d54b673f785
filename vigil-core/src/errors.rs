use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Can't parse coordinate range: {0}")]
    RangeParseError(String),

    #[error("Can't parse strand: {0}")]
    StrandParseError(String),

    #[error("Unknown alert code: {0}")]
    UnknownAlertCode(String),

    #[error("Unknown feature type: {0}")]
    UnknownFeatureType(String),

    #[error("Feature {0} has no coordinate segments")]
    EmptyFeature(usize),

    #[error("Feature {feature} segment {segment} is outside model length {length}: {range}")]
    SegmentOutOfBounds {
        feature: usize,
        segment: usize,
        range: String,
        length: u64,
    },

    #[error("Feature {feature} segment {segment} start/end disagree with its strand: {range}")]
    SegmentStrandMismatch {
        feature: usize,
        segment: usize,
        range: String,
    },

    #[error("Feature {0} references non-existent parent feature {1}")]
    UnknownParent(usize, usize),

    #[error("Feature {0} references itself as parent")]
    SelfParent(usize),

    #[error("Alternative set '{0}' has only one member (feature {1})")]
    LonelyAlternative(String, usize),

    #[error("Feature {0} follows unknown alternative set '{1}'")]
    UnknownFollowTarget(usize, String),

    #[error("Feature {0} both follows a set and belongs to one")]
    FollowerInAlternativeSet(usize),

    #[error("Feature {feature} declares an exception window outside model length {length}: {window}")]
    ExceptionWindowOutOfBounds {
        feature: usize,
        window: String,
        length: u64,
    },

    #[error("Feature {0} declares an exception for sequence-scoped alert code {1}")]
    ExceptionScopeMismatch(usize, String),
}
