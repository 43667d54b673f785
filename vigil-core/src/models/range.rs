use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Strand of a coordinate range, `+` or `-`.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    pub fn opposite(&self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            _ => Err(ModelError::StrandParseError(s.to_string())),
        }
    }
}

///
/// A 1-based inclusive coordinate range with strand. Minus-strand ranges run
/// descending, i.e. `start >= end`.
///
/// Textual form is `start..end:strand`, e.g. `21..1022:+` or `1022..21:-`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeqRange {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl SeqRange {
    pub fn new(start: u64, end: u64, strand: Strand) -> Self {
        SeqRange { start, end, strand }
    }

    /// Ascending plus-strand range.
    pub fn forward(start: u64, end: u64) -> Self {
        SeqRange::new(start, end, Strand::Plus)
    }

    /// Descending minus-strand range over the same positions.
    pub fn reverse(start: u64, end: u64) -> Self {
        SeqRange::new(start, end, Strand::Minus)
    }

    /// Lowest position covered, regardless of orientation.
    pub fn lo(&self) -> u64 {
        self.start.min(self.end)
    }

    /// Highest position covered, regardless of orientation.
    pub fn hi(&self) -> u64 {
        self.start.max(self.end)
    }

    /// Number of positions covered.
    pub fn len(&self) -> u64 {
        self.hi() - self.lo() + 1
    }

    pub fn is_empty(&self) -> bool {
        false // a range always covers at least one position
    }

    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.lo() && pos <= self.hi()
    }

    /// Whether `other` lies entirely within this range, ignoring strand.
    pub fn encloses(&self, other: &SeqRange) -> bool {
        other.lo() >= self.lo() && other.hi() <= self.hi()
    }

    /// Number of positions shared with `other`, ignoring strand.
    pub fn intersect(&self, other: &SeqRange) -> u64 {
        let lo = self.lo().max(other.lo());
        let hi = self.hi().min(other.hi());
        if lo > hi { 0 } else { hi - lo + 1 }
    }

    /// The shared sub-range, ignoring strand, expressed on the plus strand.
    pub fn overlap_range(&self, other: &SeqRange) -> Option<SeqRange> {
        let lo = self.lo().max(other.lo());
        let hi = self.hi().min(other.hi());
        if lo > hi {
            None
        } else {
            Some(SeqRange::forward(lo, hi))
        }
    }

    /// The 5' position of the range in its own orientation.
    pub fn five_prime(&self) -> u64 {
        self.start
    }

    /// The 3' position of the range in its own orientation.
    pub fn three_prime(&self) -> u64 {
        self.end
    }
}

impl Display for SeqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}:{}", self.start, self.end, self.strand)
    }
}

impl FromStr for SeqRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ModelError::RangeParseError(s.to_string());
        let (coords, strand) = s.rsplit_once(':').ok_or_else(err)?;
        let (start, end) = coords.split_once("..").ok_or_else(err)?;
        let start: u64 = start.parse().map_err(|_| err())?;
        let end: u64 = end.parse().map_err(|_| err())?;
        let strand: Strand = strand.parse()?;
        match strand {
            Strand::Plus if start > end => Err(err()),
            Strand::Minus if start < end => Err(err()),
            _ => Ok(SeqRange { start, end, strand }),
        }
    }
}

/// Comma-joined textual form of a multi-segment span, `-` when empty.
pub fn format_ranges(ranges: &[SeqRange]) -> String {
    if ranges.is_empty() {
        return "-".to_string();
    }
    ranges
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Total number of positions covered by a multi-segment span.
pub fn ranges_len(ranges: &[SeqRange]) -> u64 {
    ranges.iter().map(|r| r.len()).sum()
}

/// Parse a comma-joined multi-segment span; `-` parses to an empty list.
pub fn parse_ranges(s: &str) -> Result<Vec<SeqRange>, ModelError> {
    if s == "-" {
        return Ok(vec![]);
    }
    s.split(',').map(|part| part.parse()).collect()
}
