//! Small nucleotide helpers shared by the boundary resolver and detectors.

use crate::models::range::Strand;

/// Complement of a nucleotide, uppercased; ambiguity codes map to `N`.
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// Whether a residue is an ambiguity code (anything other than ACGT).
pub fn is_ambiguous(base: u8) -> bool {
    !matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// The codon whose first base sits at 1-based `pos`, read in the direction
/// of `strand` (minus-strand codons are reverse-complemented). None if the
/// codon runs off either end of the sequence.
pub fn codon_at(seq: &[u8], pos: u64, strand: Strand) -> Option<String> {
    let n = seq.len() as u64;
    if pos < 1 || pos > n {
        return None;
    }
    let bases: [u8; 3] = match strand {
        Strand::Plus => {
            if pos + 2 > n {
                return None;
            }
            let i = pos as usize - 1;
            [seq[i], seq[i + 1], seq[i + 2]]
        }
        Strand::Minus => {
            if pos < 3 {
                return None;
            }
            let i = pos as usize - 1;
            [
                complement(seq[i]),
                complement(seq[i - 1]),
                complement(seq[i - 2]),
            ]
        }
    };
    Some(
        bases
            .iter()
            .map(|b| b.to_ascii_uppercase() as char)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(b"ATGAAATAA", 1, Strand::Plus, Some("ATG"))]
    #[case(b"ATGAAATAA", 7, Strand::Plus, Some("TAA"))]
    #[case(b"ATGAAATAA", 8, Strand::Plus, None)]
    // reverse strand: codon starting (5') at pos 9 reads CAT revcomp -> TTA
    #[case(b"ATGAAATAA", 3, Strand::Minus, Some("CAT"))]
    #[case(b"ATGAAATAA", 2, Strand::Minus, None)]
    fn test_codon_at(
        #[case] seq: &[u8],
        #[case] pos: u64,
        #[case] strand: Strand,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(codon_at(seq, pos, strand).as_deref(), expected);
    }

    #[rstest]
    fn test_ambiguity() {
        assert!(is_ambiguous(b'N'));
        assert!(is_ambiguous(b'R'));
        assert!(!is_ambiguous(b'a'));
    }
}
