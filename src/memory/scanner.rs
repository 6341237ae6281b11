//! Byte pattern search over already-read buffers
//!
//! Used to locate string terminators of any code-unit width without
//! relying on an encoding-specific scan.

/// Exact byte pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<u8>,
}

impl BytePattern {
    /// Pattern matching exactly `bytes`
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        BytePattern {
            bytes: bytes.into(),
        }
    }

    /// All-zero pattern of `width` bytes, i.e. a null code unit
    pub fn zeros(width: usize) -> Self {
        BytePattern {
            bytes: vec![0; width],
        }
    }

    /// Get the pattern length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if pattern is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the pattern occurs in `data` starting at `index`
    pub fn matches_at(&self, data: &[u8], index: usize) -> bool {
        data.get(index..)
            .and_then(|rest| rest.get(..self.bytes.len()))
            .map_or(false, |window| window == self.bytes.as_slice())
    }
}

/// Smallest index at which `pattern` fully occurs in `data`.
///
/// Returns `None` for an empty pattern or when the pattern is longer than
/// the remaining buffer at every offset.
pub fn find(pattern: &BytePattern, data: &[u8]) -> Option<usize> {
    find_aligned(pattern, data, 1)
}

/// Like [`find`], but only tests offsets that are multiples of `stride`.
///
/// A stride equal to the code-unit width keeps a terminator search from
/// matching across two adjacent code units.
pub fn find_aligned(pattern: &BytePattern, data: &[u8], stride: usize) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > data.len() {
        return None;
    }

    let last = data.len() - pattern.len();
    (0..=last)
        .step_by(stride.max(1))
        .find(|&i| pattern.matches_at(data, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_match() {
        let pattern = BytePattern::new([0xAB, 0xCD]);
        let data = [0x00, 0xAB, 0xCD, 0xAB, 0xCD];
        assert_eq!(find(&pattern, &data), Some(1));
    }

    #[test]
    fn test_find_at_end_of_buffer() {
        let pattern = BytePattern::zeros(1);
        assert_eq!(find(&pattern, b"abc\0"), Some(3));
        assert_eq!(find(&pattern, b"\0"), Some(0));
    }

    #[test]
    fn test_not_found() {
        let zero = BytePattern::zeros(1);
        assert_eq!(find(&zero, b"no terminator"), None);

        let long = BytePattern::new([1, 2, 3, 4]);
        assert_eq!(find(&long, &[1, 2, 3]), None);

        assert_eq!(find(&BytePattern::new(Vec::new()), b"abc"), None);
        assert_eq!(find(&zero, &[]), None);
    }

    #[test]
    fn test_aligned_wide_terminator() {
        // "A" followed by U+0100 in UTF-16LE: the zero pair at offset 1
        // straddles two code units and must not count as a terminator
        let data = [0x41, 0x00, 0x00, 0x01, 0x00, 0x00];
        let pattern = BytePattern::zeros(2);

        assert_eq!(find(&pattern, &data), Some(1));
        assert_eq!(find_aligned(&pattern, &data, 2), Some(4));
    }

    #[test]
    fn test_matches_at_bounds() {
        let pattern = BytePattern::new([7, 8]);
        assert!(pattern.matches_at(&[7, 8], 0));
        assert!(!pattern.matches_at(&[7, 8], 1));
        assert!(!pattern.matches_at(&[7, 8], 5));
    }
}
