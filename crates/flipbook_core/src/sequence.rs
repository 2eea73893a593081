//! Natural ordering keys for frame file names.
//!
//! A file name is split into alternating runs of non-digits and digits, so
//! `frame_2.png` sorts before `frame_10.png`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One run of a [`SequenceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySegment {
    /// Non-digit characters, compared lexically
    Text(String),
    /// Digit characters, compared by numeric value
    Number(String),
}

impl KeySegment {
    fn digits(&self) -> Option<&str> {
        match self {
            KeySegment::Number(d) => Some(d),
            KeySegment::Text(_) => None,
        }
    }
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for KeySegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeySegment::Text(a), KeySegment::Text(b)) => a.cmp(b),
            (KeySegment::Number(a), KeySegment::Number(b)) => compare_digits(a, b),
            // Digits sort before letters, as in plain lexical order.
            (KeySegment::Number(_), KeySegment::Text(_)) => Ordering::Less,
            (KeySegment::Text(_), KeySegment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeySegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key that orders digit runs by value.
///
/// Always starts with a (possibly empty) text segment, so two keys align
/// segment-by-segment. Numeric runs compare by value without overflow, so
/// arbitrarily long digit strings are fine.
///
/// # Examples
///
/// ```
/// use flipbook_core::SequenceKey;
///
/// let mut names = vec!["frame_10.png", "frame_2.png", "frame_1.png"];
/// names.sort_by_key(|n| SequenceKey::new(n));
/// assert_eq!(names, vec!["frame_1.png", "frame_2.png", "frame_10.png"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceKey {
    segments: Vec<KeySegment>,
}

impl SequenceKey {
    /// Build the key for a file name.
    pub fn new(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for ch in name.chars() {
            let is_digit = ch.is_ascii_digit();
            if is_digit != in_digits {
                segments.push(Self::segment(std::mem::take(&mut current), in_digits));
                in_digits = is_digit;
            }
            current.push(ch);
        }
        segments.push(Self::segment(current, in_digits));

        Self { segments }
    }

    fn segment(run: String, digits: bool) -> KeySegment {
        if digits {
            KeySegment::Number(run)
        } else {
            KeySegment::Text(run)
        }
    }

    /// The alternating text/number runs.
    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// The first numeric run, if any.
    pub fn first_number(&self) -> Option<&str> {
        self.segments.iter().find_map(KeySegment::digits)
    }
}

impl Ord for SequenceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for SequenceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for SequenceKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_alternate_from_text() {
        let key = SequenceKey::new("12ab3");
        assert_eq!(
            key.segments(),
            &[
                KeySegment::Text(String::new()),
                KeySegment::Number("12".into()),
                KeySegment::Text("ab".into()),
                KeySegment::Number("3".into()),
            ]
        );
        assert_eq!(key.first_number(), Some("12"));
    }

    #[test]
    fn test_leading_zeros_compare_equal_by_value() {
        assert_eq!(
            SequenceKey::new("frame_007").cmp(&SequenceKey::new("frame_7")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let small = SequenceKey::new("f_99999999999999999999999");
        let big = SequenceKey::new("f_100000000000000000000000");
        assert!(small < big);
    }
}
