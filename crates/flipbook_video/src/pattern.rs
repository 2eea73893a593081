//! Glob-style file name patterns.

use flipbook_error::{CatalogError, CatalogErrorKind};
use regex::Regex;

/// Pattern used when none is given.
pub const DEFAULT_FRAME_PATTERN: &str = "frame_*.png";

/// A single-component glob: `*` matches any run of characters, `?` matches
/// one character, everything else matches literally.
///
/// # Examples
///
/// ```
/// use flipbook_video::FramePattern;
///
/// let pattern = FramePattern::parse("frame_*.png").unwrap();
/// assert!(pattern.matches("frame_0001.png"));
/// assert!(!pattern.matches("frame_0001.jpg"));
/// assert!(FramePattern::parse("frames/*.png").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FramePattern {
    glob: String,
    regex: Regex,
}

impl FramePattern {
    /// Compile `glob`.
    ///
    /// # Errors
    ///
    /// Empty patterns and patterns containing a path separator are rejected.
    pub fn parse(glob: &str) -> Result<Self, CatalogError> {
        let invalid = |message: &str| {
            CatalogError::new(CatalogErrorKind::InvalidPattern {
                pattern: glob.to_string(),
                message: message.to_string(),
            })
        };
        if glob.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if glob.contains('/') || glob.contains('\\') {
            return Err(invalid("pattern must match file names, not paths"));
        }

        let mut source = String::with_capacity(glob.len() + 8);
        source.push('^');
        for ch in glob.chars() {
            match ch {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Whether a file name matches.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

impl std::fmt::Display for FramePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.glob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metacharacters_are_literal() {
        let pattern = FramePattern::parse("shot(1).png").unwrap();
        assert!(pattern.matches("shot(1).png"));
        assert!(!pattern.matches("shot1.png"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let pattern = FramePattern::parse("f?.png").unwrap();
        assert!(pattern.matches("f1.png"));
        assert!(!pattern.matches("f12.png"));
    }

    #[test]
    fn test_default_pattern() {
        let pattern = FramePattern::parse(DEFAULT_FRAME_PATTERN).unwrap();
        assert!(pattern.matches("frame_1.png"));
        assert!(pattern.matches("frame_.png"));
        assert!(!pattern.matches("frames_1.png"));
        assert!(!pattern.matches("frame_1.png.bak"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(FramePattern::parse("").is_err());
    }
}
