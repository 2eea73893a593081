//! Instruction templates sent to the prompt model.

use flipbook_error::{UpstreamError, UpstreamErrorKind};

/// Instruction for the first frame of a `total`-frame sequence.
pub fn initial_instruction(scene_description: &str, total: usize) -> String {
    format!(
        "You write detailed prompts for an image generator.\n\
         Describe the first image of a sequence of {total} images that will play back \
         as one continuous animation. Be concrete and visual, and set up a scene \
         that can change gradually over time.\n\
         Scene: {scene_description}\n\
         Respond with only the prompt text."
    )
}

/// Instruction for frame `frame` of `total`, continuing from `previous`.
pub fn next_instruction(previous: &str, frame: usize, total: usize) -> String {
    format!(
        "You write sequential prompts for an image generator.\n\
         The {total} images of this sequence will play back as one fluid animation.\n\
         This is frame {frame} of {total}.\n\
         The previous frame was: \"{previous}\"\n\
         Describe the next frame as a small, clear step forward from the previous one. \
         Keep the characters, setting and style the same; only motion and change should differ.\n\
         Respond with only the prompt text."
    )
}

/// Trim a model reply, rejecting empty output.
///
/// Empty output is a permanent [`UpstreamErrorKind::InvalidResponse`].
pub fn clean_response(raw: String) -> Result<String, UpstreamError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UpstreamError::new(UpstreamErrorKind::InvalidResponse(
            "model returned an empty prompt".to_string(),
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_instruction_carries_previous_and_position() {
        let text = next_instruction("a red kite rises", 3, 8);
        assert!(text.contains("\"a red kite rises\""));
        assert!(text.contains("frame 3 of 8"));
    }

    #[test]
    fn test_initial_instruction_mentions_scene_and_length() {
        let text = initial_instruction("a stormy harbor", 12);
        assert!(text.contains("a stormy harbor"));
        assert!(text.contains("12 images"));
    }

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("  hello \n".into()).unwrap(), "hello");
        let err = clean_response(" \n\t".into()).unwrap_err();
        assert!(!err.is_transient());
    }
}
