use serde::Deserialize;

/// Per-slide configuration carried in an HTML comment, e.g.
/// `<!-- {"layout": "TITLE", "freeze": true} -->`. All fields are optional
/// so a comment can set just one of them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SlideConfigComment {
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub freeze: Option<bool>,
    #[serde(default)]
    pub ignore: Option<bool>,
    #[serde(default)]
    pub skip: Option<bool>,
}

/// What an HTML comment turned out to carry: structured per-slide config, or
/// (when its payload doesn't parse as JSON, or parses but isn't an object)
/// a plain line destined for the speaker note.
pub enum CommentOutcome {
    Config(SlideConfigComment),
    Note(String),
}

/// Interprets one HTML comment's raw text (the bytes between `<!--` and
/// `-->`, inclusive or not — delimiters are stripped if present). A comment
/// whose payload parses as a JSON object is config; anything else —
/// including a JSON object missing all four recognized keys, which is
/// usually just a plain note that happens to look JSON-ish — falls back to
/// a speaker-note line. Malformed JSON is never a fatal error here, per the
/// projector's config-vs-note carve-out.
pub fn interpret_comment(raw: &str) -> CommentOutcome {
    let payload = raw
        .trim()
        .strip_prefix("<!--")
        .unwrap_or(raw.trim())
        .strip_suffix("-->")
        .unwrap_or(raw.trim())
        .trim();

    match serde_json::from_str::<SlideConfigComment>(payload) {
        Ok(config) if config != SlideConfigComment::default() => CommentOutcome::Config(config),
        _ => CommentOutcome::Note(payload.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_with_known_keys_is_config() {
        let outcome = interpret_comment("<!-- {\"layout\": \"TITLE\", \"freeze\": true} -->");
        match outcome {
            CommentOutcome::Config(c) => {
                assert_eq!(c.layout.as_deref(), Some("TITLE"));
                assert_eq!(c.freeze, Some(true));
            }
            CommentOutcome::Note(_) => panic!("expected config"),
        }
    }

    #[test]
    fn plain_text_falls_back_to_note() {
        let outcome = interpret_comment("<!-- remember to slow down here -->");
        match outcome {
            CommentOutcome::Note(text) => assert_eq!(text, "remember to slow down here"),
            CommentOutcome::Config(_) => panic!("expected note"),
        }
    }

    #[test]
    fn malformed_json_falls_back_to_note_not_error() {
        let outcome = interpret_comment("<!-- {\"layout\": -->");
        assert!(matches!(outcome, CommentOutcome::Note(_)));
    }

    #[test]
    fn empty_json_object_falls_back_to_note() {
        let outcome = interpret_comment("<!-- {} -->");
        assert!(matches!(outcome, CommentOutcome::Note(_)));
    }
}
