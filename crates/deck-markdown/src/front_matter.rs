use serde::Deserialize;

use crate::error::ParseError;

/// Document-level front matter: an optional YAML block bounded by `---`
/// lines at the very start of the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontMatter {
    #[serde(rename = "presentationID", default)]
    pub presentation_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub breaks: bool,
    #[serde(rename = "codeBlockToImageCommand", default)]
    pub code_block_to_image_command: Option<String>,
    #[serde(default)]
    pub defaults: Vec<DefaultRule>,
}

/// One conditional entry in front-matter `defaults`. Any field left unset
/// here leaves the corresponding slide field untouched; only the first rule
/// whose `if` evaluates true is applied, and only to fields the slide itself
/// hasn't already set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultRule {
    #[serde(rename = "if", default)]
    pub if_expr: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub freeze: Option<bool>,
    #[serde(default)]
    pub ignore: Option<bool>,
    #[serde(default)]
    pub skip: Option<bool>,
}

/// Splits a document's optional leading front matter from the rest. A
/// document opens with front matter only when its very first line is `---`;
/// the matching closing `---` must also sit at column 0. Returns the parsed
/// front matter (or the default, empty one) and the remaining text.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str), ParseError> {
    let Some(after_open) = source.strip_prefix("---\n") else {
        return Ok((FrontMatter::default(), source));
    };

    let Some(close_at) = find_closing_fence(after_open) else {
        return Ok((FrontMatter::default(), source));
    };

    let yaml = &after_open[..close_at.0];
    let rest = &after_open[close_at.1..];
    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };
    Ok((front_matter, rest))
}

/// Finds the byte offset of a `---` line at column 0, returning
/// `(content_end, line_end)` so the caller can slice out the YAML body and
/// the remainder separately.
fn find_closing_fence(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if trimmed == "---" {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_front_matter_is_untouched() {
        let (fm, rest) = split_front_matter("# Hello\n").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(rest, "# Hello\n");
    }

    #[test]
    fn front_matter_is_parsed_and_stripped() {
        let source = "---\ntitle: Demo\nbreaks: true\n---\n# Hello\n";
        let (fm, rest) = split_front_matter(source).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Demo"));
        assert!(fm.breaks);
        assert_eq!(rest, "# Hello\n");
    }

    #[test]
    fn presentation_id_uses_its_exact_key() {
        let source = "---\npresentationID: abc123\n---\nbody\n";
        let (fm, _) = split_front_matter(source).unwrap();
        assert_eq!(fm.presentation_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn defaults_parse_with_if_field() {
        let source = "---\ndefaults:\n  - if: \"page == 1\"\n    layout: TITLE\n---\nbody\n";
        let (fm, _) = split_front_matter(source).unwrap();
        assert_eq!(fm.defaults.len(), 1);
        assert_eq!(fm.defaults[0].if_expr.as_deref(), Some("page == 1"));
        assert_eq!(fm.defaults[0].layout.as_deref(), Some("TITLE"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let source = "---\ntitle: [unterminated\n---\nbody\n";
        assert!(split_front_matter(source).is_err());
    }
}
