use pulldown_cmark::{Event, Tag, TagEnd};

use deck_model::Fragment;

/// Inline HTML elements that are allowed to carry styling through to a
/// fragment. Anything else is dropped, though its children still come
/// through as plain text via the `Text` events pulldown-cmark emits around
/// it — only the tag itself, and any `style_name` it would have
/// contributed, disappears.
const INLINE_WHITELIST: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "del", "em", "i", "kbd", "mark", "q", "s", "small", "span",
    "strong", "sub", "sup", "u", "var",
];

#[derive(Debug, Clone, Default)]
struct StyleState {
    bold: bool,
    italic: bool,
    link: String,
    style_name: String,
}

enum TagKind {
    Open(String, Option<String>),
    Close(String),
    Break,
    Unknown,
}

fn parse_inline_tag(raw: &str) -> TagKind {
    let body = raw.trim().trim_start_matches('<').trim_end_matches('>');
    let body = body.strip_suffix('/').unwrap_or(body).trim();
    if body.is_empty() {
        return TagKind::Unknown;
    }
    if let Some(name) = body.strip_prefix('/') {
        return TagKind::Close(name.trim().to_lowercase());
    }
    let mut parts = body.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_lowercase();
    if name == "br" {
        return TagKind::Break;
    }
    let class = parts.next().and_then(extract_class);
    TagKind::Open(name, class)
}

fn extract_class(attrs: &str) -> Option<String> {
    let idx = attrs.find("class=")?;
    let after = &attrs[idx + "class=".len()..];
    let quote = after.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &after[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Folds a flat run of inline `pulldown-cmark` events (the contents of one
/// paragraph, heading, or table cell) into styled fragments. `breaks`
/// mirrors the front-matter option: `true` turns a soft line break into a
/// literal newline, `false` into a single space.
pub fn build_fragments<'a>(events: impl Iterator<Item = Event<'a>>, breaks: bool) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut current = StyleState::default();
    let mut cmark_stack: Vec<StyleState> = Vec::new();
    let mut html_stack: Vec<(String, StyleState)> = Vec::new();

    let mut push_text = |fragments: &mut Vec<Fragment>, current: &StyleState, text: &str, code: bool| {
        if text.is_empty() {
            return;
        }
        let mut fragment = Fragment::new(text);
        if !current.link.is_empty() {
            fragment = fragment.with_link(current.link.clone());
        }
        if !current.style_name.is_empty() {
            fragment = fragment.with_style_name(current.style_name.clone());
        }
        if current.bold {
            fragment = fragment.bold();
        }
        if current.italic {
            fragment = fragment.italic();
        }
        if code {
            fragment = fragment.code();
        }
        fragments.push(fragment);
    };

    for event in events {
        match event {
            Event::Start(Tag::Strong) => {
                cmark_stack.push(current.clone());
                current.bold = true;
            }
            Event::End(TagEnd::Strong) => {
                current = cmark_stack.pop().unwrap_or_default();
            }
            Event::Start(Tag::Emphasis) => {
                cmark_stack.push(current.clone());
                current.italic = true;
            }
            Event::End(TagEnd::Emphasis) => {
                current = cmark_stack.pop().unwrap_or_default();
            }
            Event::Start(Tag::Strikethrough) => {
                cmark_stack.push(current.clone());
                current.style_name = "strikethrough".to_string();
            }
            Event::End(TagEnd::Strikethrough) => {
                current = cmark_stack.pop().unwrap_or_default();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                cmark_stack.push(current.clone());
                current.link = dest_url.to_string();
            }
            Event::End(TagEnd::Link) => {
                current = cmark_stack.pop().unwrap_or_default();
            }
            Event::Text(text) => push_text(&mut fragments, &current, &text, false),
            Event::Code(text) => push_text(&mut fragments, &current, &text, true),
            Event::SoftBreak => {
                let value = if breaks { "\n" } else { " " };
                let fragment = Fragment::new(value).mark_soft_line_break();
                fragments.push(fragment);
            }
            Event::HardBreak => push_text(&mut fragments, &current, "\n", false),
            Event::InlineHtml(raw) | Event::Html(raw) => match parse_inline_tag(&raw) {
                TagKind::Break => push_text(&mut fragments, &current, "\n", false),
                TagKind::Open(name, class) if INLINE_WHITELIST.contains(&name.as_str()) => {
                    html_stack.push((name, current.clone()));
                    if let Some(class) = class {
                        current.style_name = class;
                    }
                }
                TagKind::Close(name) if INLINE_WHITELIST.contains(&name.as_str()) => {
                    if html_stack.last().is_some_and(|(open, _)| *open == name) {
                        let (_, prior) = html_stack.pop().unwrap();
                        current = prior;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn fragments_for(markdown: &str, breaks: bool) -> Vec<Fragment> {
        let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
        // skip the wrapping Start(Paragraph)/End(Paragraph) pair.
        let events: Vec<_> = parser.collect();
        let inner = events[1..events.len() - 1].iter().cloned();
        build_fragments(inner, breaks)
    }

    #[test]
    fn bold_and_italic_compose() {
        let fragments = fragments_for("**bold** and *italic*", false);
        assert!(fragments[0].bold);
        assert!(fragments.iter().any(|f| f.italic));
    }

    #[test]
    fn link_carries_url() {
        let fragments = fragments_for("[text](https://example.com)", false);
        assert_eq!(fragments[0].link, "https://example.com");
    }

    #[test]
    fn code_span_sets_code_flag() {
        let fragments = fragments_for("`x = 1`", false);
        assert!(fragments[0].code);
    }

    #[test]
    fn strikethrough_maps_to_named_style() {
        let fragments = fragments_for("~~gone~~", false);
        assert_eq!(fragments[0].style_name, "strikethrough");
    }

    #[test]
    fn soft_break_becomes_space_by_default() {
        let fragments = fragments_for("one\ntwo", false);
        assert!(fragments.iter().any(|f| f.value == " "));
    }

    #[test]
    fn soft_break_becomes_newline_when_breaks_enabled() {
        let fragments = fragments_for("one\ntwo", true);
        assert!(fragments.iter().any(|f| f.value == "\n"));
    }

    #[test]
    fn whitelisted_html_class_sets_style_name() {
        let fragments = fragments_for("<span class=\"accent\">hi</span>", false);
        assert_eq!(fragments[0].style_name, "accent");
    }

    #[test]
    fn disallowed_html_tag_is_dropped_but_text_remains() {
        let fragments = fragments_for("<blink>hi</blink>", false);
        assert!(fragments.iter().any(|f| f.value == "hi"));
        assert!(fragments.iter().all(|f| f.style_name.is_empty()));
    }

    #[test]
    fn br_becomes_hard_newline() {
        let fragments = fragments_for("one<br>two", false);
        assert!(fragments.iter().any(|f| f.value == "\n"));
    }
}
