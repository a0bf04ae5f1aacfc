use std::collections::BTreeMap;

use pulldown_cmark::{Alignment as CmarkAlignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use deck_model::{Alignment, BlockQuote, Body, Bullet, Fragment, Image, Paragraph, Table, TableCell, TableRow};

use crate::config::{interpret_comment, CommentOutcome};
use crate::inline::build_fragments;

pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// The lowest heading level present anywhere in the document; per the
/// projector's rule this is computed document-wide, not per slide, since
/// every slide's titles and subtitles are resolved relative to the same
/// level.
pub fn find_top_heading_level(blocks: &[&str]) -> Option<i64> {
    let mut min_level = None;
    for block in blocks {
        for event in Parser::new_ext(block, parser_options()) {
            if let Event::Start(Tag::Heading { level, .. }) = event {
                let level = heading_level_value(level);
                min_level = Some(min_level.map_or(level, |m: i64| m.min(level)));
            }
        }
    }
    min_level
}

fn heading_level_value(level: HeadingLevel) -> i64 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_alignment(alignment: CmarkAlignment) -> Alignment {
    match alignment {
        CmarkAlignment::Center => Alignment::Center,
        CmarkAlignment::Right => Alignment::End,
        CmarkAlignment::None | CmarkAlignment::Left => Alignment::Start,
    }
}

/// A code fence awaiting image rendering, scoped to the slide it came from.
#[derive(Debug, Clone)]
pub struct PendingCodeBlock {
    pub lang: String,
    pub content: String,
}

/// The not-yet-finalized result of folding one slide's events. Per-slide
/// config (`layout`/`freeze`/`ignore`/`skip`) stays optional here because
/// front-matter `defaults` only fill in whatever the slide didn't already
/// set via an HTML comment.
#[derive(Debug, Default)]
pub struct RawSlide {
    pub layout: Option<String>,
    pub freeze: Option<bool>,
    pub skip: Option<bool>,
    pub ignore: Option<bool>,
    pub titles: Vec<Body>,
    pub subtitles: Vec<Body>,
    pub bodies: Vec<Body>,
    pub images: Vec<Image>,
    pub block_quotes: Vec<BlockQuote>,
    pub tables: Vec<Table>,
    pub speaker_note_lines: Vec<String>,
    pub headings: BTreeMap<i64, Vec<String>>,
    pub comments: Vec<String>,
    pub code_blocks: Vec<PendingCodeBlock>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Heading,
    Paragraph,
    TableCell,
    Image,
}

fn fragments_to_text(fragments: &[Fragment]) -> String {
    fragments.iter().map(|f| f.value.as_str()).collect()
}

/// `pulldown-cmark` has no concept of alpha-lettered ordered lists (`a.`,
/// `b)`, ...), so a line opening with one is rewritten to the digit marker it
/// does recognize before parsing. The rewrite only ever swaps the marker
/// letter for `1`, so every byte offset in the result still lines up with
/// `block`, letting [`build_raw_slide`] check the untouched source afterwards
/// to tell which lists were actually alpha-lettered.
fn rewrite_alpha_markers(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    for line in block.split_inclusive('\n') {
        let trimmed = line.trim_start_matches([' ', '\t']);
        let indent_len = line.len() - trimmed.len();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(letter), Some(punct @ ('.' | ')')), Some(' ' | '\t')) if letter.is_ascii_alphabetic() => {
                out.push_str(&line[..indent_len]);
                out.push('1');
                out.push(punct);
                out.push_str(&line[indent_len + letter.len_utf8() + punct.len_utf8()..]);
            }
            _ => out.push_str(line),
        }
    }
    out
}

/// Folds one slide block's `pulldown-cmark` events into a [`RawSlide`].
/// `top_level` is the document-wide heading level computed by
/// [`find_top_heading_level`].
pub fn build_raw_slide(block: &str, top_level: Option<i64>, breaks: bool) -> RawSlide {
    let mut raw = RawSlide::default();
    let rewritten = rewrite_alpha_markers(block);

    let mut mode = Mode::None;
    let mut inline_buffer: Vec<Event<'_>> = Vec::new();
    let mut heading_level: Option<i64> = None;
    let mut heading_target: Option<HeadingTarget> = None;

    let mut list_stack: Vec<Bullet> = Vec::new();
    let mut item_depth: u32 = 0;
    let mut current_list_paragraphs: Vec<Paragraph> = Vec::new();

    let mut blockquote_stack: Vec<(Vec<Paragraph>, u32)> = Vec::new();

    let mut table_alignments: Vec<Alignment> = Vec::new();
    let mut table_rows: Vec<TableRow> = Vec::new();
    let mut table_row_cells: Vec<TableCell> = Vec::new();
    let mut table_column: usize = 0;
    let mut in_table_header = false;

    let mut in_code_block = false;
    let mut code_lang = String::new();
    let mut code_content = String::new();

    for (event, range) in Parser::new_ext(&rewritten, parser_options()).into_offset_iter() {
        match &event {
            Event::Start(Tag::Heading { level, .. }) => {
                let value = heading_level_value(*level);
                heading_level = Some(value);
                heading_target = Some(match top_level {
                    Some(top) if value == top => HeadingTarget::Title,
                    Some(top) if value == top + 1 => HeadingTarget::Subtitle,
                    _ => HeadingTarget::DeepBody,
                });
                mode = Mode::Heading;
                inline_buffer.clear();
                continue;
            }
            Event::End(TagEnd::Heading(_)) => {
                mode = Mode::None;
                let mut fragments = build_fragments(inline_buffer.drain(..), breaks);
                let text = fragments_to_text(&fragments);
                if let Some(level) = heading_level.take() {
                    raw.headings.entry(level).or_default().push(text);
                }
                match heading_target.take() {
                    Some(HeadingTarget::Title) => raw.titles.push(Body::new(vec![Paragraph::new(fragments)])),
                    Some(HeadingTarget::Subtitle) => {
                        raw.subtitles.push(Body::new(vec![Paragraph::new(fragments)]))
                    }
                    _ => {
                        for f in &mut fragments {
                            f.bold = true;
                        }
                        raw.bodies.push(Body::new(vec![Paragraph::new(fragments)]));
                    }
                }
                continue;
            }
            Event::Start(Tag::Paragraph) => {
                mode = Mode::Paragraph;
                inline_buffer.clear();
                continue;
            }
            Event::End(TagEnd::Paragraph) => {
                mode = Mode::None;
                let fragments = build_fragments(inline_buffer.drain(..), breaks);
                let paragraph = Paragraph::new(fragments);
                if item_depth > 0 {
                    let bullet = list_stack.last().copied().unwrap_or(Bullet::None);
                    let nesting = (list_stack.len() as u32).saturating_sub(1);
                    current_list_paragraphs.push(paragraph.with_bullet(bullet).with_nesting(nesting));
                } else if let Some((paragraphs, _)) = blockquote_stack.last_mut() {
                    paragraphs.push(paragraph);
                } else {
                    raw.bodies.push(Body::new(vec![paragraph]));
                }
                continue;
            }
            Event::Start(Tag::List(start)) => {
                list_stack.push(if start.is_some() { Bullet::Number } else { Bullet::Dash });
                continue;
            }
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                if list_stack.is_empty() && !current_list_paragraphs.is_empty() {
                    raw.bodies.push(Body::new(std::mem::take(&mut current_list_paragraphs)));
                }
                continue;
            }
            Event::Start(Tag::Item) => {
                item_depth += 1;
                let marker_is_alpha = block
                    .get(range.start..)
                    .and_then(|rest| rest.trim_start().chars().next())
                    .is_some_and(|c| c.is_ascii_alphabetic());
                if marker_is_alpha {
                    if let Some(top) = list_stack.last_mut() {
                        *top = Bullet::Alpha;
                    }
                }
                continue;
            }
            Event::End(TagEnd::Item) => {
                item_depth = item_depth.saturating_sub(1);
                continue;
            }
            Event::Start(Tag::BlockQuote(_)) => {
                let nesting = blockquote_stack.len() as u32;
                blockquote_stack.push((Vec::new(), nesting));
                continue;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                if let Some((paragraphs, nesting)) = blockquote_stack.pop() {
                    raw.block_quotes.push(BlockQuote::new(paragraphs, nesting));
                }
                continue;
            }
            Event::Start(Tag::Table(alignments)) => {
                table_alignments = alignments.iter().map(|a| convert_alignment(*a)).collect();
                table_rows.clear();
                continue;
            }
            Event::End(TagEnd::Table) => {
                raw.tables.push(Table::new(std::mem::take(&mut table_rows)));
                continue;
            }
            Event::Start(Tag::TableHead) => {
                in_table_header = true;
                continue;
            }
            Event::End(TagEnd::TableHead) => {
                in_table_header = false;
                continue;
            }
            Event::Start(Tag::TableRow) => {
                table_row_cells.clear();
                table_column = 0;
                continue;
            }
            Event::End(TagEnd::TableRow) => {
                table_rows.push(TableRow::new(std::mem::take(&mut table_row_cells)));
                continue;
            }
            Event::Start(Tag::TableCell) => {
                mode = Mode::TableCell;
                inline_buffer.clear();
                continue;
            }
            Event::End(TagEnd::TableCell) => {
                mode = Mode::None;
                let mut fragments = build_fragments(inline_buffer.drain(..), breaks);
                if in_table_header {
                    for f in &mut fragments {
                        f.bold = true;
                    }
                }
                let alignment = table_alignments.get(table_column).copied().unwrap_or_default();
                let mut cell = TableCell::new(fragments).with_alignment(alignment);
                if in_table_header {
                    cell = cell.header();
                }
                table_row_cells.push(cell);
                table_column += 1;
                continue;
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                code_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                code_content.clear();
                continue;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                raw.code_blocks.push(PendingCodeBlock {
                    lang: code_lang.clone(),
                    content: code_content.clone(),
                });
                raw.bodies.push(Body::new(vec![Paragraph::new(vec![
                    Fragment::new(code_content.clone()).code(),
                ])]));
                continue;
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                mode = Mode::Image;
                let bytes = std::fs::read(dest_url.as_ref()).unwrap_or_default();
                raw.images.push(Image::from_bytes(dest_url.to_string(), bytes));
                continue;
            }
            Event::End(TagEnd::Image) => {
                mode = Mode::None;
                continue;
            }
            Event::Html(html) | Event::InlineHtml(html) if mode == Mode::None && html.trim_start().starts_with("<!--") => {
                match interpret_comment(html) {
                    CommentOutcome::Config(config) => {
                        if config.layout.is_some() {
                            raw.layout = config.layout;
                        }
                        if config.freeze.is_some() {
                            raw.freeze = config.freeze;
                        }
                        if config.ignore.is_some() {
                            raw.ignore = config.ignore;
                        }
                        if config.skip.is_some() {
                            raw.skip = config.skip;
                        }
                    }
                    CommentOutcome::Note(text) => {
                        if !text.is_empty() {
                            raw.speaker_note_lines.push(text);
                        }
                    }
                }
                raw.comments.push(html.to_string());
                continue;
            }
            Event::Text(text) if in_code_block => {
                code_content.push_str(text);
                continue;
            }
            _ => {}
        }

        if matches!(mode, Mode::Heading | Mode::Paragraph | Mode::TableCell) {
            inline_buffer.push(event);
        }
    }

    raw
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HeadingTarget {
    Title,
    Subtitle,
    DeepBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_heading_becomes_title() {
        let raw = build_raw_slide("# Hello\n", Some(1), false);
        assert_eq!(raw.titles.len(), 1);
        assert_eq!(raw.titles[0].paragraphs()[0].text(), "Hello");
    }

    #[test]
    fn second_level_becomes_subtitle() {
        let raw = build_raw_slide("# Title\n## Sub\n", Some(1), false);
        assert_eq!(raw.subtitles.len(), 1);
        assert_eq!(raw.subtitles[0].paragraphs()[0].text(), "Sub");
    }

    #[test]
    fn deeper_heading_becomes_bold_body() {
        let raw = build_raw_slide("# Title\n### Deep\n", Some(1), false);
        assert_eq!(raw.bodies.len(), 1);
        assert!(raw.bodies[0].paragraphs()[0].fragments[0].bold);
    }

    #[test]
    fn list_items_carry_bullet_and_nesting() {
        let raw = build_raw_slide("- one\n- two\n", Some(1), false);
        assert_eq!(raw.bodies.len(), 1);
        let paragraphs = raw.bodies[0].paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].bullet, Bullet::Dash);
        assert_eq!(paragraphs[0].nesting, 0);
    }

    #[test]
    fn nested_list_increments_nesting() {
        let raw = build_raw_slide("- one\n  - nested\n", Some(1), false);
        let paragraphs = raw.bodies[0].paragraphs();
        assert_eq!(paragraphs[1].nesting, 1);
    }

    #[test]
    fn ordered_list_uses_number_bullet() {
        let raw = build_raw_slide("1. one\n2. two\n", Some(1), false);
        assert_eq!(raw.bodies[0].paragraphs()[0].bullet, Bullet::Number);
    }

    #[test]
    fn alpha_marker_list_uses_alpha_bullet() {
        let raw = build_raw_slide("a. one\nb. two\n", Some(1), false);
        let paragraphs = raw.bodies[0].paragraphs();
        assert_eq!(paragraphs[0].bullet, Bullet::Alpha);
        assert_eq!(paragraphs[1].bullet, Bullet::Alpha);
    }

    #[test]
    fn nested_alpha_list_keeps_outer_dash_bullet() {
        let raw = build_raw_slide("- one\n  a. nested\n", Some(1), false);
        let paragraphs = raw.bodies[0].paragraphs();
        assert_eq!(paragraphs[0].bullet, Bullet::Dash);
        assert_eq!(paragraphs[0].nesting, 0);
        assert_eq!(paragraphs[1].bullet, Bullet::Alpha);
        assert_eq!(paragraphs[1].nesting, 1);
    }

    #[test]
    fn prose_starting_with_letter_period_is_not_mistaken_for_a_list() {
        let raw = build_raw_slide("e.g. this is a sentence\n", Some(1), false);
        assert!(raw.bodies[0].paragraphs()[0].bullet == Bullet::None);
    }

    #[test]
    fn blockquote_nesting_counts_enclosing_quotes() {
        let raw = build_raw_slide("> outer\n> > inner\n", Some(1), false);
        assert_eq!(raw.block_quotes.len(), 2);
        assert_eq!(raw.block_quotes[0].nesting, 0);
        assert_eq!(raw.block_quotes[1].nesting, 1);
    }

    #[test]
    fn table_marks_header_row_bold() {
        let raw = build_raw_slide("| A | B |\n|---|---|\n| 1 | 2 |\n", Some(1), false);
        assert_eq!(raw.tables.len(), 1);
        let rows = raw.tables[0].rows();
        assert!(rows[0].cells()[0].is_header);
        assert!(rows[0].cells()[0].fragments[0].bold);
        assert!(!rows[1].cells()[0].is_header);
    }

    #[test]
    fn table_alignment_is_captured() {
        let raw = build_raw_slide("| A |\n|:-:|\n| x |\n", Some(1), false);
        assert_eq!(raw.tables[0].rows()[0].cells()[0].alignment, Alignment::Center);
    }

    #[test]
    fn fenced_code_block_is_kept_as_literal_body_and_pending_job() {
        let raw = build_raw_slide("```rust\nfn main() {}\n```\n", Some(1), false);
        assert_eq!(raw.code_blocks.len(), 1);
        assert_eq!(raw.code_blocks[0].lang, "rust");
        assert!(raw.code_blocks[0].content.contains("fn main"));
        assert!(raw.bodies[0].paragraphs()[0].fragments[0].code);
    }

    #[test]
    fn json_comment_sets_layout_without_becoming_a_note() {
        let raw = build_raw_slide("<!-- {\"layout\": \"TITLE\"} -->\ntext\n", Some(1), false);
        assert_eq!(raw.layout.as_deref(), Some("TITLE"));
        assert!(raw.speaker_note_lines.is_empty());
    }

    #[test]
    fn plain_comment_becomes_a_speaker_note_line() {
        let raw = build_raw_slide("<!-- say hi -->\ntext\n", Some(1), false);
        assert_eq!(raw.speaker_note_lines, vec!["say hi".to_string()]);
    }

    #[test]
    fn image_is_collected_with_checksum_equality() {
        let raw = build_raw_slide("![alt](/nonexistent/path.png)\n", Some(1), false);
        assert_eq!(raw.images.len(), 1);
    }
}
