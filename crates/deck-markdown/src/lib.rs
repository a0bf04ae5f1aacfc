//! Markdown → slide projection (C2): turns a Markdown document with YAML
//! front matter into an ordered sequence of canonical [`deck_model::Slide`]s.
//!
//! The pipeline is a straight line through this crate's modules:
//! [`front_matter::split_front_matter`] peels off the YAML block,
//! [`split::split_top_level_blocks`] cuts the remainder on top-level `---`
//! rules, [`slide_builder::build_raw_slide`] folds each block's
//! `pulldown-cmark` events into a [`slide_builder::RawSlide`], fenced code
//! blocks are rendered to images in parallel via [`codeimage`], and
//! front-matter `defaults` are resolved per slide via [`expr`] before the
//! raw slide is finalized into a `Slide`.

mod codeimage;
mod config;
mod error;
mod expr;
mod front_matter;
mod inline;
mod slide_builder;
mod split;

pub use codeimage::{CodeBlockJob, CodeImageRenderer, ImageBytes, ShellCommandRenderer};
pub use config::{interpret_comment, CommentOutcome, SlideConfigComment};
pub use error::{ParseError, ProjectionError};
pub use expr::DefaultsContext;
pub use front_matter::{DefaultRule, FrontMatter};
pub use slide_builder::{find_top_heading_level, RawSlide};
pub use split::split_top_level_blocks;

use deck_model::{Body, Image, Paragraph, Slide};
use rhai::Engine;

use codeimage::render_all;
use expr::select_default;
use front_matter::split_front_matter;
use slide_builder::build_raw_slide;

/// A projected document: its front matter plus the ordered, already-resolved
/// slide sequence (`ignore`d slides are dropped, `defaults` are applied).
#[derive(Debug, Clone, Default)]
pub struct MD {
    pub front_matter: FrontMatter,
    pub slides: Vec<Slide>,
}

/// Projects a full Markdown document, rendering fenced code blocks to
/// images via the front-matter `codeBlockToImageCommand` if one is
/// configured.
pub fn project(source: &str) -> Result<MD, ProjectionError> {
    project_with_renderer(source, None)
}

/// Same as [`project`], but lets the caller supply a [`CodeImageRenderer`]
/// directly — used by tests and by any caller that wants to bypass the
/// shell-command renderer `codeBlockToImageCommand` would otherwise spawn.
pub fn project_with_renderer(
    source: &str,
    renderer: Option<&dyn CodeImageRenderer>,
) -> Result<MD, ProjectionError> {
    let (front_matter, rest) = split_front_matter(source)?;
    let blocks = split_top_level_blocks(rest);
    let top_level = find_top_heading_level(&blocks);
    let page_total = blocks.len() as i64;
    tracing::debug!(target: "deck_markdown", blocks = page_total, ?top_level, "projecting markdown document");

    let raw_slides: Vec<RawSlide> = blocks
        .iter()
        .map(|block| build_raw_slide(block, top_level, front_matter.breaks))
        .collect();

    let shell_renderer = front_matter
        .code_block_to_image_command
        .as_ref()
        .map(|cmd| ShellCommandRenderer::new(cmd.clone()));
    let renderer: Option<&dyn CodeImageRenderer> =
        renderer.or(shell_renderer.as_ref().map(|r| r as &dyn CodeImageRenderer));

    let images_by_slide = render_code_images(&raw_slides, renderer)?;

    let engine = Engine::new();
    let mut slides = Vec::with_capacity(raw_slides.len());
    for (zero_based, (raw, rendered_images)) in
        raw_slides.into_iter().zip(images_by_slide).enumerate()
    {
        let page = (zero_based + 1) as i64;
        let ctx = build_defaults_context(&raw, page, page_total, top_level);
        let picked = select_default(&engine, &ctx, &front_matter.defaults)?;

        let layout = raw
            .layout
            .or_else(|| picked.and_then(|rule| rule.layout.clone()))
            .unwrap_or_default();
        let freeze = raw
            .freeze
            .or_else(|| picked.and_then(|rule| rule.freeze))
            .unwrap_or(false);
        let ignore = raw
            .ignore
            .or_else(|| picked.and_then(|rule| rule.ignore))
            .unwrap_or(false);
        let skip = raw
            .skip
            .or_else(|| picked.and_then(|rule| rule.skip))
            .unwrap_or(false);

        if ignore {
            continue;
        }

        let mut images = raw.images;
        images.extend(rendered_images.into_iter().map(|bytes| Image::from_bytes(String::new(), bytes.0)));

        let mut slide = Slide::new(layout)
            .with_titles(raw.titles)
            .with_subtitles(raw.subtitles)
            .with_bodies(raw.bodies)
            .with_images(images)
            .with_block_quotes(raw.block_quotes)
            .with_tables(raw.tables)
            .with_speaker_note(raw.speaker_note_lines.join("\n\n"));
        if freeze {
            slide = slide.frozen();
        }
        if skip {
            slide = slide.skipped();
        }
        slides.push(slide);
    }

    Ok(MD { front_matter, slides })
}

/// Renders every fenced code block across the whole document in one
/// parallel batch (spec's single shared-error-channel parallelism point),
/// then regroups the resulting bytes back by owning slide, in the order
/// each block appeared on that slide.
fn render_code_images(
    raw_slides: &[RawSlide],
    renderer: Option<&dyn CodeImageRenderer>,
) -> Result<Vec<Vec<ImageBytes>>, ProjectionError> {
    let mut images_by_slide = vec![Vec::new(); raw_slides.len()];
    let Some(renderer) = renderer else {
        return Ok(images_by_slide);
    };

    let mut jobs = Vec::new();
    let mut owner = Vec::new();
    for (slide_idx, raw) in raw_slides.iter().enumerate() {
        for block in &raw.code_blocks {
            owner.push(slide_idx);
            jobs.push(CodeBlockJob {
                index: jobs.len(),
                lang: block.lang.clone(),
                content: block.content.clone(),
            });
        }
    }
    if jobs.is_empty() {
        return Ok(images_by_slide);
    }

    for (job_index, bytes) in render_all(&jobs, renderer)? {
        images_by_slide[owner[job_index]].push(bytes);
    }
    Ok(images_by_slide)
}

fn body_text(body: &Body) -> String {
    body.paragraphs()
        .iter()
        .map(Paragraph::text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_defaults_context(raw: &RawSlide, page: i64, page_total: i64, top_level: Option<i64>) -> DefaultsContext {
    DefaultsContext {
        page,
        page_total,
        titles: raw.titles.iter().map(body_text).collect(),
        subtitles: raw.subtitles.iter().map(body_text).collect(),
        bodies: raw.bodies.iter().map(body_text).collect(),
        block_quotes: raw
            .block_quotes
            .iter()
            .map(|bq| bq.paragraphs.iter().map(Paragraph::text).collect::<Vec<_>>().join(" "))
            .collect(),
        code_blocks: raw.code_blocks.iter().map(|b| b.content.clone()).collect(),
        images: raw.images.iter().map(|i| i.source.clone()).collect(),
        comments: raw.comments.clone(),
        headings: raw.headings.clone(),
        speaker_note: raw.speaker_note_lines.join("\n\n"),
        top_heading_level: top_level.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct FixedRenderer;

    impl CodeImageRenderer for FixedRenderer {
        fn render(&self, _lang: &str, _content: &str, _output_hint: &Path) -> Result<ImageBytes, ProjectionError> {
            Ok(ImageBytes(b"rendered".to_vec()))
        }
    }

    #[test]
    fn single_slide_document_has_no_rule_splits() {
        let md = project("# Hello\nworld\n").unwrap();
        assert_eq!(md.slides.len(), 1);
        assert_eq!(md.slides[0].titles[0].paragraphs()[0].text(), "Hello");
    }

    #[test]
    fn top_level_rule_splits_into_two_slides() {
        let md = project("# One\n---\n# Two\n").unwrap();
        assert_eq!(md.slides.len(), 2);
    }

    #[test]
    fn front_matter_presentation_id_is_captured() {
        let source = "---\npresentationID: abc\n---\n# Hello\n";
        let md = project(source).unwrap();
        assert_eq!(md.front_matter.presentation_id.as_deref(), Some("abc"));
        assert_eq!(md.slides.len(), 1);
    }

    #[test]
    fn ignored_slide_is_dropped_entirely() {
        let source = "# One\n---\n<!-- {\"ignore\": true} -->\n# Two\n---\n# Three\n";
        let md = project(source).unwrap();
        assert_eq!(md.slides.len(), 2);
        assert_eq!(md.slides[0].titles[0].paragraphs()[0].text(), "One");
        assert_eq!(md.slides[1].titles[0].paragraphs()[0].text(), "Three");
    }

    #[test]
    fn default_rule_fills_unset_layout() {
        let source = "---\ndefaults:\n  - if: \"page == 1\"\n    layout: TITLE_SLIDE\n---\n# Hello\n";
        let md = project(source).unwrap();
        assert_eq!(md.slides[0].layout, "TITLE_SLIDE");
    }

    #[test]
    fn explicit_slide_config_wins_over_default_rule() {
        let source = "---\ndefaults:\n  - layout: FROM_DEFAULT\n---\n<!-- {\"layout\": \"FROM_COMMENT\"} -->\n# Hello\n";
        let md = project(source).unwrap();
        assert_eq!(md.slides[0].layout, "FROM_COMMENT");
    }

    #[test]
    fn code_block_image_is_appended_after_literal_images() {
        let source = "![alt](/nonexistent.png)\n```rust\nfn main() {}\n```\n";
        let md = project_with_renderer(source, Some(&FixedRenderer)).unwrap();
        assert_eq!(md.slides[0].images.len(), 2);
        assert_eq!(md.slides[0].images[1].bytes, b"rendered");
    }

    #[test]
    fn speaker_note_lines_join_with_blank_line() {
        let source = "<!-- first note -->\n<!-- second note -->\n# Hello\n";
        let md = project(source).unwrap();
        assert_eq!(md.slides[0].speaker_note, "first note\n\nsecond note");
    }

    #[test]
    fn malformed_front_matter_yaml_is_an_error() {
        let source = "---\ntitle: [oops\n---\n# Hello\n";
        assert!(project(source).is_err());
    }
}
