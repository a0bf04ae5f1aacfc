use crate::{BlockQuote, Body, Image, Table};

/// One slide's worth of projected content.
///
/// `freeze` and `skip` are authoring-time policy flags, not content: a slide
/// can be edited to add `freeze: true` without becoming "different" for
/// reconciliation purposes, so they are excluded from `PartialEq`. Everything
/// else participates: layout, titles, subtitles, bodies, images (compared by
/// checksum via `Image`'s own equality), block quotes, tables and the
/// speaker note.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub layout: String,
    pub freeze: bool,
    pub skip: bool,
    pub titles: Vec<Body>,
    pub subtitles: Vec<Body>,
    pub bodies: Vec<Body>,
    pub images: Vec<Image>,
    pub block_quotes: Vec<BlockQuote>,
    pub tables: Vec<Table>,
    pub speaker_note: String,
}

impl Slide {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            ..Default::default()
        }
    }

    pub fn frozen(mut self) -> Self {
        self.freeze = true;
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn with_titles(mut self, titles: Vec<Body>) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_subtitles(mut self, subtitles: Vec<Body>) -> Self {
        self.subtitles = subtitles;
        self
    }

    pub fn with_bodies(mut self, bodies: Vec<Body>) -> Self {
        self.bodies = bodies;
        self
    }

    pub fn with_images(mut self, images: Vec<Image>) -> Self {
        self.images = images;
        self
    }

    pub fn with_block_quotes(mut self, block_quotes: Vec<BlockQuote>) -> Self {
        self.block_quotes = block_quotes;
        self
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_speaker_note(mut self, speaker_note: impl Into<String>) -> Self {
        self.speaker_note = speaker_note.into();
        self
    }
}

impl PartialEq for Slide {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
            && self.titles == other.titles
            && self.subtitles == other.subtitles
            && self.bodies == other.bodies
            && self.images == other.images
            && self.block_quotes == other.block_quotes
            && self.tables == other.tables
            && self.speaker_note == other.speaker_note
    }
}
impl Eq for Slide {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fragment;

    #[test]
    fn freeze_and_skip_are_excluded_from_equality() {
        let a = Slide::new("TITLE_AND_BODY");
        let b = Slide::new("TITLE_AND_BODY").frozen().skipped();
        assert_eq!(a, b);
    }

    #[test]
    fn content_differences_are_detected() {
        let a = Slide::new("TITLE_AND_BODY")
            .with_titles(vec![Body::new(vec![crate::Paragraph::new(vec![
                Fragment::new("Hello"),
            ])])]);
        let b = Slide::new("TITLE_AND_BODY")
            .with_titles(vec![Body::new(vec![crate::Paragraph::new(vec![
                Fragment::new("Goodbye"),
            ])])]);
        assert_ne!(a, b);
    }

    #[test]
    fn layout_participates_in_equality() {
        let a = Slide::new("TITLE_AND_BODY");
        let b = Slide::new("SECTION_HEADER");
        assert_ne!(a, b);
    }
}
