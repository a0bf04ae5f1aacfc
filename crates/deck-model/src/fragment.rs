/// A single run of styled text inside a `Paragraph`.
///
/// `soft_line_break` is scaffolding used only while a paragraph is still
/// under construction by the projector: a fragment carrying a pending soft
/// break is always collapsed into a literal space or `'\n'` (per the
/// front-matter `breaks` option) before the paragraph is handed back as part
/// of a finished `Slide`. `PartialEq` ignores the field entirely, so it is
/// not possible to observe it from outside the crate on a value anyone
/// actually compares.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub value: String,
    pub link: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub style_name: String,
    pub(crate) soft_line_break: bool,
}

impl Fragment {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_style_name(mut self, name: impl Into<String>) -> Self {
        self.style_name = name.into();
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    /// Marks this fragment as carrying a pending soft line break, consumed by
    /// the projector's collapse pass before the paragraph is finalized.
    pub fn mark_soft_line_break(mut self) -> Self {
        self.soft_line_break = true;
        self
    }

    pub fn has_pending_soft_line_break(&self) -> bool {
        self.soft_line_break
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.link == other.link
            && self.bold == other.bold
            && self.italic == other.italic
            && self.code == other.code
            && self.style_name == other.style_name
    }
}
impl Eq for Fragment {}
