use crate::Fragment;

/// Marker for a paragraph's list bullet, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bullet {
    #[default]
    None,
    Dash,
    Number,
    Alpha,
}

/// One line of a `Body`: an ordered run of styled fragments plus list
/// context (`bullet`, `nesting`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub fragments: Vec<Fragment>,
    pub bullet: Bullet,
    pub nesting: u32,
}

impl Paragraph {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            fragments,
            bullet: Bullet::None,
            nesting: 0,
        }
    }

    pub fn with_bullet(mut self, bullet: Bullet) -> Self {
        self.bullet = bullet;
        self
    }

    pub fn with_nesting(mut self, nesting: u32) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.value.as_str()).collect()
    }
}

/// An ordered sequence of paragraphs making up one slide body placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body(pub Vec<Paragraph>);

impl Body {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self(paragraphs)
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_equality_is_structural() {
        let a = Paragraph::new(vec![Fragment::new("x")]).with_bullet(Bullet::Dash);
        let b = Paragraph::new(vec![Fragment::new("x")]).with_bullet(Bullet::Dash);
        assert_eq!(a, b);
        let c = Paragraph::new(vec![Fragment::new("x")]).with_bullet(Bullet::Number);
        assert_ne!(a, c);
    }

    #[test]
    fn text_joins_fragment_values() {
        let p = Paragraph::new(vec![Fragment::new("foo "), Fragment::new("bar")]);
        assert_eq!(p.text(), "foo bar");
    }
}
