/// An image placeholder's content.
///
/// Equality is by content checksum rather than by the `source` string or raw
/// bytes: two images with different URLs (or re-encoded bytes) that hash to
/// the same checksum are the same image for reconciliation purposes, and two
/// images fetched from the same URL at different times are different images
/// if their content changed.
#[derive(Debug, Clone)]
pub struct Image {
    pub source: String,
    pub bytes: Vec<u8>,
    checksum: blake3::Hash,
}

impl Image {
    pub fn from_bytes(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        let checksum = blake3::hash(&bytes);
        Self {
            source: source.into(),
            bytes,
            checksum,
        }
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::from_bytes(String::new(), Vec::new())
    }
}

impl Image {
    pub fn checksum(&self) -> &blake3::Hash {
        &self.checksum
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.checksum == other.checksum
    }
}
impl Eq for Image {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_checksum_not_source() {
        let a = Image::from_bytes("a.png", vec![1, 2, 3]);
        let b = Image::from_bytes("b.png", vec![1, 2, 3]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_are_unequal() {
        let a = Image::from_bytes("a.png", vec![1, 2, 3]);
        let b = Image::from_bytes("a.png", vec![1, 2, 4]);
        assert_ne!(a, b);
    }
}
