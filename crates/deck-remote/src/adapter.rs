use async_trait::async_trait;
use deck_model::Slide;

use crate::RemoteError;

/// `list_slides`'s result: the canonical slide sequence plus the opaque page
/// id the remote assigned each position. The engine never sees these ids —
/// only the apply driver and the adapter implementations care about them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSlides {
    pub slides: Vec<Slide>,
    pub page_ids: Vec<String>,
}

/// The seam between the reconciliation engine's plan and an actual
/// presentation backend. Every method is atomic from the engine's
/// perspective and index-stable: a `move`/`insert`/`delete` that succeeds
/// leaves every other live index exactly where the plan expects it.
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    async fn list_slides(&mut self) -> Result<RemoteSlides, RemoteError>;

    async fn append(&mut self, slide: &Slide) -> Result<(), RemoteError>;
    async fn insert(&mut self, slide: &Slide, at: usize) -> Result<(), RemoteError>;
    async fn update(&mut self, at: usize, slide: &Slide) -> Result<(), RemoteError>;
    async fn move_slide(&mut self, from: usize, to: usize) -> Result<(), RemoteError>;
    async fn delete(&mut self, at: usize) -> Result<(), RemoteError>;

    async fn list_layouts(&mut self) -> Result<Vec<String>, RemoteError>;
    async fn set_title(&mut self, title: &str) -> Result<(), RemoteError>;

    /// Writes a rendered export (e.g. PDF) of the current presentation.
    async fn export(&mut self, writer: &mut (dyn std::io::Write + Send)) -> Result<(), RemoteError>;
}
