//! The remote adapter seam: one trait the reconciliation engine's plan is
//! executed against, one in-memory implementation for tests, one real HTTP
//! implementation.

mod adapter;
mod error;
mod memory;
mod slides;

pub use adapter::{RemoteAdapter, RemoteSlides};
pub use error::RemoteError;
pub use memory::MemoryAdapter;
pub use slides::SlidesAdapter;
