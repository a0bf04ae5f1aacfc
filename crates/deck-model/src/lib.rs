//! Canonical slide value model.
//!
//! This crate is the dependency-free leaf of the workspace: every other
//! crate either constructs, diffs, or renders these types, but nothing here
//! knows about Markdown, HTTP, or the filesystem.
//!
//! Equality is the whole point of this crate. `Slide`'s `PartialEq` impl is
//! the content-equality law the reconciliation engine relies on: layout,
//! titles, subtitles, bodies, block quotes, tables, images and the speaker
//! note all participate; `freeze` and `skip` are policy flags and are
//! deliberately excluded from it.

mod blockquote;
mod body;
mod fragment;
mod image;
mod slide;
mod table;

pub use blockquote::BlockQuote;
pub use body::{Body, Bullet, Paragraph};
pub use fragment::Fragment;
pub use image::Image;
pub use slide::Slide;
pub use table::{Alignment, Table, TableCell, TableRow};
