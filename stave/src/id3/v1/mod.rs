//! ID3v1 items
//!
//! ## Format notes
//!
//! ID3v1 is a severely limited format, with each field being incredibly
//! small in size. Attempting to write a field greater than its maximum
//! size will **not** error, it will just be shrunk on render.

pub(crate) mod constants;
mod read;
mod tag;
mod write;

pub use constants::GENRES;
pub use tag::Id3v1Tag;

pub(crate) use write::{encode, write_id3v1};
