//! Parse, merge, and rewrite metadata in audio files.
//!
//! The generic [`Tag`](tag::Tag) surface sits over every format-specific
//! tag, and a [`CombinedTag`](tag::CombinedTag) aggregates the multiple
//! tags a single file can carry. Saving re-renders only the tag regions
//! and splices them back in place, leaving the audio payload untouched.
//!
//! # Supported Formats
//!
//! | Format        | Container tags              | Sandwich tags    |
//! |---------------|-----------------------------|------------------|
//! | APE           |                             | ID3v1, ID3v2*, APE* |
//! | FLAC          | Xiph comment, pictures      | ID3v1, ID3v2*    |
//! | OGG           | Xiph comment per bitstream  |                  |
//! | WAV/AVI       | INFO, MovieID, DivX, ID3v2* |                  |
//!
//! `*` preserved byte-exact, not interpreted.
//!
//! # Examples
//!
//! ## Reading a generic file
//!
//! ```rust,no_run
//! # fn main() -> stave::error::Result<()> {
//! use stave::config::ParseOptions;
//! use stave::prelude::*;
//! use stave::read_from_path;
//!
//! // The format is guessed from the extension, falling back to a
//! // content probe
//! let tagged_file = read_from_path("test.flac", ParseOptions::new())?;
//!
//! let tag = tagged_file.tag();
//! println!("Title: {:?}", tag.title());
//! println!("Performers: {:?}", tag.performers());
//! # Ok(())
//! # }
//! ```
//!
//! ## Editing and saving
//!
//! ```rust,no_run
//! # fn main() -> stave::error::Result<()> {
//! use stave::config::{ParseOptions, WriteOptions};
//! use stave::prelude::*;
//! use stave::read_from_path;
//!
//! let mut tagged_file = read_from_path("test.flac", ParseOptions::new())?;
//!
//! let tag = tagged_file.tag_mut();
//! tag.set_title(String::from("Track A"));
//! tag.set_performers(vec![String::from("Artist")]);
//!
//! // Only the tag regions are rewritten
//! tagged_file.save_to_path("test.flac", WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Using concrete file types
//!
//! ```rust,no_run
//! # fn main() -> stave::error::Result<()> {
//! use stave::config::ParseOptions;
//! use stave::flac::FlacFile;
//! use stave::prelude::*;
//!
//! let mut file_content = std::fs::File::open("test.flac")?;
//! let flac_file = FlacFile::read_from(&mut file_content, ParseOptions::new())?;
//!
//! if let Some(comment) = flac_file.xiph_comment() {
//! 	println!("Vendor: {}", comment.vendor());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file;
pub(crate) mod macros;
pub mod picture;
pub mod properties;
pub mod tag;
mod util;

pub mod ape;
pub mod flac;
pub mod id3;
pub mod ogg;
pub mod riff;

pub use crate::file::{read_from, read_from_path, read_from_with_type};

pub use util::io;
pub use util::text::TextEncoding;

pub mod prelude {
	//! A prelude for commonly used items in the library.
	//!
	//! This module is intended to be wildcard imported.
	//!
	//! ```rust
	//! use stave::prelude::*;
	//! ```

	pub use crate::tag::{Tag, TagType, TagTypes};
}
