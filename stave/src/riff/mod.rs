//! Items for RIFF containers (WAV/AVI)
//!
//! ## File notes
//!
//! Tag chunks may be scattered non-contiguously through a RIFF file. When
//! they form one contiguous run (`JUNK` chunks included), a save replaces
//! the whole run in a single splice; otherwise each tag chunk is removed
//! individually before the new region is inserted. See
//! [`RiffFile::save_to`].

pub(crate) mod chunk;
mod divx;
mod info;
mod properties;
mod read;
mod write;

use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, StaveError};
use crate::tag::{CombinedTag, TagType, TagTypes};
use crate::util::io::{FileLike, Length, Truncate};
use write::RiffTagsRef;

use std::io::{Read, Seek};

// Exports
pub use divx::{DivxTag, VIDEO_GENRES};
pub use info::{InfoTag, MovieIdTag, RiffListTag};
pub use properties::{AviProperties, RiffProperties, WavProperties};

/// The form type of a RIFF file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RiffForm {
	/// A `WAVE` form, audio
	Wave,
	/// An `AVI ` form, video
	Avi,
}

/// A RIFF file, covering both the WAV and AVI forms
pub struct RiffFile {
	pub(crate) form: RiffForm,
	pub(crate) tag: CombinedTag,
	pub(crate) properties: RiffProperties,
}

impl RiffFile {
	/// Read a `RiffFile` from a reader
	///
	/// # Errors
	///
	/// * The RIFF header is missing or of an unsupported form
	/// * A chunk extends past the end of the file
	pub fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		read::read_from(data, parse_options)
	}

	/// The file's form type
	pub fn form(&self) -> RiffForm {
		self.form
	}

	/// The file's tags
	pub fn tag(&self) -> &CombinedTag {
		&self.tag
	}

	/// Mutable counterpart of [`RiffFile::tag`]
	pub fn tag_mut(&mut self) -> &mut CombinedTag {
		&mut self.tag
	}

	/// The file's properties
	pub fn properties(&self) -> &RiffProperties {
		&self.properties
	}

	/// Detach every tag whose kind intersects `types`
	pub fn remove_tags(&mut self, types: TagTypes) {
		self.tag.remove_tags(types);
	}

	/// Save the file's tags back to `file`
	///
	/// Contiguous tag chunks are replaced in a single splice; scattered
	/// ones are removed individually first. Freed space is reused as a
	/// `JUNK` chunk, and the top-level RIFF size field is rewritten
	/// afterwards.
	///
	/// # Errors
	///
	/// * `file` does not contain a valid RIFF header
	/// * [`std::io::Error`]
	pub fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> Result<()>
	where
		F: FileLike,
		StaveError: From<<F as Truncate>::Error>,
		StaveError: From<<F as Length>::Error>,
	{
		let tags = RiffTagsRef {
			id3v2: self
				.tag
				.get_tag(TagType::Id3v2)
				.and_then(|tag| tag.as_id3v2()),
			info: self
				.tag
				.get_tag(TagType::RiffInfo)
				.and_then(|tag| tag.as_info()),
			movie_id: self
				.tag
				.get_tag(TagType::MovieId)
				.and_then(|tag| tag.as_movie_id()),
			divx: self.tag.get_tag(TagType::Divx).and_then(|tag| tag.as_divx()),
		};

		write::write_to(file, &tags, write_options)
	}
}
