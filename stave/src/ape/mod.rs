//! Items for Monkey's Audio (APE)
//!
//! ## File notes
//!
//! * An ID3v2 tag at the start of the file and an APEv2 tag at the end are
//!   preserved untouched; their presence is reported through
//!   [`ApeFile::tag_types`]
//! * The writable tag of an APE file is the trailing ID3v1 tag

mod properties;
mod read;

use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, StaveError};
use crate::id3::v1::write_id3v1;
use crate::tag::{CombinedTag, Tag, TagType, TagTypes};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek};

// Exports
pub use properties::ApeProperties;

/// A Monkey's Audio file
pub struct ApeFile {
	pub(crate) tag: CombinedTag,
	pub(crate) extra_tag_types: TagTypes,
	pub(crate) properties: ApeProperties,
}

impl ApeFile {
	/// Read an `ApeFile` from a reader
	///
	/// # Errors
	///
	/// * The `"MAC "` marker is missing
	/// * The stream header is malformed
	pub fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		read::read_from(data, parse_options)
	}

	/// The file's tags
	pub fn tag(&self) -> &CombinedTag {
		&self.tag
	}

	/// Mutable counterpart of [`ApeFile::tag`]
	pub fn tag_mut(&mut self) -> &mut CombinedTag {
		&mut self.tag
	}

	/// Every tag kind detected in the file
	///
	/// Unlike the aggregate's own mask this includes preserved-only tags
	/// (a sandwiched ID3v2 or an APEv2 tag).
	pub fn tag_types(&self) -> TagTypes {
		self.tag.tag_types() | self.extra_tag_types
	}

	/// The file's audio properties
	pub fn properties(&self) -> &ApeProperties {
		&self.properties
	}

	/// Detach every tag whose kind intersects `types`
	pub fn remove_tags(&mut self, types: TagTypes) {
		self.tag.remove_tags(types);
	}

	/// Save the file's tags back to `file`
	///
	/// Only the trailing 128-byte ID3v1 region is rewritten (or stripped);
	/// everything else stays untouched.
	///
	/// # Errors
	///
	/// * [`std::io::Error`]
	pub fn save_to<F>(&self, file: &mut F, _write_options: WriteOptions) -> Result<()>
	where
		F: FileLike,
		StaveError: From<<F as Truncate>::Error>,
		StaveError: From<<F as Length>::Error>,
	{
		let id3v1 = self
			.tag
			.get_tag(TagType::Id3v1)
			.and_then(|tag| tag.as_id3v1());

		write_id3v1(file, id3v1)
	}
}
