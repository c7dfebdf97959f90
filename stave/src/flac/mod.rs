//! Items for FLAC
//!
//! ## File notes
//!
//! * Pictures from `PICTURE` blocks and from comment-carried
//!   `METADATA_BLOCK_PICTURE` fields share the comment's picture store.
//!   Saving emits every picture as its own `PICTURE` block, never inside
//!   the comment.
//! * A sandwiched ID3v2 tag at the start of the file is preserved
//!   untouched, and an ID3v1 tag at the very end is fully supported.

pub(crate) mod block;
mod properties;
mod read;
mod write;

use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, StaveError};
use crate::ogg::XiphComment;
use crate::tag::{CombinedTag, Tag, TagType, TagTypes};
use crate::util::io::{FileLike, Length, Truncate};

use std::io::{Read, Seek};

// Exports
pub use properties::FlacProperties;

/// A FLAC file
pub struct FlacFile {
	pub(crate) tag: CombinedTag,
	pub(crate) extra_tag_types: TagTypes,
	pub(crate) properties: FlacProperties,
}

impl FlacFile {
	/// Read a `FlacFile` from a reader
	///
	/// # Errors
	///
	/// * The `"fLaC"` marker or the mandatory `STREAMINFO` block is missing
	/// * A metadata block is malformed
	pub fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		read::read_from(data, parse_options)
	}

	/// The file's tags: the Xiph comment, and an ID3v1 tag when present
	pub fn tag(&self) -> &CombinedTag {
		&self.tag
	}

	/// Mutable counterpart of [`FlacFile::tag`]
	pub fn tag_mut(&mut self) -> &mut CombinedTag {
		&mut self.tag
	}

	/// Every tag kind detected in the file
	///
	/// Unlike the aggregate's own mask this includes preserved-only tags
	/// (a sandwiched ID3v2), and reports picture blocks.
	pub fn tag_types(&self) -> TagTypes {
		let mut tag_types = self.tag.tag_types() | self.extra_tag_types;

		let has_pictures = self
			.tag
			.get_tag(TagType::Xiph)
			.and_then(|tag| tag.as_xiph())
			.is_some_and(|comment| !comment.picture_store().is_empty());
		if has_pictures {
			tag_types |= TagTypes::FLAC_PICTURES;
		}

		tag_types
	}

	/// The file's audio properties
	pub fn properties(&self) -> &FlacProperties {
		&self.properties
	}

	/// Detach every tag whose kind intersects `types`
	pub fn remove_tags(&mut self, types: TagTypes) {
		self.tag.remove_tags(types);
	}

	/// Save the file's tags back to `file`
	///
	/// All comment, picture, and padding blocks are re-rendered and spliced
	/// over the original metadata span; audio frames are never rewritten.
	/// Freed space becomes padding, see
	/// [`WriteOptions::preferred_padding`].
	///
	/// # Errors
	///
	/// * `file` does not contain valid FLAC metadata
	/// * A rendered block exceeds the 24-bit block length
	/// * [`std::io::Error`]
	pub fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> Result<()>
	where
		F: FileLike,
		StaveError: From<<F as Truncate>::Error>,
		StaveError: From<<F as Length>::Error>,
	{
		let comment = self
			.tag
			.get_tag(TagType::Xiph)
			.and_then(|tag| tag.as_xiph());
		let id3v1 = self
			.tag
			.get_tag(TagType::Id3v1)
			.and_then(|tag| tag.as_id3v1());

		write::write_to(file, comment, id3v1, write_options)
	}

	/// The file's Xiph comment, if one exists
	pub fn xiph_comment(&self) -> Option<&XiphComment> {
		self.tag.get_tag(TagType::Xiph).and_then(|tag| tag.as_xiph())
	}

	/// Mutable counterpart of [`FlacFile::xiph_comment`]
	pub fn xiph_comment_mut(&mut self) -> Option<&mut XiphComment> {
		self.tag
			.get_tag_mut(TagType::Xiph)
			.and_then(|tag| tag.as_xiph_mut())
	}
}
