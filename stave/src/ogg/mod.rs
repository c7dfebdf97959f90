//! Items for OGG container formats
//!
//! ## File notes
//!
//! A single physical OGG file multiplexes one or more logical bitstreams,
//! each identified by a serial number. Every logical bitstream is required
//! to carry exactly one comment header, so comments can be replaced but
//! never added or removed outright, see [`OggFile::remove_tags`].

pub(crate) mod constants;
mod properties;
pub(crate) mod read;
pub(crate) mod tag;
pub(crate) mod write;

use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, StaveError};
use crate::macros::{decode_err, err};
use crate::tag::{CombinedTag, TagTypes};
use crate::util::io::{FileLike, Length, Truncate};
use constants::{OPUSHEAD, OPUSTAGS, SPEEXHEADER, VORBIS_COMMENT_HEAD, VORBIS_IDENT_HEAD};

use std::io::{Read, Seek};

// Exports
pub use properties::OggProperties;
pub use tag::XiphComment;

/// The codec of a logical bitstream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OggFormat {
	/// Vorbis audio
	Vorbis,
	/// Opus audio
	Opus,
	/// Speex audio
	Speex,
}

impl OggFormat {
	pub(crate) fn identify(identification_packet: &[u8]) -> Result<Self> {
		if identification_packet.starts_with(VORBIS_IDENT_HEAD) {
			return Ok(OggFormat::Vorbis);
		}

		if identification_packet.starts_with(OPUSHEAD) {
			return Ok(OggFormat::Opus);
		}

		if identification_packet.starts_with(SPEEXHEADER) {
			return Ok(OggFormat::Speex);
		}

		decode_err!(@BAIL Ogg, "Unsupported codec in OGG bitstream")
	}

	pub(crate) fn comment_signature(self) -> &'static [u8] {
		match self {
			OggFormat::Vorbis => VORBIS_COMMENT_HEAD,
			OggFormat::Opus => OPUSTAGS,
			// Speex comment headers carry no signature
			OggFormat::Speex => &[],
		}
	}

	pub(crate) fn has_framing_bit(self) -> bool {
		self == OggFormat::Vorbis
	}
}

pub(crate) fn verify_signature(content: &[u8], sig: &[u8]) -> Result<()> {
	if content.len() < sig.len() || &content[..sig.len()] != sig {
		decode_err!(@BAIL Ogg, "Expected a packet signature");
	}

	Ok(())
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct OggStream {
	pub(crate) serial: u32,
	#[allow(dead_code)]
	pub(crate) format: OggFormat,
}

/// An OGG file
///
/// ## Notes
///
/// * The file's tag aggregates one [`XiphComment`] per logical bitstream,
///   in bitstream discovery order
/// * Comments can only be *replaced*; creating or removing them outright is
///   unsupported
pub struct OggFile {
	pub(crate) streams: Vec<OggStream>,
	pub(crate) tag: CombinedTag,
	pub(crate) properties: OggProperties,
}

impl OggFile {
	/// Read an `OggFile` from a reader
	///
	/// # Errors
	///
	/// * The reader contains no OGG pages
	/// * A bitstream uses an unsupported codec, or is missing its comment
	///   header
	pub fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		read::read_from(data, parse_options)
	}

	/// The file's comments, one [`XiphComment`] member per logical bitstream
	pub fn tag(&self) -> &CombinedTag {
		&self.tag
	}

	/// Mutable counterpart of [`OggFile::tag`]
	pub fn tag_mut(&mut self) -> &mut CombinedTag {
		&mut self.tag
	}

	/// The comment of the bitstream with `serial`, if one exists
	pub fn comment_by_serial(&self, serial: u32) -> Option<&XiphComment> {
		let idx = self
			.streams
			.iter()
			.position(|stream| stream.serial == serial)?;
		self.tag.tags().get(idx).and_then(|tag| tag.as_xiph())
	}

	/// The file's audio properties, describing the first logical bitstream
	pub fn properties(&self) -> &OggProperties {
		&self.properties
	}

	/// Removing comments is not supported
	///
	/// Every logical bitstream must carry exactly one comment header; they
	/// can be replaced (cleared), but never removed from the container.
	///
	/// # Errors
	///
	/// Always, with
	/// [`ErrorKind::UnsupportedTag`](crate::error::ErrorKind::UnsupportedTag)
	pub fn remove_tags(&mut self, _types: TagTypes) -> Result<()> {
		err!(UnsupportedTag)
	}

	/// Save the file's comments back to `file`
	///
	/// Every logical bitstream is re-paginated with its updated comment
	/// header and the streams are re-interleaved page by page.
	///
	/// # Errors
	///
	/// * `file` does not contain a valid OGG physical stream
	/// * [`std::io::Error`]
	pub fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> Result<()>
	where
		F: FileLike,
		StaveError: From<<F as Truncate>::Error>,
		StaveError: From<<F as Length>::Error>,
	{
		let comments: Vec<&XiphComment> = self
			.tag
			.tags()
			.iter()
			.filter_map(|tag| tag.as_xiph())
			.collect();

		write::write_to(file, &comments, write_options)
	}
}
