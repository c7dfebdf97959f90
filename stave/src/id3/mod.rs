//! ID3 specific items
//!
//! ID3v1 is fully supported. ID3v2 tags are located and carried as opaque
//! payloads only, see [`Id3v2Payload`](crate::id3::v2::Id3v2Payload).

pub mod v1;
pub mod v2;

use crate::config::ParsingMode;
use crate::error::Result;
use v1::constants::ID3V1_TAG_MARKER;

pub use v2::Id3v2Payload;

use std::io::{Read, Seek, SeekFrom};

pub(crate) struct ID3FindResults<Header, Content>(pub Option<Header>, pub Content);

pub(crate) fn find_id3v1<R>(
	data: &mut R,
	read: bool,
	parse_mode: ParsingMode,
) -> Result<ID3FindResults<(), Option<v1::Id3v1Tag>>>
where
	R: Read + Seek,
{
	log::debug!("Searching for an ID3v1 tag");

	let mut id3v1 = None;
	let mut header = None;

	// Reader is too small to contain an ID3v1 tag
	if data.seek(SeekFrom::End(-128)).is_err() {
		data.seek(SeekFrom::End(0))?;
		return Ok(ID3FindResults(header, id3v1));
	}

	let mut id3v1_header = [0; 3];
	data.read_exact(&mut id3v1_header)?;

	data.seek(SeekFrom::Current(-3))?;

	// No ID3v1 tag found
	if id3v1_header != ID3V1_TAG_MARKER {
		data.seek(SeekFrom::End(0))?;
		return Ok(ID3FindResults(header, id3v1));
	}

	log::debug!("Found an ID3v1 tag, parsing");

	header = Some(());

	if read {
		let mut id3v1_tag = [0; 128];
		data.read_exact(&mut id3v1_tag)?;

		data.seek(SeekFrom::End(-128))?;

		id3v1 = Some(v1::Id3v1Tag::parse(id3v1_tag, parse_mode)?)
	}

	Ok(ID3FindResults(header, id3v1))
}
