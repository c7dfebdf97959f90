use super::constants::ID3V1_TAG_MARKER;
use super::tag::Id3v1Tag;
use crate::config::ParsingMode;
use crate::error::{Result, StaveError};
use crate::id3::{ID3FindResults, find_id3v1};
use crate::tag::Tag as _;
use crate::util::io::{self, FileLike, Length, Truncate};
use crate::util::text::latin1_encode;

use std::io::Write;

use byteorder::WriteBytesExt;

// An ID3v1 tag occupies exactly the last 128 bytes of the file, so writing
// is either an overwrite of that region, an append, or a truncation.
pub(crate) fn write_id3v1<F>(file: &mut F, tag: Option<&Id3v1Tag>) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	let ID3FindResults(header, _) = find_id3v1(file, false, ParsingMode::BestAttempt)?;
	let file_length = file.len()?;

	let tag = tag.filter(|tag| !tag.is_empty());

	match (tag, header.is_some()) {
		(Some(tag), true) => {
			let encoded = encode(tag)?;
			io::insert(file, &encoded, file_length - 128, 128)
		},
		(Some(tag), false) => {
			let encoded = encode(tag)?;
			io::insert(file, &encoded, file_length, 0)
		},
		(None, true) => {
			log::debug!("Stripping the existing ID3v1 tag");

			file.truncate(file_length - 128)?;
			Ok(())
		},
		(None, false) => Ok(()),
	}
}

// ID3v1 is always rendered lossy, there is no way to signal an encoding
// and the fields are hard-truncated anyway.
fn resize_string(value: Option<&str>, size: usize) -> Result<Vec<u8>> {
	let mut out = vec![0; size];

	if let Some(val) = value {
		for (i, b) in latin1_encode(val, true).take(size).enumerate() {
			out[i] = b?;
		}
	}

	Ok(out)
}

pub(crate) fn encode(tag: &Id3v1Tag) -> Result<Vec<u8>> {
	let mut writer = Vec::with_capacity(128);

	writer.write_all(&ID3V1_TAG_MARKER)?;

	let title = resize_string(tag.title.as_deref(), 30)?;
	writer.write_all(&title)?;

	let artist = resize_string(tag.artist.as_deref(), 30)?;
	writer.write_all(&artist)?;

	let album = resize_string(tag.album.as_deref(), 30)?;
	writer.write_all(&album)?;

	let mut year = [0; 4];
	if let Some(year_num) = tag.year {
		let mut year_num = std::cmp::min(year_num, 9999);

		let mut idx = 3;
		loop {
			year[idx] = b'0' + (year_num % 10) as u8;
			year_num /= 10;

			if idx == 0 {
				break;
			}

			idx -= 1;
		}
	}

	writer.write_all(&year)?;

	// A V1.1 layout is always written: 28 comment bytes, a zero
	// discriminant, and the track number
	let comment = resize_string(tag.comment.as_deref(), 28)?;
	writer.write_all(&comment)?;

	writer.write_u8(0)?;

	writer.write_u8(tag.track.unwrap_or(0))?;
	writer.write_u8(tag.genre.unwrap_or(255))?;

	Ok(writer)
}
