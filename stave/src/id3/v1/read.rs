use super::constants::ID3V1_TAG_MARKER;
use super::tag::Id3v1Tag;
use crate::config::ParsingMode;
use crate::error::StaveError;
use crate::macros::err;
use crate::util::text::latin1_decode;

impl Id3v1Tag {
	/// Parse an `Id3v1Tag` from its fixed 128-byte layout
	///
	/// # Errors
	///
	/// * The `"TAG"` marker is missing
	/// * The year field is malformed (only in [`ParsingMode::Strict`])
	pub fn parse(reader: [u8; 128], parse_mode: ParsingMode) -> Result<Self, StaveError> {
		let mut tag = Self::default();

		if reader[..3] != ID3V1_TAG_MARKER {
			err!(FakeTag);
		}

		let reader = &reader[3..];

		tag.title = decode_text(&reader[..30]);
		tag.artist = decode_text(&reader[30..60]);
		tag.album = decode_text(&reader[60..90]);

		tag.year = try_parse_year(&reader[90..94], parse_mode)?;

		// Determine the range of the comment (30 bytes for ID3v1 and 28 for ID3v1.1)
		// We check for the null terminator 28 bytes in, and for a non-zero track number after it.
		// A track number of 0 is invalid.
		let range = if reader[122] == 0 && reader[123] != 0 {
			tag.track = Some(reader[123]);

			94_usize..122
		} else {
			94..124
		};

		tag.comment = decode_text(&reader[range]);

		if reader[124] != 255 {
			tag.genre = Some(reader[124]);
		}

		Ok(tag)
	}
}

fn decode_text(data: &[u8]) -> Option<String> {
	let mut first_null_pos = data.len();
	if let Some(null_pos) = data.iter().position(|&b| b == 0) {
		if null_pos == 0 {
			return None;
		}

		if data[null_pos..].iter().any(|b| *b != b'\0') {
			log::warn!("ID3v1 text field contains trailing junk, skipping");
		}

		first_null_pos = null_pos;
	}

	Some(latin1_decode(&data[..first_null_pos]))
}

fn try_parse_year(input: &[u8], parse_mode: ParsingMode) -> Result<Option<u32>, StaveError> {
	let (num_digits, year) = input
		.iter()
		.take_while(|c| (**c).is_ascii_digit())
		.fold((0usize, 0u32), |(num_digits, year), c| {
			(num_digits + 1, year * 10 + u32::from(*c - b'0'))
		});
	if num_digits != 4 {
		// Most writers emit "\0\0\0\0" for an empty year rather than
		// "0000", so a short year is only fatal when strict.
		if parse_mode == ParsingMode::Strict && input.iter().any(|b| *b != 0) {
			err!(TextDecode("ID3v1 year field contains non-digit characters"));
		}

		return Ok(None);
	}

	Ok(Some(year))
}
