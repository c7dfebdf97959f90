use crate::error::{ErrorKind, Result, StaveError};
use crate::macros::err;

/// Errors that can occur while encoding text
#[derive(Copy, Clone, Debug)]
pub struct TextEncodingError {
	encoding: TextEncoding,
	valid_up_to: usize,
}

impl TextEncodingError {
	/// The target text encoding
	pub fn encoding(&self) -> TextEncoding {
		self.encoding
	}

	/// The byte index in the provided string up to which the encoding was valid
	pub fn valid_up_to(&self) -> usize {
		self.valid_up_to
	}
}

impl core::fmt::Display for TextEncodingError {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let encoding = match self.encoding {
			TextEncoding::Latin1 => "Latin-1",
			TextEncoding::UTF16 => "UTF-16",
			TextEncoding::UTF8 => "UTF-8",
		};

		write!(
			f,
			"invalid {encoding} sequence from index {}",
			self.valid_up_to
		)
	}
}

impl core::error::Error for TextEncodingError {}

/// A text encoding found in tag data
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
pub enum TextEncoding {
	/// ISO-8859-1
	Latin1,
	/// UTF-16 with a byte order mark
	UTF16,
	/// UTF-8
	UTF8,
}

pub(crate) fn latin1_decode(bytes: &[u8]) -> String {
	let mut text = bytes.iter().map(|c| *c as char).collect::<String>();
	trim_end_nulls(&mut text);
	text
}

pub(crate) fn latin1_encode(
	s: &str,
	lossy: bool,
) -> impl Iterator<Item = std::result::Result<u8, TextEncodingError>> {
	s.chars().enumerate().map(move |(index, c)| {
		if (c as u32) <= 255 {
			Ok(c as u8)
		} else if lossy {
			Ok(b'?')
		} else {
			Err(TextEncodingError {
				encoding: TextEncoding::Latin1,
				valid_up_to: index,
			})
		}
	})
}

pub(crate) fn utf8_decode(bytes: Vec<u8>) -> Result<String> {
	String::from_utf8(bytes)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(Into::into)
}

pub(crate) fn utf8_decode_str(bytes: &[u8]) -> Result<&str> {
	std::str::from_utf8(bytes)
		.map(trim_end_nulls_str)
		.map_err(Into::into)
}

#[allow(dead_code)]
pub(crate) fn utf16_decode(words: &[u16]) -> Result<String> {
	String::from_utf16(words)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(|_| StaveError::new(ErrorKind::TextDecode("Given an invalid UTF-16 string")))
}

#[allow(dead_code)]
pub(crate) fn utf16_decode_bytes(bytes: &[u8], endianness: fn([u8; 2]) -> u16) -> Result<String> {
	if bytes.is_empty() {
		return Ok(String::new());
	}

	if bytes.len() % 2 != 0 {
		err!(TextDecode("UTF-16 string has an odd length"));
	}

	let unverified: Vec<u16> = bytes
		.chunks_exact(2)
		// A byte order mark is not text content, strip any we encounter
		.filter_map(|c| match c {
			[0xFF, 0xFE] | [0xFE, 0xFF] => None,
			_ => Some(endianness(c.try_into().unwrap())), // Infallible
		})
		.collect();

	utf16_decode(&unverified)
}

#[allow(dead_code)]
pub(crate) fn utf16_encode(text: &str, endianness: fn(u16) -> [u8; 2], bom: bool) -> Vec<u8> {
	let mut encoded = Vec::<u8>::new();

	if bom {
		encoded.extend_from_slice(&endianness(0xFEFF_u16));
	}

	for ch in text.encode_utf16() {
		encoded.extend_from_slice(&endianness(ch));
	}

	encoded
}

pub(crate) fn trim_end_nulls(text: &mut String) {
	if text.ends_with('\0') {
		let new_len = text.trim_end_matches('\0').len();
		text.truncate(new_len);
	}
}

pub(crate) fn trim_end_nulls_str(text: &str) -> &str {
	text.trim_end_matches('\0')
}

#[cfg(test)]
mod tests {
	const TEST_STRING: &str = "st\u{00e5}v\u{00a5}";

	#[test_log::test]
	fn latin1_round_trip() {
		let encoded = super::latin1_encode(TEST_STRING, false)
			.collect::<Result<Vec<u8>, _>>()
			.unwrap();

		assert_eq!(super::latin1_decode(&encoded), TEST_STRING);
	}

	#[test_log::test]
	fn latin1_lossy() {
		// '€' is not representable in Latin-1
		let lossy = super::latin1_encode("a\u{20ac}b", true)
			.collect::<Result<Vec<u8>, _>>()
			.unwrap();
		assert_eq!(lossy, b"a?b");

		assert!(
			super::latin1_encode("a\u{20ac}b", false)
				.collect::<Result<Vec<u8>, _>>()
				.is_err()
		);
	}

	#[test_log::test]
	fn utf16_decode() {
		let be = super::utf16_decode_bytes(
			&[0xFE, 0xFF, 0x00, 0x73, 0x00, 0x74, 0x00, 0xE5],
			u16::from_be_bytes,
		)
		.unwrap();
		let le = super::utf16_decode_bytes(
			&[0xFF, 0xFE, 0x73, 0x00, 0x74, 0x00, 0xE5, 0x00],
			u16::from_le_bytes,
		)
		.unwrap();

		assert_eq!(be, le);
		assert_eq!(be, "st\u{00e5}");

		assert!(super::utf16_decode_bytes(&[0x00], u16::from_be_bytes).is_err());
	}

	#[test_log::test]
	fn null_trimming() {
		assert_eq!(super::latin1_decode(b"abc\0\0"), "abc");
		assert_eq!(super::trim_end_nulls_str("abc\0"), "abc");
	}
}
