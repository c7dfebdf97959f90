//! Minimal ID3v2 handling
//!
//! The frame structure of ID3v2 is not interpreted. A tag found in a
//! container is carried as an [`Id3v2Payload`] so it can survive a rewrite
//! (or be stripped), and tags sandwiched at the start of other formats are
//! skipped over when locating the real container data.

use crate::error::Result;
use crate::picture::Picture;
use crate::tag::{Tag, TagTypes};

use std::io::{Read, Seek, SeekFrom};

/// An opaque ID3v2 tag payload
///
/// The bytes include the full tag: header, frames, and footer if present.
/// None of the generic properties are readable through it; it exists so the
/// tag is preserved byte-exact across a save, and so
/// [`CombinedTag::remove_tags`](crate::tag::CombinedTag::remove_tags) can
/// drop it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Id3v2Payload {
	pub(crate) data: Vec<u8>,
}

impl Id3v2Payload {
	pub(crate) fn new(data: Vec<u8>) -> Self {
		Self { data }
	}

	/// The raw tag bytes
	pub fn data(&self) -> &[u8] {
		&self.data
	}
}

impl Tag for Id3v2Payload {
	fn tag_types(&self) -> TagTypes {
		TagTypes::ID3V2
	}

	fn pictures(&self) -> Vec<Picture> {
		Vec::new()
	}

	fn clear(&mut self) {
		self.data.clear();
	}
}

/// Skip over an ID3v2 tag if the reader is positioned at one
///
/// Returns the total number of bytes occupied by the tag (header, content,
/// and footer), leaving the reader positioned directly after it. When no
/// tag is present the reader is left untouched.
pub(crate) fn skip_id3v2<R>(data: &mut R) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;

	let mut header = [0; 10];
	if data.read_exact(&mut header).is_err() {
		data.seek(SeekFrom::Start(start))?;
		return Ok(None);
	}

	if &header[..3] != b"ID3" {
		data.seek(SeekFrom::Start(start))?;
		return Ok(None);
	}

	// Size is a 28-bit synchsafe integer
	let size = (u64::from(header[6] & 0x7F) << 21)
		| (u64::from(header[7] & 0x7F) << 14)
		| (u64::from(header[8] & 0x7F) << 7)
		| u64::from(header[9] & 0x7F);

	let mut total = 10 + size;

	// Footer flag
	if header[5] & 0x10 != 0 {
		total += 10;
	}

	log::debug!("Skipping an ID3v2 tag of {total} bytes");

	data.seek(SeekFrom::Start(start + total))?;

	Ok(Some(total))
}

#[cfg(test)]
mod tests {
	use super::skip_id3v2;

	use std::io::{Cursor, Seek};

	#[test_log::test]
	fn skips_tag_with_synchsafe_size() {
		// Header advertising 0x101 content bytes
		let mut bytes = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0x02, 0x01];
		bytes.extend(vec![0xFF; 0x101]);
		bytes.extend(b"fLaC");

		let mut reader = Cursor::new(bytes);
		let skipped = skip_id3v2(&mut reader).unwrap();

		assert_eq!(skipped, Some(10 + 0x101));
		assert_eq!(reader.stream_position().unwrap(), 10 + 0x101);
	}

	#[test_log::test]
	fn no_tag_leaves_reader_untouched() {
		let mut reader = Cursor::new(b"fLaC....".to_vec());
		assert_eq!(skip_id3v2(&mut reader).unwrap(), None);
		assert_eq!(reader.stream_position().unwrap(), 0);
	}
}
