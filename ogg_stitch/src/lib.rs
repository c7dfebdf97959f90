//! An OGG page reader and paginator
//!
//! This crate deals with the physical layer of OGG files only: reading
//! pages, reassembling packets, and segmenting packets back into pages
//! after their size has changed.

mod crc;
mod error;
mod header;
mod packets;
mod paginate;

use std::io::{Read, Seek, SeekFrom};

pub use crc::crc32;
pub use error::{PageError, Result};
pub use header::PageHeader;
pub use packets::{Packets, PacketsIter};
pub use paginate::paginate;

pub(crate) const CONTINUED_PACKET: u8 = 0x01;

/// The maximum page content size
pub const MAX_CONTENT_SIZE: usize = 65025;
/// The maximum number of segments a page can hold
pub const MAX_SEGMENT_COUNT: usize = 255;
/// The page is the first page of the logical bitstream
pub const CONTAINS_FIRST_PAGE_OF_BITSTREAM: u8 = 0x02;
/// The page is the last page of the logical bitstream
pub const CONTAINS_LAST_PAGE_OF_BITSTREAM: u8 = 0x04;

/// An OGG page
#[derive(Clone, PartialEq, Debug)]
pub struct Page {
	pub(crate) header: PageHeader,
	pub(crate) content: Vec<u8>,
	/// The position in the stream the page ended at
	pub end: u64,
}

impl Page {
	/// Returns a reference to the page's header
	pub fn header(&self) -> &PageHeader {
		&self.header
	}

	/// Returns a mutable reference to the page's header
	///
	/// NOTE: Any changes made here are not reflected in the checksum
	/// until [`Page::gen_crc`] is called.
	pub fn header_mut(&mut self) -> &mut PageHeader {
		&mut self.header
	}

	/// Returns the page's content
	pub fn content(&self) -> &[u8] {
		self.content.as_slice()
	}

	/// Consumes the page and returns its content
	pub fn take_content(self) -> Vec<u8> {
		self.content
	}

	/// Attempts to read a `Page` from a reader
	///
	/// # Errors
	///
	/// * [`std::io::Error`]
	/// * [`PageError`]
	pub fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		let header = PageHeader::read(data)?;

		let mut content = vec![0; header.content_size()];
		data.read_exact(&mut content)?;

		let end = data.stream_position()?;

		Ok(Page {
			header,
			content,
			end,
		})
	}

	/// Attempts to read a page header, seeking past its content
	///
	/// # Errors
	///
	/// * [`std::io::Error`]
	/// * [`PageError`]
	pub fn skip<R>(data: &mut R) -> Result<PageHeader>
	where
		R: Read + Seek,
	{
		let header = PageHeader::read(data)?;

		data.seek(SeekFrom::Current(header.content_size() as i64))?;

		Ok(header)
	}

	/// Convert the page to bytes for writing
	///
	/// NOTE: This will write the checksum as is. It is likely [`Page::gen_crc`]
	/// will have to be used prior.
	pub fn as_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(27 + self.header.segments.len() + self.content.len());

		bytes.extend(b"OggS");
		bytes.push(0);
		bytes.push(self.header.header_type_flag);
		bytes.extend(self.header.abgp.to_le_bytes());
		bytes.extend(self.header.stream_serial.to_le_bytes());
		bytes.extend(self.header.sequence_number.to_le_bytes());
		bytes.extend(self.header.checksum.to_le_bytes());
		bytes.push(self.header.segments.len() as u8);
		bytes.extend(self.header.segments.iter());
		bytes.extend(self.content.iter());

		bytes
	}

	/// Generates the CRC checksum of the page
	///
	/// The checksum covers the entire page with the checksum field zeroed.
	pub fn gen_crc(&mut self) {
		self.header.checksum = 0;
		self.header.checksum = crc::crc32(&self.as_bytes());
	}
}

/// Creates a segment table for a single packet of `length` bytes
///
/// A packet is laced as `length / 255` segments of 255 bytes, terminated
/// by one segment of `length % 255` bytes. A packet of an exact multiple
/// of 255 bytes therefore ends in a zero-length segment.
///
/// # Errors
///
/// * The resulting table would exceed [`MAX_SEGMENT_COUNT`]
pub fn segment_table(length: usize) -> Result<Vec<u8>> {
	let needed = (length / 255) + 1;

	if needed > MAX_SEGMENT_COUNT {
		return Err(PageError::TooMuchData);
	}

	let mut segments = vec![255u8; needed - 1];
	segments.push((length % 255) as u8);

	Ok(segments)
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::io::Cursor;

	#[test]
	fn segment_table_exact_multiple() {
		let table = segment_table(510).unwrap();
		assert_eq!(table, vec![255, 255, 0]);

		let table = segment_table(0).unwrap();
		assert_eq!(table, vec![0]);

		assert!(segment_table(MAX_CONTENT_SIZE * 2).is_err());
	}

	#[test]
	fn page_round_trip() {
		let content = vec![0xAB; 300];

		let mut header = PageHeader::new(CONTAINS_FIRST_PAGE_OF_BITSTREAM, 0, 1234, 0);
		header.segments = segment_table(content.len()).unwrap();

		let mut page = Page {
			header,
			content,
			end: 0,
		};
		page.gen_crc();

		let bytes = page.as_bytes();
		let read_back = Page::read(&mut Cursor::new(bytes)).unwrap();

		assert_eq!(read_back.header.stream_serial, 1234);
		assert_eq!(read_back.header.checksum, page.header.checksum);
		assert_eq!(read_back.content(), page.content());
	}
}
