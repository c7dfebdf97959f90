use crate::error::Result;
use crate::macros::{err, try_vec};

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

pub(crate) const RIFF_CHUNK_HEADER_SIZE: u64 = 8;

// A lightweight descriptor for a top-level RIFF chunk
//
// Only the header is read during a scan; the payload is loaded on demand
// through `read_content`, so tag-less opens never materialize the audio
// or movie data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChunkDescriptor {
	pub(crate) fourcc: [u8; 4],
	/// Absolute offset of the chunk header
	pub(crate) start: u64,
	/// The stored size, excluding the header and any pad byte
	pub(crate) size: u32,
	/// The type fourcc of a `LIST` chunk
	pub(crate) list_type: Option<[u8; 4]>,
}

impl ChunkDescriptor {
	// Chunks are expected to start on even boundaries, and are padded
	// with a 0 if necessary. This is NOT included in the chunk's size.
	pub(crate) fn pad(&self) -> u64 {
		u64::from(self.size % 2 != 0)
	}

	/// The full on-disk footprint: header, payload, and pad byte
	pub(crate) fn total_len(&self) -> u64 {
		RIFF_CHUNK_HEADER_SIZE + u64::from(self.size) + self.pad()
	}

	pub(crate) fn end(&self) -> u64 {
		self.start + self.total_len()
	}

	/// Load the chunk's payload
	///
	/// For `LIST` chunks this includes the leading type fourcc. The
	/// reader's position is not preserved.
	pub(crate) fn read_content<R>(&self, data: &mut R) -> Result<Vec<u8>>
	where
		R: Read + Seek,
	{
		data.seek(SeekFrom::Start(self.start + RIFF_CHUNK_HEADER_SIZE))?;

		let mut content = try_vec![0; self.size as usize];
		data.read_exact(&mut content)?;

		Ok(content)
	}

	pub(crate) fn is_junk(&self) -> bool {
		&self.fourcc == b"JUNK"
	}

	pub(crate) fn is_tag_chunk(&self) -> bool {
		match &self.fourcc {
			b"id3 " | b"ID3 " | b"ID32" | b"IDVX" => true,
			b"LIST" => matches!(self.list_type.as_ref(), Some(b"INFO" | b"MID ")),
			_ => false,
		}
	}
}

/// Walk every top-level chunk of the file, collecting descriptors
///
/// The reader must be positioned directly past the 12-byte RIFF header.
pub(crate) fn scan_chunks<R>(data: &mut R, file_len: u64) -> Result<Vec<ChunkDescriptor>>
where
	R: Read + Seek,
{
	let mut chunks = Vec::new();

	let mut pos = data.stream_position()?;
	while pos + RIFF_CHUNK_HEADER_SIZE <= file_len {
		let mut fourcc = [0; 4];
		data.read_exact(&mut fourcc)?;
		let size = data.read_u32::<LittleEndian>()?;

		if pos + RIFF_CHUNK_HEADER_SIZE + u64::from(size) > file_len {
			err!(SizeMismatch);
		}

		let mut list_type = None;
		if &fourcc == b"LIST" {
			if size < 4 {
				err!(SizeMismatch);
			}

			let mut ty = [0; 4];
			data.read_exact(&mut ty)?;
			data.seek(SeekFrom::Current(-4))?;

			list_type = Some(ty);
		}

		let descriptor = ChunkDescriptor {
			fourcc,
			start: pos,
			size,
			list_type,
		};

		log::trace!(
			"Found chunk {:?} at {pos}, size: {size}",
			String::from_utf8_lossy(&fourcc)
		);

		pos = descriptor.end();
		data.seek(SeekFrom::Start(pos))?;

		chunks.push(descriptor);
	}

	Ok(chunks)
}

#[cfg(test)]
mod tests {
	use super::{ChunkDescriptor, scan_chunks};

	use std::io::{Cursor, Seek, SeekFrom};

	fn chunk(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(fourcc);
		bytes.extend((content.len() as u32).to_le_bytes());
		bytes.extend_from_slice(content);
		if content.len() % 2 != 0 {
			bytes.push(0);
		}
		bytes
	}

	#[test_log::test]
	fn scan_handles_odd_sizes_and_lists(){
		let mut file = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
		file.extend(chunk(b"fmt ", &[0; 16]));
		file.extend(chunk(b"odd ", &[1, 2, 3]));
		file.extend(chunk(b"LIST", b"INFOabcd"));

		let file_len = file.len() as u64;
		let mut reader = Cursor::new(file);
		reader.seek(SeekFrom::Start(12)).unwrap();

		let chunks = scan_chunks(&mut reader, file_len).unwrap();
		assert_eq!(chunks.len(), 3);

		assert_eq!(&chunks[0].fourcc, b"fmt ");
		assert_eq!(chunks[1].size, 3);
		assert_eq!(chunks[1].pad(), 1);
		assert_eq!(chunks[2].list_type, Some(*b"INFO"));
		assert!(chunks[2].is_tag_chunk());

		// Descriptors tile the file exactly
		assert_eq!(chunks[0].end(), chunks[1].start);
		assert_eq!(chunks[1].end(), chunks[2].start);
		assert_eq!(chunks[2].end(), file_len);
	}

	#[test_log::test]
	fn lazy_content_load() {
		let mut file = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
		file.extend(chunk(b"data", b"payload!"));

		let mut reader = Cursor::new(file.clone());
		reader.seek(SeekFrom::Start(12)).unwrap();

		let chunks = scan_chunks(&mut reader, file.len() as u64).unwrap();
		let content = chunks[0].read_content(&mut reader).unwrap();
		assert_eq!(content, b"payload!");
	}

	#[test_log::test]
	fn oversized_chunk_rejected() {
		let mut file = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
		file.extend(b"data");
		file.extend(1000u32.to_le_bytes());

		let file_len = file.len() as u64;
		let mut reader = Cursor::new(file);
		reader.seek(SeekFrom::Start(12)).unwrap();

		assert!(scan_chunks(&mut reader, file_len).is_err());
	}

	#[test_log::test]
	fn tag_chunk_identification() {
		let id3 = ChunkDescriptor {
			fourcc: *b"id3 ",
			start: 0,
			size: 10,
			list_type: None,
		};
		assert!(id3.is_tag_chunk());

		let movi = ChunkDescriptor {
			fourcc: *b"LIST",
			start: 0,
			size: 10,
			list_type: Some(*b"movi"),
		};
		assert!(!movi.is_tag_chunk());
	}
}
