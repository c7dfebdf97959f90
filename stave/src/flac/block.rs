use crate::error::Result;
use crate::macros::{err, try_vec};
use crate::ogg::tag::XiphComment;
use crate::ogg::write::create_comment_packet;
use crate::picture::{Picture, PictureInformation};

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

pub(crate) const BLOCK_ID_STREAMINFO: u8 = 0;
pub(crate) const BLOCK_ID_PADDING: u8 = 1;
pub(crate) const BLOCK_ID_VORBIS_COMMENTS: u8 = 4;
pub(crate) const BLOCK_ID_PICTURE: u8 = 6;

pub(crate) const BLOCK_HEADER_SIZE: u64 = 4;

// The block length field is 24 bits
const MAX_BLOCK_SIZE: usize = (1 << 24) - 1;

// A FLAC metadata block
//
// The 4 byte header is always read eagerly; whether the content follows it
// into memory is up to the caller's predicate, so large blocks (pictures
// especially) are only materialized when actually wanted. A skipped block
// can be picked up later through `Block::load`.
pub(crate) struct Block {
	pub(crate) ty: u8,
	pub(crate) last: bool,
	pub(crate) loaded: bool,
	pub(crate) content: Vec<u8>,
	pub(crate) start: u64,
	pub(crate) end: u64,
}

impl Block {
	pub(crate) fn read<R, P>(data: &mut R, mut predicate: P) -> Result<Self>
	where
		R: Read + Seek,
		P: FnMut(u8) -> bool,
	{
		let start = data.stream_position()?;

		let byte = data.read_u8()?;
		let last = (byte & 0x80) != 0;
		let ty = byte & 0x7F;

		let size = data.read_u24::<BigEndian>()?;
		log::trace!("Reading FLAC block, type: {ty}, size: {size}");

		let mut content = Vec::new();
		let loaded = predicate(ty);
		if loaded {
			content = try_vec![0; size as usize];
			data.read_exact(&mut content)?;
		} else {
			data.seek(SeekFrom::Current(i64::from(size)))?;
		}

		let end = data.stream_position()?;

		Ok(Self {
			ty,
			last,
			loaded,
			content,
			start,
			end,
		})
	}

	// Second phase of the lazy read, loads a block skipped by the
	// predicate. The reader's position is restored afterwards.
	pub(crate) fn load<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		if self.loaded {
			return Ok(());
		}

		let size = (self.end - self.start - BLOCK_HEADER_SIZE) as usize;

		let current = data.stream_position()?;
		data.seek(SeekFrom::Start(self.start + BLOCK_HEADER_SIZE))?;

		self.content = try_vec![0; size];
		data.read_exact(&mut self.content)?;
		self.loaded = true;

		data.seek(SeekFrom::Start(current))?;

		Ok(())
	}

	pub(crate) fn write_to<W>(&self, writer: &mut W) -> Result<()>
	where
		W: Write,
	{
		if self.content.len() > MAX_BLOCK_SIZE {
			err!(TooMuchData);
		}

		let mut byte = self.ty;
		if self.last {
			byte |= 0x80;
		}

		writer.write_u8(byte)?;
		writer.write_u24::<BigEndian>(self.content.len() as u32)?;
		writer.write_all(&self.content)?;

		Ok(())
	}

	pub(crate) fn rendered_len(&self) -> u64 {
		BLOCK_HEADER_SIZE + self.content.len() as u64
	}

	pub(crate) fn new_comment(comment: &XiphComment, vendor: &str) -> Result<Self> {
		// Pictures are emitted as their own blocks, never inside the
		// comment itself
		let mut vendored = comment.clone();
		vendored.set_vendor(String::from(vendor));

		let content = create_comment_packet(&vendored, &[], false, false)?;

		Ok(Self::new(BLOCK_ID_VORBIS_COMMENTS, content))
	}

	pub(crate) fn new_picture(picture: &Picture, info: PictureInformation) -> Self {
		Self::new(BLOCK_ID_PICTURE, picture.as_flac_bytes(info, false))
	}

	pub(crate) fn new_padding(size: usize) -> Self {
		Self::new(BLOCK_ID_PADDING, vec![0; size])
	}

	fn new(ty: u8, content: Vec<u8>) -> Self {
		Self {
			ty,
			last: false,
			loaded: true,
			content,
			start: 0,
			end: 0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Block;

	use std::io::Cursor;

	#[test_log::test]
	fn lazy_load_round_trip() {
		let block = Block::new_padding(32);

		let mut bytes = Vec::new();
		block.write_to(&mut bytes).unwrap();
		assert_eq!(bytes.len(), 36);

		let mut reader = Cursor::new(bytes);
		let mut read_back = Block::read(&mut reader, |_| false).unwrap();

		assert!(!read_back.loaded);
		assert!(read_back.content.is_empty());
		assert_eq!(read_back.start, 0);
		assert_eq!(read_back.end, 36);

		read_back.load(&mut reader).unwrap();
		assert!(read_back.loaded);
		assert_eq!(read_back.content, vec![0; 32]);
	}

	#[test_log::test]
	fn oversized_block_rejected() {
		let block = Block::new_padding(super::MAX_BLOCK_SIZE + 1);
		assert!(block.write_to(&mut Vec::new()).is_err());
	}
}
