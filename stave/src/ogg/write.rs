use super::read::scan_streams;
use super::tag::XiphComment;
use super::{OggFormat, verify_signature};
use crate::config::WriteOptions;
use crate::error::{Result, StaveError};
use crate::macros::{decode_err, err, try_vec};
use crate::picture::{Picture, PictureInformation};
use crate::util::io::{FileLike, Length, Truncate};
use crate::util::text::latin1_decode;

use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ogg_stitch::{
	CONTAINS_FIRST_PAGE_OF_BITSTREAM, CONTAINS_LAST_PAGE_OF_BITSTREAM, Packets, Page, PageError,
};

pub(crate) fn write_to<F>(
	file: &mut F,
	comments: &[&XiphComment],
	_write_options: WriteOptions,
) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	let start = file.stream_position()?;

	let streams = scan_streams(file)?;

	// Re-paginate every logical bitstream with its comment packet replaced
	let mut paginated_streams = Vec::with_capacity(streams.len());
	for (idx, (serial, _)) in streams.iter().copied().enumerate() {
		file.seek(SeekFrom::Start(start))?;
		let mut packets = Packets::read_stream(file, serial)?;

		let identification_packet = packets
			.get(0)
			.ok_or_else(|| decode_err!(Ogg, "Expected identification packet"))?;
		let format = OggFormat::identify(identification_packet)?;

		let comment_signature = format.comment_signature();
		{
			let comment_packet = packets
				.get(1)
				.ok_or_else(|| decode_err!(Ogg, "Expected comment packet"))?;
			verify_signature(comment_packet, comment_signature)?;
		}

		// A stream the caller holds no comment for gets an empty one, the
		// formats require the header packet to exist regardless
		let empty;
		let comment = match comments.get(idx) {
			Some(comment) => *comment,
			None => {
				empty = XiphComment::new();
				&empty
			},
		};

		let new_comment_packet =
			create_comment_packet(comment, comment_signature, true, format.has_framing_bit())?;
		packets.set(1, new_comment_packet);

		let pages = packets.paginate(
			serial,
			CONTAINS_FIRST_PAGE_OF_BITSTREAM | CONTAINS_LAST_PAGE_OF_BITSTREAM,
		)?;
		paginated_streams.push(pages.into_iter());
	}

	// Reproduce valid multiplexing by taking one page at a time from each
	// non-exhausted stream
	let mut interleaved = Vec::new();
	loop {
		let mut exhausted = true;
		for stream in &mut paginated_streams {
			if let Some(page) = stream.next() {
				interleaved.extend(page.as_bytes());
				exhausted = false;
			}
		}

		if exhausted {
			break;
		}
	}

	// Sequence numbers are only valid per logical bitstream; correct them
	// (and the checksums) in a dedicated pass over the written pages
	let corrected = renumber_pages(&interleaved)?;

	file.seek(SeekFrom::Start(start))?;
	file.truncate(start)?;
	file.write_all(&corrected)?;

	Ok(())
}

fn renumber_pages(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut corrected = Vec::with_capacity(bytes.len());
	let mut counters: Vec<(u32, u32)> = Vec::new();

	let mut reader = Cursor::new(bytes);
	loop {
		let mut page = match Page::read(&mut reader) {
			Ok(page) => page,
			Err(PageError::Io(ref io)) if io.kind() == std::io::ErrorKind::UnexpectedEof => break,
			Err(e) => return Err(e.into()),
		};

		let serial = page.header().stream_serial;
		let sequence_number = match counters.iter_mut().find(|(s, _)| *s == serial) {
			Some((_, count)) => {
				*count += 1;
				*count
			},
			None => {
				counters.push((serial, 0));
				0
			},
		};

		page.header_mut().sequence_number = sequence_number;
		page.gen_crc();

		corrected.extend(page.as_bytes());
	}

	Ok(corrected)
}

pub(crate) fn create_comment_packet(
	comment: &XiphComment,
	comment_signature: &[u8],
	include_pictures: bool,
	add_framing_bit: bool,
) -> Result<Vec<u8>> {
	let mut new_comment_packet = Cursor::new(Vec::new());

	let vendor_bytes = comment.vendor().as_bytes();
	new_comment_packet.write_all(comment_signature)?;
	new_comment_packet.write_u32::<LittleEndian>(vendor_bytes.len() as u32)?;
	new_comment_packet.write_all(vendor_bytes)?;

	// Zero out the item count for later
	let item_count_pos = new_comment_packet.stream_position()?;
	new_comment_packet.write_u32::<LittleEndian>(0)?;

	let mut count = 0;
	create_comments(&mut new_comment_packet, &mut count, comment)?;

	if include_pictures {
		create_pictures(
			&mut new_comment_packet,
			&mut count,
			comment.picture_store(),
		)?;
	}

	// Seek back and write the item count
	new_comment_packet.seek(SeekFrom::Start(item_count_pos))?;
	new_comment_packet.write_u32::<LittleEndian>(count)?;

	if add_framing_bit {
		// OGG Vorbis makes use of a "framing bit" to
		// separate the header packets
		//
		// <https://xiph.org/vorbis/doc/Vorbis_I_spec.html#x1-590004>
		new_comment_packet.get_mut().push(1);
	}

	Ok(new_comment_packet.into_inner())
}

pub(crate) fn create_comments(
	packet: &mut impl Write,
	count: &mut u32,
	comment: &XiphComment,
) -> Result<()> {
	for (key, values) in comment.fields() {
		for value in values {
			if value.is_empty() {
				continue;
			}

			let field = format!("{key}={value}");
			let field_bytes = field.as_bytes();

			let Ok(bytes_len) = u32::try_from(field_bytes.len()) else {
				err!(TooMuchData);
			};

			*count += 1;

			packet.write_u32::<LittleEndian>(bytes_len)?;
			packet.write_all(field_bytes)?;
		}
	}

	Ok(())
}

fn create_pictures(
	packet: &mut impl Write,
	count: &mut u32,
	pictures: &[(Picture, PictureInformation)],
) -> Result<()> {
	const PICTURE_KEY: &str = "METADATA_BLOCK_PICTURE=";

	for (picture, info) in pictures {
		let picture_bytes = picture.as_flac_bytes(*info, true);

		let Ok(bytes_len) = u32::try_from(picture_bytes.len() + PICTURE_KEY.len()) else {
			err!(TooMuchData);
		};

		*count += 1;

		packet.write_u32::<LittleEndian>(bytes_len)?;
		packet.write_all(PICTURE_KEY.as_bytes())?;
		packet.write_all(&picture_bytes)?;
	}

	Ok(())
}

// Retains the vendor string already present in a comment region on disk,
// used by the FLAC engine so a rewrite keeps the encoder identification.
pub(crate) fn read_vendor(content: &[u8]) -> Result<String> {
	let mut reader = &*content;

	let vendor_len = reader.read_u32::<LittleEndian>()?;
	let mut vendor_raw = try_vec![0; vendor_len as usize];
	std::io::Read::read_exact(&mut reader, &mut vendor_raw)?;

	match String::from_utf8(vendor_raw) {
		Ok(vendor) => Ok(vendor),
		Err(e) => {
			log::warn!("Vendor string is not valid UTF-8, reading as Latin-1");
			Ok(latin1_decode(e.as_bytes()))
		},
	}
}
