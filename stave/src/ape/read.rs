use super::{ApeFile, ApeProperties};
use crate::config::ParseOptions;
use crate::error::Result;
use crate::id3::v1::Id3v1Tag;
use crate::id3::v2::skip_id3v2;
use crate::id3::{ID3FindResults, find_id3v1};
use crate::macros::{decode_err, err};
use crate::tag::{AnyTag, CombinedTag, TagTypes};

use std::io::{Read, Seek, SeekFrom};

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<ApeFile>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;
	let end = data.seek(SeekFrom::End(0))?;

	data.seek(SeekFrom::Start(start))?;

	let mut stream_len = end - start;
	let mut extra_tag_types = TagTypes::NONE;

	// ID3v2 tags are unsupported in APE files, but still possible. The tag
	// stays untouched at the start of the file; only its presence is
	// reported.
	if let Some(id3v2_size) = skip_id3v2(data)? {
		log::warn!("Encountered an ID3v2 tag, it will be preserved but not read");
		extra_tag_types |= TagTypes::ID3V2;

		let Some(new_stream_length) = stream_len.checked_sub(id3v2_size) else {
			err!(SizeMismatch);
		};

		stream_len = new_stream_length;
	}

	let mac_start = data.stream_position()?;

	let mut header = [0; 4];
	data.read_exact(&mut header)?;

	if &header != b"MAC " {
		decode_err!(@BAIL Ape, "Invalid data found while reading header, expected \"MAC \"");
	}

	// First see if there's an ID3v1 tag
	//
	// Starts with ['T', 'A', 'G']
	// Exactly 128 bytes long (including the identifier)
	let mut id3v1_tag = None;
	let ID3FindResults(id3v1_header, id3v1) =
		find_id3v1(data, parse_options.read_tags, parse_options.parsing_mode)?;

	if id3v1_header.is_some() {
		id3v1_tag = id3v1;
		let Some(new_stream_length) = stream_len.checked_sub(128) else {
			err!(SizeMismatch);
		};

		stream_len = new_stream_length;
	}

	// Next, search for an APEv2 tag footer
	//
	// Starts with ['A', 'P', 'E', 'T', 'A', 'G', 'E', 'X']
	// Exactly 32 bytes long
	// Strongly recommended to be at the end of the file, preceding a
	// possible ID3v1 tag
	if data.seek(SeekFrom::Current(-32)).is_ok() {
		let mut footer = [0; 32];
		data.read_exact(&mut footer)?;

		if &footer[..8] == b"APETAGEX" {
			log::warn!("Encountered an APE tag, it will be preserved but not read");
			extra_tag_types |= TagTypes::APE;

			// Infallible
			let ape_tag_size = u32::from_le_bytes(footer[12..16].try_into().unwrap());

			// The size includes the footer, but a header may precede the
			// items
			let has_header = (u32::from_le_bytes(footer[20..24].try_into().unwrap())
				& 0x8000_0000)
				!= 0;
			let full_size = u64::from(ape_tag_size) + if has_header { 32 } else { 0 };

			let Some(new_stream_length) = stream_len.checked_sub(full_size) else {
				err!(SizeMismatch);
			};

			stream_len = new_stream_length;
		}
	}

	let file_length = data.seek(SeekFrom::End(0))?;

	let mut tags = Vec::new();
	if parse_options.read_tags {
		match id3v1_tag {
			Some(id3v1) => tags.push(AnyTag::Id3v1(id3v1)),
			None if parse_options.create_default_tags => {
				tags.push(AnyTag::Id3v1(Id3v1Tag::new()));
			},
			None => {},
		}
	}

	let tag = CombinedTag::with_tags(TagTypes::ID3V1, tags)?;

	// Go back to the MAC header to read properties
	let properties = if parse_options.read_properties {
		data.seek(SeekFrom::Start(mac_start + 4))?;

		super::properties::read_properties(
			data,
			stream_len,
			file_length,
			parse_options.parsing_mode,
		)?
	} else {
		ApeProperties::default()
	};

	Ok(ApeFile {
		tag,
		extra_tag_types,
		properties,
	})
}
