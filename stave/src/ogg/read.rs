use super::tag::{COVERART, METADATA_BLOCK_PICTURE, XiphComment};
use super::{OggFile, OggFormat, OggStream, verify_signature};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{decode_err, err, try_vec};
use crate::ogg::properties::{self, OggProperties};
use crate::picture::{MimeType, Picture, PictureInformation, PictureType};
use crate::tag::{AnyTag, CombinedTag, TagTypes};
use crate::util::text::{latin1_decode, utf8_decode, utf8_decode_str};

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use data_encoding::BASE64;
use ogg_stitch::{Packets, Page, PageError};

pub(crate) fn read_comments<R>(
	data: &mut R,
	mut len: u64,
	parse_options: ParseOptions,
) -> Result<XiphComment>
where
	R: Read,
{
	let parse_mode = parse_options.parsing_mode;

	let vendor_len = data.read_u32::<LittleEndian>()?;
	if u64::from(vendor_len) > len {
		err!(SizeMismatch);
	}

	let mut vendor_bytes = try_vec![0; vendor_len as usize];
	data.read_exact(&mut vendor_bytes)?;

	len -= u64::from(vendor_len);

	let vendor = match utf8_decode(vendor_bytes.clone()) {
		Ok(vendor) => vendor,
		Err(e) => {
			if parse_mode == ParsingMode::Strict {
				return Err(e);
			}

			// Some vendor strings carry mixed encodings. Reading the bytes
			// as Latin-1 keeps the string, opposed to using replacement
			// characters.
			log::warn!("Possibly corrupt vendor string, reading as Latin-1");
			latin1_decode(&vendor_bytes)
		},
	};

	let number_of_items = data.read_u32::<LittleEndian>()?;
	if u64::from(number_of_items) > (len >> 2) {
		err!(SizeMismatch);
	}

	let mut tag = XiphComment {
		vendor,
		fields: Vec::new(),
		pictures: Vec::new(),
	};

	for _ in 0..number_of_items {
		let comment_len = data.read_u32::<LittleEndian>()?;
		if u64::from(comment_len) > len {
			err!(SizeMismatch);
		}

		let mut comment_bytes = try_vec![0; comment_len as usize];
		data.read_exact(&mut comment_bytes)?;

		len -= u64::from(comment_len);

		// KEY=VALUE
		let mut comment_split = comment_bytes.splitn(2, |b| *b == b'=');

		let Some(key) = comment_split.next() else {
			continue;
		};

		// Make sure there was a separator present, otherwise just move on
		let Some(value) = comment_split.next() else {
			log::warn!("No separator found in field, discarding");
			continue;
		};

		match key {
			k if k.eq_ignore_ascii_case(METADATA_BLOCK_PICTURE.as_bytes()) => {
				if !parse_options.read_cover_art {
					continue;
				}

				match Picture::from_flac_bytes(value, true, parse_mode) {
					Ok((picture, info)) => tag.push_picture_with_info(picture, info),
					Err(e) => {
						if parse_mode == ParsingMode::Strict {
							return Err(e);
						}

						log::warn!("Failed to decode picture field, discarding");
						continue;
					},
				}
			},
			k if k.eq_ignore_ascii_case(COVERART.as_bytes()) => {
				if !parse_options.read_cover_art {
					continue;
				}

				// `COVERART` is a deprecated image storage format holding
				// nothing but the base64 encoded image.
				//
				// <https://wiki.xiph.org/VorbisComment#Cover_art>
				log::warn!("Found a deprecated `COVERART` field, routing to the picture store");

				match BASE64.decode(value) {
					Ok(picture_data) => {
						let mime_type = (picture_data.len() >= 8)
							.then(|| Picture::mimetype_from_bin(&picture_data).ok())
							.flatten()
							.unwrap_or_else(|| MimeType::Unknown(String::from("image/")));

						let picture = Picture {
							pic_type: PictureType::Other,
							mime_type: Some(mime_type),
							description: None,
							data: Cow::from(picture_data),
						};

						tag.push_picture_with_info(picture, PictureInformation::default());
					},
					Err(_) => {
						if parse_mode == ParsingMode::Strict {
							err!(NotAPicture);
						}

						log::warn!("Failed to decode `COVERART` field, discarding");
						continue;
					},
				}
			},
			k if valid_comment_key(k) => {
				// Just verified to be a subset of ASCII
				let key = utf8_decode_str(k)?.to_owned();

				match utf8_decode_str(value) {
					Ok(value) => {
						if let Err(e) = tag.push_field(key, value.to_owned()) {
							if parse_mode == ParsingMode::Strict {
								return Err(e);
							}
						}
					},
					Err(e) => {
						if parse_mode == ParsingMode::Strict {
							return Err(e);
						}

						log::warn!("Non UTF-8 value found, discarding field {key:?}");
						continue;
					},
				}
			},
			_ => {
				if parse_mode == ParsingMode::Strict {
					decode_err!(@BAIL Ogg, "Comment field contains an invalid key");
				}

				// Otherwise discard invalid keys
			},
		}
	}

	Ok(tag)
}

pub(super) fn valid_comment_key(key: &[u8]) -> bool {
	// The valid range is 0x20..=0x7D not including 0x3D
	!key.is_empty() && key.iter().all(|c| (b' '..=b'}').contains(c) && *c != b'=')
}

// Walks every page, recording each logical bitstream in order of first
// appearance along with the last granule position it reported.
pub(crate) fn scan_streams<R>(data: &mut R) -> Result<Vec<(u32, u64)>>
where
	R: Read + Seek,
{
	let mut streams: Vec<(u32, u64)> = Vec::new();

	loop {
		match Page::skip(data) {
			Ok(header) => {
				match streams
					.iter_mut()
					.find(|(serial, _)| *serial == header.stream_serial)
				{
					Some((_, granule)) => {
						if header.abgp != u64::MAX {
							*granule = header.abgp;
						}
					},
					None => {
						let granule = if header.abgp == u64::MAX {
							0
						} else {
							header.abgp
						};
						streams.push((header.stream_serial, granule));
					},
				}
			},
			// Page reading stops at the end of the physical stream
			Err(PageError::Io(ref io)) if io.kind() == std::io::ErrorKind::UnexpectedEof => break,
			Err(e) => return Err(e.into()),
		}
	}

	if streams.is_empty() {
		decode_err!(@BAIL Ogg, "File contains no OGG pages");
	}

	Ok(streams)
}

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<OggFile>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;

	let streams_scan = scan_streams(data)?;
	let file_length = data.stream_position()?;

	let mut streams = Vec::with_capacity(streams_scan.len());
	let mut comments = Vec::with_capacity(streams_scan.len());
	let mut properties = OggProperties::default();

	for (idx, (serial, last_granule)) in streams_scan.iter().copied().enumerate() {
		data.seek(SeekFrom::Start(start))?;

		let packets = Packets::read_stream_count(data, serial, 2)?;

		let identification_packet = packets
			.get(0)
			.ok_or_else(|| decode_err!(Ogg, "Expected identification packet"))?;
		let format = OggFormat::identify(identification_packet)?;

		log::debug!("Found a logical bitstream, serial: {serial}, format: {format:?}");

		streams.push(OggStream { serial, format });

		// Every stream carries exactly one comment header
		let mut comment_packet = packets
			.get(1)
			.ok_or_else(|| decode_err!(Ogg, "Expected comment packet"))?;

		let comment_signature = format.comment_signature();
		verify_signature(comment_packet, comment_signature)?;
		comment_packet = &comment_packet[comment_signature.len()..];

		let comment;
		if parse_options.read_tags {
			let reader = &mut comment_packet;
			comment = read_comments(reader, reader.len() as u64, parse_options)?;
		} else {
			comment = XiphComment::new();
		}

		comments.push(AnyTag::Xiph(comment));

		// The first bitstream describes the file
		if idx == 0 && parse_options.read_properties {
			properties = properties::read_properties(
				format,
				identification_packet,
				last_granule,
				file_length - start,
			)?;
		}
	}

	Ok(OggFile {
		streams,
		tag: CombinedTag::grouped(TagTypes::XIPH, comments),
		properties,
	})
}
