use super::chunk::{ChunkDescriptor, scan_chunks};
use super::divx::{DIVX_TAG_SIZE, DivxTag};
use super::info::{InfoTag, MovieIdTag, RiffListTag};
use super::properties::{self, RiffProperties};
use super::{RiffFile, RiffForm};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::id3::Id3v2Payload;
use crate::macros::decode_err;
use crate::tag::{AnyTag, CombinedTag, TagTypes};

use std::io::{Read, Seek, SeekFrom};

// Verifies the 12-byte RIFF header, returning the form type and the stored
// top-level size
pub(crate) fn verify_riff<T>(data: &mut T) -> Result<(RiffForm, u32)>
where
	T: Read + Seek,
{
	let mut id = [0; 12];
	data.read_exact(&mut id)?;

	if &id[..4] != b"RIFF" {
		decode_err!(@BAIL "File doesn't contain a RIFF chunk");
	}

	let form = match &id[8..] {
		b"WAVE" => RiffForm::Wave,
		b"AVI " => RiffForm::Avi,
		_ => decode_err!(@BAIL "Found RIFF file of an unsupported form type"),
	};

	log::debug!("File verified to be RIFF, form: {form:?}");

	// Infallible
	Ok((form, u32::from_le_bytes(id[4..8].try_into().unwrap())))
}

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<RiffFile>
where
	R: Read + Seek,
{
	let (form, _) = verify_riff(data)?;

	let current_pos = data.stream_position()?;
	let file_len = data.seek(SeekFrom::End(0))?;
	data.seek(SeekFrom::Start(current_pos))?;

	let chunks = scan_chunks(data, file_len)?;

	let mut info: Option<InfoTag> = None;
	let mut movie_id: Option<MovieIdTag> = None;
	let mut divx: Option<DivxTag> = None;
	let mut id3v2: Option<Id3v2Payload> = None;

	let mut fmt = Vec::new();
	let mut avih = Vec::new();
	let mut total_samples = 0_u32;
	let mut stream_len = 0_u32;

	for chunk in &chunks {
		match &chunk.fourcc {
			b"fmt " if parse_options.read_properties => {
				if fmt.is_empty() {
					fmt = chunk.read_content(data)?;
				}
			},
			b"fact" if parse_options.read_properties => {
				if total_samples == 0 {
					let content = chunk.read_content(data)?;
					if content.len() >= 4 {
						// Infallible
						total_samples = u32::from_le_bytes(content[..4].try_into().unwrap());
					}
				}
			},
			// The audio payload itself is never loaded
			b"data" if parse_options.read_properties => {
				if stream_len == 0 {
					stream_len = chunk.size;
				}
			},
			b"LIST" => match chunk.list_type.as_ref() {
				Some(b"INFO") if parse_options.read_tags => {
					if info.is_some() {
						log::warn!("Duplicate INFO list found, keeping the first");
						continue;
					}

					let content = chunk.read_content(data)?;
					let list = RiffListTag::parse(&content[4..], parse_options.parsing_mode)?;
					info = Some(InfoTag { list });
				},
				Some(b"MID ") if parse_options.read_tags => {
					if movie_id.is_some() {
						log::warn!("Duplicate MID list found, keeping the first");
						continue;
					}

					let content = chunk.read_content(data)?;
					let list = RiffListTag::parse(&content[4..], parse_options.parsing_mode)?;
					movie_id = Some(MovieIdTag { list });
				},
				Some(b"hdrl") if parse_options.read_properties && form == RiffForm::Avi => {
					if avih.is_empty() {
						let content = chunk.read_content(data)?;
						avih = find_avih(&content[4..]);
					}
				},
				_ => {},
			},
			b"IDVX" if parse_options.read_tags => {
				let content = chunk.read_content(data)?;

				let Ok(bytes) = <[u8; DIVX_TAG_SIZE]>::try_from(content) else {
					if parse_options.parsing_mode == ParsingMode::Strict {
						decode_err!(@BAIL Avi, "IDVX chunk has an invalid size (!= 128)");
					}

					log::warn!("IDVX chunk has an invalid size, discarding");
					continue;
				};

				match DivxTag::parse(bytes) {
					Ok(tag) => divx = Some(tag),
					Err(e) => {
						if parse_options.parsing_mode == ParsingMode::Strict {
							return Err(e);
						}

						log::warn!("Unable to read DivX tag, discarding");
					},
				}
			},
			b"id3 " | b"ID3 " | b"ID32" if parse_options.read_tags => {
				if id3v2.is_some() {
					log::warn!("Duplicate ID3v2 chunk found, keeping the first");
					continue;
				}

				// Carried opaquely, see `Id3v2Payload`
				id3v2 = Some(Id3v2Payload::new(chunk.read_content(data)?));
			},
			_ => {},
		}
	}

	// Default tag types, so a freshly opened file is writable right away
	if parse_options.read_tags && parse_options.create_default_tags {
		match form {
			RiffForm::Wave if info.is_none() => info = Some(InfoTag::new()),
			RiffForm::Avi if movie_id.is_none() => movie_id = Some(MovieIdTag::new()),
			_ => {},
		}
	}

	let mut tags = Vec::new();
	if let Some(info) = info {
		tags.push(AnyTag::Info(info));
	}
	if let Some(movie_id) = movie_id {
		tags.push(AnyTag::MovieId(movie_id));
	}
	if let Some(divx) = divx {
		tags.push(AnyTag::Divx(divx));
	}
	if let Some(id3v2) = id3v2 {
		tags.push(AnyTag::Id3v2(id3v2));
	}

	let tag = CombinedTag::with_tags(
		TagTypes::RIFF_INFO | TagTypes::MOVIE_ID | TagTypes::DIVX | TagTypes::ID3V2,
		tags,
	)?;

	let properties = if parse_options.read_properties {
		match form {
			RiffForm::Wave => RiffProperties::Wav(properties::read_wav_properties(
				&fmt,
				total_samples,
				stream_len,
				file_len,
			)?),
			RiffForm::Avi => RiffProperties::Avi(properties::read_avi_properties(&avih)?),
		}
	} else {
		RiffProperties::default()
	};

	Ok(RiffFile {
		form,
		tag,
		properties,
	})
}

// Walks the subchunks of an `hdrl` list body looking for the main AVI
// header
fn find_avih(content: &[u8]) -> Vec<u8> {
	let mut pos = 0;
	while pos + 8 <= content.len() {
		let id = &content[pos..pos + 4];
		// Infallible
		let size = u32::from_le_bytes(content[pos + 4..pos + 8].try_into().unwrap()) as usize;
		pos += 8;

		if pos + size > content.len() {
			break;
		}

		if id == b"avih" {
			return content[pos..pos + size].to_vec();
		}

		pos += size + (size % 2);
	}

	Vec::new()
}

pub(super) fn find_data_chunk(chunks: &[ChunkDescriptor]) -> Option<&ChunkDescriptor> {
	chunks.iter().find(|chunk| {
		&chunk.fourcc == b"data" || chunk.list_type.as_ref() == Some(b"movi")
	})
}
