use super::FlacFile;
use super::block::{
	BLOCK_ID_PICTURE, BLOCK_ID_STREAMINFO, BLOCK_ID_VORBIS_COMMENTS, Block,
};
use super::properties::FlacProperties;
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::id3::v2::skip_id3v2;
use crate::id3::{ID3FindResults, find_id3v1};
use crate::macros::{decode_err, err};
use crate::ogg::XiphComment;
use crate::ogg::read::read_comments;
use crate::picture::Picture;
use crate::tag::{AnyTag, CombinedTag, TagTypes};

use std::io::{Read, Seek, SeekFrom};

pub(super) fn verify_flac<R>(data: &mut R) -> Result<Block>
where
	R: Read + Seek,
{
	let mut marker = [0; 4];
	data.read_exact(&mut marker)?;

	if &marker != b"fLaC" {
		decode_err!(@BAIL Flac, "File missing \"fLaC\" stream marker");
	}

	let block = Block::read(data, |_| true)?;

	if block.ty != BLOCK_ID_STREAMINFO {
		decode_err!(@BAIL Flac, "File missing mandatory STREAMINFO block");
	}

	log::debug!("File verified to be FLAC");
	Ok(block)
}

pub(crate) fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<FlacFile>
where
	R: Read + Seek,
{
	let mut extra_tag_types = TagTypes::NONE;

	// A sandwiched ID3v2 tag is possible at the very start of the file. It
	// stays untouched on disk; only its presence is reported.
	if skip_id3v2(data)?.is_some() {
		log::warn!("Encountered an ID3v2 tag, it will be preserved but not read");
		extra_tag_types |= TagTypes::ID3V2;
	}

	let stream_info = verify_flac(data)?;
	let stream_info_len = (stream_info.end - stream_info.start) as u32;

	if stream_info_len < 18 + 4 {
		decode_err!(@BAIL Flac, "File has an invalid STREAMINFO block size (< 18)");
	}

	let mut comment: Option<XiphComment> = None;
	let mut pictures = Vec::new();

	let mut last_block = stream_info.last;

	while !last_block {
		let block = Block::read(data, |block_type| {
			(block_type == BLOCK_ID_VORBIS_COMMENTS && parse_options.read_tags)
				|| (block_type == BLOCK_ID_PICTURE && parse_options.read_cover_art)
		})?;

		last_block = block.last;

		if !block.loaded {
			continue;
		}

		if block.ty == BLOCK_ID_VORBIS_COMMENTS {
			log::debug!("Encountered a Vorbis Comments block, parsing");

			// A spec compliant stream has at most one comment block. When
			// more appear, the latest one wins; writing removes them all
			// anyway.
			if comment.is_some() && parse_options.parsing_mode == ParsingMode::Strict {
				decode_err!(@BAIL Flac, "Streams are only allowed one Vorbis Comments block");
			}

			comment = Some(read_comments(
				&mut &*block.content,
				block.content.len() as u64,
				parse_options,
			)?);
			continue;
		}

		if block.ty == BLOCK_ID_PICTURE {
			log::debug!("Encountered a FLAC picture block, parsing");

			match Picture::from_flac_bytes(&block.content, false, parse_options.parsing_mode) {
				Ok(picture) => pictures.push(picture),
				Err(e) => {
					if parse_options.parsing_mode == ParsingMode::Strict {
						return Err(e);
					}

					log::warn!("Unable to read FLAC picture block, discarding");
					continue;
				},
			}
		}
	}

	let audio_start = data.stream_position()?;

	let mut id3v1 = None;
	if parse_options.read_tags {
		let ID3FindResults(header, tag) =
			find_id3v1(data, true, parse_options.parsing_mode)?;

		if header.is_some() {
			id3v1 = tag;
		}
	}

	// Picture blocks and comment-carried pictures share one store
	if comment.is_none() && (!pictures.is_empty() || parse_options.create_default_tags) {
		comment = Some(XiphComment::new());
	}

	if let Some(comment) = comment.as_mut() {
		for (picture, info) in pictures {
			comment.push_picture_with_info(picture, info);
		}
	}

	let mut tags = Vec::new();
	if let Some(comment) = comment {
		tags.push(AnyTag::Xiph(comment));
	}
	if let Some(id3v1) = id3v1 {
		tags.push(AnyTag::Id3v1(id3v1));
	}

	let tag = CombinedTag::with_tags(TagTypes::XIPH | TagTypes::ID3V1, tags)?;

	let mut properties = FlacProperties::default();
	if parse_options.read_properties {
		let (stream_length, file_length) = {
			let end = data.seek(SeekFrom::End(0))?;

			// In the event that a block lies about its size, the audio
			// start position could be completely wrong
			if audio_start > end {
				err!(SizeMismatch);
			}

			(end - audio_start, end)
		};

		properties = super::properties::read_properties(
			&mut &stream_info.content[..],
			stream_length,
			file_length,
		)?;
	}

	Ok(FlacFile {
		tag,
		extra_tag_types,
		properties,
	})
}
