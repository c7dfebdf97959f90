use super::block::{
	BLOCK_HEADER_SIZE, BLOCK_ID_PADDING, BLOCK_ID_PICTURE, BLOCK_ID_VORBIS_COMMENTS, Block,
};
use super::read::verify_flac;
use crate::config::WriteOptions;
use crate::error::{Result, StaveError};
use crate::id3::v1::Id3v1Tag;
use crate::id3::v2::skip_id3v2;
use crate::ogg::XiphComment;
use crate::ogg::write::read_vendor;
use crate::util::io::{self, FileLike, Length, Truncate};

pub(crate) fn write_to<F>(
	file: &mut F,
	comment: Option<&XiphComment>,
	id3v1: Option<&Id3v1Tag>,
	write_options: WriteOptions,
) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	file.rewind()?;

	// The leading ID3v2 tag, if any, stays where it is; the metadata splice
	// happens past it
	skip_id3v2(file)?;

	let mut stream_info = verify_flac(file)?;
	let mut is_last_block = stream_info.last;

	stream_info.last = false; // Determined later

	let metadata_start = stream_info.start;
	let mut metadata_end = stream_info.end;

	let mut vendor = comment.map(XiphComment::vendor).unwrap_or_default().to_owned();

	let mut blocks = vec![stream_info];
	while !is_last_block {
		let block = Block::read(file, |ty| {
			ty != BLOCK_ID_PADDING && ty != BLOCK_ID_PICTURE
		})?;

		is_last_block = block.last;
		metadata_end = block.end;

		match block.ty {
			// Replaced by the re-rendered comment; the vendor string already
			// on disk is retained
			BLOCK_ID_VORBIS_COMMENTS => {
				vendor = read_vendor(&block.content)?;
			},
			// Dropped, re-rendered from the picture store
			BLOCK_ID_PICTURE => {},
			// Dropped, recreated at the exact size needed
			BLOCK_ID_PADDING => {},
			_ => {
				let mut block = block;
				block.last = false;
				blocks.push(block);
			},
		}
	}

	let old_span = metadata_end - metadata_start;

	if let Some(comment) = comment {
		let has_fields = comment.fields().next().is_some();
		let has_pictures = !comment.picture_store().is_empty();

		if has_fields || has_pictures || !vendor.is_empty() {
			blocks.push(Block::new_comment(comment, &vendor)?);
		}

		for (picture, info) in comment.picture_store() {
			blocks.push(Block::new_picture(picture, *info));
		}
	}

	let new_content_size: u64 = blocks.iter().map(Block::rendered_len).sum();

	// Padding policy: freed space is reclaimed exactly, a growing splice
	// gets fresh headroom instead
	if new_content_size + BLOCK_HEADER_SIZE <= old_span {
		let padding_size = old_span - new_content_size - BLOCK_HEADER_SIZE;
		log::debug!("Filling {padding_size} freed bytes with padding");

		blocks.push(Block::new_padding(padding_size as usize));
	} else if new_content_size != old_span {
		if let Some(preferred) = write_options.preferred_padding {
			log::debug!("Metadata grew, adding {preferred} bytes of padding headroom");

			blocks.push(Block::new_padding(preferred as usize));
		}
	}

	if let Some(block) = blocks.last_mut() {
		block.last = true;
	}

	let mut encoded_metadata = Vec::new();
	let mut position = metadata_start;
	for block in &mut blocks {
		// Keep the stored offsets consistent with the new layout
		block.start = position;
		block.write_to(&mut encoded_metadata)?;
		position += block.rendered_len();
		block.end = position;

		log::trace!(
			"Wrote a block (ty: {}, size: {})",
			block.ty,
			block.content.len()
		);
	}

	io::insert(file, &encoded_metadata, metadata_start, old_span)?;

	crate::id3::v1::write_id3v1(file, id3v1)
}
