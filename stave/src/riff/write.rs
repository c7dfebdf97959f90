use super::chunk::{RIFF_CHUNK_HEADER_SIZE, scan_chunks};
use super::divx::DivxTag;
use super::info::{InfoTag, MovieIdTag};
use super::read::{find_data_chunk, verify_riff};
use crate::config::WriteOptions;
use crate::error::{Result, StaveError};
use crate::id3::Id3v2Payload;
use crate::tag::Tag as _;
use crate::util::io::{self, FileLike, Length, Truncate};

use std::io::SeekFrom;

use byteorder::{LittleEndian, WriteBytesExt};

pub(crate) struct RiffTagsRef<'a> {
	pub(crate) id3v2: Option<&'a Id3v2Payload>,
	pub(crate) info: Option<&'a InfoTag>,
	pub(crate) movie_id: Option<&'a MovieIdTag>,
	pub(crate) divx: Option<&'a DivxTag>,
}

impl RiffTagsRef<'_> {
	// Renders every present tag into one contiguous region, in a fixed
	// order: ID3v2, INFO, MID, DivX
	fn render(&self) -> Result<Vec<u8>> {
		let mut content = Vec::new();

		if let Some(id3v2) = self.id3v2 {
			if !id3v2.data().is_empty() {
				content.extend(b"id3 ");
				content.write_u32::<LittleEndian>(id3v2.data().len() as u32)?;
				content.extend(id3v2.data());
				if id3v2.data().len() % 2 != 0 {
					content.push(0);
				}
			}
		}

		if let Some(info) = self.info {
			if !info.list().is_empty() {
				content.extend(info.list().render(b"INFO")?);
			}
		}

		if let Some(movie_id) = self.movie_id {
			if !movie_id.list().is_empty() {
				content.extend(movie_id.list().render(b"MID ")?);
			}
		}

		if let Some(divx) = self.divx {
			if !divx.is_empty() {
				let rendered = divx.render();

				content.extend(b"IDVX");
				content.write_u32::<LittleEndian>(rendered.len() as u32)?;
				content.extend(rendered);
			}
		}

		Ok(content)
	}
}

pub(crate) fn write_to<F>(
	file: &mut F,
	tags: &RiffTagsRef<'_>,
	write_options: WriteOptions,
) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	file.rewind()?;
	verify_riff(file)?;

	let file_len = file.len()?;
	let chunks = scan_chunks(file, file_len)?;

	let new_content = tags.render()?;

	let tag_indices: Vec<usize> = chunks
		.iter()
		.enumerate()
		.filter(|(_, chunk)| chunk.is_tag_chunk())
		.map(|(idx, _)| idx)
		.collect();

	if tag_indices.is_empty() {
		if new_content.is_empty() {
			log::debug!("Nothing to do");
			return Ok(());
		}

		// No prior tag location. Tags slot in just before the payload
		// chunk, or at the end of the file as a last resort.
		let insert_pos = find_data_chunk(&chunks).map_or(file_len, |chunk| chunk.start);

		let mut region = new_content;
		if let Some(padding) = padding_size(write_options) {
			region.extend(junk_chunk(padding));
		}

		io::insert(file, &region, insert_pos, 0)?;
		return fix_riff_size(file);
	}

	// Infallible, the index list is non-empty
	let first = tag_indices[0];
	let last = *tag_indices.last().unwrap();

	// Trailing JUNK joins the region
	let mut last_expanded = last;
	while last_expanded + 1 < chunks.len() && chunks[last_expanded + 1].is_junk() {
		last_expanded += 1;
	}

	let contiguous = (first..=last_expanded)
		.all(|idx| chunks[idx].is_tag_chunk() || chunks[idx].is_junk());

	if contiguous {
		let region_start = chunks[first].start;
		let region_end = chunks[last_expanded].end();
		let freed = region_end - region_start;

		if new_content.is_empty() {
			log::debug!("All tags removed, freeing {freed} bytes");
			io::insert(file, &[], region_start, freed)?;
			return fix_riff_size(file);
		}

		let mut region = new_content;

		// Chunks are even-aligned throughout, so the leftover space is too
		let needed = region.len() as u64;
		if needed + RIFF_CHUNK_HEADER_SIZE <= freed {
			region.extend(junk_chunk((freed - needed - RIFF_CHUNK_HEADER_SIZE) as u32));
		} else if needed != freed {
			if let Some(padding) = padding_size(write_options) {
				region.extend(junk_chunk(padding));
			}
		}

		io::insert(file, &region, region_start, freed)?;
		return fix_riff_size(file);
	}

	// The tagging chunks are scattered through the file. Remove each one
	// (plus its trailing JUNK) individually, back to front so the earlier
	// offsets stay valid, then insert the new region where the first one
	// was.
	log::warn!("Tag chunks are not contiguous, removing them individually");

	let insert_pos = chunks[first].start;

	for idx in tag_indices.iter().rev() {
		let chunk = &chunks[*idx];

		let mut region_end = chunk.end();
		let mut next = *idx + 1;
		while next < chunks.len() && chunks[next].is_junk() {
			region_end = chunks[next].end();
			next += 1;
		}

		io::insert(file, &[], chunk.start, region_end - chunk.start)?;
	}

	if !new_content.is_empty() {
		let mut region = new_content;
		if let Some(padding) = padding_size(write_options) {
			region.extend(junk_chunk(padding));
		}

		io::insert(file, &region, insert_pos, 0)?;
	}

	fix_riff_size(file)
}

// Keeps the chunk even-aligned
fn padding_size(write_options: WriteOptions) -> Option<u32> {
	write_options
		.preferred_padding
		.map(|preferred| preferred + (preferred % 2))
}

fn junk_chunk(content_len: u32) -> Vec<u8> {
	let mut chunk = Vec::with_capacity(content_len as usize + 8);

	chunk.extend(b"JUNK");
	chunk.extend(content_len.to_le_bytes());
	chunk.extend(std::iter::repeat_n(0, content_len as usize));
	if content_len % 2 != 0 {
		chunk.push(0);
	}

	chunk
}

// The top-level size field covers everything past itself
fn fix_riff_size<F>(file: &mut F) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	let file_len = file.len()?;

	file.seek(SeekFrom::Start(4))?;
	file.write_u32::<LittleEndian>((file_len.saturating_sub(8)) as u32)?;
	file.rewind()?;

	Ok(())
}
