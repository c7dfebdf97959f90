#![allow(missing_docs)]
use stave::config::{ParseOptions, WriteOptions};
use stave::flac::FlacFile;
use stave::picture::{MimeType, Picture, PictureType};
use stave::prelude::*;

use std::io::Cursor;

const SAMPLE_RATE: u32 = 44100;
const TOTAL_SAMPLES: u32 = 88200;
const AUDIO_PAYLOAD: &[u8] = b"not really audio frames, but they must survive byte-exact";

fn streaminfo_content() -> Vec<u8> {
	let mut content = Vec::new();

	// Min/max block size
	content.extend(4096u16.to_be_bytes());
	content.extend(4096u16.to_be_bytes());
	// Min/max frame size
	content.extend([0; 6]);

	// Sample rate (20) | channels - 1 (3) | bits per sample - 1 (5) | total samples high (4)
	let info = (SAMPLE_RATE << 12) | ((2 - 1) << 9) | ((16 - 1) << 4);
	content.extend(info.to_be_bytes());
	content.extend(TOTAL_SAMPLES.to_be_bytes());

	// MD5 signature
	content.extend([0; 16]);

	content
}

fn block(ty: u8, last: bool, content: &[u8]) -> Vec<u8> {
	let mut bytes = Vec::new();

	let mut byte = ty;
	if last {
		byte |= 0x80;
	}

	bytes.push(byte);
	bytes.extend(&(content.len() as u32).to_be_bytes()[1..]);
	bytes.extend(content);

	bytes
}

fn minimal_flac() -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend(block(0, true, &streaminfo_content()));
	file.extend(AUDIO_PAYLOAD);
	file
}

fn flac_with_padding(padding_size: usize) -> Vec<u8> {
	let mut file = b"fLaC".to_vec();
	file.extend(block(0, false, &streaminfo_content()));
	file.extend(block(1, true, &vec![0; padding_size]));
	file.extend(AUDIO_PAYLOAD);
	file
}

// Walks the metadata blocks of a rendered file, returning (type, size) pairs
fn block_layout(file: &[u8]) -> Vec<(u8, u32)> {
	assert_eq!(&file[..4], b"fLaC");

	let mut layout = Vec::new();
	let mut pos = 4;
	loop {
		let byte = file[pos];
		let size = u32::from_be_bytes([0, file[pos + 1], file[pos + 2], file[pos + 3]]);

		layout.push((byte & 0x7F, size));
		pos += 4 + size as usize;

		if byte & 0x80 != 0 {
			break;
		}
	}

	layout
}

fn metadata_end(file: &[u8]) -> usize {
	4 + block_layout(file)
		.iter()
		.map(|(_, size)| 4 + *size as usize)
		.sum::<usize>()
}

#[test_log::test]
fn end_to_end_round_trip() {
	let original = minimal_flac();

	let mut cursor = Cursor::new(original.clone());
	let mut flac_file = FlacFile::read_from(&mut cursor, ParseOptions::new()).unwrap();

	// No comment block exists yet, but a default tag is created on open
	let tag = flac_file.tag_mut();
	assert!(tag.is_empty());

	tag.set_title(String::from("Track A"));
	tag.set_performers(vec![String::from("Artist")]);

	let picture = Picture::new(
		PictureType::CoverFront,
		Some(MimeType::Png),
		None,
		vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4],
	);
	flac_file.xiph_comment_mut().unwrap().push_picture(picture.clone());

	let mut file = Cursor::new(original);
	flac_file.save_to(&mut file, WriteOptions::default()).unwrap();

	// Re-open and verify everything round-tripped
	let saved = file.into_inner();
	let reread = FlacFile::read_from(&mut Cursor::new(saved.clone()), ParseOptions::new()).unwrap();

	let tag = reread.tag();
	assert_eq!(tag.title().as_deref(), Some("Track A"));
	assert_eq!(tag.performers(), vec![String::from("Artist")]);

	let pictures = tag.pictures();
	assert_eq!(pictures.len(), 1);
	assert_eq!(pictures[0].data(), picture.data());

	// Exactly one comment block and one picture block, and the original
	// STREAMINFO is byte-identical
	let layout = block_layout(&saved);
	assert_eq!(layout[0].0, 0);
	assert_eq!(layout.iter().filter(|(ty, _)| *ty == 4).count(), 1);
	assert_eq!(layout.iter().filter(|(ty, _)| *ty == 6).count(), 1);
	assert_eq!(&saved[8..8 + 34], streaminfo_content().as_slice());

	// The audio payload is untouched at the tail
	assert!(saved.ends_with(AUDIO_PAYLOAD));

	assert_eq!(reread.properties().sample_rate(), SAMPLE_RATE);
	assert_eq!(reread.properties().duration().as_secs(), 2);
}

#[test_log::test]
fn padding_exactly_fills_freed_space() {
	let original = flac_with_padding(4096);
	let original_metadata_end = metadata_end(&original);

	let mut flac_file =
		FlacFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	flac_file.tag_mut().set_title(String::from("short"));

	let mut file = Cursor::new(original);
	flac_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();

	// New metadata is smaller than the old span, so padding grows to fill
	// it exactly: the metadata span (and the whole file) keeps its size
	assert_eq!(metadata_end(&saved), original_metadata_end);

	let layout = block_layout(&saved);
	let (last_ty, _) = layout.last().unwrap();
	assert_eq!(*last_ty, 1);

	assert!(saved.ends_with(AUDIO_PAYLOAD));
}

#[test_log::test]
fn save_is_idempotent() {
	let original = flac_with_padding(512);

	let mut flac_file =
		FlacFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	flac_file.tag_mut().set_title(String::from("Foo title"));
	flac_file.tag_mut().set_year(1998);

	let mut file = Cursor::new(original);
	flac_file
		.save_to(&mut file, WriteOptions::default())
		.unwrap();
	let first_save = file.into_inner();

	// Saving again without edits must be byte-identical
	let reread =
		FlacFile::read_from(&mut Cursor::new(first_save.clone()), ParseOptions::new()).unwrap();

	let mut file = Cursor::new(first_save.clone());
	reread.save_to(&mut file, WriteOptions::default()).unwrap();

	assert_eq!(file.into_inner(), first_save);
}

#[test_log::test]
fn id3v1_sandwich_tag() {
	let original = minimal_flac();

	let mut flac_file =
		FlacFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();

	let id3v1 = flac_file.tag_mut().create_tag(TagType::Id3v1, false).unwrap();
	id3v1.set_title(String::from("Foo title"));

	let mut file = Cursor::new(original.clone());
	flac_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();
	assert_eq!(&saved[saved.len() - 128..][..3], b"TAG");

	let reread =
		FlacFile::read_from(&mut Cursor::new(saved.clone()), ParseOptions::new()).unwrap();
	assert!(reread.tag().contains_tag_type(TagType::Id3v1));

	// Stripping it again restores the original layout
	let mut reread = reread;
	reread.remove_tags(TagTypes::ID3V1);

	let mut file = Cursor::new(saved);
	reread.save_to(&mut file, WriteOptions::default()).unwrap();

	assert!(file.into_inner().ends_with(AUDIO_PAYLOAD));
}

#[test_log::test]
fn corrupt_marker_is_fatal() {
	let mut original = minimal_flac();
	original[0] = b'X';

	assert!(FlacFile::read_from(&mut Cursor::new(original), ParseOptions::new()).is_err());
}