#![allow(missing_docs)]
use stave::config::{ParseOptions, WriteOptions};
use stave::prelude::*;
use stave::riff::{RiffFile, RiffForm};

use std::io::Cursor;

const AUDIO_PAYLOAD: &[u8] = b"PCM samples that must survive byte-exact....";

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

fn fmt_chunk() -> Vec<u8> {
	let mut content = Vec::new();
	content.extend(1u16.to_le_bytes()); // PCM
	content.extend(2u16.to_le_bytes()); // Channels
	content.extend(44100u32.to_le_bytes()); // Sample rate
	content.extend(176400u32.to_le_bytes()); // Avg bytes per sec
	content.extend(4u16.to_le_bytes()); // Block align
	content.extend(16u16.to_le_bytes()); // Bit depth
	chunk(b"fmt ", &content)
}

fn list_chunk(list_type: &[u8; 4], items: &[(&[u8; 4], &str)]) -> Vec<u8> {
	let mut content = list_type.to_vec();
	for (id, value) in items {
		let mut bytes = value.as_bytes().to_vec();
		bytes.push(0);
		if bytes.len() % 2 != 0 {
			bytes.push(0);
		}

		content.extend_from_slice(*id);
		content.extend((bytes.len() as u32).to_le_bytes());
		content.extend(bytes);
	}
	chunk(b"LIST", &content)
}

fn divx_chunk(title: &str) -> Vec<u8> {
	let mut content = vec![b' '; 128];
	content[..title.len()].copy_from_slice(title.as_bytes());
	content[121..].copy_from_slice(b"DIVXTAG");
	chunk(b"IDVX", &content)
}

fn wav_file(chunks: &[Vec<u8>]) -> Vec<u8> {
	let mut body = b"WAVE".to_vec();
	for chunk in chunks {
		body.extend(chunk);
	}

	let mut file = b"RIFF".to_vec();
	file.extend((body.len() as u32).to_le_bytes());
	file.extend(body);
	file
}

// Returns (fourcc, list_type, start, size) for every top-level chunk
fn chunk_layout(file: &[u8]) -> Vec<([u8; 4], Option<[u8; 4]>, usize, u32)> {
	let mut layout = Vec::new();

	let mut pos = 12;
	while pos + 8 <= file.len() {
		let fourcc: [u8; 4] = file[pos..pos + 4].try_into().unwrap();
		let size = u32::from_le_bytes(file[pos + 4..pos + 8].try_into().unwrap());

		let list_type = (&fourcc == b"LIST")
			.then(|| file[pos + 8..pos + 12].try_into().unwrap());

		layout.push((fourcc, list_type, pos, size));
		pos += 8 + size as usize + (size as usize % 2);
	}

	layout
}

fn riff_size(file: &[u8]) -> u32 {
	u32::from_le_bytes(file[4..8].try_into().unwrap())
}

#[test_log::test]
fn fresh_tags_insert_before_data() {
	let original = wav_file(&[fmt_chunk(), chunk(b"data", AUDIO_PAYLOAD)]);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	assert_eq!(riff_file.form(), RiffForm::Wave);

	// The default INFO tag was created on open
	riff_file.tag_mut().set_title(String::from("Foo title"));
	riff_file
		.tag_mut()
		.set_album_artists(vec![String::from("Bar artist")]);

	let mut file = Cursor::new(original);
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();
	let layout = chunk_layout(&saved);

	// fmt, INFO, JUNK, data
	let kinds: Vec<_> = layout
		.iter()
		.map(|(fourcc, list_type, ..)| (*fourcc, *list_type))
		.collect();
	assert_eq!(
		kinds,
		vec![
			(*b"fmt ", None),
			(*b"LIST", Some(*b"INFO")),
			(*b"JUNK", None),
			(*b"data", None),
		]
	);

	assert_eq!(riff_size(&saved) as usize, saved.len() - 8);
	assert!(saved.ends_with(AUDIO_PAYLOAD));

	let reread = RiffFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("Foo title"));
	assert_eq!(
		reread.tag().album_artists(),
		vec![String::from("Bar artist")]
	);
}

#[test_log::test]
fn contiguous_run_is_replaced_in_place() {
	// INFO, MID, and IDVX are adjacent, so a save touches nothing else
	let original = wav_file(&[
		fmt_chunk(),
		list_chunk(b"INFO", &[(b"INAM", "An old title long enough to leave spare room")]),
		list_chunk(b"MID ", &[(b"TITL", "Old movie title")]),
		divx_chunk("Old divx title"),
		chunk(b"data", AUDIO_PAYLOAD),
	]);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();

	assert_eq!(
		riff_file.tag().title().as_deref(),
		Some("An old title long enough to leave spare room")
	);
	assert!(riff_file.tag().contains_tag_type(TagType::Divx));

	riff_file.tag_mut().set_title(String::from("New title"));

	let mut file = Cursor::new(original.clone());
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();

	// The new region shrank inside the freed space; the run is replaced in
	// one splice and the file keeps its size
	assert_eq!(saved.len(), original.len());

	let layout = chunk_layout(&saved);

	// The run is replaced as a whole: one INFO, one MID, one IDVX, one
	// JUNK, all still between fmt and data
	let kinds: Vec<_> = layout
		.iter()
		.map(|(fourcc, list_type, ..)| (*fourcc, *list_type))
		.collect();
	assert_eq!(
		kinds,
		vec![
			(*b"fmt ", None),
			(*b"LIST", Some(*b"INFO")),
			(*b"LIST", Some(*b"MID ")),
			(*b"IDVX", None),
			(*b"JUNK", None),
			(*b"data", None),
		]
	);

	assert_eq!(riff_size(&saved) as usize, saved.len() - 8);

	let reread = RiffFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("New title"));

	// The other tags round-tripped untouched
	let movie_id = reread.tag().get_tag(TagType::MovieId).unwrap();
	assert_eq!(movie_id.title().as_deref(), Some("Old movie title"));
	let divx = reread.tag().get_tag(TagType::Divx).unwrap();
	assert_eq!(divx.title().as_deref(), Some("Old divx title"));
}

#[test_log::test]
fn scattered_tags_are_gathered() {
	// The INFO list and the DivX chunk are separated by the fmt chunk, so
	// the save must fall back to removing them individually
	let original = wav_file(&[
		list_chunk(b"INFO", &[(b"INAM", "Old title")]),
		fmt_chunk(),
		divx_chunk("Old divx title"),
		chunk(b"data", AUDIO_PAYLOAD),
	]);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	riff_file.tag_mut().set_title(String::from("New title"));

	let mut file = Cursor::new(original);
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();
	let layout = chunk_layout(&saved);

	// Both tag chunks now live in one region where the INFO list was
	let kinds: Vec<_> = layout
		.iter()
		.map(|(fourcc, list_type, ..)| (*fourcc, *list_type))
		.collect();
	assert_eq!(
		kinds,
		vec![
			(*b"LIST", Some(*b"INFO")),
			(*b"IDVX", None),
			(*b"JUNK", None),
			(*b"fmt ", None),
			(*b"data", None),
		]
	);

	assert!(saved.ends_with(AUDIO_PAYLOAD));

	let reread = RiffFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("New title"));
	let divx = reread.tag().get_tag(TagType::Divx).unwrap();
	assert_eq!(divx.title().as_deref(), Some("Old divx title"));
}

#[test_log::test]
fn freed_space_is_reused() {
	let long_title = "t".repeat(400);
	let original = wav_file(&[
		fmt_chunk(),
		list_chunk(b"INFO", &[(b"INAM", &long_title)]),
		chunk(b"data", AUDIO_PAYLOAD),
	]);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	riff_file.tag_mut().set_title(String::from("short"));

	let mut file = Cursor::new(original.clone());
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	// The new tag shrank inside the freed space, the file must not grow
	let saved = file.into_inner();
	assert_eq!(saved.len(), original.len());

	let layout = chunk_layout(&saved);
	assert!(layout.iter().any(|(fourcc, ..)| fourcc == b"JUNK"));
}

#[test_log::test]
fn removing_all_tags() {
	let original = wav_file(&[
		fmt_chunk(),
		list_chunk(b"INFO", &[(b"INAM", "Old title")]),
		chunk(b"data", AUDIO_PAYLOAD),
	]);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	riff_file.remove_tags(TagTypes::ALL);

	let mut file = Cursor::new(original);
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();
	let layout = chunk_layout(&saved);

	assert!(!layout.iter().any(|(fourcc, list_type, ..)| {
		fourcc == b"IDVX" || matches!(list_type, Some(ty) if ty == b"INFO")
	}));
	assert_eq!(riff_size(&saved) as usize, saved.len() - 8);
}

#[test_log::test]
fn avi_form_uses_movie_id() {
	let mut avih = Vec::new();
	avih.extend(b"avih");
	avih.extend(56u32.to_le_bytes());
	let mut avih_content = vec![0u8; 56];
	avih_content[..4].copy_from_slice(&40_000u32.to_le_bytes()); // 25 fps
	avih_content[16..20].copy_from_slice(&250u32.to_le_bytes()); // Total frames
	avih_content[32..36].copy_from_slice(&640u32.to_le_bytes()); // Width
	avih_content[36..40].copy_from_slice(&480u32.to_le_bytes()); // Height
	avih.extend(avih_content);

	let mut hdrl = b"hdrl".to_vec();
	hdrl.extend(avih);

	let mut body = b"AVI ".to_vec();
	body.extend(chunk(b"LIST", &hdrl));
	body.extend(chunk(b"LIST", &{
		let mut movi = b"movi".to_vec();
		movi.extend(b"00dcfake");
		movi
	}));

	let mut original = b"RIFF".to_vec();
	original.extend((body.len() as u32).to_le_bytes());
	original.extend(body);

	let mut riff_file =
		RiffFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();
	assert_eq!(riff_file.form(), RiffForm::Avi);

	// AVI files get a default MovieID tag
	assert!(riff_file.tag().contains_tag_type(TagType::MovieId));

	riff_file.tag_mut().set_title(String::from("A film"));

	let mut file = Cursor::new(original);
	riff_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();

	// The tag landed before the movi list
	let layout = chunk_layout(&saved);
	let mid_pos = layout
		.iter()
		.position(|(_, list_type, ..)| *list_type == Some(*b"MID "))
		.unwrap();
	let movi_pos = layout
		.iter()
		.position(|(_, list_type, ..)| *list_type == Some(*b"movi"))
		.unwrap();
	assert!(mid_pos < movi_pos);

	let reread = RiffFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("A film"));
	assert_eq!(reread.properties().duration().as_secs(), 10);
}