#![allow(missing_docs)]
use stave::config::{ParseOptions, WriteOptions};
use stave::file::FileType;
use stave::prelude::*;
use stave::read_from;

use std::io::{Cursor, Write};

fn minimal_wav() -> Vec<u8> {
	let mut fmt = Vec::new();
	fmt.extend(1u16.to_le_bytes());
	fmt.extend(1u16.to_le_bytes());
	fmt.extend(8000u32.to_le_bytes());
	fmt.extend(16000u32.to_le_bytes());
	fmt.extend(2u16.to_le_bytes());
	fmt.extend(16u16.to_le_bytes());

	let mut body = b"WAVE".to_vec();
	body.extend(b"fmt ");
	body.extend((fmt.len() as u32).to_le_bytes());
	body.extend(fmt);
	body.extend(b"data");
	body.extend(8u32.to_le_bytes());
	body.extend(b"12345678");

	let mut file = b"RIFF".to_vec();
	file.extend((body.len() as u32).to_le_bytes());
	file.extend(body);
	file
}

#[test_log::test]
fn content_probe_dispatches() {
	let wav = minimal_wav();

	let tagged_file = read_from(&mut Cursor::new(wav), ParseOptions::new()).unwrap();
	assert_eq!(tagged_file.file_type(), FileType::Wav);

	let properties = tagged_file.properties();
	assert_eq!(properties.sample_rate(), Some(8000));
	assert_eq!(properties.channels(), Some(1));
}

#[test_log::test]
fn unknown_content_is_rejected() {
	let mut garbage = Cursor::new(b"this is not any audio format".to_vec());
	assert!(read_from(&mut garbage, ParseOptions::new()).is_err());
}

#[test_log::test]
fn save_through_generic_surface() {
	let wav = minimal_wav();

	let mut tagged_file =
		read_from(&mut Cursor::new(wav.clone()), ParseOptions::new()).unwrap();
	tagged_file.tag_mut().set_title(String::from("Foo title"));

	let mut file = Cursor::new(wav);
	tagged_file
		.save_to(&mut file, WriteOptions::default())
		.unwrap();

	let reread = read_from(&mut Cursor::new(file.into_inner()), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("Foo title"));
}

#[test_log::test]
fn save_to_path_round_trip() {
	let wav = minimal_wav();

	let mut temp_file = tempfile::NamedTempFile::new().unwrap();
	temp_file.write_all(&wav).unwrap();

	let mut tagged_file =
		read_from(&mut Cursor::new(wav), ParseOptions::new()).unwrap();
	tagged_file.tag_mut().set_title(String::from("On disk"));

	tagged_file
		.save_to_path(temp_file.path(), WriteOptions::default())
		.unwrap();

	let reread =
		stave::read_from_path(temp_file.path(), ParseOptions::new()).unwrap();
	assert_eq!(reread.tag().title().as_deref(), Some("On disk"));
}