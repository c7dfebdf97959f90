#![allow(missing_docs)]
use stave::config::{ParseOptions, WriteOptions};
use stave::ogg::OggFile;
use stave::prelude::*;

use ogg_stitch::{CONTAINS_FIRST_PAGE_OF_BITSTREAM, CONTAINS_LAST_PAGE_OF_BITSTREAM, Page};

use std::io::Cursor;

fn vorbis_ident_packet() -> Vec<u8> {
	let mut packet = b"\x01vorbis".to_vec();
	packet.extend(0u32.to_le_bytes()); // Version
	packet.push(2); // Channels
	packet.extend(44100u32.to_le_bytes()); // Sample rate
	packet.extend(0i32.to_le_bytes()); // Bitrate maximum
	packet.extend(128_000i32.to_le_bytes()); // Bitrate nominal
	packet.extend(0i32.to_le_bytes()); // Bitrate minimum
	packet.push(0xB8); // Blocksizes
	packet.push(1); // Framing
	packet
}

fn vorbis_comment_packet(vendor: &str, fields: &[(&str, &str)]) -> Vec<u8> {
	let mut packet = b"\x03vorbis".to_vec();
	packet.extend((vendor.len() as u32).to_le_bytes());
	packet.extend(vendor.as_bytes());
	packet.extend((fields.len() as u32).to_le_bytes());

	for (key, value) in fields {
		let field = format!("{key}={value}");
		packet.extend((field.len() as u32).to_le_bytes());
		packet.extend(field.as_bytes());
	}

	packet.push(1); // Framing bit
	packet
}

fn vorbis_setup_packet() -> Vec<u8> {
	let mut packet = b"\x05vorbis".to_vec();
	packet.extend(vec![0; 32]);
	packet.push(1);
	packet
}

// Large enough that a stream spans multiple pages
fn audio_packet(seed: u8) -> Vec<u8> {
	(0..40_000).map(|i| seed.wrapping_add(i as u8)).collect()
}

fn vorbis_stream(serial: u32, vendor: &str, fields: &[(&str, &str)]) -> Vec<u8> {
	let ident = vorbis_ident_packet();
	let comment = vorbis_comment_packet(vendor, fields);
	let setup = vorbis_setup_packet();
	let audio_a = audio_packet(serial as u8);
	let audio_b = audio_packet((serial as u8).wrapping_add(7));

	let packets: Vec<(&[u8], u64)> = vec![
		(&ident, 0),
		(&comment, 0),
		(&setup, 0),
		(&audio_a, 44100),
		(&audio_b, 88200),
	];

	let pages = ogg_stitch::paginate(
		packets,
		serial,
		CONTAINS_FIRST_PAGE_OF_BITSTREAM | CONTAINS_LAST_PAGE_OF_BITSTREAM,
	)
	.unwrap();

	let mut bytes = Vec::new();
	for mut page in pages {
		page.gen_crc();
		bytes.extend(page.as_bytes());
	}
	bytes
}

fn page_serials_and_sequences(file: &[u8]) -> Vec<(u32, u32)> {
	let mut reader = Cursor::new(file);
	let mut pages = Vec::new();

	while let Ok(page) = Page::read(&mut reader) {
		pages.push((page.header().stream_serial, page.header().sequence_number));
	}

	pages
}

#[test_log::test]
fn single_stream_round_trip() {
	let original = vorbis_stream(
		1001,
		"test vendor",
		&[("TITLE", "Old title"), ("TRACKNUMBER", "3/12")],
	);

	let mut ogg_file =
		OggFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();

	let tag = ogg_file.tag();
	assert_eq!(tag.title().as_deref(), Some("Old title"));

	// Fractional fallback
	assert_eq!(tag.track(), Some(3));
	assert_eq!(tag.track_count(), Some(12));

	assert_eq!(ogg_file.properties().sample_rate(), 44100);
	assert_eq!(ogg_file.properties().channels(), 2);
	assert_eq!(ogg_file.properties().duration().as_secs(), 2);

	let tag = ogg_file.tag_mut();
	tag.set_title(String::from("New title"));
	tag.set_track(5);

	let mut file = Cursor::new(original);
	ogg_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();
	let reread = OggFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();

	assert_eq!(reread.tag().title().as_deref(), Some("New title"));
	assert_eq!(reread.tag().track(), Some(5));
	assert_eq!(reread.tag().track_count(), Some(12));

	// The vendor survived the rewrite
	let comment = reread.comment_by_serial(1001).unwrap();
	assert_eq!(comment.vendor(), "test vendor");
}

#[test_log::test]
fn multiplexed_streams_interleave() {
	let mut original = vorbis_stream(10, "vendor a", &[("TITLE", "Stream A")]);
	original.extend(vorbis_stream(20, "vendor b", &[("TITLE", "Stream B")]));

	let mut ogg_file =
		OggFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();

	// One comment per logical bitstream
	assert_eq!(ogg_file.tag().tags().len(), 2);
	assert_eq!(
		ogg_file.comment_by_serial(10).unwrap().get("TITLE"),
		Some("Stream A")
	);
	assert_eq!(
		ogg_file.comment_by_serial(20).unwrap().get("TITLE"),
		Some("Stream B")
	);

	// Write to all members
	ogg_file.tag_mut().set_write_to_all(true);
	ogg_file.tag_mut().set_genres(vec![String::from("Rock")]);

	let mut file = Cursor::new(original);
	ogg_file.save_to(&mut file, WriteOptions::default()).unwrap();

	let saved = file.into_inner();

	// Pages from both streams are interleaved round-robin and renumbered
	// per stream
	let pages = page_serials_and_sequences(&saved);
	assert!(pages.len() >= 4);
	assert_eq!(pages[0].0, 10);
	assert_eq!(pages[1].0, 20);

	for serial in [10, 20] {
		let sequences: Vec<u32> = pages
			.iter()
			.filter(|(s, _)| *s == serial)
			.map(|(_, seq)| *seq)
			.collect();
		let expected: Vec<u32> = (0..sequences.len() as u32).collect();
		assert_eq!(sequences, expected, "stream {serial} is misnumbered");
	}

	let reread = OggFile::read_from(&mut Cursor::new(saved), ParseOptions::new()).unwrap();
	assert_eq!(
		reread.comment_by_serial(10).unwrap().get("GENRE"),
		Some("Rock")
	);
	assert_eq!(
		reread.comment_by_serial(20).unwrap().get("GENRE"),
		Some("Rock")
	);
	assert_eq!(
		reread.comment_by_serial(20).unwrap().get("TITLE"),
		Some("Stream B")
	);
}

#[test_log::test]
fn save_is_idempotent() {
	let original = vorbis_stream(77, "vendor", &[("TITLE", "Foo title")]);

	let ogg_file =
		OggFile::read_from(&mut Cursor::new(original.clone()), ParseOptions::new()).unwrap();

	let mut file = Cursor::new(original);
	ogg_file.save_to(&mut file, WriteOptions::default()).unwrap();
	let first_save = file.into_inner();

	let reread =
		OggFile::read_from(&mut Cursor::new(first_save.clone()), ParseOptions::new()).unwrap();

	let mut file = Cursor::new(first_save.clone());
	reread.save_to(&mut file, WriteOptions::default()).unwrap();

	assert_eq!(file.into_inner(), first_save);
}

#[test_log::test]
fn removing_comments_is_unsupported() {
	let original = vorbis_stream(1, "vendor", &[]);

	let mut ogg_file =
		OggFile::read_from(&mut Cursor::new(original), ParseOptions::new()).unwrap();

	assert!(ogg_file.remove_tags(TagTypes::XIPH).is_err());
}

#[test_log::test]
fn garbage_input_is_rejected() {
	let mut garbage = Cursor::new(b"definitely not an ogg stream".to_vec());
	assert!(OggFile::read_from(&mut garbage, ParseOptions::new()).is_err());
}