use crate::error::Result;
use crate::macros::err;
use crate::tag::{Tag, TagTypes};
use crate::util::text::{latin1_decode, latin1_encode};

use std::borrow::Cow;

pub(crate) const DIVX_TAG_IDENTIFIER: [u8; 7] = *b"DIVXTAG";
pub(crate) const DIVX_TAG_SIZE: usize = 128;

/// The DivX genre list, the stored 3-digit genre field indexes into this
pub const VIDEO_GENRES: [&str; 26] = [
	"Action",
	"Action/Adventure",
	"Adult",
	"Adventure",
	"Animation",
	"Biography",
	"Comedy",
	"Crime",
	"Documentary",
	"Drama",
	"Educational",
	"Erotic",
	"Family",
	"Fantasy",
	"History",
	"Horror",
	"Music Video",
	"Musical",
	"Mystery",
	"Religious",
	"Sci-Fi",
	"Sex",
	"Sport",
	"Thriller",
	"Western",
	"Other",
];

/// A DivX tag
///
/// A fixed 128-byte trailer ending in a literal `"DIVXTAG"` identifier,
/// Latin-1 space-padded throughout:
///
/// | Field    | Size |
/// |----------|------|
/// | title    | 32   |
/// | artist   | 28   |
/// | year     | 4    |
/// | comment  | 48   |
/// | genre    | 3    |
/// | reserved | 6    |
/// | marker   | 7    |
///
/// The genre is a 3-digit ASCII index into [`VIDEO_GENRES`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DivxTag {
	/// Movie title, 32 bytes max
	pub title: Option<String>,
	/// Performing artist, 28 bytes max
	pub artist: Option<String>,
	/// Release year (max 9999)
	pub year: Option<u32>,
	/// A short comment, 48 bytes max
	pub comment: Option<String>,
	/// Index into [`VIDEO_GENRES`]
	pub genre: Option<u8>,
}

impl DivxTag {
	/// Create a new empty `DivxTag`
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a `DivxTag` from its fixed 128-byte layout
	///
	/// # Errors
	///
	/// The trailing `"DIVXTAG"` identifier is missing
	pub fn parse(reader: [u8; 128]) -> Result<Self> {
		if reader[121..] != DIVX_TAG_IDENTIFIER {
			err!(FakeTag);
		}

		let title = decode_field(&reader[..32]);
		let artist = decode_field(&reader[32..60]);
		let year = decode_field(&reader[60..64]).and_then(|year| year.parse().ok());
		let comment = decode_field(&reader[64..112]);
		let genre = decode_field(&reader[112..115]).and_then(|genre| genre.parse().ok());

		Ok(Self {
			title,
			artist,
			year,
			comment,
			genre,
		})
	}

	/// Render the tag to its fixed 128-byte layout
	pub fn render(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(DIVX_TAG_SIZE);

		encode_field(&mut out, self.title.as_deref(), 32);
		encode_field(&mut out, self.artist.as_deref(), 28);

		let year = self
			.year
			.map(|year| format!("{:04}", year.min(9999)))
			.unwrap_or_default();
		encode_field(&mut out, Some(&year), 4);

		encode_field(&mut out, self.comment.as_deref(), 48);

		let genre = self.genre.map(|genre| format!("{genre:03}")).unwrap_or_default();
		encode_field(&mut out, Some(&genre), 3);

		// Reserved
		out.extend([b' '; 6]);
		out.extend(DIVX_TAG_IDENTIFIER);

		out
	}
}

fn decode_field(data: &[u8]) -> Option<String> {
	let end = data
		.iter()
		.rposition(|&b| b != b' ' && b != 0)
		.map_or(0, |pos| pos + 1);

	if end == 0 {
		return None;
	}

	Some(latin1_decode(&data[..end]))
}

fn encode_field(out: &mut Vec<u8>, value: Option<&str>, size: usize) {
	let mut field = vec![b' '; size];

	if let Some(value) = value {
		for (i, b) in latin1_encode(value, true).take(size).enumerate() {
			// Infallible with lossy encoding
			field[i] = b.unwrap_or(b'?');
		}
	}

	out.extend(field);
}

impl Tag for DivxTag {
	fn tag_types(&self) -> TagTypes {
		TagTypes::DIVX
	}

	fn title(&self) -> Option<Cow<'_, str>> {
		self.title.as_deref().map(Cow::Borrowed)
	}

	fn set_title(&mut self, value: String) {
		self.title = Some(value);
	}

	fn remove_title(&mut self) {
		self.title = None;
	}

	fn comment(&self) -> Option<Cow<'_, str>> {
		self.comment.as_deref().map(Cow::Borrowed)
	}

	fn set_comment(&mut self, value: String) {
		self.comment = Some(value);
	}

	fn remove_comment(&mut self) {
		self.comment = None;
	}

	fn performers(&self) -> Vec<String> {
		self.artist.clone().map_or_else(Vec::new, |artist| vec![artist])
	}

	fn set_performers(&mut self, value: Vec<String>) {
		if value.is_empty() {
			self.artist = None;
			return;
		}

		self.artist = Some(value.join("; "));
	}

	fn remove_performers(&mut self) {
		self.artist = None;
	}

	fn genres(&self) -> Vec<String> {
		if let Some(genre) = self.genre {
			if let Some(name) = VIDEO_GENRES.get(usize::from(genre)) {
				return vec![(*name).to_string()];
			}
		}

		Vec::new()
	}

	fn set_genres(&mut self, value: Vec<String>) {
		let Some(first) = value.first() else {
			self.genre = None;
			return;
		};

		self.genre = VIDEO_GENRES
			.iter()
			.position(|genre| genre.eq_ignore_ascii_case(first))
			.map(|pos| pos as u8);
	}

	fn remove_genres(&mut self) {
		self.genre = None;
	}

	fn year(&self) -> Option<u32> {
		self.year
	}

	fn set_year(&mut self, value: u32) {
		self.year = Some(value);
	}

	fn remove_year(&mut self) {
		self.year = None;
	}

	fn clear(&mut self) {
		*self = Self::default();
	}
}

#[cfg(test)]
mod tests {
	use super::DivxTag;
	use crate::tag::Tag;

	fn filled_tag() -> DivxTag {
		DivxTag {
			title: Some(String::from("A film")),
			artist: Some(String::from("Some director")),
			year: Some(2003),
			comment: Some(String::from("A comment")),
			genre: Some(6),
		}
	}

	#[test_log::test]
	fn divx_round_trip() {
		let tag = filled_tag();

		let rendered = tag.render();
		assert_eq!(rendered.len(), 128);
		assert_eq!(&rendered[121..], b"DIVXTAG");

		let parsed = DivxTag::parse(rendered.try_into().unwrap()).unwrap();
		assert_eq!(parsed, tag);
	}

	#[test_log::test]
	fn missing_identifier_rejected() {
		let mut rendered = filled_tag().render();
		rendered[121] = b'X';

		assert!(DivxTag::parse(rendered.try_into().unwrap()).is_err());
	}

	#[test_log::test]
	fn genre_table() {
		let tag = filled_tag();
		assert_eq!(tag.genres(), vec![String::from("Comedy")]);

		let mut tag = tag;
		tag.set_genres(vec![String::from("western")]);
		assert_eq!(tag.genre, Some(24));
	}

	#[test_log::test]
	fn oversized_fields_truncated() {
		let mut tag = filled_tag();
		tag.set_title("T".repeat(50));

		let rendered = tag.render();
		let parsed = DivxTag::parse(rendered.try_into().unwrap()).unwrap();

		assert_eq!(parsed.title.unwrap().len(), 32);
	}
}
