use crate::id3::v1::constants::GENRES;
use crate::tag::{Tag, TagTypes};

use std::borrow::Cow;

/// An ID3v1 tag
///
/// All fields have been commented with their maximum sizes and any other
/// additional restrictions. Oversized fields are shrunk on render rather
/// than erroring.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Id3v1Tag {
	/// Track title, 30 bytes max
	pub title: Option<String>,
	/// Track artist, 30 bytes max
	pub artist: Option<String>,
	/// Album title, 30 bytes max
	pub album: Option<String>,
	/// Release year (max 9999)
	pub year: Option<u32>,
	/// A short comment
	///
	/// A V1 tag has 30 bytes available, a V1.1 tag only 28. A V1.1 tag is
	/// *always* written.
	pub comment: Option<String>,
	/// The track number, 1 byte max
	///
	/// The track number **cannot** be 0. Many readers, including this
	/// library, look for a null byte at the end of the comment to
	/// differentiate between V1 and V1.1.
	pub track: Option<u8>,
	/// The track's genre
	///
	/// ID3v1 has a predefined set of genres, see [`GENRES`]. This byte
	/// should be an index into it; a value of 255 means no genre. Out of
	/// range indices are retained so they survive a round trip.
	pub genre: Option<u8>,
}

impl Id3v1Tag {
	/// Create a new empty `Id3v1Tag`
	///
	/// # Examples
	///
	/// ```rust
	/// use stave::id3::v1::Id3v1Tag;
	/// use stave::tag::Tag as _;
	///
	/// let id3v1_tag = Id3v1Tag::new();
	/// assert!(id3v1_tag.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}
}

macro_rules! impl_accessor {
	($($name:ident,)+) => {
		paste::paste! {
			$(
				fn $name(&self) -> Option<Cow<'_, str>> {
					self.$name.as_deref().map(Cow::Borrowed)
				}

				fn [<set_ $name>](&mut self, value: String) {
					self.$name = Some(value)
				}

				fn [<remove_ $name>](&mut self) {
					self.$name = None
				}
			)+
		}
	}
}

impl Tag for Id3v1Tag {
	fn tag_types(&self) -> TagTypes {
		TagTypes::ID3V1
	}

	impl_accessor!(title, album,);

	fn comment(&self) -> Option<Cow<'_, str>> {
		self.comment.as_deref().map(Cow::Borrowed)
	}

	fn set_comment(&mut self, value: String) {
		let mut resized = String::with_capacity(28);
		for c in value.chars() {
			if resized.len() + c.len_utf8() > 28 {
				break;
			}

			resized.push(c);
		}

		self.comment = Some(resized);
	}

	fn remove_comment(&mut self) {
		self.comment = None;
	}

	fn performers(&self) -> Vec<String> {
		self.artist.clone().map_or_else(Vec::new, |a| vec![a])
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
			if let Some(name) = GENRES.get(usize::from(genre)) {
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

		self.genre = GENRES
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

	fn track(&self) -> Option<u32> {
		self.track.map(u32::from)
	}

	fn set_track(&mut self, value: u32) {
		// A track number of 0 cannot be represented, it doubles as the
		// V1/V1.1 discriminant
		self.track = u8::try_from(value).ok().filter(|track| *track != 0);
	}

	fn remove_track(&mut self) {
		self.track = None;
	}

	fn clear(&mut self) {
		*self = Self::default();
	}
}

#[cfg(test)]
mod tests {
	use super::Id3v1Tag;
	use crate::config::ParsingMode;
	use crate::id3::v1::encode;
	use crate::tag::{Tag, TagTypes};

	fn filled_tag() -> Id3v1Tag {
		Id3v1Tag {
			title: Some(String::from("Foo title")),
			artist: Some(String::from("Bar artist")),
			album: Some(String::from("Baz album")),
			year: Some(1984),
			comment: Some(String::from("Qux comment")),
			track: Some(1),
			genre: Some(32),
		}
	}

	#[test_log::test]
	fn id3v1_re_read() {
		let tag = filled_tag();

		let rendered = encode(&tag).unwrap();
		assert_eq!(rendered.len(), 128);

		let parsed = Id3v1Tag::parse(rendered.try_into().unwrap(), ParsingMode::Strict).unwrap();
		assert_eq!(parsed, tag);
	}

	#[test_log::test]
	fn oversized_title_is_truncated() {
		let mut tag = filled_tag();
		tag.set_title("T".repeat(40));

		let rendered = encode(&tag).unwrap();
		let parsed = Id3v1Tag::parse(rendered.try_into().unwrap(), ParsingMode::Strict).unwrap();

		let title = parsed.title.unwrap();
		assert!(title.len() <= 30);
		assert!(!title.contains('\0'));
	}

	#[test_log::test]
	fn v1_0_comment_without_track() {
		let mut rendered = encode(&filled_tag()).unwrap();

		// Rewrite the comment region as a full 30-byte V1.0 comment
		for byte in &mut rendered[97..127] {
			*byte = b'c';
		}

		let parsed = Id3v1Tag::parse(rendered.try_into().unwrap(), ParsingMode::Strict).unwrap();

		assert_eq!(parsed.track, None);
		assert_eq!(parsed.comment.as_deref(), Some(&"c".repeat(30)[..]));
	}

	#[test_log::test]
	fn genre_byte_255_means_unset() {
		let mut rendered = encode(&Id3v1Tag::new()).unwrap();
		assert_eq!(rendered[127], 255);

		rendered[127] = 200; // Not in the table, but retained
		let parsed = Id3v1Tag::parse(rendered.try_into().unwrap(), ParsingMode::Strict).unwrap();

		assert_eq!(parsed.genre, Some(200));
		assert!(parsed.genres().is_empty());
	}

	#[test_log::test]
	fn generic_properties() {
		let tag = filled_tag();

		assert_eq!(tag.tag_types(), TagTypes::ID3V1);
		assert_eq!(tag.performers(), vec![String::from("Bar artist")]);
		assert_eq!(tag.genres(), vec![String::from("Classical")]);
		assert_eq!(tag.track(), Some(1));

		let mut tag = tag;
		tag.set_track(0);
		assert_eq!(tag.track, None);

		tag.clear();
		assert!(tag.is_empty());
	}
}
