use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::err;
use crate::tag::{Tag, TagTypes};
use crate::util::text::utf8_decode_str;

use std::borrow::Cow;

use byteorder::{LittleEndian, WriteBytesExt};

/// The generic storage behind a RIFF `LIST` tag
///
/// An ordered map of 4-character item IDs to value lists. Values are
/// NUL-terminated strings on the wire, padded to an even length.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RiffListTag {
	pub(crate) items: Vec<([u8; 4], Vec<String>)>,
}

impl RiffListTag {
	/// Gets the first value of the item `id`
	pub fn get(&self, id: &[u8; 4]) -> Option<&str> {
		self.items
			.iter()
			.find(|(item_id, _)| item_id == id)
			.and_then(|(_, values)| values.first())
			.map(String::as_str)
	}

	/// Gets all values of the item `id`
	pub fn get_all<'a>(&'a self, id: &'a [u8; 4]) -> impl Iterator<Item = &'a str> + Clone {
		self.items
			.iter()
			.filter(move |(item_id, _)| item_id == id)
			.flat_map(|(_, values)| values.iter().map(String::as_str))
	}

	/// Replaces the values of the item `id`
	///
	/// Passing an empty value list removes the item.
	pub fn set(&mut self, id: [u8; 4], values: Vec<String>) {
		if values.is_empty() {
			self.remove(&id);
			return;
		}

		if let Some((_, existing)) = self.items.iter_mut().find(|(item_id, _)| *item_id == id) {
			*existing = values;
		} else {
			self.items.push((id, values));
		}
	}

	/// Removes all values of the item `id`
	pub fn remove(&mut self, id: &[u8; 4]) {
		self.items.retain(|(item_id, _)| item_id != id);
	}

	/// Returns every item and its values, in insertion order
	pub fn items(&self) -> impl Iterator<Item = (&[u8; 4], &[String])> + Clone {
		self.items
			.iter()
			.map(|(id, values)| (id, values.as_slice()))
	}

	/// Whether the tag holds no items
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub(crate) fn clear(&mut self) {
		self.items.clear();
	}

	fn push(&mut self, id: [u8; 4], value: String) {
		if let Some((_, existing)) = self.items.iter_mut().find(|(item_id, _)| *item_id == id) {
			existing.push(value);
		} else {
			self.items.push((id, vec![value]));
		}
	}

	// Parses the body of a `LIST` chunk, past its type fourcc
	pub(crate) fn parse(content: &[u8], parse_mode: ParsingMode) -> Result<Self> {
		let mut tag = Self::default();

		let mut pos = 0;
		while pos + 8 <= content.len() {
			let mut id = [0; 4];
			id.copy_from_slice(&content[pos..pos + 4]);

			let size =
				u32::from_le_bytes(content[pos + 4..pos + 8].try_into().unwrap()) as usize;
			pos += 8;

			if pos + size > content.len() {
				if parse_mode == ParsingMode::Strict {
					err!(SizeMismatch);
				}

				log::warn!("LIST item extends past the chunk, discarding the rest");
				break;
			}

			if !id.iter().all(u8::is_ascii) {
				if parse_mode == ParsingMode::Strict {
					err!(FakeTag);
				}

				log::warn!("Non ASCII item ID in LIST chunk, discarding item");
				pos += size + (size % 2);
				continue;
			}

			match utf8_decode_str(&content[pos..pos + size]) {
				Ok(value) => {
					let value = value.trim_end_matches('\0');
					if !value.is_empty() {
						tag.push(id, value.to_owned());
					}
				},
				Err(e) => {
					if parse_mode == ParsingMode::Strict {
						return Err(e);
					}

					log::warn!("Non UTF-8 value in LIST chunk, discarding item");
				},
			}

			pos += size + (size % 2);
		}

		Ok(tag)
	}

	// Renders a full `LIST` chunk: header, type fourcc, and items
	pub(crate) fn render(&self, list_type: &[u8; 4]) -> Result<Vec<u8>> {
		let mut content = Vec::new();
		content.extend(list_type);

		for (id, values) in self.items() {
			for value in values {
				if value.is_empty() {
					continue;
				}

				let value_bytes = value.as_bytes();
				// Account for the NUL terminator
				let len = value_bytes.len() + 1;

				// Each value has to be NUL-terminated and have an even length
				let terminator: &[u8] = if len % 2 == 0 { &[0] } else { &[0, 0] };

				content.extend(id);
				content.write_u32::<LittleEndian>(len as u32)?;
				content.extend(value_bytes);
				content.extend(terminator);
			}
		}

		if content.len() > u32::MAX as usize {
			err!(TooMuchData);
		}

		let mut chunk = Vec::with_capacity(content.len() + 8);
		chunk.extend(b"LIST");
		chunk.write_u32::<LittleEndian>(content.len() as u32)?;
		chunk.append(&mut content);

		Ok(chunk)
	}
}

macro_rules! impl_accessor {
	($($name:ident => $key:literal;)+) => {
		paste::paste! {
			$(
				fn $name(&self) -> Option<Cow<'_, str>> {
					self.list.get($key).map(Cow::Borrowed)
				}

				fn [<set_ $name>](&mut self, value: String) {
					self.list.set(*$key, vec![value]);
				}

				fn [<remove_ $name>](&mut self) {
					self.list.remove($key);
				}
			)+
		}
	}
}

macro_rules! impl_list_accessor {
	($($name:ident => $key:literal;)+) => {
		paste::paste! {
			$(
				fn $name(&self) -> Vec<String> {
					self.list.get_all($key).map(str::to_owned).collect()
				}

				fn [<set_ $name>](&mut self, value: Vec<String>) {
					self.list.set(*$key, value);
				}

				fn [<remove_ $name>](&mut self) {
					self.list.remove($key);
				}
			)+
		}
	}
}

macro_rules! impl_number_accessor {
	($($name:ident => $key:literal;)+) => {
		paste::paste! {
			$(
				fn $name(&self) -> Option<u32> {
					self.list.get($key)?.parse().ok()
				}

				fn [<set_ $name>](&mut self, value: u32) {
					self.list.set(*$key, vec![value.to_string()]);
				}

				fn [<remove_ $name>](&mut self) {
					self.list.remove($key);
				}
			)+
		}
	}
}

/// A RIFF `LIST INFO` tag
///
/// The standard metadata tag of WAV files, also encountered in AVI.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct InfoTag {
	pub(crate) list: RiffListTag,
}

impl InfoTag {
	/// Create a new empty `InfoTag`
	pub fn new() -> Self {
		Self::default()
	}

	/// The underlying item storage
	pub fn list(&self) -> &RiffListTag {
		&self.list
	}

	/// Mutable counterpart of [`InfoTag::list`]
	pub fn list_mut(&mut self) -> &mut RiffListTag {
		&mut self.list
	}
}

impl Tag for InfoTag {
	fn tag_types(&self) -> TagTypes {
		TagTypes::RIFF_INFO
	}

	impl_accessor!(
		title     => b"INAM";
		album     => b"IPRD";
		comment   => b"ICMT";
		copyright => b"ICOP";
	);

	impl_list_accessor!(
		performers    => b"ISTR";
		album_artists => b"IART";
		composers     => b"IWRI";
		genres        => b"IGNR";
	);

	impl_number_accessor!(
		track       => b"IPRT";
		track_count => b"IFRM";
	);

	fn year(&self) -> Option<u32> {
		// ICRD may hold a full creation date, only the year leads it
		let date = self.list.get(b"ICRD")?;
		let year: String = date.chars().take(4).collect();

		if year.len() < 4 {
			return None;
		}

		year.parse().ok()
	}

	fn set_year(&mut self, value: u32) {
		self.list.set(*b"ICRD", vec![format!("{value:04}")]);
	}

	fn remove_year(&mut self) {
		self.list.remove(b"ICRD");
	}

	fn clear(&mut self) {
		self.list.clear();
	}
}

/// A RIFF `LIST MID ` (MovieID) tag
///
/// A small video metadata tag found in AVI files.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MovieIdTag {
	pub(crate) list: RiffListTag,
}

impl MovieIdTag {
	/// Create a new empty `MovieIdTag`
	pub fn new() -> Self {
		Self::default()
	}

	/// The underlying item storage
	pub fn list(&self) -> &RiffListTag {
		&self.list
	}

	/// Mutable counterpart of [`MovieIdTag::list`]
	pub fn list_mut(&mut self) -> &mut RiffListTag {
		&mut self.list
	}
}

impl Tag for MovieIdTag {
	fn tag_types(&self) -> TagTypes {
		TagTypes::MOVIE_ID
	}

	impl_accessor!(
		title   => b"TITL";
		comment => b"COMM";
	);

	impl_list_accessor!(
		performers => b"IART";
		genres     => b"GENR";
	);

	impl_number_accessor!(
		track       => b"PRT1";
		track_count => b"PRT2";
	);

	fn clear(&mut self) {
		self.list.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::{InfoTag, MovieIdTag, RiffListTag};
	use crate::config::ParsingMode;
	use crate::tag::Tag;

	#[test_log::test]
	fn list_round_trip() {
		let mut info = InfoTag::new();
		info.set_title(String::from("Foo title"));
		info.set_performers(vec![String::from("Bar artist")]);
		info.set_comment(String::from("Odd")); // 3 bytes, exercises padding
		info.set_year(2004);

		let rendered = info.list.render(b"INFO").unwrap();
		assert_eq!(&rendered[..4], b"LIST");
		assert_eq!(&rendered[8..12], b"INFO");

		// Every value is even-length padded
		assert_eq!(rendered.len() % 2, 0);

		let parsed = RiffListTag::parse(&rendered[12..], ParsingMode::Strict).unwrap();
		assert_eq!(parsed, info.list);
	}

	#[test_log::test]
	fn movie_id_mappings() {
		let mut movie_id = MovieIdTag::new();
		movie_id.set_title(String::from("A film"));
		movie_id.set_track(3);
		movie_id.set_track_count(12);

		assert_eq!(movie_id.list.get(b"TITL"), Some("A film"));
		assert_eq!(movie_id.list.get(b"PRT1"), Some("3"));
		assert_eq!(movie_id.list.get(b"PRT2"), Some("12"));

		assert_eq!(movie_id.track(), Some(3));
		assert_eq!(movie_id.track_count(), Some(12));
	}

	#[test_log::test]
	fn info_year_reads_full_dates() {
		let mut info = InfoTag::new();
		info.list_mut()
			.set(*b"ICRD", vec![String::from("2004-06-02")]);

		assert_eq!(info.year(), Some(2004));
	}

	#[test_log::test]
	fn empty_values_removed() {
		let mut info = InfoTag::new();
		info.set_title(String::from("Foo"));
		info.list_mut().set(*b"INAM", Vec::new());

		assert!(info.list.is_empty());
	}
}
