use crate::error::Result;
use crate::macros::{encode_err, err};
use crate::picture::{Picture, PictureInformation};
use crate::tag::{Tag, TagTypes};

use std::borrow::Cow;

// The two legacy picture-carrying field keys. These never appear in the
// generic field map, their contents are routed to the picture store.
pub(crate) const METADATA_BLOCK_PICTURE: &str = "METADATA_BLOCK_PICTURE";
pub(crate) const COVERART: &str = "COVERART";

macro_rules! impl_accessor {
	($($name:ident => $key:literal;)+) => {
		paste::paste! {
			$(
				fn $name(&self) -> Option<Cow<'_, str>> {
					self.get($key).map(Cow::Borrowed)
				}

				fn [<set_ $name>](&mut self, value: String) {
					let _ = self.set_field(String::from($key), vec![value]);
				}

				fn [<remove_ $name>](&mut self) {
					self.remove_field($key);
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
					self.get_all($key).map(str::to_owned).collect()
				}

				fn [<set_ $name>](&mut self, value: Vec<String>) {
					let _ = self.set_field(String::from($key), value);
				}

				fn [<remove_ $name>](&mut self) {
					self.remove_field($key);
				}
			)+
		}
	}
}

/// A Xiph comment (Vorbis comment)
///
/// An ordered map of uppercased field names to value lists, plus a separate
/// picture store. The same comment layout backs FLAC `VORBIS_COMMENT`
/// blocks and the comment header of every OGG codec.
///
/// ## Pictures
///
/// The `METADATA_BLOCK_PICTURE` and `COVERART` fields carry base64 encoded
/// images. They are intercepted at parse time and routed to
/// [`XiphComment::pictures`]; attempting to write them through the generic
/// field API is an error.
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct XiphComment {
	pub(crate) vendor: String,
	pub(crate) fields: Vec<(String, Vec<String>)>,
	pub(crate) pictures: Vec<(Picture, PictureInformation)>,
}

impl XiphComment {
	/// Create a new empty `XiphComment`
	///
	/// # Examples
	///
	/// ```rust
	/// use stave::ogg::XiphComment;
	/// use stave::tag::Tag as _;
	///
	/// let xiph_comment = XiphComment::new();
	/// assert!(xiph_comment.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the vendor string
	pub fn vendor(&self) -> &str {
		&self.vendor
	}

	/// Sets the vendor string
	pub fn set_vendor(&mut self, vendor: String) {
		self.vendor = vendor
	}

	/// Gets the first value of the field `key`
	///
	/// The lookup is case-insensitive.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.fields
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(key))
			.and_then(|(_, values)| values.first())
			.map(String::as_str)
	}

	/// Gets all values of the field `key`
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + Clone + 'a {
		self.fields
			.iter()
			.filter(move |(k, _)| k.eq_ignore_ascii_case(key))
			.flat_map(|(_, values)| values.iter().map(String::as_str))
	}

	/// Returns every field and its values, in insertion order
	pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> + Clone {
		self.fields
			.iter()
			.map(|(k, values)| (k.as_str(), values.as_slice()))
	}

	/// Replaces the values of the field `key`
	///
	/// The key is uppercased on entry. Passing an empty value list removes
	/// the field.
	///
	/// # Errors
	///
	/// * `key` contains characters outside `0x20..=0x7D` or an `'='`
	/// * `key` is one of the picture-carrying fields, which must go through
	///   [`XiphComment::push_picture`]
	pub fn set_field(&mut self, key: String, values: Vec<String>) -> Result<()> {
		let key = Self::verify_key(&key)?;

		if values.is_empty() {
			self.remove_field(&key);
			return Ok(());
		}

		if let Some((_, existing)) = self.fields.iter_mut().find(|(k, _)| *k == key) {
			*existing = values;
		} else {
			self.fields.push((key, values));
		}

		Ok(())
	}

	/// Appends a value to the field `key`, retaining any existing values
	///
	/// # Errors
	///
	/// See [`XiphComment::set_field`]
	pub fn push_field(&mut self, key: String, value: String) -> Result<()> {
		let key = Self::verify_key(&key)?;

		if let Some((_, existing)) = self.fields.iter_mut().find(|(k, _)| *k == key) {
			existing.push(value);
		} else {
			self.fields.push((key, vec![value]));
		}

		Ok(())
	}

	/// Removes all values of the field `key`, returning them
	pub fn remove_field(&mut self, key: &str) -> Vec<String> {
		let mut removed = Vec::new();

		let mut idx = 0;
		while idx < self.fields.len() {
			if self.fields[idx].0.eq_ignore_ascii_case(key) {
				removed.extend(self.fields.remove(idx).1);
				continue;
			}

			idx += 1;
		}

		removed
	}

	/// Returns the pictures with their stored [`PictureInformation`]
	pub fn picture_store(&self) -> &[(Picture, PictureInformation)] {
		&self.pictures
	}

	/// Adds a picture
	///
	/// The [`PictureInformation`] is probed from the image data where
	/// possible.
	pub fn push_picture(&mut self, picture: Picture) {
		let info = PictureInformation::from_picture(&picture).unwrap_or_default();
		self.pictures.push((picture, info));
	}

	pub(crate) fn push_picture_with_info(&mut self, picture: Picture, info: PictureInformation) {
		self.pictures.push((picture, info));
	}

	// A case-insensitive field name may consist of ASCII 0x20 through 0x7D,
	// 0x3D ('=') excluded. Uppercase on entry so storage is canonical.
	fn verify_key(key: &str) -> Result<String> {
		if key.is_empty()
			|| !key
				.bytes()
				.all(|byte| (0x20..=0x7D).contains(&byte) && byte != 0x3D)
		{
			encode_err!(@BAIL "Xiph comment keys may only consist of ASCII 0x20..=0x7D, excluding '='");
		}

		let key = key.to_ascii_uppercase();

		if key == METADATA_BLOCK_PICTURE || key == COVERART {
			err!(PictureField);
		}

		Ok(key)
	}
}

impl Tag for XiphComment {
	fn tag_types(&self) -> TagTypes {
		TagTypes::XIPH
	}

	impl_accessor!(
		title     => "TITLE";
		album     => "ALBUM";
		comment   => "COMMENT";
		lyrics    => "LYRICS";
		grouping  => "GROUPING";
		conductor => "CONDUCTOR";
		copyright => "COPYRIGHT";
		musicbrainz_artist_id  => "MUSICBRAINZ_ARTISTID";
		musicbrainz_release_id => "MUSICBRAINZ_ALBUMID";
		musicbrainz_track_id   => "MUSICBRAINZ_TRACKID";
	);

	impl_list_accessor!(
		performers => "ARTIST";
		composers  => "COMPOSER";
		genres     => "GENRE";
	);

	fn album_artists(&self) -> Vec<String> {
		// Fall back to the aliases used by third-party taggers
		for key in ["ALBUMARTIST", "ALBUM ARTIST", "ENSEMBLE"] {
			let values: Vec<String> = self.get_all(key).map(str::to_owned).collect();
			if !values.is_empty() {
				return values;
			}
		}

		Vec::new()
	}

	fn set_album_artists(&mut self, value: Vec<String>) {
		// Compatibility heuristic: the aliases are refreshed only when a
		// third-party tagger already introduced them, never created fresh
		for alias in ["ALBUM ARTIST", "ENSEMBLE"] {
			if self.get(alias).is_some() {
				let _ = self.set_field(String::from(alias), value.clone());
			}
		}

		let _ = self.set_field(String::from("ALBUMARTIST"), value);
	}

	fn remove_album_artists(&mut self) {
		self.remove_field("ALBUMARTIST");
		self.remove_field("ALBUM ARTIST");
		self.remove_field("ENSEMBLE");
	}

	fn year(&self) -> Option<u32> {
		// DATE may hold a full ISO date/time, only the year leads it
		let date = self.get("DATE")?;
		let year: String = date.chars().take(4).collect();

		if year.len() < 4 {
			return None;
		}

		year.parse().ok()
	}

	fn set_year(&mut self, value: u32) {
		let _ = self.set_field(String::from("DATE"), vec![format!("{value:04}")]);
	}

	fn remove_year(&mut self) {
		self.remove_field("DATE");
	}

	fn track(&self) -> Option<u32> {
		let value = self.get("TRACKNUMBER")?;
		value.split('/').next()?.parse().ok()
	}

	fn set_track(&mut self, value: u32) {
		// Writing never reintroduces the legacy "current/total" encoding;
		// any total it carried moves to the dedicated field first
		if self.get("TRACKTOTAL").is_none() {
			if let Some(total) = self.track_count() {
				let _ = self.set_field(String::from("TRACKTOTAL"), vec![total.to_string()]);
			}
		}

		let _ = self.set_field(String::from("TRACKNUMBER"), vec![value.to_string()]);
	}

	fn remove_track(&mut self) {
		self.remove_field("TRACKNUMBER");
	}

	fn track_count(&self) -> Option<u32> {
		if let Some(total) = self.get("TRACKTOTAL") {
			return total.parse().ok();
		}

		// Legacy fractional encoding, "3/12"
		let value = self.get("TRACKNUMBER")?;
		let mut split = value.splitn(2, '/');
		split.next();
		split.next()?.parse().ok()
	}

	fn set_track_count(&mut self, value: u32) {
		if let Some(track) = self.track() {
			if self.get("TRACKNUMBER").is_some_and(|v| v.contains('/')) {
				let _ = self.set_field(String::from("TRACKNUMBER"), vec![track.to_string()]);
			}
		}

		let _ = self.set_field(String::from("TRACKTOTAL"), vec![value.to_string()]);
	}

	fn remove_track_count(&mut self) {
		self.remove_field("TRACKTOTAL");
	}

	fn disc(&self) -> Option<u32> {
		let value = self.get("DISCNUMBER")?;
		value.split('/').next()?.parse().ok()
	}

	fn set_disc(&mut self, value: u32) {
		if self.get("DISCTOTAL").is_none() {
			if let Some(total) = self.disc_count() {
				let _ = self.set_field(String::from("DISCTOTAL"), vec![total.to_string()]);
			}
		}

		let _ = self.set_field(String::from("DISCNUMBER"), vec![value.to_string()]);
	}

	fn remove_disc(&mut self) {
		self.remove_field("DISCNUMBER");
	}

	fn disc_count(&self) -> Option<u32> {
		if let Some(total) = self.get("DISCTOTAL") {
			return total.parse().ok();
		}

		let value = self.get("DISCNUMBER")?;
		let mut split = value.splitn(2, '/');
		split.next();
		split.next()?.parse().ok()
	}

	fn set_disc_count(&mut self, value: u32) {
		if let Some(disc) = self.disc() {
			if self.get("DISCNUMBER").is_some_and(|v| v.contains('/')) {
				let _ = self.set_field(String::from("DISCNUMBER"), vec![disc.to_string()]);
			}
		}

		let _ = self.set_field(String::from("DISCTOTAL"), vec![value.to_string()]);
	}

	fn remove_disc_count(&mut self) {
		self.remove_field("DISCTOTAL");
	}

	fn bpm(&self) -> Option<u32> {
		self.get("BPM")?.parse().ok()
	}

	fn set_bpm(&mut self, value: u32) {
		let _ = self.set_field(String::from("BPM"), vec![value.to_string()]);
	}

	fn remove_bpm(&mut self) {
		self.remove_field("BPM");
	}

	fn replay_gain_track_gain(&self) -> Option<f64> {
		parse_gain(self.get("REPLAYGAIN_TRACK_GAIN")?)
	}

	fn set_replay_gain_track_gain(&mut self, value: f64) {
		let _ = self.set_field(
			String::from("REPLAYGAIN_TRACK_GAIN"),
			vec![format_gain(value)],
		);
	}

	fn remove_replay_gain_track_gain(&mut self) {
		self.remove_field("REPLAYGAIN_TRACK_GAIN");
	}

	fn replay_gain_track_peak(&self) -> Option<f64> {
		self.get("REPLAYGAIN_TRACK_PEAK")?.parse().ok()
	}

	fn set_replay_gain_track_peak(&mut self, value: f64) {
		let _ = self.set_field(
			String::from("REPLAYGAIN_TRACK_PEAK"),
			vec![format!("{value:.6}")],
		);
	}

	fn remove_replay_gain_track_peak(&mut self) {
		self.remove_field("REPLAYGAIN_TRACK_PEAK");
	}

	fn replay_gain_album_gain(&self) -> Option<f64> {
		parse_gain(self.get("REPLAYGAIN_ALBUM_GAIN")?)
	}

	fn set_replay_gain_album_gain(&mut self, value: f64) {
		let _ = self.set_field(
			String::from("REPLAYGAIN_ALBUM_GAIN"),
			vec![format_gain(value)],
		);
	}

	fn remove_replay_gain_album_gain(&mut self) {
		self.remove_field("REPLAYGAIN_ALBUM_GAIN");
	}

	fn replay_gain_album_peak(&self) -> Option<f64> {
		self.get("REPLAYGAIN_ALBUM_PEAK")?.parse().ok()
	}

	fn set_replay_gain_album_peak(&mut self, value: f64) {
		let _ = self.set_field(
			String::from("REPLAYGAIN_ALBUM_PEAK"),
			vec![format!("{value:.6}")],
		);
	}

	fn remove_replay_gain_album_peak(&mut self) {
		self.remove_field("REPLAYGAIN_ALBUM_PEAK");
	}

	fn pictures(&self) -> Vec<Picture> {
		self.pictures
			.iter()
			.map(|(picture, _)| picture.clone())
			.collect()
	}

	fn set_pictures(&mut self, value: Vec<Picture>) {
		self.pictures = value
			.into_iter()
			.map(|picture| {
				let info = PictureInformation::from_picture(&picture).unwrap_or_default();
				(picture, info)
			})
			.collect();
	}

	fn remove_pictures(&mut self) {
		self.pictures.clear();
	}

	fn clear(&mut self) {
		self.fields.clear();
		self.pictures.clear();
	}
}

// "-6.20 dB" <-> -6.2
fn parse_gain(value: &str) -> Option<f64> {
	value
		.trim()
		.trim_end_matches("dB")
		.trim_end_matches("DB")
		.trim()
		.parse()
		.ok()
}

fn format_gain(value: f64) -> String {
	format!("{value:.2} dB")
}

#[cfg(test)]
mod tests {
	use super::XiphComment;
	use crate::error::ErrorKind;
	use crate::picture::{MimeType, Picture, PictureType};
	use crate::tag::Tag;

	#[test_log::test]
	fn keys_are_uppercased_and_case_insensitive() {
		let mut comment = XiphComment::new();
		comment
			.set_field(String::from("Title"), vec![String::from("Foo")])
			.unwrap();

		assert_eq!(comment.get("TITLE"), Some("Foo"));
		assert_eq!(comment.get("title"), Some("Foo"));
		assert_eq!(comment.fields().next().unwrap().0, "TITLE");
	}

	#[test_log::test]
	fn multi_value_fields_preserve_order() {
		let mut comment = XiphComment::new();
		comment
			.push_field(String::from("ARTIST"), String::from("Foo"))
			.unwrap();
		comment
			.push_field(String::from("ARTIST"), String::from("Bar"))
			.unwrap();

		assert_eq!(
			comment.performers(),
			vec![String::from("Foo"), String::from("Bar")]
		);
	}

	#[test_log::test]
	fn invalid_keys_rejected() {
		let mut comment = XiphComment::new();

		assert!(
			comment
				.set_field(String::from("BAD=KEY"), vec![String::from("v")])
				.is_err()
		);
		assert!(
			comment
				.set_field(String::new(), vec![String::from("v")])
				.is_err()
		);
	}

	#[test_log::test]
	fn picture_keys_must_use_picture_api() {
		let mut comment = XiphComment::new();

		for key in ["METADATA_BLOCK_PICTURE", "CoverArt"] {
			let result = comment.set_field(String::from(key), vec![String::from("AAAA")]);
			assert!(matches!(
				result.unwrap_err().kind(),
				ErrorKind::PictureField
			));
		}

		let picture = Picture::new(
			PictureType::CoverFront,
			Some(MimeType::Png),
			None,
			vec![1, 2, 3],
		);
		comment.push_picture(picture);
		assert_eq!(comment.pictures().len(), 1);
	}

	#[test_log::test]
	fn fractional_track_fallback() {
		let mut comment = XiphComment::new();
		comment
			.set_field(String::from("TRACKNUMBER"), vec![String::from("3/12")])
			.unwrap();

		assert_eq!(comment.track(), Some(3));
		assert_eq!(comment.track_count(), Some(12));

		// Writes migrate the total to the dedicated field
		comment.set_track(5);

		assert_eq!(comment.get("TRACKNUMBER"), Some("5"));
		assert_eq!(comment.get("TRACKTOTAL"), Some("12"));
	}

	#[test_log::test]
	fn dedicated_total_preferred_over_fraction() {
		let mut comment = XiphComment::new();
		comment
			.set_field(String::from("TRACKNUMBER"), vec![String::from("3/12")])
			.unwrap();
		comment
			.set_field(String::from("TRACKTOTAL"), vec![String::from("14")])
			.unwrap();

		assert_eq!(comment.track_count(), Some(14));
	}

	#[test_log::test]
	fn year_reads_prefix_of_full_dates() {
		let mut comment = XiphComment::new();
		comment
			.set_field(String::from("DATE"), vec![String::from("1998-06-02T12:00")])
			.unwrap();

		assert_eq!(comment.year(), Some(1998));

		comment.set_year(45);
		assert_eq!(comment.get("DATE"), Some("0045"));
		assert_eq!(comment.year(), Some(45));
	}

	#[test_log::test]
	fn album_artist_aliases() {
		let mut comment = XiphComment::new();
		comment
			.set_field(String::from("ENSEMBLE"), vec![String::from("Orchestra")])
			.unwrap();

		assert_eq!(comment.album_artists(), vec![String::from("Orchestra")]);

		// The pre-existing alias is refreshed alongside the canonical field
		comment.set_album_artists(vec![String::from("Band")]);
		assert_eq!(comment.get("ALBUMARTIST"), Some("Band"));
		assert_eq!(comment.get("ENSEMBLE"), Some("Band"));

		// A fresh comment never has aliases introduced
		let mut fresh = XiphComment::new();
		fresh.set_album_artists(vec![String::from("Band")]);
		assert_eq!(fresh.get("ALBUMARTIST"), Some("Band"));
		assert_eq!(fresh.get("ENSEMBLE"), None);
		assert_eq!(fresh.get("ALBUM ARTIST"), None);
	}

	#[test_log::test]
	fn replay_gain_formatting() {
		let mut comment = XiphComment::new();
		comment.set_replay_gain_track_gain(-6.2);

		assert_eq!(comment.get("REPLAYGAIN_TRACK_GAIN"), Some("-6.20 dB"));
		assert_eq!(comment.replay_gain_track_gain(), Some(-6.2));
	}
}
