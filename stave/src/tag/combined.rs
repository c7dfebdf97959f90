use crate::error::Result;
use crate::id3::Id3v2Payload;
use crate::id3::v1::Id3v1Tag;
use crate::macros::err;
use crate::ogg::XiphComment;
use crate::picture::Picture;
use crate::riff::{DivxTag, InfoTag, MovieIdTag};
use crate::tag::{Tag, TagType, TagTypes, with_tag_properties};

use std::borrow::Cow;

macro_rules! dispatch {
	($self:ident, $inner:pat_param => $body:expr) => {
		match $self {
			AnyTag::Id3v1($inner) => $body,
			AnyTag::Xiph($inner) => $body,
			AnyTag::Divx($inner) => $body,
			AnyTag::Info($inner) => $body,
			AnyTag::MovieId($inner) => $body,
			AnyTag::Id3v2($inner) => $body,
			AnyTag::Combined($inner) => $body,
		}
	};
}

macro_rules! typed_access {
	($($method:ident, $method_mut:ident => $variant:ident, $ty:ident;)+) => {
		paste::paste! {
			$(
				#[doc = "Returns the inner [`" $ty "`], if this is the matching variant"]
				pub fn $method(&self) -> Option<&$ty> {
					match self {
						AnyTag::$variant(inner) => Some(inner),
						_ => None,
					}
				}

				#[doc = "Mutable counterpart of [`AnyTag::" $method "`]"]
				pub fn $method_mut(&mut self) -> Option<&mut $ty> {
					match self {
						AnyTag::$variant(inner) => Some(inner),
						_ => None,
					}
				}
			)+
		}
	};
}

/// A concrete tag instance behind the generic [`Tag`] surface
///
/// File engines hand out their tags through this dispatcher rather than a
/// trait object, so the concrete type remains recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnyTag {
	/// An ID3v1 tag
	Id3v1(Id3v1Tag),
	/// A Xiph comment
	Xiph(XiphComment),
	/// A DivX trailer tag
	Divx(DivxTag),
	/// A RIFF `LIST INFO` tag
	Info(InfoTag),
	/// A RIFF MovieID tag
	MovieId(MovieIdTag),
	/// An opaque ID3v2 payload
	Id3v2(Id3v2Payload),
	/// A nested aggregate
	Combined(CombinedTag),
}

impl AnyTag {
	/// The concrete [`TagType`] of this tag, `None` for a nested aggregate
	pub fn tag_type(&self) -> Option<TagType> {
		match self {
			AnyTag::Id3v1(_) => Some(TagType::Id3v1),
			AnyTag::Xiph(_) => Some(TagType::Xiph),
			AnyTag::Divx(_) => Some(TagType::Divx),
			AnyTag::Info(_) => Some(TagType::RiffInfo),
			AnyTag::MovieId(_) => Some(TagType::MovieId),
			AnyTag::Id3v2(_) => Some(TagType::Id3v2),
			AnyTag::Combined(_) => None,
		}
	}

	typed_access! {
		as_id3v1, as_id3v1_mut => Id3v1, Id3v1Tag;
		as_xiph, as_xiph_mut => Xiph, XiphComment;
		as_divx, as_divx_mut => Divx, DivxTag;
		as_info, as_info_mut => Info, InfoTag;
		as_movie_id, as_movie_id_mut => MovieId, MovieIdTag;
		as_id3v2, as_id3v2_mut => Id3v2, Id3v2Payload;
		as_combined, as_combined_mut => Combined, CombinedTag;
	}
}

impl From<Id3v1Tag> for AnyTag {
	fn from(input: Id3v1Tag) -> Self {
		AnyTag::Id3v1(input)
	}
}

impl From<XiphComment> for AnyTag {
	fn from(input: XiphComment) -> Self {
		AnyTag::Xiph(input)
	}
}

impl From<DivxTag> for AnyTag {
	fn from(input: DivxTag) -> Self {
		AnyTag::Divx(input)
	}
}

impl From<InfoTag> for AnyTag {
	fn from(input: InfoTag) -> Self {
		AnyTag::Info(input)
	}
}

impl From<MovieIdTag> for AnyTag {
	fn from(input: MovieIdTag) -> Self {
		AnyTag::MovieId(input)
	}
}

impl From<Id3v2Payload> for AnyTag {
	fn from(input: Id3v2Payload) -> Self {
		AnyTag::Id3v2(input)
	}
}

impl From<CombinedTag> for AnyTag {
	fn from(input: CombinedTag) -> Self {
		AnyTag::Combined(input)
	}
}

macro_rules! anytag_accessors {
	(
		TEXT: [ $([$text_first:tt $($text_rest:tt)*]),+ $(,)? ]
		LIST: [ $([$list_first:tt $($list_rest:tt)*]),+ $(,)? ]
		NUMBER: [ $([$num_first:tt $($num_rest:tt)*]),+ $(,)? ]
		GAIN: [ $([$gain_first:tt $($gain_rest:tt)*]),+ $(,)? ]
	) => {
		paste::paste! {
			$(
				fn [<$text_first $(_ $text_rest)*>](&self) -> Option<Cow<'_, str>> {
					dispatch!(self, tag => tag.[<$text_first $(_ $text_rest)*>]())
				}

				fn [<set_ $text_first $(_ $text_rest)*>](&mut self, value: String) {
					dispatch!(self, tag => tag.[<set_ $text_first $(_ $text_rest)*>](value))
				}

				fn [<remove_ $text_first $(_ $text_rest)*>](&mut self) {
					dispatch!(self, tag => tag.[<remove_ $text_first $(_ $text_rest)*>]())
				}
			)+
			$(
				fn [<$list_first $(_ $list_rest)*>](&self) -> Vec<String> {
					dispatch!(self, tag => tag.[<$list_first $(_ $list_rest)*>]())
				}

				fn [<set_ $list_first $(_ $list_rest)*>](&mut self, value: Vec<String>) {
					dispatch!(self, tag => tag.[<set_ $list_first $(_ $list_rest)*>](value))
				}

				fn [<remove_ $list_first $(_ $list_rest)*>](&mut self) {
					dispatch!(self, tag => tag.[<remove_ $list_first $(_ $list_rest)*>]())
				}
			)+
			$(
				fn [<$num_first $(_ $num_rest)*>](&self) -> Option<u32> {
					dispatch!(self, tag => tag.[<$num_first $(_ $num_rest)*>]())
				}

				fn [<set_ $num_first $(_ $num_rest)*>](&mut self, value: u32) {
					dispatch!(self, tag => tag.[<set_ $num_first $(_ $num_rest)*>](value))
				}

				fn [<remove_ $num_first $(_ $num_rest)*>](&mut self) {
					dispatch!(self, tag => tag.[<remove_ $num_first $(_ $num_rest)*>]())
				}
			)+
			$(
				fn [<$gain_first $(_ $gain_rest)*>](&self) -> Option<f64> {
					dispatch!(self, tag => tag.[<$gain_first $(_ $gain_rest)*>]())
				}

				fn [<set_ $gain_first $(_ $gain_rest)*>](&mut self, value: f64) {
					dispatch!(self, tag => tag.[<set_ $gain_first $(_ $gain_rest)*>](value))
				}

				fn [<remove_ $gain_first $(_ $gain_rest)*>](&mut self) {
					dispatch!(self, tag => tag.[<remove_ $gain_first $(_ $gain_rest)*>]())
				}
			)+
		}
	};
}

impl Tag for AnyTag {
	fn tag_types(&self) -> TagTypes {
		dispatch!(self, tag => tag.tag_types())
	}

	with_tag_properties!(anytag_accessors);

	fn pictures(&self) -> Vec<Picture> {
		dispatch!(self, tag => tag.pictures())
	}

	fn set_pictures(&mut self, value: Vec<Picture>) {
		dispatch!(self, tag => tag.set_pictures(value))
	}

	fn remove_pictures(&mut self) {
		dispatch!(self, tag => tag.remove_pictures())
	}

	fn is_empty(&self) -> bool {
		dispatch!(self, tag => tag.is_empty())
	}

	fn clear(&mut self) {
		dispatch!(self, tag => tag.clear())
	}
}

/// An ordered aggregate of concrete tags behind the generic [`Tag`] surface
///
/// Reads resolve to the first member (in list order) whose value for the
/// property is non-empty. Writes apply to the first member only, or to every
/// member when [`CombinedTag::set_write_to_all`] has been enabled.
///
/// At most one member per concrete [`TagType`] may exist; nested
/// `CombinedTag`s are transparent to [`CombinedTag::tags`],
/// [`CombinedTag::get_tag`], and [`CombinedTag::remove_tags`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedTag {
	tags: Vec<AnyTag>,
	write_to_all: bool,
	supported: TagTypes,
}

impl CombinedTag {
	/// Create a new empty `CombinedTag` supporting the given tag kinds
	pub fn new(supported: TagTypes) -> Self {
		Self {
			tags: Vec::new(),
			write_to_all: false,
			supported,
		}
	}

	/// Create a `CombinedTag` from existing tags
	///
	/// # Errors
	///
	/// A concrete [`TagType`] appears more than once in `tags`
	pub(crate) fn with_tags(supported: TagTypes, tags: Vec<AnyTag>) -> Result<Self> {
		let mut combined = Self::new(supported);

		for tag in tags {
			combined.insert_tag(tag)?;
		}

		Ok(combined)
	}

	/// Create a `CombinedTag` whose members may share a [`TagType`]
	///
	/// OGG physical streams hold one Xiph comment per logical bitstream, so
	/// their aggregate is exempt from the one-tag-per-type rule. Members are
	/// kept in bitstream discovery order.
	pub(crate) fn grouped(supported: TagTypes, tags: Vec<AnyTag>) -> Self {
		Self {
			tags,
			write_to_all: false,
			supported,
		}
	}

	pub(crate) fn insert_tag(&mut self, tag: AnyTag) -> Result<()> {
		if let Some(tag_type) = tag.tag_type() {
			if self.get_tag(tag_type).is_some() {
				err!(TagAlreadyExists);
			}
		}

		self.tags.push(tag);
		Ok(())
	}

	/// Returns every leaf tag, flattening nested aggregates
	pub fn tags(&self) -> Vec<&AnyTag> {
		fn collect<'a>(tags: &'a [AnyTag], out: &mut Vec<&'a AnyTag>) {
			for tag in tags {
				match tag {
					AnyTag::Combined(inner) => collect(&inner.tags, out),
					leaf => out.push(leaf),
				}
			}
		}

		let mut leaves = Vec::new();
		collect(&self.tags, &mut leaves);
		leaves
	}

	/// The tag kinds this aggregate is able to create
	pub fn supported_tag_types(&self) -> TagTypes {
		self.supported
	}

	/// Whether generic property writes reach every member
	pub fn write_to_all(&self) -> bool {
		self.write_to_all
	}

	/// Set whether generic property writes reach every member
	///
	/// When `false` (the default), writes apply only to the first member.
	pub fn set_write_to_all(&mut self, write_to_all: bool) {
		self.write_to_all = write_to_all;
	}

	/// Returns the leaf tag matching `tag_type`, recursing into nested
	/// aggregates
	pub fn get_tag(&self, tag_type: TagType) -> Option<&AnyTag> {
		for tag in &self.tags {
			match tag {
				AnyTag::Combined(inner) => {
					if let Some(found) = inner.get_tag(tag_type) {
						return Some(found);
					}
				},
				leaf => {
					if leaf.tag_type() == Some(tag_type) {
						return Some(leaf);
					}
				},
			}
		}

		None
	}

	/// Mutable counterpart of [`CombinedTag::get_tag`]
	pub fn get_tag_mut(&mut self, tag_type: TagType) -> Option<&mut AnyTag> {
		for tag in &mut self.tags {
			match tag {
				AnyTag::Combined(inner) => {
					if let Some(found) = inner.get_tag_mut(tag_type) {
						return Some(found);
					}
				},
				leaf => {
					if leaf.tag_type() == Some(tag_type) {
						return Some(leaf);
					}
				},
			}
		}

		None
	}

	/// Whether a leaf tag of `tag_type` is present
	pub fn contains_tag_type(&self, tag_type: TagType) -> bool {
		self.get_tag(tag_type).is_some()
	}

	/// Create a new leaf tag of `tag_type` and append it to the aggregate
	///
	/// With `copy`, the aggregate's current property values are copied into
	/// the fresh tag.
	///
	/// # Errors
	///
	/// * [`ErrorKind::UnsupportedTag`](crate::error::ErrorKind::UnsupportedTag):
	///   `tag_type` is outside [`CombinedTag::supported_tag_types`], or cannot
	///   be synthesized (opaque payloads)
	/// * [`ErrorKind::TagAlreadyExists`](crate::error::ErrorKind::TagAlreadyExists):
	///   a tag of `tag_type` is already present
	pub fn create_tag(&mut self, tag_type: TagType, copy: bool) -> Result<&mut AnyTag> {
		if !self.supported.contains(tag_type.as_flag()) {
			err!(UnsupportedTag);
		}

		if self.contains_tag_type(tag_type) {
			err!(TagAlreadyExists);
		}

		let mut tag = match tag_type {
			TagType::Id3v1 => AnyTag::Id3v1(Id3v1Tag::new()),
			TagType::Xiph => AnyTag::Xiph(XiphComment::new()),
			TagType::Divx => AnyTag::Divx(DivxTag::new()),
			TagType::RiffInfo => AnyTag::Info(InfoTag::new()),
			TagType::MovieId => AnyTag::MovieId(MovieIdTag::new()),
			// Opaque payloads can only come from a parsed file
			TagType::Id3v2 | TagType::Ape => err!(UnsupportedTag),
		};

		if copy {
			Tag::copy_to(self, &mut tag, true);
		}

		self.tags.push(tag);

		// Just pushed, infallible
		Ok(self.tags.last_mut().unwrap())
	}

	/// Detach every leaf tag whose kind intersects `types`
	///
	/// Nested aggregates are recursed into rather than removed wholesale.
	pub fn remove_tags(&mut self, types: TagTypes) {
		// Reverse index order keeps the remaining indices valid while
		// splicing in place
		for idx in (0..self.tags.len()).rev() {
			if let AnyTag::Combined(inner) = &mut self.tags[idx] {
				inner.remove_tags(types);
				continue;
			}

			if self.tags[idx].tag_types().intersects(types) {
				self.tags.remove(idx);
			}
		}
	}

	pub(crate) fn member_count(&self) -> usize {
		self.tags.len()
	}
}

macro_rules! combined_accessors {
	(
		TEXT: [ $([$text_first:tt $($text_rest:tt)*]),+ $(,)? ]
		LIST: [ $([$list_first:tt $($list_rest:tt)*]),+ $(,)? ]
		NUMBER: [ $([$num_first:tt $($num_rest:tt)*]),+ $(,)? ]
		GAIN: [ $([$gain_first:tt $($gain_rest:tt)*]),+ $(,)? ]
	) => {
		paste::paste! {
			$(
				fn [<$text_first $(_ $text_rest)*>](&self) -> Option<Cow<'_, str>> {
					self.tags
						.iter()
						.find_map(|tag| tag.[<$text_first $(_ $text_rest)*>]())
				}

				fn [<set_ $text_first $(_ $text_rest)*>](&mut self, value: String) {
					if self.write_to_all {
						for tag in &mut self.tags {
							tag.[<set_ $text_first $(_ $text_rest)*>](value.clone());
						}
					} else if let Some(tag) = self.tags.first_mut() {
						tag.[<set_ $text_first $(_ $text_rest)*>](value);
					}
				}

				fn [<remove_ $text_first $(_ $text_rest)*>](&mut self) {
					for tag in &mut self.tags {
						tag.[<remove_ $text_first $(_ $text_rest)*>]();
					}
				}
			)+
			$(
				fn [<$list_first $(_ $list_rest)*>](&self) -> Vec<String> {
					self.tags
						.iter()
						.map(|tag| tag.[<$list_first $(_ $list_rest)*>]())
						.find(|value| !value.is_empty())
						.unwrap_or_default()
				}

				fn [<set_ $list_first $(_ $list_rest)*>](&mut self, value: Vec<String>) {
					if self.write_to_all {
						for tag in &mut self.tags {
							tag.[<set_ $list_first $(_ $list_rest)*>](value.clone());
						}
					} else if let Some(tag) = self.tags.first_mut() {
						tag.[<set_ $list_first $(_ $list_rest)*>](value);
					}
				}

				fn [<remove_ $list_first $(_ $list_rest)*>](&mut self) {
					for tag in &mut self.tags {
						tag.[<remove_ $list_first $(_ $list_rest)*>]();
					}
				}
			)+
			$(
				fn [<$num_first $(_ $num_rest)*>](&self) -> Option<u32> {
					self.tags
						.iter()
						.find_map(|tag| tag.[<$num_first $(_ $num_rest)*>]())
				}

				fn [<set_ $num_first $(_ $num_rest)*>](&mut self, value: u32) {
					if self.write_to_all {
						for tag in &mut self.tags {
							tag.[<set_ $num_first $(_ $num_rest)*>](value);
						}
					} else if let Some(tag) = self.tags.first_mut() {
						tag.[<set_ $num_first $(_ $num_rest)*>](value);
					}
				}

				fn [<remove_ $num_first $(_ $num_rest)*>](&mut self) {
					for tag in &mut self.tags {
						tag.[<remove_ $num_first $(_ $num_rest)*>]();
					}
				}
			)+
			$(
				fn [<$gain_first $(_ $gain_rest)*>](&self) -> Option<f64> {
					self.tags
						.iter()
						.find_map(|tag| tag.[<$gain_first $(_ $gain_rest)*>]())
				}

				fn [<set_ $gain_first $(_ $gain_rest)*>](&mut self, value: f64) {
					if self.write_to_all {
						for tag in &mut self.tags {
							tag.[<set_ $gain_first $(_ $gain_rest)*>](value);
						}
					} else if let Some(tag) = self.tags.first_mut() {
						tag.[<set_ $gain_first $(_ $gain_rest)*>](value);
					}
				}

				fn [<remove_ $gain_first $(_ $gain_rest)*>](&mut self) {
					for tag in &mut self.tags {
						tag.[<remove_ $gain_first $(_ $gain_rest)*>]();
					}
				}
			)+
		}
	};
}

impl Tag for CombinedTag {
	fn tag_types(&self) -> TagTypes {
		self.tags
			.iter()
			.fold(TagTypes::NONE, |acc, tag| acc | tag.tag_types())
	}

	with_tag_properties!(combined_accessors);

	fn pictures(&self) -> Vec<Picture> {
		self.tags
			.iter()
			.map(Tag::pictures)
			.find(|value| !value.is_empty())
			.unwrap_or_default()
	}

	fn set_pictures(&mut self, value: Vec<Picture>) {
		if self.write_to_all {
			for tag in &mut self.tags {
				tag.set_pictures(value.clone());
			}
		} else if let Some(tag) = self.tags.first_mut() {
			tag.set_pictures(value);
		}
	}

	fn remove_pictures(&mut self) {
		for tag in &mut self.tags {
			tag.remove_pictures();
		}
	}

	fn clear(&mut self) {
		for tag in &mut self.tags {
			tag.clear();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{AnyTag, CombinedTag};
	use crate::id3::v1::Id3v1Tag;
	use crate::ogg::XiphComment;
	use crate::tag::{Tag, TagType, TagTypes};

	fn combined_with_two_tags() -> CombinedTag {
		let id3v1 = Id3v1Tag::new();

		let mut xiph = XiphComment::new();
		xiph.set_album(String::from("Second album"));
		xiph.set_year(1998);

		CombinedTag::with_tags(
			TagTypes::ID3V1 | TagTypes::XIPH,
			vec![AnyTag::Id3v1(id3v1), AnyTag::Xiph(xiph)],
		)
		.unwrap()
	}

	#[test_log::test]
	fn read_precedence() {
		let combined = combined_with_two_tags();

		// The first tag has no album, so the second tag's wins
		assert_eq!(combined.album().as_deref(), Some("Second album"));
		assert_eq!(combined.year(), Some(1998));
	}

	#[test_log::test]
	fn write_first_only() {
		let mut combined = combined_with_two_tags();
		assert!(!combined.write_to_all());

		combined.set_album(String::from("New album"));

		let tags = combined.tags();
		assert_eq!(tags[0].album().as_deref(), Some("New album"));
		assert_eq!(tags[1].album().as_deref(), Some("Second album"));
	}

	#[test_log::test]
	fn write_to_all() {
		let mut combined = combined_with_two_tags();
		combined.set_write_to_all(true);

		combined.set_album(String::from("New album"));

		for tag in combined.tags() {
			assert_eq!(tag.album().as_deref(), Some("New album"));
		}
	}

	#[test_log::test]
	fn duplicate_tag_types_rejected() {
		let result = CombinedTag::with_tags(
			TagTypes::ID3V1,
			vec![
				AnyTag::Id3v1(Id3v1Tag::new()),
				AnyTag::Id3v1(Id3v1Tag::new()),
			],
		);

		assert!(result.is_err());
	}

	#[test_log::test]
	fn create_tag_errors() {
		let mut combined = CombinedTag::new(TagTypes::XIPH);

		// Creating an unsupported type fails
		assert!(combined.create_tag(TagType::Divx, false).is_err());

		combined.create_tag(TagType::Xiph, false).unwrap();

		// Creating it twice fails
		assert!(combined.create_tag(TagType::Xiph, false).is_err());
	}

	#[test_log::test]
	fn create_tag_copies_values() {
		let mut combined = CombinedTag::new(TagTypes::ID3V1 | TagTypes::XIPH);

		combined.create_tag(TagType::Xiph, false).unwrap();
		combined.set_title(String::from("Foo title"));
		combined.set_track(7);

		let created = combined.create_tag(TagType::Id3v1, true).unwrap();
		assert_eq!(created.title().as_deref(), Some("Foo title"));
		assert_eq!(created.track(), Some(7));
	}

	#[test_log::test]
	fn nested_tags_flatten() {
		let mut inner = CombinedTag::new(TagTypes::XIPH);
		inner.create_tag(TagType::Xiph, false).unwrap();

		let outer = CombinedTag::with_tags(
			TagTypes::ALL,
			vec![
				AnyTag::Id3v1(Id3v1Tag::new()),
				AnyTag::Combined(inner),
			],
		)
		.unwrap();

		let leaves = outer.tags();
		assert_eq!(leaves.len(), 2);
		assert_eq!(leaves[1].tag_type(), Some(TagType::Xiph));

		// Recursive lookup finds the nested leaf
		assert!(outer.get_tag(TagType::Xiph).is_some());
	}

	#[test_log::test]
	fn nested_remove_recurses() {
		let mut inner = CombinedTag::new(TagTypes::XIPH);
		inner.create_tag(TagType::Xiph, false).unwrap();

		let mut outer = CombinedTag::with_tags(
			TagTypes::ALL,
			vec![
				AnyTag::Id3v1(Id3v1Tag::new()),
				AnyTag::Combined(inner),
			],
		)
		.unwrap();

		outer.remove_tags(TagTypes::XIPH);

		// The leaf is gone, but the nested aggregate itself remains
		assert!(outer.get_tag(TagType::Xiph).is_none());
		assert_eq!(outer.member_count(), 2);

		outer.remove_tags(TagTypes::ALL);
		assert!(outer.get_tag(TagType::Id3v1).is_none());
	}

	#[test_log::test]
	fn tag_types_is_union() {
		let combined = combined_with_two_tags();
		assert_eq!(combined.tag_types(), TagTypes::ID3V1 | TagTypes::XIPH);
	}
}
