//! The generic tag property surface and multi-tag aggregation

mod combined;
mod tag_types;

pub use combined::{AnyTag, CombinedTag};
pub use tag_types::{TagType, TagTypes};

use crate::picture::Picture;

use std::borrow::Cow;

// This defines the `Tag` trait, the unified property surface every concrete
// tag sits behind.
//
// Usage:
//
// tag_trait! {
//     TEXT:   [ [field name], ... ]
//     LIST:   [ [field name], ... ]
//     NUMBER: [ [field name], ... ]
//     GAIN:   [ [field name], ... ]
// }
//
// * `TEXT` fields are single strings, absent as `None`.
// * `LIST` fields are string lists, absent as an empty `Vec`.
// * `NUMBER` fields are `u32`s, absent as `None`.
// * `GAIN` fields are `f64`s (ReplayGain decibel/peak values), absent as `None`.
//
// Field names consisting of multiple segments should be separated by spaces,
// like [track count]. Every getter defaults to the empty value and every
// setter to a no-op, so a concrete tag only implements the fields its wire
// format can represent.
macro_rules! tag_trait {
	(
		TEXT: [ $([$text_first:tt $($text_rest:tt)*]),+ $(,)? ]
		LIST: [ $([$list_first:tt $($list_rest:tt)*]),+ $(,)? ]
		NUMBER: [ $([$num_first:tt $($num_rest:tt)*]),+ $(,)? ]
		GAIN: [ $([$gain_first:tt $($gain_rest:tt)*]),+ $(,)? ]
	) => {
		/// The generic tag property surface
		///
		/// Every property has a defined "empty" value (`None` or an empty list)
		/// meaning "not present". Setters **overwrite**; formats supporting
		/// multiple values of a field expose their own appending methods, for
		/// example [`XiphComment::push_field`](crate::ogg::XiphComment::push_field).
		pub trait Tag {
			/// The tag kind(s) contained in this tag
			///
			/// For an aggregate this is the union of its members', see
			/// [`CombinedTag`].
			fn tag_types(&self) -> TagTypes;

			$( tag_trait! { @TEXT [$text_first $($text_rest)*] } )+
			$( tag_trait! { @LIST [$list_first $($list_rest)*] } )+
			$( tag_trait! { @NUMBER [$num_first $($num_rest)*] } )+
			$( tag_trait! { @GAIN [$gain_first $($gain_rest)*] } )+

			/// Returns every picture.
			fn pictures(&self) -> Vec<Picture> {
				Vec::new()
			}

			/// Sets the pictures, replacing any existing ones.
			fn set_pictures(&mut self, _value: Vec<Picture>) {}

			/// Removes all pictures.
			fn remove_pictures(&mut self) {}

			/// Whether the tag is devoid of values
			///
			/// This is computed from a fixed set of core properties: title,
			/// performers, album artists, composers, album, comment, genres,
			/// year, track, and disc.
			fn is_empty(&self) -> bool {
				self.title().is_none()
					&& self.performers().is_empty()
					&& self.album_artists().is_empty()
					&& self.composers().is_empty()
					&& self.album().is_none()
					&& self.comment().is_none()
					&& self.genres().is_empty()
					&& self.year().is_none()
					&& self.track().is_none()
					&& self.disc().is_none()
			}

			/// Resets every property to its empty value.
			fn clear(&mut self);

			/// Copies each non-empty property of `self` into `target`
			///
			/// When `overwrite` is `false`, only properties that are empty in
			/// `target` are filled in.
			fn copy_to<T>(&self, target: &mut T, overwrite: bool)
			where
				T: Tag,
				Self: Sized,
			{
				paste::paste! {
					$(
						if let Some(value) = self.[<$text_first $(_ $text_rest)*>]() {
							if overwrite || target.[<$text_first $(_ $text_rest)*>]().is_none() {
								target.[<set_ $text_first $(_ $text_rest)*>](value.into_owned());
							}
						}
					)+
					$(
						let value = self.[<$list_first $(_ $list_rest)*>]();
						if !value.is_empty()
							&& (overwrite || target.[<$list_first $(_ $list_rest)*>]().is_empty())
						{
							target.[<set_ $list_first $(_ $list_rest)*>](value);
						}
					)+
					$(
						if let Some(value) = self.[<$num_first $(_ $num_rest)*>]() {
							if overwrite || target.[<$num_first $(_ $num_rest)*>]().is_none() {
								target.[<set_ $num_first $(_ $num_rest)*>](value);
							}
						}
					)+
					$(
						if let Some(value) = self.[<$gain_first $(_ $gain_rest)*>]() {
							if overwrite || target.[<$gain_first $(_ $gain_rest)*>]().is_none() {
								target.[<set_ $gain_first $(_ $gain_rest)*>](value);
							}
						}
					)+
				}

				let pictures = self.pictures();
				if !pictures.is_empty() && (overwrite || target.pictures().is_empty()) {
					target.set_pictures(pictures);
				}
			}
		}
	};
	(@TEXT [$name:tt $($other:tt)*]) => {
		paste::paste! {
			#[doc = "Returns the " $name $(" " $other)* "."]
			fn [<$name $(_ $other)*>](&self) -> Option<Cow<'_, str>> {
				None
			}

			#[doc = "Sets the " $name $(" " $other)* "."]
			fn [<set_ $name $(_ $other)*>](&mut self, _value: String) {}

			#[doc = "Removes the " $name $(" " $other)* "."]
			fn [<remove_ $name $(_ $other)*>](&mut self) {}
		}
	};
	(@LIST [$name:tt $($other:tt)*]) => {
		paste::paste! {
			#[doc = "Returns the " $name $(" " $other)* "."]
			fn [<$name $(_ $other)*>](&self) -> Vec<String> {
				Vec::new()
			}

			#[doc = "Sets the " $name $(" " $other)* "."]
			fn [<set_ $name $(_ $other)*>](&mut self, _value: Vec<String>) {}

			#[doc = "Removes the " $name $(" " $other)* "."]
			fn [<remove_ $name $(_ $other)*>](&mut self) {}
		}
	};
	(@NUMBER [$name:tt $($other:tt)*]) => {
		paste::paste! {
			#[doc = "Returns the " $name $(" " $other)* "."]
			fn [<$name $(_ $other)*>](&self) -> Option<u32> {
				None
			}

			#[doc = "Sets the " $name $(" " $other)* "."]
			fn [<set_ $name $(_ $other)*>](&mut self, _value: u32) {}

			#[doc = "Removes the " $name $(" " $other)* "."]
			fn [<remove_ $name $(_ $other)*>](&mut self) {}
		}
	};
	(@GAIN [$name:tt $($other:tt)*]) => {
		paste::paste! {
			#[doc = "Returns the " $name $(" " $other)* "."]
			fn [<$name $(_ $other)*>](&self) -> Option<f64> {
				None
			}

			#[doc = "Sets the " $name $(" " $other)* "."]
			fn [<set_ $name $(_ $other)*>](&mut self, _value: f64) {}

			#[doc = "Removes the " $name $(" " $other)* "."]
			fn [<remove_ $name $(_ $other)*>](&mut self) {}
		}
	};
}

// The canonical property list, shared between the trait definition and the
// aggregation impls in `combined`. Invokes `$callback` with the full set.
macro_rules! with_tag_properties {
	($callback:ident) => {
		$callback! {
			TEXT: [
				[title], [album], [comment], [lyrics], [grouping], [conductor], [copyright],
				[musicbrainz artist id], [musicbrainz release id], [musicbrainz track id],
			]
			LIST: [
				[performers], [album artists], [composers], [genres],
			]
			NUMBER: [
				[year], [track], [track count], [disc], [disc count], [bpm],
			]
			GAIN: [
				[replay gain track gain], [replay gain track peak],
				[replay gain album gain], [replay gain album peak],
			]
		}
	};
}

pub(crate) use with_tag_properties;

with_tag_properties!(tag_trait);
