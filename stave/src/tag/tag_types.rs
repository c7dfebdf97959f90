use std::fmt::{Debug, Formatter};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

macro_rules! define_tag_flags {
	([
		$(
			$(#[$meta:meta])?
			$name:ident => $shift:literal
		),+
	]) => {
		impl TagTypes {
			$(
				$(#[$meta])?
				#[allow(missing_docs)]
				pub const $name: Self = Self(1 << $shift);
			)+
		}
	};
}

/// A bitmask of tag kinds
///
/// Every concrete tag contributes one flag; an aggregate's mask is the
/// union of its members'. This is used to query what a file contains and
/// to select tags for removal, see
/// [`CombinedTag::remove_tags`](crate::tag::CombinedTag::remove_tags).
#[derive(Clone, Copy, Eq, PartialEq, Default)]
#[repr(transparent)]
pub struct TagTypes(pub(crate) u32);

define_tag_flags! {
	[
		XIPH          => 0,
		ID3V1         => 1,
		ID3V2         => 2,
		APE           => 3,
		RIFF_INFO     => 4,
		MOVIE_ID      => 5,
		DIVX          => 6,
		FLAC_PICTURES => 7
	]
}

impl TagTypes {
	/// An empty mask
	pub const NONE: Self = Self(0);
	/// Every tag kind
	pub const ALL: Self = Self(u32::MAX);

	/// The bit mask
	#[must_use]
	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Whether the mask contains every flag of `other`
	#[must_use]
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Whether the mask shares any flag with `other`
	#[must_use]
	pub const fn intersects(self, other: Self) -> bool {
		self.0 & other.0 != 0
	}

	/// Whether no flags are set
	#[must_use]
	pub const fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl BitOr for TagTypes {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl BitOrAssign for TagTypes {
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}

impl BitAnd for TagTypes {
	type Output = Self;

	fn bitand(self, rhs: Self) -> Self {
		Self(self.0 & rhs.0)
	}
}

impl BitAndAssign for TagTypes {
	fn bitand_assign(&mut self, rhs: Self) {
		self.0 &= rhs.0;
	}
}

impl Debug for TagTypes {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		const NAMES: [(TagTypes, &str); 8] = [
			(TagTypes::XIPH, "XIPH"),
			(TagTypes::ID3V1, "ID3V1"),
			(TagTypes::ID3V2, "ID3V2"),
			(TagTypes::APE, "APE"),
			(TagTypes::RIFF_INFO, "RIFF_INFO"),
			(TagTypes::MOVIE_ID, "MOVIE_ID"),
			(TagTypes::DIVX, "DIVX"),
			(TagTypes::FLAC_PICTURES, "FLAC_PICTURES"),
		];

		let mut first = true;
		for (flag, name) in NAMES {
			if self.intersects(flag) {
				if !first {
					write!(f, " | ")?;
				}

				write!(f, "{name}")?;
				first = false;
			}
		}

		if first {
			write!(f, "NONE")?;
		}

		Ok(())
	}
}

/// The tag's format
///
/// The companion identity to the [`TagTypes`] mask, used wherever exactly
/// one concrete tag kind must be named.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TagType {
	/// A Xiph comment (Vorbis comment)
	Xiph,
	/// An ID3v1 tag
	Id3v1,
	/// An ID3v2 tag
	///
	/// These are carried as opaque payloads; the frame structure is not
	/// interpreted.
	Id3v2,
	/// An APEv1/v2 tag
	///
	/// These are recognized and preserved, but not rewritten.
	Ape,
	/// A RIFF `LIST INFO` tag
	RiffInfo,
	/// A RIFF `LIST MID ` (MovieID) tag
	MovieId,
	/// A DivX trailer tag
	Divx,
}

impl TagType {
	/// The mask flag corresponding to this tag type
	#[must_use]
	pub const fn as_flag(self) -> TagTypes {
		match self {
			TagType::Xiph => TagTypes::XIPH,
			TagType::Id3v1 => TagTypes::ID3V1,
			TagType::Id3v2 => TagTypes::ID3V2,
			TagType::Ape => TagTypes::APE,
			TagType::RiffInfo => TagTypes::RIFF_INFO,
			TagType::MovieId => TagTypes::MOVIE_ID,
			TagType::Divx => TagTypes::DIVX,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{TagType, TagTypes};

	#[test_log::test]
	fn mask_operations() {
		let mask = TagTypes::XIPH | TagTypes::ID3V1;

		assert!(mask.contains(TagTypes::XIPH));
		assert!(mask.contains(TagTypes::ID3V1));
		assert!(!mask.contains(TagTypes::DIVX));
		assert!(mask.intersects(TagTypes::ID3V1 | TagTypes::DIVX));
		assert!(!mask.intersects(TagTypes::DIVX));

		assert!(TagTypes::NONE.is_none());
		assert!(TagTypes::ALL.contains(mask));
	}

	#[test_log::test]
	fn flags_round_trip_through_tag_type() {
		assert_eq!(TagType::Xiph.as_flag(), TagTypes::XIPH);
		assert_eq!(TagType::Divx.as_flag(), TagTypes::DIVX);
	}
}
