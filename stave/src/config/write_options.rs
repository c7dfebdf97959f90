/// Options to control how tags are written back to a file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) preferred_padding: Option<u32>,
	pub(crate) write_to_all: bool,
}

impl WriteOptions {
	/// Default preferred padding size in bytes
	pub const DEFAULT_PREFERRED_PADDING: u32 = 1024;

	/// Creates a new `WriteOptions`, alias for `Default` implementation
	///
	/// See also: [`WriteOptions::default`]
	pub const fn new() -> Self {
		Self {
			preferred_padding: Some(Self::DEFAULT_PREFERRED_PADDING),
			write_to_all: false,
		}
	}

	/// Set the preferred padding size in bytes
	///
	/// If the format being written supports padding, this is the amount of
	/// headroom added when the freed space cannot be reused.
	///
	/// NOTES:
	///
	/// * Not all formats support padding
	/// * The actual padding size may differ from this value; when new content
	///   shrinks inside an existing region, the padding grows to exactly fill
	///   the freed space instead.
	pub fn preferred_padding(mut self, preferred_padding: u32) -> Self {
		match preferred_padding {
			0 => self.preferred_padding = None,
			_ => self.preferred_padding = Some(preferred_padding),
		}
		self
	}

	/// Whether generic property writes should reach every member of a
	/// [`CombinedTag`](crate::tag::CombinedTag)
	///
	/// When `false` (the default), writes apply only to the first tag in the
	/// aggregate.
	pub fn write_to_all(mut self, write_to_all: bool) -> Self {
		self.write_to_all = write_to_all;
		self
	}
}

impl Default for WriteOptions {
	/// The default implementation for `WriteOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// WriteOptions {
	///     preferred_padding: 1024,
	///     write_to_all: false,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}
