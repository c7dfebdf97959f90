/// The parsing strictness mode
///
/// This can be set with [`ParseOptions::parsing_mode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Will eagerly error on invalid input
	///
	/// This mode will eagerly error on any non spec-compliant input.
	Strict,
	/// Default mode, less eager to error on recoverably malformed input
	///
	/// This mode will attempt to fill in any holes where possible in otherwise
	/// valid, partially malformed input.
	#[default]
	BestAttempt,
	/// Least eager to error, may produce invalid/partial output
	///
	/// This mode will discard any invalid fields, and ignore errors wherever
	/// it can.
	Relaxed,
}

/// Options to control how files are parsed
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) read_properties: bool,
	pub(crate) read_tags: bool,
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) read_cover_art: bool,
	pub(crate) create_default_tags: bool,
}

impl Default for ParseOptions {
	/// The default implementation for `ParseOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// ParseOptions {
	/// 	read_properties: true,
	///     read_tags: true,
	/// 	parsing_mode: ParsingMode::BestAttempt,
	///     read_cover_art: true,
	///     create_default_tags: true,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// Default parsing mode
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// Creates a new `ParseOptions`, alias for `Default` implementation
	///
	/// See also: [`ParseOptions::default`]
	#[must_use]
	pub const fn new() -> Self {
		Self {
			read_properties: true,
			read_tags: true,
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			read_cover_art: true,
			create_default_tags: true,
		}
	}

	/// Whether or not to read the audio properties
	pub fn read_properties(&mut self, read_properties: bool) -> Self {
		self.read_properties = read_properties;
		*self
	}

	/// Whether or not to read the tags
	pub fn read_tags(&mut self, read_tags: bool) -> Self {
		self.read_tags = read_tags;
		*self
	}

	/// The parsing mode to use, see [`ParsingMode`] for details
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}

	/// Whether or not to read cover art
	///
	/// Embedded images are by far the largest fields in a tag. When they aren't
	/// needed, skipping them avoids materializing their contents entirely.
	pub fn read_cover_art(&mut self, read_cover_art: bool) -> Self {
		self.read_cover_art = read_cover_art;
		*self
	}

	/// Whether or not to create a format's default tag when none is present
	///
	/// With this enabled, opening a tag-less file yields an empty writable
	/// tag of the format's native kind (a Xiph comment for FLAC, an INFO
	/// list for WAV, …), so callers can set properties right away without
	/// creating the tag themselves.
	pub fn create_default_tags(&mut self, create_default_tags: bool) -> Self {
		self.create_default_tags = create_default_tags;
		*self
	}
}
