use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// The type of a file
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum FileType {
	/// Monkey's Audio
	Ape,
	/// FLAC
	Flac,
	/// An OGG container (Vorbis, Opus, Speex)
	Ogg,
	/// RIFF WAVE
	Wav,
	/// RIFF AVI
	Avi,
}

// MIME types registered on top of the built-in set
static CUSTOM_MIME_TYPES: Mutex<BTreeMap<&'static str, FileType>> = Mutex::new(BTreeMap::new());

/// Register a MIME type for a [`FileType`]
///
/// The registration is process-wide and consulted by
/// [`FileType::from_mime`] after the built-in set.
pub fn register_mime_type(mime_type: &'static str, file_type: FileType) {
	log::debug!("Registering MIME type {mime_type} for {file_type:?}");

	CUSTOM_MIME_TYPES
		.lock()
		.expect("MIME type registry poisoned")
		.insert(mime_type, file_type);
}

impl FileType {
	/// Get a `FileType` from a file extension
	///
	/// # Examples
	///
	/// ```rust
	/// use stave::file::FileType;
	///
	/// let extension = "flac";
	/// assert_eq!(FileType::from_ext(extension), Some(FileType::Flac));
	/// ```
	pub fn from_ext<E>(ext: E) -> Option<Self>
	where
		E: AsRef<std::ffi::OsStr>,
	{
		let ext = ext.as_ref().to_str()?.to_ascii_lowercase();

		match ext.as_str() {
			"ape" | "mac" => Some(Self::Ape),
			"flac" => Some(Self::Flac),
			"ogg" | "oga" | "opus" | "spx" => Some(Self::Ogg),
			"wav" | "wave" => Some(Self::Wav),
			"avi" => Some(Self::Avi),
			_ => None,
		}
	}

	/// Get a `FileType` from a path's extension
	pub fn from_path<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path>,
	{
		let ext = path.as_ref().extension()?;
		Self::from_ext(ext)
	}

	/// Get a `FileType` from a MIME type
	///
	/// Consults the built-in set first, then anything added through
	/// [`register_mime_type`].
	///
	/// # Examples
	///
	/// ```rust
	/// use stave::file::FileType;
	///
	/// assert_eq!(FileType::from_mime("audio/ogg"), Some(FileType::Ogg));
	/// ```
	pub fn from_mime(mime_type: &str) -> Option<Self> {
		match mime_type {
			"audio/x-ape" | "audio/ape" => return Some(Self::Ape),
			"audio/flac" | "audio/x-flac" => return Some(Self::Flac),
			"audio/ogg" | "application/ogg" | "audio/vorbis" | "audio/opus"
			| "audio/x-speex" => return Some(Self::Ogg),
			"audio/wav" | "audio/x-wav" | "audio/wave" => return Some(Self::Wav),
			"video/avi" | "video/msvideo" | "video/x-msvideo" => return Some(Self::Avi),
			_ => {},
		}

		CUSTOM_MIME_TYPES
			.lock()
			.expect("MIME type registry poisoned")
			.get(mime_type)
			.copied()
	}

	/// Guess a `FileType` from the first bytes of a file
	///
	/// `buf` should hold at least the first 12 bytes. A leading ID3v2 tag
	/// is not handled here; reading functions skip it before probing.
	pub fn from_buffer(buf: &[u8]) -> Option<Self> {
		match buf {
			[b'M', b'A', b'C', b' ', ..] => Some(Self::Ape),
			[b'f', b'L', b'a', b'C', ..] => Some(Self::Flac),
			[b'O', b'g', b'g', b'S', ..] => Some(Self::Ogg),
			[b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(Self::Wav),
			[b'R', b'I', b'F', b'F', _, _, _, _, b'A', b'V', b'I', b' ', ..] => Some(Self::Avi),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{FileType, register_mime_type};

	#[test_log::test]
	fn extension_lookup() {
		assert_eq!(FileType::from_ext("FLAC"), Some(FileType::Flac));
		assert_eq!(FileType::from_ext("opus"), Some(FileType::Ogg));
		assert_eq!(FileType::from_path("/music/a.wav"), Some(FileType::Wav));
		assert_eq!(FileType::from_ext("txt"), None);
	}

	#[test_log::test]
	fn mime_registry() {
		assert_eq!(FileType::from_mime("audio/flac"), Some(FileType::Flac));
		assert_eq!(FileType::from_mime("audio/x-monkeys-audio"), None);

		register_mime_type("audio/x-monkeys-audio", FileType::Ape);
		assert_eq!(
			FileType::from_mime("audio/x-monkeys-audio"),
			Some(FileType::Ape)
		);
	}

	#[test_log::test]
	fn buffer_probing() {
		assert_eq!(FileType::from_buffer(b"fLaC\x00\x00\x00\x22"), Some(FileType::Flac));
		assert_eq!(
			FileType::from_buffer(b"RIFF\x10\x00\x00\x00WAVEfmt "),
			Some(FileType::Wav)
		);
		assert_eq!(FileType::from_buffer(b"garbage!"), None);
	}
}
