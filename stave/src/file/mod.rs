//! Generic file handling utilities

mod file_type;

use crate::ape::ApeFile;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, StaveError};
use crate::flac::FlacFile;
use crate::id3::v2::skip_id3v2;
use crate::macros::err;
use crate::ogg::OggFile;
use crate::properties::FileProperties;
use crate::riff::{RiffFile, RiffForm};
use crate::tag::{CombinedTag, Tag, TagTypes};
use crate::util::io::{FileLike, Length, Truncate};

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub use file_type::{FileType, register_mime_type};

/// A parsed file of any supported type
///
/// This is the generic surface over the concrete file types: a tag object
/// supporting generic get/set of music metadata fields, and a save
/// operation persisting edits back to disk.
#[non_exhaustive]
pub enum TaggedFile {
	/// A Monkey's Audio file
	Ape(ApeFile),
	/// A FLAC file
	Flac(FlacFile),
	/// An OGG file
	Ogg(OggFile),
	/// A RIFF (WAV/AVI) file
	Riff(RiffFile),
}

impl TaggedFile {
	/// The type of the parsed file
	pub fn file_type(&self) -> FileType {
		match self {
			TaggedFile::Ape(_) => FileType::Ape,
			TaggedFile::Flac(_) => FileType::Flac,
			TaggedFile::Ogg(_) => FileType::Ogg,
			TaggedFile::Riff(file) => match file.form() {
				RiffForm::Wave => FileType::Wav,
				RiffForm::Avi => FileType::Avi,
			},
		}
	}

	/// The file's tags behind the generic [`Tag`](crate::tag::Tag) surface
	pub fn tag(&self) -> &CombinedTag {
		match self {
			TaggedFile::Ape(file) => file.tag(),
			TaggedFile::Flac(file) => file.tag(),
			TaggedFile::Ogg(file) => file.tag(),
			TaggedFile::Riff(file) => file.tag(),
		}
	}

	/// Mutable counterpart of [`TaggedFile::tag`]
	pub fn tag_mut(&mut self) -> &mut CombinedTag {
		match self {
			TaggedFile::Ape(file) => file.tag_mut(),
			TaggedFile::Flac(file) => file.tag_mut(),
			TaggedFile::Ogg(file) => file.tag_mut(),
			TaggedFile::Riff(file) => file.tag_mut(),
		}
	}

	/// Every tag kind detected in the file, preserved-only tags included
	pub fn tag_types(&self) -> TagTypes {
		match self {
			TaggedFile::Ape(file) => file.tag_types(),
			TaggedFile::Flac(file) => file.tag_types(),
			TaggedFile::Ogg(file) => file.tag().tag_types(),
			TaggedFile::Riff(file) => file.tag().tag_types(),
		}
	}

	/// The file's properties, converted to the format-agnostic
	/// [`FileProperties`]
	pub fn properties(&self) -> FileProperties {
		match self {
			TaggedFile::Ape(file) => file.properties().clone().into(),
			TaggedFile::Flac(file) => (*file.properties()).into(),
			TaggedFile::Ogg(file) => (*file.properties()).into(),
			TaggedFile::Riff(file) => (*file.properties()).into(),
		}
	}

	/// Detach every tag whose kind intersects `types`
	///
	/// # Errors
	///
	/// The format does not support removing tags (OGG), see
	/// [`OggFile::remove_tags`]
	pub fn remove_tags(&mut self, types: TagTypes) -> Result<()> {
		match self {
			TaggedFile::Ape(file) => file.remove_tags(types),
			TaggedFile::Flac(file) => file.remove_tags(types),
			TaggedFile::Ogg(file) => return file.remove_tags(types),
			TaggedFile::Riff(file) => file.remove_tags(types),
		}

		Ok(())
	}

	/// Save the file's tags back to `file`
	///
	/// # Errors
	///
	/// See the concrete types' `save_to` methods
	pub fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> Result<()>
	where
		F: FileLike,
		StaveError: From<<F as Truncate>::Error>,
		StaveError: From<<F as Length>::Error>,
	{
		match self {
			TaggedFile::Ape(f) => f.save_to(file, write_options),
			TaggedFile::Flac(f) => f.save_to(file, write_options),
			TaggedFile::Ogg(f) => f.save_to(file, write_options),
			TaggedFile::Riff(f) => f.save_to(file, write_options),
		}
	}

	/// Save the file's tags back to the file at `path`
	///
	/// The file is opened read+write for the duration of the save only.
	///
	/// # Errors
	///
	/// * `path` does not exist or is not writable
	/// * See [`TaggedFile::save_to`]
	pub fn save_to_path<P>(&self, path: P, write_options: WriteOptions) -> Result<()>
	where
		P: AsRef<Path>,
	{
		let mut file = OpenOptions::new().read(true).write(true).open(path)?;
		self.save_to(&mut file, write_options)
	}
}

/// Read a [`TaggedFile`] from a reader, guessing the type from its content
///
/// A sandwiched ID3v2 tag is skipped over before probing the signature.
///
/// # Errors
///
/// * The format could not be determined
/// * See the concrete types' `read_from` methods
pub fn read_from<R>(data: &mut R, parse_options: ParseOptions) -> Result<TaggedFile>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;

	// Sniffing must see the real container, not a sandwiched tag
	skip_id3v2(data)?;
	let probe_pos = data.stream_position()?;

	let mut buf = [0; 12];
	let read = data.read(&mut buf)?;
	data.seek(SeekFrom::Start(start))?;

	let Some(file_type) = FileType::from_buffer(&buf[..read]) else {
		err!(UnknownFormat);
	};

	read_with_file_type(data, file_type, probe_pos, parse_options)
}

/// Read a [`TaggedFile`] from a path
///
/// The type is determined from the extension, falling back to a content
/// probe when the extension is missing or unknown. The file is opened
/// read-only.
///
/// # Errors
///
/// * `path` does not exist
/// * See [`read_from`]
pub fn read_from_path<P>(path: P, parse_options: ParseOptions) -> Result<TaggedFile>
where
	P: AsRef<Path>,
{
	let mut file = std::fs::File::open(&path)?;

	match FileType::from_path(&path) {
		Some(file_type) => read_from_with_type(&mut file, file_type, parse_options),
		None => read_from(&mut file, parse_options),
	}
}

/// Read a [`TaggedFile`] of a known [`FileType`] from a reader
///
/// Use this when the type was already resolved externally, for example
/// from a MIME type through [`FileType::from_mime`].
///
/// # Errors
///
/// See the concrete types' `read_from` methods
pub fn read_from_with_type<R>(
	data: &mut R,
	file_type: FileType,
	parse_options: ParseOptions,
) -> Result<TaggedFile>
where
	R: Read + Seek,
{
	let start = data.stream_position()?;
	skip_id3v2(data)?;
	let probe_pos = data.stream_position()?;
	data.seek(SeekFrom::Start(start))?;

	read_with_file_type(data, file_type, probe_pos, parse_options)
}

fn read_with_file_type<R>(
	data: &mut R,
	file_type: FileType,
	probe_pos: u64,
	parse_options: ParseOptions,
) -> Result<TaggedFile>
where
	R: Read + Seek,
{
	log::debug!("Reading file of type {file_type:?}");

	match file_type {
		// These engines locate sandwiched tags themselves
		FileType::Ape => Ok(TaggedFile::Ape(ApeFile::read_from(data, parse_options)?)),
		FileType::Flac => Ok(TaggedFile::Flac(FlacFile::read_from(data, parse_options)?)),
		FileType::Ogg => {
			data.seek(SeekFrom::Start(probe_pos))?;
			Ok(TaggedFile::Ogg(OggFile::read_from(data, parse_options)?))
		},
		FileType::Wav | FileType::Avi => {
			data.seek(SeekFrom::Start(probe_pos))?;
			Ok(TaggedFile::Riff(RiffFile::read_from(data, parse_options)?))
		},
	}
}
