//! Various traits for reading and writing to file-like objects

use crate::error::{Result, StaveError};
use crate::macros::{err, try_vec};

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Provides a method to truncate an object to the specified length
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to any
/// file saving methods such as [`TaggedFile::save_to`](crate::file::TaggedFile::save_to).
///
/// Take great care in implementing this for downstream types, as the library will assume that the
/// container has the new length specified. If this assumption were to be broken, files **will** become corrupted.
pub trait Truncate {
	/// The error type of the truncation operation
	type Error: Into<StaveError>;

	/// Truncate a storage object to the specified length
	///
	/// # Errors
	///
	/// Errors depend on the object being truncated, which may not always be fallible.
	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error>;
}

impl Truncate for File {
	type Error = std::io::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.set_len(new_len)
	}
}

impl Truncate for Vec<u8> {
	type Error = std::convert::Infallible;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.truncate(new_len as usize);
		Ok(())
	}
}

impl<T> Truncate for Cursor<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.get_mut().truncate(new_len)
	}
}

impl<T> Truncate for Box<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.as_mut().truncate(new_len)
	}
}

impl<T> Truncate for &mut T
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		(**self).truncate(new_len)
	}
}

/// Provides a method to get the length of a storage object
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to any
/// file saving methods such as [`TaggedFile::save_to`](crate::file::TaggedFile::save_to).
///
/// Take great care in implementing this for downstream types, as the library will assume that the
/// container has the exact length specified. If this assumption were to be broken, files **may** become corrupted.
pub trait Length {
	/// The error type of the length operation
	type Error: Into<StaveError>;

	/// Get the length of a storage object
	///
	/// # Errors
	///
	/// Errors depend on the object being read, which may not always be fallible.
	fn len(&self) -> std::result::Result<u64, Self::Error>;
}

impl Length for File {
	type Error = std::io::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		self.metadata().map(|m| m.len())
	}
}

impl Length for Vec<u8> {
	type Error = std::convert::Infallible;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Ok(self.len() as u64)
	}
}

impl<T> Length for Cursor<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.get_ref())
	}
}

impl<T> Length for Box<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.as_ref())
	}
}

impl<T> Length for &T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

impl<T> Length for &mut T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

/// Provides a set of methods to read and write to a file-like object
///
/// This is a combination of the [`Read`], [`Write`], [`Seek`], [`Truncate`], and [`Length`] traits.
/// It is used to provide implementors access to any file saving methods such as
/// [`TaggedFile::save_to`](crate::file::TaggedFile::save_to).
///
/// Take great care in implementing this for downstream types, as the library will assume that the
/// trait implementations are correct. If this assumption were to be broken, files **may** become corrupted.
pub trait FileLike: Read + Write + Seek + Truncate + Length
where
	<Self as Truncate>::Error: Into<StaveError>,
	<Self as Length>::Error: Into<StaveError>,
{
}

impl<T> FileLike for T
where
	T: Read + Write + Seek + Truncate + Length,
	<T as Truncate>::Error: Into<StaveError>,
	<T as Length>::Error: Into<StaveError>,
{
}

// Trailing bytes are moved in bounded chunks rather than buffering the
// remainder of the file.
const MOVE_BUFFER_SIZE: usize = 64 * 1024;

/// Replace the region `[start, start + replace_length)` of `file` with `data`
///
/// Bytes following the region are shifted by the length delta, so the
/// surrounding content survives untouched no matter how the region's size
/// changes. A shrinking replacement truncates the file to its new length.
///
/// This is the single primitive every save algorithm routes its region
/// rewrites through.
///
/// # Errors
///
/// * The region extends past the end of the file
/// * [`std::io::Error`]
pub fn insert<F>(file: &mut F, data: &[u8], start: u64, replace_length: u64) -> Result<()>
where
	F: FileLike,
	StaveError: From<<F as Truncate>::Error>,
	StaveError: From<<F as Length>::Error>,
{
	let file_length = file.len()?;

	let Some(tail_start) = start.checked_add(replace_length) else {
		err!(SizeMismatch);
	};

	if tail_start > file_length {
		err!(SizeMismatch);
	}

	let tail_length = file_length - tail_start;
	let new_tail_start = start + data.len() as u64;

	log::trace!(
		"Splicing {} bytes over [{start}, {tail_start}), shifting {tail_length} trailing bytes",
		data.len()
	);

	if new_tail_start != tail_start && tail_length > 0 {
		let mut buffer = try_vec![0; MOVE_BUFFER_SIZE];

		if new_tail_start > tail_start {
			// Growing, move the tail back to front so chunks never
			// overwrite bytes that still need to be read
			let mut remaining = tail_length;
			while remaining > 0 {
				let chunk = std::cmp::min(remaining, MOVE_BUFFER_SIZE as u64) as usize;
				let src = tail_start + remaining - chunk as u64;

				file.seek(SeekFrom::Start(src))?;
				file.read_exact(&mut buffer[..chunk])?;

				file.seek(SeekFrom::Start(new_tail_start + (src - tail_start)))?;
				file.write_all(&buffer[..chunk])?;

				remaining -= chunk as u64;
			}
		} else {
			// Shrinking, move front to back
			let mut moved = 0_u64;
			while moved < tail_length {
				let chunk = std::cmp::min(tail_length - moved, MOVE_BUFFER_SIZE as u64) as usize;

				file.seek(SeekFrom::Start(tail_start + moved))?;
				file.read_exact(&mut buffer[..chunk])?;

				file.seek(SeekFrom::Start(new_tail_start + moved))?;
				file.write_all(&buffer[..chunk])?;

				moved += chunk as u64;
			}
		}
	}

	file.seek(SeekFrom::Start(start))?;
	file.write_all(data)?;

	let new_length = file_length - replace_length + data.len() as u64;
	if new_length < file_length {
		file.truncate(new_length)?;
	}

	file.rewind()?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::insert;

	use std::io::Cursor;

	fn file(content: &[u8]) -> Cursor<Vec<u8>> {
		Cursor::new(content.to_vec())
	}

	#[test_log::test]
	fn insert_grow() {
		let mut f = file(b"aaXXbb");
		insert(&mut f, b"YYYY", 2, 2).unwrap();
		assert_eq!(f.into_inner(), b"aaYYYYbb");
	}

	#[test_log::test]
	fn insert_shrink() {
		let mut f = file(b"aaXXXXbb");
		insert(&mut f, b"Y", 2, 4).unwrap();
		assert_eq!(f.into_inner(), b"aaYbb");
	}

	#[test_log::test]
	fn insert_equal_length() {
		let mut f = file(b"aaXXbb");
		insert(&mut f, b"YY", 2, 2).unwrap();
		assert_eq!(f.into_inner(), b"aaYYbb");
	}

	#[test_log::test]
	fn insert_pure_insertion() {
		let mut f = file(b"aabb");
		insert(&mut f, b"XX", 2, 0).unwrap();
		assert_eq!(f.into_inner(), b"aaXXbb");
	}

	#[test_log::test]
	fn insert_pure_removal() {
		let mut f = file(b"aaXXbb");
		insert(&mut f, b"", 2, 2).unwrap();
		assert_eq!(f.into_inner(), b"aabb");
	}

	#[test_log::test]
	fn insert_out_of_bounds() {
		let mut f = file(b"aa");
		assert!(insert(&mut f, b"X", 1, 5).is_err());
	}

	#[test_log::test]
	fn insert_large_tail() {
		// Force multiple buffer chunks through both move directions
		let tail = vec![7u8; super::MOVE_BUFFER_SIZE * 2 + 123];

		let mut content = b"head".to_vec();
		content.extend_from_slice(&[0; 10]);
		content.extend_from_slice(&tail);

		let mut f = file(&content);
		insert(&mut f, &[1; 300], 4, 10).unwrap();

		let grown = f.into_inner();
		assert_eq!(&grown[..4], b"head");
		assert_eq!(&grown[4..304], &[1; 300][..]);
		assert_eq!(&grown[304..], &tail[..]);

		let mut f = file(&grown);
		insert(&mut f, &[2; 3], 4, 300).unwrap();

		let shrunk = f.into_inner();
		assert_eq!(&shrunk[..4], b"head");
		assert_eq!(&shrunk[4..7], &[2; 3][..]);
		assert_eq!(&shrunk[7..], &tail[..]);
	}
}
