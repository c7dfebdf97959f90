use crate::Page;
use crate::error::{PageError, Result};
use crate::paginate::paginate;

use std::fmt::{Debug, Formatter};
use std::io::{Read, Seek, Write};

/// A container for packets in an OGG file
///
/// Alongside its content, each packet remembers the granule position of
/// the page it finished on, so that a stream can be repaginated without
/// losing timing information.
pub struct Packets {
	content: Vec<u8>,
	packet_sizes: Vec<u64>,
	end_granules: Vec<u64>,
}

impl Packets {
	/// Read as many packets as possible from a reader
	///
	/// # Errors
	///
	/// A page has a bad length
	pub fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_inner(data, -1, None)
	}

	/// Read a specific number of packets from a reader
	///
	/// A special value of `-1` will read as many packets as possible,
	/// in which case [`Packets::read`] should be used.
	///
	/// NOTE: Any value 0 or below will return an empty [`Packets`]
	///
	/// # Errors
	///
	/// * Unable to read the specified number of packets
	/// * A page has a bad length
	pub fn read_count<R>(data: &mut R, count: isize) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_inner(data, count, None)
	}

	/// Read all packets belonging to the logical bitstream `stream_serial`
	///
	/// Pages belonging to other logical bitstreams are skipped over, making
	/// this usable on multiplexed physical streams.
	///
	/// # Errors
	///
	/// A page has a bad length
	pub fn read_stream<R>(data: &mut R, stream_serial: u32) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_inner(data, -1, Some(stream_serial))
	}

	/// Read a specific number of packets belonging to `stream_serial`
	///
	/// See [`Packets::read_count`] and [`Packets::read_stream`].
	///
	/// # Errors
	///
	/// * Unable to read the specified number of packets
	/// * A page has a bad length
	pub fn read_stream_count<R>(data: &mut R, stream_serial: u32, count: isize) -> Result<Self>
	where
		R: Read + Seek,
	{
		Self::read_inner(data, count, Some(stream_serial))
	}

	fn read_inner<R>(data: &mut R, count: isize, serial_filter: Option<u32>) -> Result<Self>
	where
		R: Read + Seek,
	{
		let mut content = Vec::new();
		let mut packet_sizes = Vec::new();
		let mut end_granules = Vec::new();

		if count == 0 || count < -1 {
			return Ok(Self {
				content,
				packet_sizes,
				end_granules,
			});
		}

		let mut read = 0_isize;
		let mut pending = 0_u64;

		'outer: while let Ok(page) = Page::read(data) {
			if let Some(serial) = serial_filter {
				if page.header.stream_serial != serial {
					continue;
				}
			}

			content.extend_from_slice(&page.content);

			for &segment in &page.header.segments {
				pending += u64::from(segment);

				// A segment < 255 terminates the current packet
				if segment < 255 {
					packet_sizes.push(pending);
					end_granules.push(page.header.abgp);
					pending = 0;

					if count != -1 {
						read += 1;

						if read == count {
							break 'outer;
						}
					}
				}
			}
		}

		if count != -1 && packet_sizes.len() != count as usize {
			return Err(PageError::NotEnoughData);
		}

		Ok(Self {
			content,
			packet_sizes,
			end_granules,
		})
	}

	/// Returns the number of packets
	pub fn len(&self) -> usize {
		self.packet_sizes.len()
	}

	/// Returns true if there are no packets
	pub fn is_empty(&self) -> bool {
		self.packet_sizes.is_empty()
	}

	fn start_of(&self, idx: usize) -> usize {
		self.packet_sizes[..idx].iter().map(|&s| s as usize).sum()
	}

	/// Gets the packet at a specified index, returning its contents
	///
	/// NOTES:
	///
	/// * This is zero-indexed
	/// * If the index is out of bounds, it will return [`None`]
	pub fn get(&self, idx: usize) -> Option<&[u8]> {
		if idx >= self.packet_sizes.len() {
			return None;
		}

		let start = self.start_of(idx);
		Some(&self.content[start..start + self.packet_sizes[idx] as usize])
	}

	/// Sets the packet content, if it exists
	///
	/// The packet keeps its original end granule position.
	///
	/// NOTES:
	///
	/// * This is zero-indexed
	/// * If the index is out of bounds, it will return `false`
	pub fn set(&mut self, idx: usize, content: impl Into<Vec<u8>>) -> bool {
		if idx >= self.packet_sizes.len() {
			return false;
		}

		let start = self.start_of(idx);
		let end = start + self.packet_sizes[idx] as usize;

		let content = content.into();
		let content_size = content.len();

		self.content.splice(start..end, content);
		self.packet_sizes[idx] = content_size as u64;

		true
	}

	/// Returns an iterator over the packets and their end granule positions
	pub fn iter(&self) -> PacketsIter<'_> {
		<&Self as IntoIterator>::into_iter(self)
	}

	/// Convert the packets into a stream of pages
	///
	/// See [`paginate()`] for more information.
	///
	/// # Errors
	///
	/// See [`paginate()`]
	pub fn paginate(&self, stream_serial: u32, flags: u8) -> Result<Vec<Page>> {
		paginate(self.iter(), stream_serial, flags)
	}

	/// Paginate and write all of the packets to a writer
	///
	/// Returns the number of pages written.
	///
	/// # Errors
	///
	/// * Unable to write, see [`std::io::Error`]
	pub fn write_to<W>(&self, writer: &mut W, stream_serial: u32, flags: u8) -> Result<usize>
	where
		W: Write,
	{
		let paginated = self.paginate(stream_serial, flags)?;
		let num_pages = paginated.len();

		for mut page in paginated {
			page.gen_crc();
			writer.write_all(&page.as_bytes())?;
		}

		Ok(num_pages)
	}
}

/// An iterator over packets
///
/// This is created by calling `into_iter` on [`Packets`]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PacketsIter<'a> {
	content: &'a [u8],
	packet_sizes: &'a [u64],
	end_granules: &'a [u64],
}

impl<'a> Iterator for PacketsIter<'a> {
	type Item = (&'a [u8], u64);

	fn next(&mut self) -> Option<Self::Item> {
		if self.packet_sizes.is_empty() {
			return None;
		}

		let packet_size = self.packet_sizes[0];
		let granule = self.end_granules[0];

		self.packet_sizes = &self.packet_sizes[1..];
		self.end_granules = &self.end_granules[1..];

		let (ret, remaining) = self.content.split_at(packet_size as usize);
		self.content = remaining;

		Some((ret, granule))
	}
}

impl<'a> IntoIterator for &'a Packets {
	type Item = (&'a [u8], u64);
	type IntoIter = PacketsIter<'a>;

	fn into_iter(self) -> Self::IntoIter {
		PacketsIter {
			content: &self.content,
			packet_sizes: &self.packet_sizes,
			end_granules: &self.end_granules,
		}
	}
}

impl Debug for Packets {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Packets")
			.field("total_bytes", &self.content.len())
			.field("count", &self.packet_sizes.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::CONTAINS_FIRST_PAGE_OF_BITSTREAM;

	use std::io::Cursor;

	fn stream_bytes(serial: u32, packets: &[(&[u8], u64)]) -> Vec<u8> {
		let pages = paginate(
			packets.iter().copied(),
			serial,
			CONTAINS_FIRST_PAGE_OF_BITSTREAM,
		)
		.unwrap();

		let mut bytes = Vec::new();
		for mut page in pages {
			page.gen_crc();
			bytes.extend(page.as_bytes());
		}
		bytes
	}

	#[test]
	fn packet_round_trip() {
		let p1 = vec![1u8; 400];
		let p2 = vec![2u8; 255];
		let p3 = vec![3u8; 10];

		let bytes = stream_bytes(77, &[(&p1, 0), (&p2, 100), (&p3, 200)]);

		let packets = Packets::read(&mut Cursor::new(bytes)).unwrap();

		assert_eq!(packets.len(), 3);
		assert_eq!(packets.get(0), Some(p1.as_slice()));
		assert_eq!(packets.get(1), Some(p2.as_slice()));
		assert_eq!(packets.get(2), Some(p3.as_slice()));

		let granules: Vec<u64> = packets.iter().map(|(_, g)| g).collect();
		assert_eq!(granules, vec![200, 200, 200]);
	}

	#[test]
	fn set_resizes_following_packets() {
		let p1 = vec![1u8; 30];
		let p2 = vec![2u8; 40];

		let bytes = stream_bytes(1, &[(&p1, 0), (&p2, 0)]);
		let mut packets = Packets::read(&mut Cursor::new(bytes)).unwrap();

		let replacement = vec![9u8; 500];
		assert!(packets.set(0, replacement.clone()));

		assert_eq!(packets.get(0), Some(replacement.as_slice()));
		assert_eq!(packets.get(1), Some(p2.as_slice()));

		assert!(!packets.set(100, Vec::new()));
	}

	#[test]
	fn serial_filter_skips_other_streams() {
		let a = vec![1u8; 50];
		let b = vec![2u8; 60];

		let mut bytes = stream_bytes(10, &[(&a, 0)]);
		bytes.extend(stream_bytes(20, &[(&b, 0)]));

		let packets = Packets::read_stream(&mut Cursor::new(bytes), 20).unwrap();

		assert_eq!(packets.len(), 1);
		assert_eq!(packets.get(0), Some(b.as_slice()));
	}
}
