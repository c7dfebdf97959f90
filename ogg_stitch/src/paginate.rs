use crate::error::Result;
use crate::{
	CONTAINS_FIRST_PAGE_OF_BITSTREAM, CONTAINS_LAST_PAGE_OF_BITSTREAM, CONTINUED_PACKET,
	MAX_SEGMENT_COUNT, Page, PageHeader,
};

// The granule position of a page on which no packet finishes is a
// special value of '-1' in two's complement.
const NO_PACKET_FINISHES: u64 = 1_u64.wrapping_neg();

struct PaginateContext {
	pages: Vec<Page>,
	stream_serial: u32,
	header_flags: u8,
	idx: u32,
	// State of the page currently being filled
	segments: Vec<u8>,
	content: Vec<u8>,
	abgp: u64,
	packet_finished_on_page: bool,
	continued: bool,
	first_page: bool,
}

impl PaginateContext {
	fn new(stream_serial: u32, header_flags: u8) -> Self {
		Self {
			pages: Vec::new(),
			stream_serial,
			header_flags,
			idx: 0,
			segments: Vec::new(),
			content: Vec::new(),
			abgp: NO_PACKET_FINISHES,
			packet_finished_on_page: false,
			continued: false,
			first_page: true,
		}
	}

	fn push_segment(&mut self, segment: &[u8], terminal: bool, granule: u64) {
		debug_assert!(segment.len() <= 255);

		self.segments.push(segment.len() as u8);
		self.content.extend_from_slice(segment);

		if terminal {
			self.packet_finished_on_page = true;
			self.abgp = granule;
		}

		if self.segments.len() == MAX_SEGMENT_COUNT {
			// The next page continues the current packet unless this
			// segment happened to be its last
			self.flush_page(!terminal);
		}
	}

	fn flush_page(&mut self, packet_continues: bool) {
		let header_type_flag = {
			if self.first_page && self.header_flags & CONTAINS_FIRST_PAGE_OF_BITSTREAM != 0 {
				CONTAINS_FIRST_PAGE_OF_BITSTREAM
			} else if self.continued {
				CONTINUED_PACKET
			} else {
				0
			}
		};

		let header = PageHeader {
			start: 0,
			header_type_flag,
			abgp: if self.packet_finished_on_page {
				self.abgp
			} else {
				NO_PACKET_FINISHES
			},
			stream_serial: self.stream_serial,
			sequence_number: self.idx,
			checksum: 0,
			segments: core::mem::take(&mut self.segments),
		};

		self.pages.push(Page {
			header,
			content: core::mem::take(&mut self.content),
			end: 0,
		});

		self.idx += 1;
		self.first_page = false;
		self.continued = packet_continues;
		self.packet_finished_on_page = false;
		self.abgp = NO_PACKET_FINISHES;
	}
}

/// Create pages from a list of packets
///
/// Each packet is paired with the granule position of the page it should
/// finish on. A page on which no packet finishes is given a granule
/// position of `-1`.
///
/// Packets are packed together; a page is only flushed once its segment
/// table is full. Sequence numbers are assigned starting at 0 and the
/// checksums are left zeroed, see [`Page::gen_crc`].
///
/// # Errors
///
/// * Unable to read packet content
pub fn paginate<'a, I>(packets: I, stream_serial: u32, flags: u8) -> Result<Vec<Page>>
where
	I: IntoIterator<Item = (&'a [u8], u64)>,
{
	let mut ctx = PaginateContext::new(stream_serial, flags);

	for (packet, granule) in packets {
		paginate_packet(&mut ctx, packet, granule);
	}

	// Flush any content leftover
	if !ctx.segments.is_empty() {
		ctx.flush_page(false);
	}

	if flags & CONTAINS_LAST_PAGE_OF_BITSTREAM != 0 {
		if let Some(last) = ctx.pages.last_mut() {
			last.header.header_type_flag |= CONTAINS_LAST_PAGE_OF_BITSTREAM;
		}
	}

	Ok(ctx.pages)
}

fn paginate_packet(ctx: &mut PaginateContext, packet: &[u8], granule: u64) {
	// A packet is laced as `len / 255` full segments plus one terminal
	// segment of `len % 255` bytes (possibly zero-length).
	let full_segments = packet.len() / 255;

	let mut pos = 0;
	for _ in 0..full_segments {
		ctx.push_segment(&packet[pos..pos + 255], false, granule);
		pos += 255;
	}

	ctx.push_segment(&packet[pos..], true, granule);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_packets_share_a_page() {
		let p1 = vec![1u8; 100];
		let p2 = vec![2u8; 200];

		let pages = paginate(
			[(p1.as_slice(), 0), (p2.as_slice(), 48000)],
			1234,
			CONTAINS_FIRST_PAGE_OF_BITSTREAM,
		)
		.unwrap();

		assert_eq!(pages.len(), 1);

		let page = &pages[0];
		assert_eq!(page.header.segments, vec![100, 200]);
		assert_eq!(page.header.abgp, 48000);
		assert_eq!(
			page.header.header_type_flag,
			CONTAINS_FIRST_PAGE_OF_BITSTREAM
		);
	}

	#[test]
	fn large_packet_spans_pages() {
		// 255 * 300 bytes needs two pages worth of segments
		let packet = vec![0u8; 255 * 300];

		let pages = paginate([(packet.as_slice(), 96000)], 1, 0).unwrap();

		assert_eq!(pages.len(), 2);

		// No packet finishes on the first page
		assert_eq!(pages[0].header.abgp, u64::MAX);
		assert_eq!(pages[0].header.segments.len(), MAX_SEGMENT_COUNT);

		// The second page continues the packet and carries the granule
		assert_eq!(pages[1].header.header_type_flag, CONTINUED_PACKET);
		assert_eq!(pages[1].header.abgp, 96000);

		let total: usize = pages
			.iter()
			.map(|p| p.header.content_size())
			.sum();
		assert_eq!(total, packet.len());
	}

	#[test]
	fn exact_multiple_gets_zero_segment() {
		let packet = vec![0u8; 510];

		let pages = paginate([(packet.as_slice(), 0)], 1, 0).unwrap();

		assert_eq!(pages.len(), 1);
		assert_eq!(pages[0].header.segments, vec![255, 255, 0]);
	}
}
