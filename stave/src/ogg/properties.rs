use super::OggFormat;
use crate::error::Result;
use crate::macros::decode_err;
use crate::properties::FileProperties;

use std::io::{Seek, SeekFrom};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

/// An OGG file's audio properties
///
/// These describe the file's first logical bitstream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct OggProperties {
	pub(crate) duration: Duration,
	pub(crate) overall_bitrate: u32,
	pub(crate) audio_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
}

impl From<OggProperties> for FileProperties {
	fn from(input: OggProperties) -> Self {
		Self {
			duration: input.duration,
			overall_bitrate: Some(input.overall_bitrate),
			audio_bitrate: Some(input.audio_bitrate),
			sample_rate: Some(input.sample_rate),
			bit_depth: None,
			channels: Some(input.channels),
		}
	}
}

impl OggProperties {
	/// Duration of the audio
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Overall bitrate (kbps)
	pub fn overall_bitrate(&self) -> u32 {
		self.overall_bitrate
	}

	/// Audio bitrate (kbps)
	pub fn audio_bitrate(&self) -> u32 {
		self.audio_bitrate
	}

	/// Sample rate (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Channel count
	pub fn channels(&self) -> u8 {
		self.channels
	}
}

pub(crate) fn read_properties(
	format: OggFormat,
	identification_packet: &[u8],
	last_granule: u64,
	file_length: u64,
) -> Result<OggProperties> {
	match format {
		OggFormat::Vorbis => vorbis_properties(identification_packet, last_granule, file_length),
		OggFormat::Opus => opus_properties(identification_packet, last_granule, file_length),
		OggFormat::Speex => speex_properties(identification_packet, last_granule, file_length),
	}
}

fn with_duration(
	mut properties: OggProperties,
	total_samples: u64,
	decode_rate: u64,
	file_length: u64,
) -> OggProperties {
	if decode_rate > 0 && total_samples > 0 {
		let length = (total_samples * 1000) / decode_rate;
		properties.duration = Duration::from_millis(length);

		if length > 0 && file_length > 0 {
			properties.overall_bitrate = ((file_length * 8) / length) as u32;
		}
	}

	properties
}

fn vorbis_properties(
	identification_packet: &[u8],
	last_granule: u64,
	file_length: u64,
) -> Result<OggProperties> {
	// Past the 7 byte signature:
	// Version (4)
	// Channels (1)
	// Sample rate (4)
	// Maximum bitrate (4)
	// Nominal bitrate (4)
	// Minimum bitrate (4)
	let mut reader = &identification_packet[7..];

	let version = reader.read_u32::<LittleEndian>()?;
	if version != 0 {
		decode_err!(@BAIL Ogg, "Vorbis identification header has an invalid version");
	}

	let channels = reader.read_u8()?;
	let sample_rate = reader.read_u32::<LittleEndian>()?;
	reader.read_i32::<LittleEndian>()?;
	let bitrate_nominal = reader.read_i32::<LittleEndian>()?;

	let properties = OggProperties {
		audio_bitrate: (bitrate_nominal.max(0) as u32) / 1000,
		sample_rate,
		channels,
		..OggProperties::default()
	};

	Ok(with_duration(
		properties,
		last_granule,
		u64::from(sample_rate),
		file_length,
	))
}

fn opus_properties(
	identification_packet: &[u8],
	last_granule: u64,
	file_length: u64,
) -> Result<OggProperties> {
	// Past the 8 byte signature:
	// Version (1)
	// Channels (1)
	// Pre-skip (2)
	// Input sample rate (4)
	let mut reader = &identification_packet[8..];

	let version = reader.read_u8()?;
	if version != 1 {
		decode_err!(@BAIL Ogg, "Opus identification header has an invalid version");
	}

	let channels = reader.read_u8()?;
	let pre_skip = reader.read_u16::<LittleEndian>()?;
	let input_sample_rate = reader.read_u32::<LittleEndian>()?;

	let properties = OggProperties {
		sample_rate: input_sample_rate,
		channels,
		..OggProperties::default()
	};

	// Opus granule positions are always expressed in 48 kHz samples,
	// regardless of the input rate, and include the pre-skip
	let total_samples = last_granule.saturating_sub(u64::from(pre_skip));

	Ok(with_duration(properties, total_samples, 48000, file_length))
}

fn speex_properties(
	identification_packet: &[u8],
	last_granule: u64,
	file_length: u64,
) -> Result<OggProperties> {
	// Past the 8 byte signature:
	// Version string (20)
	// Version id (4)
	// Header size (4)
	// Sample rate (4)
	// Mode (4)
	// Mode bitstream version (4)
	// Channels (4)
	// Bitrate (4)
	let mut reader = std::io::Cursor::new(&identification_packet[8..]);
	reader.seek(SeekFrom::Current(20))?;

	let _version_id = reader.read_u32::<LittleEndian>()?;
	let _header_size = reader.read_u32::<LittleEndian>()?;
	let sample_rate = reader.read_u32::<LittleEndian>()?;
	reader.read_u32::<LittleEndian>()?;
	reader.read_u32::<LittleEndian>()?;
	let channels = reader.read_u32::<LittleEndian>()?;
	let bitrate = reader.read_i32::<LittleEndian>()?;

	let properties = OggProperties {
		audio_bitrate: (bitrate.max(0) as u32) / 1000,
		sample_rate,
		channels: channels as u8,
		..OggProperties::default()
	};

	Ok(with_duration(
		properties,
		last_granule,
		u64::from(sample_rate),
		file_length,
	))
}
