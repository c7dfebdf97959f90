use crate::error::Result;
use crate::macros::decode_err;
use crate::properties::FileProperties;

use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

/// A WAV file's audio properties
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct WavProperties {
	pub(crate) format_tag: u16,
	pub(crate) channels: u16,
	pub(crate) sample_rate: u32,
	pub(crate) bit_depth: u16,
	pub(crate) duration: Duration,
	pub(crate) audio_bitrate: u32,
	pub(crate) overall_bitrate: u32,
}

impl From<WavProperties> for FileProperties {
	fn from(input: WavProperties) -> Self {
		Self {
			duration: input.duration,
			overall_bitrate: Some(input.overall_bitrate),
			audio_bitrate: Some(input.audio_bitrate),
			sample_rate: Some(input.sample_rate),
			bit_depth: Some(input.bit_depth as u8),
			channels: Some(input.channels as u8),
		}
	}
}

impl WavProperties {
	/// The format tag from the `fmt ` chunk (1 = PCM)
	pub fn format_tag(&self) -> u16 {
		self.format_tag
	}

	/// Channel count
	pub fn channels(&self) -> u16 {
		self.channels
	}

	/// Sample rate (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Bits per sample
	pub fn bit_depth(&self) -> u16 {
		self.bit_depth
	}

	/// Duration of the audio
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Audio bitrate (kbps)
	pub fn audio_bitrate(&self) -> u32 {
		self.audio_bitrate
	}

	/// Overall bitrate (kbps)
	pub fn overall_bitrate(&self) -> u32 {
		self.overall_bitrate
	}
}

/// An AVI file's properties
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct AviProperties {
	pub(crate) duration: Duration,
	pub(crate) width: u32,
	pub(crate) height: u32,
	pub(crate) total_frames: u32,
	pub(crate) stream_count: u32,
}

impl From<AviProperties> for FileProperties {
	fn from(input: AviProperties) -> Self {
		Self {
			duration: input.duration,
			..FileProperties::default()
		}
	}
}

impl AviProperties {
	/// Duration of the video
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Video frame width in pixels
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Video frame height in pixels
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Total number of video frames
	pub fn total_frames(&self) -> u32 {
		self.total_frames
	}

	/// Number of streams in the file
	pub fn stream_count(&self) -> u32 {
		self.stream_count
	}
}

/// Properties of either RIFF form
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RiffProperties {
	/// WAV audio properties
	Wav(WavProperties),
	/// AVI properties
	Avi(AviProperties),
}

impl RiffProperties {
	/// Duration of the media
	pub fn duration(&self) -> Duration {
		match self {
			RiffProperties::Wav(properties) => properties.duration(),
			RiffProperties::Avi(properties) => properties.duration(),
		}
	}
}

impl From<RiffProperties> for FileProperties {
	fn from(input: RiffProperties) -> Self {
		match input {
			RiffProperties::Wav(properties) => properties.into(),
			RiffProperties::Avi(properties) => properties.into(),
		}
	}
}

impl Default for RiffProperties {
	fn default() -> Self {
		RiffProperties::Wav(WavProperties::default())
	}
}

pub(super) fn read_wav_properties(
	fmt: &[u8],
	total_samples: u32,
	stream_len: u32,
	file_length: u64,
) -> Result<WavProperties> {
	if fmt.len() < 16 {
		decode_err!(@BAIL Wav, "File has an invalid \"fmt \" chunk (< 16 bytes)");
	}

	let mut reader = fmt;

	let format_tag = reader.read_u16::<LittleEndian>()?;
	let channels = reader.read_u16::<LittleEndian>()?;
	let sample_rate = reader.read_u32::<LittleEndian>()?;
	let avg_bytes_per_sec = reader.read_u32::<LittleEndian>()?;
	let _block_align = reader.read_u16::<LittleEndian>()?;
	let bit_depth = reader.read_u16::<LittleEndian>()?;

	if channels == 0 {
		decode_err!(@BAIL Wav, "File contains 0 channels");
	}

	let bytes_per_sample = u32::from(channels) * u32::from(bit_depth).div_ceil(8);

	let mut properties = WavProperties {
		format_tag,
		channels,
		sample_rate,
		bit_depth,
		..WavProperties::default()
	};

	// Prefer the `fact` chunk's sample count, fall back to the `data`
	// chunk length for PCM
	let length_ms = if total_samples > 0 && sample_rate > 0 {
		(u64::from(total_samples) * 1000) / u64::from(sample_rate)
	} else if bytes_per_sample > 0 && sample_rate > 0 {
		let frames = u64::from(stream_len) / u64::from(bytes_per_sample);
		(frames * 1000) / u64::from(sample_rate)
	} else if avg_bytes_per_sec > 0 {
		(u64::from(stream_len) * 1000) / u64::from(avg_bytes_per_sec)
	} else {
		0
	};

	if length_ms > 0 {
		properties.duration = Duration::from_millis(length_ms);
		properties.audio_bitrate = ((u64::from(stream_len) * 8) / length_ms) as u32;
		properties.overall_bitrate = ((file_length * 8) / length_ms) as u32;
	}

	Ok(properties)
}

pub(super) fn read_avi_properties(avih: &[u8]) -> Result<AviProperties> {
	if avih.len() < 40 {
		decode_err!(@BAIL Avi, "File has an invalid \"avih\" chunk (< 40 bytes)");
	}

	let mut reader = avih;

	let micro_sec_per_frame = reader.read_u32::<LittleEndian>()?;
	let _max_bytes_per_sec = reader.read_u32::<LittleEndian>()?;
	let _padding_granularity = reader.read_u32::<LittleEndian>()?;
	let _flags = reader.read_u32::<LittleEndian>()?;
	let total_frames = reader.read_u32::<LittleEndian>()?;
	let _initial_frames = reader.read_u32::<LittleEndian>()?;
	let stream_count = reader.read_u32::<LittleEndian>()?;
	let _suggested_buffer_size = reader.read_u32::<LittleEndian>()?;
	let width = reader.read_u32::<LittleEndian>()?;
	let height = reader.read_u32::<LittleEndian>()?;

	let duration_micros = u64::from(micro_sec_per_frame) * u64::from(total_frames);

	Ok(AviProperties {
		duration: Duration::from_micros(duration_micros),
		width,
		height,
		total_frames,
		stream_count,
	})
}
