// Codec identification signatures, found at the start of the first packet
// of a logical bitstream
pub(crate) const VORBIS_IDENT_HEAD: &[u8] = &[1, b'v', b'o', b'r', b'b', b'i', b's'];
pub(crate) const VORBIS_COMMENT_HEAD: &[u8] = &[3, b'v', b'o', b'r', b'b', b'i', b's'];

pub(crate) const OPUSHEAD: &[u8] = b"OpusHead";
pub(crate) const OPUSTAGS: &[u8] = b"OpusTags";

pub(crate) const SPEEXHEADER: &[u8] = b"Speex   ";
