//! Baseline PNG codec
//!
//! Only the subset the emblem sprites need is handled: 8-bit samples, color
//! types 0/2/4/6, no interlacing, and IDAT data that may be split across any
//! number of chunks. Encoding always produces 8-bit RGBA with store-mode
//! DEFLATE, so it never depends on a compressor.

pub mod checksum;
pub mod decode;
pub mod encode;

pub use decode::decode;
pub use encode::{encode, encode_rgba};

use thiserror::Error;

/// The fixed 8-byte PNG file signature
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Reasons a byte stream is rejected by the decoder (or a buffer by the encoder)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("not a PNG file (bad signature)")]
    BadSignature,

    #[error("no IHDR chunk before IEND")]
    MissingHeader,

    #[error("no IDAT chunk present")]
    MissingImageData,

    #[error("unsupported bit depth {0} (only 8 is supported)")]
    UnsupportedBitDepth(u8),

    #[error("unsupported color type {0}")]
    UnsupportedColorType(u8),

    #[error("interlaced images are not supported")]
    Interlaced,

    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("image dimensions {width}x{height} are too large")]
    TooLarge { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Color types accepted by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale,
    Rgb,
    GrayscaleAlpha,
    Rgba,
}

impl ColorType {
    pub fn from_code(code: u8) -> Result<Self, FormatError> {
        match code {
            0 => Ok(ColorType::Grayscale),
            2 => Ok(ColorType::Rgb),
            4 => Ok(ColorType::GrayscaleAlpha),
            6 => Ok(ColorType::Rgba),
            other => Err(FormatError::UnsupportedColorType(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ColorType::Grayscale => 0,
            ColorType::Rgb => 2,
            ColorType::GrayscaleAlpha => 4,
            ColorType::Rgba => 6,
        }
    }

    /// Bytes per pixel at 8-bit depth
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Grayscale => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }
}

/// Parsed IHDR fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
}

impl Header {
    pub const LEN: usize = 13;

    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < Self::LEN {
            return Err(FormatError::Truncated("IHDR chunk"));
        }
        Ok(Header {
            width: read_u32(data, 0),
            height: read_u32(data, 4),
            bit_depth: data[8],
            color_type: data[9],
            interlace: data[12],
        })
    }

    /// IHDR payload: dimensions, depth, color type, then compression/filter/interlace
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type;
        out[12] = self.interlace;
        out
    }
}

/// A chunk as it sits in the file, borrowing its payload
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
}

/// Walks the chunk stream after the signature.
///
/// CRCs are skipped, not verified. Iteration ends when fewer than eight bytes
/// remain; a payload running past the end of the buffer yields an error.
pub struct ChunkIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: SIGNATURE.len() }
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 8 > self.data.len() {
            return None;
        }

        let length = read_u32(self.data, self.pos) as usize;
        let kind = [
            self.data[self.pos + 4],
            self.data[self.pos + 5],
            self.data[self.pos + 6],
            self.data[self.pos + 7],
        ];

        let start = self.pos + 8;
        let end = match start.checked_add(length) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                self.pos = self.data.len();
                return Some(Err(FormatError::Truncated("chunk payload")));
            }
        };

        // skip the CRC trailer, tolerating a file cut off inside it
        self.pos = end.saturating_add(4).min(self.data.len());

        Some(Ok(Chunk { kind, data: &self.data[start..end] }))
    }
}

/// Append one serialized chunk: length, type, payload, CRC32(type + payload).
pub fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut crc = checksum::Crc32::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}
