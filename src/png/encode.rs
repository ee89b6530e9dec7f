//! PNG encoding with store-mode DEFLATE

use super::checksum::adler32;
use super::{write_chunk, ColorType, FormatError, Header, SIGNATURE};
use crate::rendering::Bitmap;

/// Largest payload a stored DEFLATE block can carry
const MAX_STORED_BLOCK: usize = 65535;

/// zlib CMF/FLG pair (deflate, 32K window, check bits valid)
const ZLIB_HEADER: [u8; 2] = [0x78, 0x01];

/// Encode a bitmap as an 8-bit RGBA PNG without filtering or compression.
pub fn encode(image: &Bitmap) -> Vec<u8> {
    let width = image.width() as usize;
    let row_len = width * 4;

    let mut scanlines = Vec::with_capacity(image.height() as usize * (row_len + 1));
    if row_len > 0 {
        for row in image.pixels().chunks_exact(row_len) {
            scanlines.push(0);
            scanlines.extend_from_slice(row);
        }
    } else {
        scanlines.resize(image.height() as usize, 0);
    }

    let header = Header {
        width: image.width(),
        height: image.height(),
        bit_depth: 8,
        color_type: ColorType::Rgba.code(),
        interlace: 0,
    };

    let idat = zlib_store(&scanlines);

    let mut out = Vec::with_capacity(SIGNATURE.len() + 12 * 3 + Header::LEN + idat.len());
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, b"IHDR", &header.to_bytes());
    write_chunk(&mut out, b"IDAT", &idat);
    write_chunk(&mut out, b"IEND", &[]);
    out
}

/// Encode a raw RGBA buffer, checking it holds exactly `width * height * 4` bytes.
pub fn encode_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, FormatError> {
    let image = Bitmap::new(width, height, rgba.to_vec())?;
    Ok(encode(&image))
}

/// Wrap `data` in a zlib container made of stored (uncompressed) blocks.
fn zlib_store(data: &[u8]) -> Vec<u8> {
    let blocks = data.len().div_ceil(MAX_STORED_BLOCK).max(1);
    let mut out = Vec::with_capacity(ZLIB_HEADER.len() + blocks * 5 + data.len() + 4);
    out.extend_from_slice(&ZLIB_HEADER);

    if data.is_empty() {
        write_stored_block(&mut out, &[], true);
    } else {
        let mut pieces = data.chunks(MAX_STORED_BLOCK).peekable();
        while let Some(piece) = pieces.next() {
            write_stored_block(&mut out, piece, pieces.peek().is_none());
        }
    }

    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

/// BFINAL|BTYPE=00 header byte, then LEN and NLEN little-endian, then the bytes.
fn write_stored_block(out: &mut Vec<u8>, piece: &[u8], last: bool) {
    let len = piece.len() as u16;
    out.push(u8::from(last));
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(piece);
}
