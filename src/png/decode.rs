//! PNG decoding into an RGBA [`Bitmap`]

use super::{ChunkIter, ColorType, FormatError, Header, SIGNATURE};
use crate::rendering::Bitmap;
use flate2::read::DeflateDecoder;
use std::io::Read;

/// zlib header bytes in front of the DEFLATE stream
const ZLIB_HEADER_LEN: usize = 2;
/// Adler-32 trailer after the DEFLATE stream
const ZLIB_TRAILER_LEN: usize = 4;

/// Decode a baseline PNG into a flat RGBA bitmap.
///
/// All IDAT payloads are concatenated before inflation; anything after the
/// first IEND is ignored and chunk CRCs are not checked.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, FormatError> {
    if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(FormatError::BadSignature);
    }

    let mut header: Option<Header> = None;
    let mut idat = Vec::new();
    let mut idat_chunks = 0usize;

    for chunk in ChunkIter::new(bytes) {
        let chunk = chunk?;
        match &chunk.kind {
            b"IHDR" => header = Some(Header::parse(chunk.data)?),
            b"IDAT" => {
                idat.extend_from_slice(chunk.data);
                idat_chunks += 1;
            }
            b"IEND" => break,
            _ => {}
        }
    }

    let header = match header {
        Some(h) if h.width > 0 && h.height > 0 => h,
        _ => return Err(FormatError::MissingHeader),
    };
    if idat_chunks == 0 {
        return Err(FormatError::MissingImageData);
    }
    if header.bit_depth != 8 {
        return Err(FormatError::UnsupportedBitDepth(header.bit_depth));
    }
    if header.interlace != 0 {
        return Err(FormatError::Interlaced);
    }
    let color_type = ColorType::from_code(header.color_type)?;

    let width = header.width as usize;
    let height = header.height as usize;
    let bpp = color_type.bytes_per_pixel();
    let too_large = FormatError::TooLarge { width: header.width, height: header.height };
    let stride = width.checked_mul(bpp).ok_or_else(|| too_large.clone())?;
    let needed = stride
        .checked_add(1)
        .and_then(|row| row.checked_mul(height))
        .filter(|_| width.checked_mul(height).and_then(|n| n.checked_mul(4)).is_some())
        .ok_or(too_large)?;

    let raw = inflate(&idat)?;
    if raw.len() < needed {
        return Err(FormatError::Truncated("image data"));
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    let mut prev = vec![0u8; stride];
    let mut cur = vec![0u8; stride];

    for row in raw.chunks_exact(stride + 1).take(height) {
        let filter = row[0];
        cur.copy_from_slice(&row[1..]);
        unfilter(filter, bpp, &mut cur, &prev);
        expand_row(color_type, &cur, &mut pixels);
        std::mem::swap(&mut cur, &mut prev);
    }

    Bitmap::new(header.width, header.height, pixels)
}

/// Strip the zlib wrapper and run a raw DEFLATE decoder over the rest.
fn inflate(idat: &[u8]) -> Result<Vec<u8>, FormatError> {
    if idat.len() < ZLIB_HEADER_LEN + ZLIB_TRAILER_LEN {
        return Err(FormatError::Truncated("zlib stream"));
    }
    let body = &idat[ZLIB_HEADER_LEN..idat.len() - ZLIB_TRAILER_LEN];

    let mut out = Vec::new();
    DeflateDecoder::new(body)
        .read_to_end(&mut out)
        .map_err(|e| FormatError::Inflate(e.to_string()))?;
    Ok(out)
}

/// Reverse one scanline's filter in place.
///
/// `a` is the byte `bpp` to the left in this row, `b` the byte above and `c`
/// the byte above-left. Unknown filter types leave the row untouched.
fn unfilter(filter: u8, bpp: usize, cur: &mut [u8], prev: &[u8]) {
    match filter {
        1 => {
            for x in bpp..cur.len() {
                cur[x] = cur[x].wrapping_add(cur[x - bpp]);
            }
        }
        2 => {
            for x in 0..cur.len() {
                cur[x] = cur[x].wrapping_add(prev[x]);
            }
        }
        3 => {
            for x in 0..cur.len() {
                let a = if x >= bpp { cur[x - bpp] as u16 } else { 0 };
                let b = prev[x] as u16;
                cur[x] = cur[x].wrapping_add(((a + b) / 2) as u8);
            }
        }
        4 => {
            for x in 0..cur.len() {
                let (a, c) = if x >= bpp { (cur[x - bpp], prev[x - bpp]) } else { (0, 0) };
                cur[x] = cur[x].wrapping_add(paeth(a, prev[x], c));
            }
        }
        _ => {}
    }
}

/// Paeth predictor: ties go to `a`, then `b`.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a16, b16, c16) = (a as i16, b as i16, c as i16);
    let p = a16 + b16 - c16;
    let pa = (p - a16).abs();
    let pb = (p - b16).abs();
    let pc = (p - c16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn expand_row(color_type: ColorType, row: &[u8], out: &mut Vec<u8>) {
    match color_type {
        ColorType::Rgba => out.extend_from_slice(row),
        ColorType::Rgb => {
            for px in row.chunks_exact(3) {
                out.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        ColorType::Grayscale => {
            for &v in row {
                out.extend_from_slice(&[v, v, v, 255]);
            }
        }
        ColorType::GrayscaleAlpha => {
            for px in row.chunks_exact(2) {
                out.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::write_chunk;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Build a PNG from already-filtered scanlines (each starting with its filter byte).
    fn png_from_scanlines(width: u32, height: u32, color_type: u8, scanlines: &[u8], idat_splits: usize) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(scanlines).unwrap();
        let compressed = enc.finish().unwrap();

        let header = Header { width, height, bit_depth: 8, color_type, interlace: 0 };
        let mut file = SIGNATURE.to_vec();
        write_chunk(&mut file, b"IHDR", &header.to_bytes());
        let part = compressed.len().div_ceil(idat_splits.max(1)).max(1);
        for piece in compressed.chunks(part) {
            write_chunk(&mut file, b"IDAT", piece);
        }
        write_chunk(&mut file, b"IEND", &[]);
        file
    }

    fn gray(img: &Bitmap) -> Vec<u8> {
        img.pixels().chunks_exact(4).map(|p| p[0]).collect()
    }

    #[test]
    fn paeth_tie_breaking() {
        assert_eq!(paeth(0, 100, 0), 100);
        assert_eq!(paeth(101, 50, 100), 50);
        // all equal distances -> a
        assert_eq!(paeth(10, 10, 10), 10);
        assert_eq!(paeth(0, 0, 0), 0);
    }

    #[test]
    fn sub_and_up_filters() {
        // row0 Sub [10, 5] -> [10, 15]; row1 Up [1, 2] -> [11, 17]
        let png = png_from_scanlines(2, 2, 0, &[1, 10, 5, 2, 1, 2], 1);
        let img = decode(&png).unwrap();
        assert_eq!(gray(&img), vec![10, 15, 11, 17]);
        assert!(img.pixels().chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn average_filter() {
        // row1 x0: 10 + (0+100)/2 = 60; x1: 20 + (60+50)/2 = 75
        let png = png_from_scanlines(2, 2, 0, &[0, 100, 50, 3, 10, 20], 1);
        assert_eq!(gray(&decode(&png).unwrap()), vec![100, 50, 60, 75]);
    }

    #[test]
    fn paeth_filter() {
        // row1 x0: a=0 b=100 c=0 -> 100, 1+100; x1: a=101 b=50 c=100 -> 50, 2+50
        let png = png_from_scanlines(2, 2, 0, &[0, 100, 50, 4, 1, 2], 1);
        assert_eq!(gray(&decode(&png).unwrap()), vec![100, 50, 101, 52]);
    }

    #[test]
    fn sub_filter_wraps_and_uses_pixel_stride() {
        let png = png_from_scanlines(2, 1, 0, &[1, 200, 100], 1);
        assert_eq!(gray(&decode(&png).unwrap()), vec![200, 44]);

        let png = png_from_scanlines(2, 1, 2, &[1, 1, 2, 3, 10, 20, 30], 1);
        let img = decode(&png).unwrap();
        assert_eq!(img.pixels(), &[1u8, 2, 3, 255, 11, 22, 33, 255]);
    }

    #[test]
    fn unknown_filter_is_treated_as_none() {
        let png = png_from_scanlines(2, 1, 0, &[7, 9, 8], 1);
        assert_eq!(gray(&decode(&png).unwrap()), vec![9, 8]);
    }

    #[test]
    fn grayscale_alpha_and_rgba_expansion() {
        let png = png_from_scanlines(2, 1, 4, &[0, 40, 128, 90, 0], 1);
        assert_eq!(decode(&png).unwrap().pixels(), &[40u8, 40, 40, 128, 90, 90, 90, 0]);

        let png = png_from_scanlines(1, 1, 6, &[0, 1, 2, 3, 4], 1);
        assert_eq!(decode(&png).unwrap().pixels(), &[1u8, 2, 3, 4]);
    }

    #[test]
    fn idat_split_across_chunks() {
        let mut scan = Vec::new();
        for y in 0..8u8 {
            scan.push(0);
            for x in 0..8u8 {
                scan.extend_from_slice(&[x * 30, y * 30, x ^ y, 255]);
            }
        }
        let one = decode(&png_from_scanlines(8, 8, 6, &scan, 1)).unwrap();
        let many = decode(&png_from_scanlines(8, 8, 6, &scan, 5)).unwrap();
        assert_eq!(one, many);
        assert_eq!(&one.pixels()[4..8], &[30u8, 0, 1, 255]);
    }

    #[test]
    fn data_after_iend_is_ignored() {
        let mut png = png_from_scanlines(1, 1, 0, &[0, 77], 1);
        png.extend_from_slice(b"trailing garbage that is not a chunk");
        assert_eq!(gray(&decode(&png).unwrap()), vec![77]);
    }

    #[test]
    fn rejects_bad_signature() {
        assert_eq!(decode(b"GIF89a...."), Err(FormatError::BadSignature));
        assert_eq!(decode(&[]), Err(FormatError::BadSignature));
    }

    #[test]
    fn rejects_missing_header_and_data() {
        let mut only_end = SIGNATURE.to_vec();
        write_chunk(&mut only_end, b"IEND", &[]);
        assert_eq!(decode(&only_end), Err(FormatError::MissingHeader));

        let header = Header { width: 1, height: 1, bit_depth: 8, color_type: 6, interlace: 0 };
        let mut no_idat = SIGNATURE.to_vec();
        write_chunk(&mut no_idat, b"IHDR", &header.to_bytes());
        write_chunk(&mut no_idat, b"IEND", &[]);
        assert_eq!(decode(&no_idat), Err(FormatError::MissingImageData));
    }

    #[test]
    fn rejects_unsupported_formats() {
        let png = png_from_scanlines(1, 1, 3, &[0, 0], 1);
        assert_eq!(decode(&png), Err(FormatError::UnsupportedColorType(3)));
    }

    fn stored_zlib(data: &[u8]) -> Vec<u8> {
        let mut z = vec![0x78, 0x01, 1];
        z.extend_from_slice(&(data.len() as u16).to_le_bytes());
        z.extend_from_slice(&(!(data.len() as u16)).to_le_bytes());
        z.extend_from_slice(data);
        z.extend_from_slice(&crate::png::checksum::adler32(data).to_be_bytes());
        z
    }

    #[test]
    fn rejects_dimensions_that_overflow() {
        for (width, height) in [(u32::MAX, u32::MAX), (u32::MAX, 1), (1 << 30, 1 << 30)] {
            let header = Header { width, height, bit_depth: 8, color_type: 6, interlace: 0 };
            let mut file = SIGNATURE.to_vec();
            write_chunk(&mut file, b"IHDR", &header.to_bytes());
            write_chunk(&mut file, b"IDAT", &stored_zlib(&[0]));
            write_chunk(&mut file, b"IEND", &[]);

            let result = std::panic::catch_unwind(|| decode(&file)).expect("decode must not panic");
            match result {
                Err(FormatError::TooLarge { .. }) | Err(FormatError::Truncated("image data")) => {}
                other => panic!("{}x{}: unexpected {:?}", width, height, other),
            }
        }
    }

    #[test]
    fn chunk_crcs_are_not_verified() {
        let image = Bitmap::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let mut png = crate::png::encode(&image);
        // last byte of the IHDR CRC: signature (8) + length/type (8) + payload (13) + CRC (4)
        png[8 + 8 + 13 + 3] ^= 0xFF;
        // last byte of the IDAT CRC, just before the 12-byte IEND chunk
        let idat_crc = png.len() - 12 - 1;
        png[idat_crc] ^= 0xFF;
        // last byte of the IEND CRC
        let last = png.len() - 1;
        png[last] ^= 0xFF;
        assert_eq!(decode(&png).unwrap(), image);
    }

    #[test]
    fn rejects_short_pixel_data() {
        // claims 2 rows, carries 1
        let png = png_from_scanlines(1, 2, 0, &[0, 5], 1);
        assert_eq!(decode(&png), Err(FormatError::Truncated("image data")));
    }
}
