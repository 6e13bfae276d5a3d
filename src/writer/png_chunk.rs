//! PNG chunk framing, CRC32, and scanline filtering shared by the PNG8 and
//! APNG writers.
//!
//! Hand-rolled rather than built on the `png` crate: the writer only ever
//! needs to *emit* a small, fixed sequence of chunk types, so framing them
//! directly on `flate2` (DEFLATE) + `crc32fast` (chunk CRCs) is simpler
//! than pulling in a full decoder/encoder crate for the write-only half.

use std::io::{self, Write};

use crc32fast::Hasher as Crc32;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// The 8-byte PNG signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Write one length-prefixed, CRC-suffixed PNG chunk.
pub fn write_chunk<W: Write>(w: &mut W, chunk_type: &[u8; 4], data: &[u8]) -> io::Result<()> {
    w.write_all(&(data.len() as u32).to_be_bytes())?;
    w.write_all(chunk_type)?;
    w.write_all(data)?;

    let mut hasher = Crc32::new();
    hasher.update(chunk_type);
    hasher.update(data);
    w.write_all(&hasher.finalize().to_be_bytes())?;
    Ok(())
}

/// zlib-compress `data` at the given 0..=9 level (flate2 clamps out-of-
/// range values itself).
pub fn zlib_compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(data)?;
    encoder.finish()
}

const FILTER_NONE: u8 = 0;
const FILTER_SUB: u8 = 1;
const FILTER_UP: u8 = 2;
const FILTER_AVERAGE: u8 = 3;
const FILTER_PAETH: u8 = 4;

fn paeth_predictor(a: i16, b: i16, c: i16) -> u8 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

/// Filter a single scanline each of the 5 standard ways, returning the
/// lowest-total-absolute-value encoding (a common and cheap-enough
/// heuristic for picking a filter per row).
fn filter_row(raw: &[u8], prev: &[u8], bpp: usize) -> Vec<u8> {
    let width = raw.len();
    let mut candidates: Vec<(u8, Vec<u8>)> = Vec::with_capacity(5);

    let mut none_row = vec![FILTER_NONE];
    none_row.extend_from_slice(raw);
    candidates.push((FILTER_NONE, none_row));

    let mut sub_row = vec![FILTER_SUB];
    for i in 0..width {
        let a = if i >= bpp { raw[i - bpp] } else { 0 };
        sub_row.push(raw[i].wrapping_sub(a));
    }
    candidates.push((FILTER_SUB, sub_row));

    let mut up_row = vec![FILTER_UP];
    for i in 0..width {
        up_row.push(raw[i].wrapping_sub(prev[i]));
    }
    candidates.push((FILTER_UP, up_row));

    let mut avg_row = vec![FILTER_AVERAGE];
    for i in 0..width {
        let a = if i >= bpp { raw[i - bpp] as u16 } else { 0 };
        let b = prev[i] as u16;
        avg_row.push(raw[i].wrapping_sub(((a + b) / 2) as u8));
    }
    candidates.push((FILTER_AVERAGE, avg_row));

    let mut paeth_row = vec![FILTER_PAETH];
    for i in 0..width {
        let a = if i >= bpp { raw[i - bpp] as i16 } else { 0 };
        let b = prev[i] as i16;
        let c = if i >= bpp { prev[i - bpp] as i16 } else { 0 };
        paeth_row.push(raw[i].wrapping_sub(paeth_predictor(a, b, c)));
    }
    candidates.push((FILTER_PAETH, paeth_row));

    candidates
        .into_iter()
        .min_by_key(|(_, row)| row[1..].iter().map(|&b| (b as i16 - 128).unsigned_abs() as u32).sum::<u32>())
        .expect("five fixed candidates")
        .1
}

/// Apply per-row PNG filtering across an entire image: `raw` is
/// `height` scanlines of `width * bpp` bytes each, row-major and
/// unfiltered.
pub fn filter_scanlines(raw: &[u8], width: usize, height: usize, bpp: usize) -> Vec<u8> {
    let stride = width * bpp;
    let mut out = Vec::with_capacity(height * (stride + 1));
    let zero_row = vec![0u8; stride];

    for y in 0..height {
        let row = &raw[y * stride..(y + 1) * stride];
        let prev = if y == 0 {
            &zero_row[..]
        } else {
            &raw[(y - 1) * stride..y * stride]
        };
        out.extend_from_slice(&filter_row(row, prev, bpp));
    }

    out
}

/// Apply the Sub filter unconditionally to every scanline, skipping the
/// per-row min-sum-of-absolute-differences heuristic [`filter_scanlines`]
/// uses. The APNG (truecolor) writer always uses this: with 4 bytes per
/// pixel, Sub already captures most horizontal redundancy cheaply, and
/// not re-evaluating four other candidates per row keeps truecolor
/// frames (4x the bytes of an indexed one) fast to encode.
pub fn sub_filter_scanlines(raw: &[u8], width: usize, height: usize, bpp: usize) -> Vec<u8> {
    let stride = width * bpp;
    let mut out = Vec::with_capacity(height * (stride + 1));

    for y in 0..height {
        let row = &raw[y * stride..(y + 1) * stride];
        out.push(FILTER_SUB);
        for i in 0..stride {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            out.push(row[i].wrapping_sub(a));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_round_trips_length_and_type() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, b"IHDR", &[1, 2, 3, 4]).unwrap();
        assert_eq!(&buf[0..4], &4u32.to_be_bytes());
        assert_eq!(&buf[4..8], b"IHDR");
        assert_eq!(&buf[8..12], &[1, 2, 3, 4]);
    }

    #[test]
    fn chunk_crc_is_verifiable() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, b"tEST", &[9, 9, 9]).unwrap();
        let crc_bytes = &buf[buf.len() - 4..];
        let mut hasher = Crc32::new();
        hasher.update(b"tEST");
        hasher.update(&[9, 9, 9]);
        assert_eq!(crc_bytes, &hasher.finalize().to_be_bytes());
    }

    #[test]
    fn sub_filter_scanlines_always_tags_filter_byte_one() {
        let width = 2;
        let height = 2;
        let bpp = 4;
        let raw = vec![10u8, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160];
        let filtered = sub_filter_scanlines(&raw, width, height, bpp);
        assert_eq!(filtered.len(), height * (width * bpp + 1));
        assert_eq!(filtered[0], FILTER_SUB);
        assert_eq!(filtered[width * bpp + 1], FILTER_SUB);
        // First pixel of each row has nothing to its left: Sub is a no-op there.
        assert_eq!(&filtered[1..5], &raw[0..4]);
    }

    #[test]
    fn filter_scanlines_produces_filter_byte_plus_row_per_scanline() {
        let width = 3;
        let height = 2;
        let bpp = 1;
        let raw = vec![10u8, 20, 30, 40, 50, 60];
        let filtered = filter_scanlines(&raw, width, height, bpp);
        assert_eq!(filtered.len(), height * (width * bpp + 1));
    }

    #[test]
    fn zlib_round_trips_via_flate2_reader() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let data = b"hello palette world".to_vec();
        let compressed = zlib_compress(&data, 6).unwrap();
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
