//! Truecolor APNG writer: same chunk machinery as the PNG8 writer, but
//! color type 6 (8-bit RGBA, no palette) and Sub-only row filtering
//! (SPEC_FULL §4.6).

use std::io::Write;

use crate::error::EncodeError;
use crate::image::Frame;

use super::png8::FrameControl;
use super::png_chunk::{sub_filter_scanlines, write_chunk, zlib_compress, SIGNATURE};

const COLOR_TYPE_RGBA: u8 = 6;
const BYTES_PER_PIXEL: usize = 4;

/// Options controlling a truecolor APNG write.
#[derive(Debug, Clone)]
pub struct ApngOptions {
    pub compression_level: u32,
    pub frame_controls: Vec<FrameControl>,
}

impl Default for ApngOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            frame_controls: Vec::new(),
        }
    }
}

fn frame_rgba_bytes(frame: &Frame) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.width() * frame.height() * BYTES_PER_PIXEL);
    for i in 0..frame.pixels().len() {
        let (r, g, b, a) = frame.pixel_at(i);
        bytes.extend_from_slice(&[r, g, b, a]);
    }
    bytes
}

fn write_ihdr<W: Write>(w: &mut W, width: u32, height: u32) -> Result<(), EncodeError> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(8); // bit depth
    data.push(COLOR_TYPE_RGBA);
    data.push(0);
    data.push(0);
    data.push(0);
    write_chunk(w, b"IHDR", &data)?;
    Ok(())
}

fn write_idat<W: Write>(w: &mut W, frame: &Frame, level: u32) -> Result<(), EncodeError> {
    let raw = frame_rgba_bytes(frame);
    let filtered = sub_filter_scanlines(&raw, frame.width(), frame.height(), BYTES_PER_PIXEL);
    let compressed = zlib_compress(&filtered, level)?;
    write_chunk(w, b"IDAT", &compressed)?;
    Ok(())
}

fn write_fctl<W: Write>(
    w: &mut W,
    sequence_number: u32,
    frame: &Frame,
    control: &FrameControl,
) -> Result<(), EncodeError> {
    let mut data = Vec::with_capacity(26);
    data.extend_from_slice(&sequence_number.to_be_bytes());
    data.extend_from_slice(&(frame.width() as u32).to_be_bytes());
    data.extend_from_slice(&(frame.height() as u32).to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&control.delay_num.to_be_bytes());
    data.extend_from_slice(&control.delay_den.to_be_bytes());
    data.push(control.dispose_op);
    data.push(control.blend_op);
    write_chunk(w, b"fcTL", &data)?;
    Ok(())
}

fn write_fdat<W: Write>(w: &mut W, sequence_number: u32, frame: &Frame, level: u32) -> Result<(), EncodeError> {
    let raw = frame_rgba_bytes(frame);
    let filtered = sub_filter_scanlines(&raw, frame.width(), frame.height(), BYTES_PER_PIXEL);
    let compressed = zlib_compress(&filtered, level)?;
    let mut data = Vec::with_capacity(4 + compressed.len());
    data.extend_from_slice(&sequence_number.to_be_bytes());
    data.extend_from_slice(&compressed);
    write_chunk(w, b"fdAT", &data)?;
    Ok(())
}

/// Write a single- or multi-frame truecolor APNG. Skips the palette
/// engine entirely: every frame is written as full 8-bit RGBA.
pub fn write_apng<W: Write>(w: &mut W, frames: &[Frame], options: &ApngOptions) -> Result<(), EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::Sequence("no frames to encode".into()));
    }
    let (width, height) = (frames[0].width(), frames[0].height());
    if width == 0 || height == 0 {
        return Err(EncodeError::Sequence(format!("zero-size frame: {width}x{height}")));
    }
    for frame in frames {
        if frame.width() != width || frame.height() != height {
            return Err(EncodeError::Sequence(format!(
                "frame {}x{} does not match first frame {}x{}",
                frame.width(),
                frame.height(),
                width,
                height
            )));
        }
    }

    w.write_all(&SIGNATURE)?;
    write_ihdr(w, width as u32, height as u32)?;

    if frames.len() == 1 {
        write_idat(w, &frames[0], options.compression_level)?;
    } else {
        let mut data = Vec::with_capacity(8);
        data.extend_from_slice(&(frames.len() as u32).to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        write_chunk(w, b"acTL", &data)?;

        let mut seq = 0u32;
        for (i, frame) in frames.iter().enumerate() {
            let control = options.frame_controls.get(i).copied().unwrap_or_default();
            write_fctl(w, seq, frame, &control)?;
            seq += 1;
            if i == 0 {
                write_idat(w, frame, options.compression_level)?;
            } else {
                write_fdat(w, seq, frame, options.compression_level)?;
                seq += 1;
            }
        }
    }

    write_chunk(w, b"IEND", &[])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: usize, height: usize, rgba: [u8; 4]) -> Frame {
        let pixel = (rgba[0] as u32) << 24 | (rgba[1] as u32) << 16 | (rgba[2] as u32) << 8 | rgba[3] as u32;
        Frame::new(width, height, vec![pixel; width * height])
    }

    fn iter_chunks(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
        let mut pos = 8;
        std::iter::from_fn(move || {
            if pos + 8 > data.len() {
                return None;
            }
            let len = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
            let chunk_type: [u8; 4] = data[pos + 4..pos + 8].try_into().unwrap();
            let chunk_data = &data[pos + 8..pos + 8 + len];
            pos += 8 + len + 4;
            Some((chunk_type, chunk_data))
        })
    }

    fn count_chunk_type(data: &[u8], chunk_type: &[u8; 4]) -> usize {
        iter_chunks(data).filter(|(t, _)| t == chunk_type).count()
    }

    #[test]
    fn single_frame_has_color_type_six_and_no_palette_chunks() {
        let frame = solid_frame(2, 2, [10, 20, 30, 255]);
        let mut out = Vec::new();
        write_apng(&mut out, &[frame], &ApngOptions::default()).unwrap();

        assert_eq!(&out[0..8], &SIGNATURE);
        let (_, ihdr) = iter_chunks(&out).find(|(t, _)| t == b"IHDR").unwrap();
        assert_eq!(ihdr[9], COLOR_TYPE_RGBA);
        assert_eq!(count_chunk_type(&out, b"PLTE"), 0);
        assert_eq!(count_chunk_type(&out, b"acTL"), 0);
    }

    #[test]
    fn multi_frame_produces_actl_fctl_and_fdat() {
        let frames = vec![
            solid_frame(2, 2, [255, 0, 0, 255]),
            solid_frame(2, 2, [0, 255, 0, 255]),
        ];
        let mut out = Vec::new();
        write_apng(&mut out, &frames, &ApngOptions::default()).unwrap();

        assert_eq!(count_chunk_type(&out, b"acTL"), 1);
        assert_eq!(count_chunk_type(&out, b"fcTL"), 2);
        assert_eq!(count_chunk_type(&out, b"IDAT"), 1);
        assert_eq!(count_chunk_type(&out, b"fdAT"), 1);
    }

    #[test]
    fn idat_decompresses_to_four_bytes_per_pixel_plus_filter_byte() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let frame = solid_frame(3, 2, [1, 2, 3, 4]);
        let mut out = Vec::new();
        write_apng(&mut out, &[frame], &ApngOptions::default()).unwrap();

        let (_, idat) = iter_chunks(&out).find(|(t, _)| t == b"IDAT").unwrap();
        let mut decoder = ZlibDecoder::new(idat);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed.len(), 2 * (1 + 3 * 4));
    }

    #[test]
    fn rejects_zero_size_frame() {
        let frame = Frame::new(0, 0, vec![]);
        let mut out = Vec::new();
        let result = write_apng(&mut out, &[frame], &ApngOptions::default());
        assert!(matches!(result, Err(EncodeError::Sequence(_))));
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let frames = vec![solid_frame(2, 2, [0, 0, 0, 255]), solid_frame(3, 2, [0, 0, 0, 255])];
        let mut out = Vec::new();
        let result = write_apng(&mut out, &frames, &ApngOptions::default());
        assert!(matches!(result, Err(EncodeError::Sequence(_))));
    }
}
