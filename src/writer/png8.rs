//! PNG8 writer: palette-indexed PNG, with optional animation via
//! `acTL`/`fcTL`/`fdAT` (SPEC_FULL §4.5).

use std::io::Write;

use crate::error::EncodeError;
use crate::image::IndexedFrame;
use crate::palette::Palette;

use super::png_chunk::{filter_scanlines, write_chunk, zlib_compress, SIGNATURE};

const COLOR_TYPE_INDEXED: u8 = 3;

/// Per-frame timing and disposal, mirroring `fcTL`'s fields.
#[derive(Debug, Clone, Copy)]
pub struct FrameControl {
    /// Delay numerator/denominator in seconds, e.g. `(1, 30)` for 1/30s.
    pub delay_num: u16,
    pub delay_den: u16,
    /// `fcTL` `dispose_op`: 0 = none, 1 = background, 2 = previous.
    pub dispose_op: u8,
    /// `fcTL` `blend_op`: 0 = source, 1 = over.
    pub blend_op: u8,
}

impl Default for FrameControl {
    fn default() -> Self {
        Self {
            delay_num: 1,
            delay_den: 10,
            dispose_op: 0,
            blend_op: 0,
        }
    }
}

/// Options controlling a PNG8 write.
#[derive(Debug, Clone)]
pub struct Png8Options {
    pub compression_level: u32,
    pub frame_controls: Vec<FrameControl>,
}

impl Default for Png8Options {
    fn default() -> Self {
        Self {
            compression_level: 6,
            frame_controls: Vec::new(),
        }
    }
}

fn write_ihdr<W: Write>(w: &mut W, width: u32, height: u32) -> Result<(), EncodeError> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(8); // bit depth
    data.push(COLOR_TYPE_INDEXED);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    write_chunk(w, b"IHDR", &data)?;
    Ok(())
}

fn write_plte_and_trns<W: Write>(w: &mut W, palette: &Palette) -> Result<(), EncodeError> {
    let mut plte = Vec::with_capacity(palette.len() * 3);
    for i in 0..palette.len() {
        let c = palette.color(i);
        plte.extend_from_slice(&[c[0], c[1], c[2]]);
    }
    write_chunk(w, b"PLTE", &plte)?;

    if palette.has_transparency() {
        write_chunk(w, b"tRNS", &[0u8])?;
    }
    Ok(())
}

fn write_idat<W: Write>(w: &mut W, frame: &IndexedFrame, level: u32) -> Result<(), EncodeError> {
    let filtered = filter_scanlines(frame.indices(), frame.width(), frame.height(), 1);
    let compressed = zlib_compress(&filtered, level)?;
    write_chunk(w, b"IDAT", &compressed)?;
    Ok(())
}

fn write_fctl<W: Write>(
    w: &mut W,
    sequence_number: u32,
    frame: &IndexedFrame,
    control: &FrameControl,
) -> Result<(), EncodeError> {
    let mut data = Vec::with_capacity(26);
    data.extend_from_slice(&sequence_number.to_be_bytes());
    data.extend_from_slice(&(frame.width() as u32).to_be_bytes());
    data.extend_from_slice(&(frame.height() as u32).to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes()); // x_offset
    data.extend_from_slice(&0u32.to_be_bytes()); // y_offset
    data.extend_from_slice(&control.delay_num.to_be_bytes());
    data.extend_from_slice(&control.delay_den.to_be_bytes());
    data.push(control.dispose_op);
    data.push(control.blend_op);
    write_chunk(w, b"fcTL", &data)?;
    Ok(())
}

fn write_fdat<W: Write>(
    w: &mut W,
    sequence_number: u32,
    frame: &IndexedFrame,
    level: u32,
) -> Result<(), EncodeError> {
    let filtered = filter_scanlines(frame.indices(), frame.width(), frame.height(), 1);
    let compressed = zlib_compress(&filtered, level)?;
    let mut data = Vec::with_capacity(4 + compressed.len());
    data.extend_from_slice(&sequence_number.to_be_bytes());
    data.extend_from_slice(&compressed);
    write_chunk(w, b"fdAT", &data)?;
    Ok(())
}

/// Write a single- or multi-frame PNG8. A single frame produces a plain
/// static PNG (no `acTL`); more than one frame produces an
/// animated-indexed PNG using the `acTL`/`fcTL`/`fdAT` extension.
pub fn write_png8<W: Write>(
    w: &mut W,
    palette: &Palette,
    frames: &[IndexedFrame],
    options: &Png8Options,
) -> Result<(), EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::Sequence("no frames to encode".into()));
    }
    let (width, height) = (frames[0].width(), frames[0].height());
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
    write_plte_and_trns(w, palette)?;

    if frames.len() == 1 {
        write_idat(w, &frames[0], options.compression_level)?;
    } else {
        let mut data = Vec::with_capacity(8);
        data.extend_from_slice(&(frames.len() as u32).to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // num_plays: 0 = infinite
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

    fn bw_palette() -> Palette {
        Palette::exact(&[[0, 0, 0, 0], [0x80, 0x80, 0x80, 255]]).unwrap()
    }

    #[test]
    fn single_frame_produces_one_idat_and_no_actl() {
        let palette = bw_palette();
        let frame = IndexedFrame::new(3, 3, vec![0, 1, 1, 1, 0, 1, 1, 1, 0]);
        let mut out = Vec::new();
        write_png8(&mut out, &palette, &[frame], &Png8Options::default()).unwrap();

        assert_eq!(&out[0..8], &SIGNATURE);
        assert!(!contains_chunk_type(&out, b"acTL"));
        assert_eq!(count_chunk_type(&out, b"IDAT"), 1);
        assert_eq!(count_chunk_type(&out, b"tRNS"), 1);
    }

    #[test]
    fn multi_frame_produces_actl_and_fdat() {
        let palette = bw_palette();
        let frames = vec![
            IndexedFrame::new(2, 2, vec![0, 1, 1, 0]),
            IndexedFrame::new(2, 2, vec![1, 0, 0, 1]),
        ];
        let mut out = Vec::new();
        write_png8(&mut out, &palette, &frames, &Png8Options::default()).unwrap();

        assert!(contains_chunk_type(&out, b"acTL"));
        assert_eq!(count_chunk_type(&out, b"fcTL"), 2);
        assert_eq!(count_chunk_type(&out, b"IDAT"), 1);
        assert_eq!(count_chunk_type(&out, b"fdAT"), 1);
    }

    #[test]
    fn mismatched_frame_dimensions_error() {
        let palette = bw_palette();
        let frames = vec![
            IndexedFrame::new(2, 2, vec![0, 1, 1, 0]),
            IndexedFrame::new(3, 2, vec![0, 1, 1, 0, 1, 0]),
        ];
        let mut out = Vec::new();
        let result = write_png8(&mut out, &palette, &frames, &Png8Options::default());
        assert!(matches!(result, Err(EncodeError::Sequence(_))));
    }

    #[test]
    fn idat_decompresses_to_filtered_rows() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let palette = Palette::exact(&[[0, 0, 0, 0], [0x80, 0x80, 0x80, 255]]).unwrap();
        let frame = IndexedFrame::new(3, 3, vec![1, 1, 1, 1, 1, 1, 1, 1, 1]);
        let mut out = Vec::new();
        write_png8(&mut out, &palette, &[frame], &Png8Options::default()).unwrap();

        let idat = extract_chunk_data(&out, b"IDAT");
        let mut decoder = ZlibDecoder::new(&idat[..]);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        // 3 rows, each 1 filter byte + 3 index bytes
        assert_eq!(decompressed.len(), 3 * (1 + 3));
    }

    fn count_chunk_type(data: &[u8], chunk_type: &[u8; 4]) -> usize {
        iter_chunks(data).filter(|(t, _)| t == chunk_type).count()
    }

    fn contains_chunk_type(data: &[u8], chunk_type: &[u8; 4]) -> bool {
        count_chunk_type(data, chunk_type) > 0
    }

    fn extract_chunk_data(data: &[u8], chunk_type: &[u8; 4]) -> Vec<u8> {
        iter_chunks(data)
            .find(|(t, _)| t == chunk_type)
            .map(|(_, d)| d.to_vec())
            .unwrap()
    }

    fn iter_chunks(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
        let mut pos = 8; // skip signature
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
}
