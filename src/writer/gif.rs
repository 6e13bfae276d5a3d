//! GIF89a writer: LZW-compressed indexed frames, one shared global color
//! table or a local color table per frame (SPEC_FULL §4.4).

use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::EncodeError;
use crate::image::IndexedFrame;
use crate::palette::Palette;

const TRAILER: u8 = 0x3B;

/// GIF87a/89a frame disposal method, `fcTL`'s `dispose_op` counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified.
    None = 0,
    /// Leave the frame in place for the next one to draw over.
    DoNotDispose = 1,
    /// Restore to the background color before the next frame.
    RestoreBackground = 2,
    /// Restore to whatever was there before this frame.
    RestorePrevious = 3,
}

/// Whether every frame shares one global color table, or each frame
/// carries its own local color table (SPEC_FULL §9's `PaletteMode`).
pub enum PaletteMode<'a> {
    /// One color table shared by all frames, written once as the GCT.
    Global(&'a Palette),
    /// Each frame supplies its own palette, written as a per-frame LCT.
    PerFrame,
}

/// One frame's indices paired with the palette they were produced
/// against (needed even in [`PaletteMode::Global`] mode, to resolve the
/// transparent index).
pub struct GifFrame<'a> {
    pub indexed: &'a IndexedFrame,
    pub palette: &'a Palette,
}

/// Options controlling a GIF write.
#[derive(Debug, Clone)]
pub struct GifOptions {
    /// Frames per second; converted to a per-frame delay in centiseconds.
    pub fps: f32,
    /// Netscape loop extension count. `0` = infinite looping.
    pub repeat: u16,
    /// Whether per-frame analysis (when used upstream) should use the
    /// fast, coarse-bucketed analyzer. Carried here only for the
    /// pipeline to read back; the writer itself just emits whatever
    /// frames it's given.
    pub fast_analysis: bool,
    pub disposal: DisposalMethod,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            fps: 10.0,
            repeat: 0,
            fast_analysis: false,
            disposal: DisposalMethod::RestoreBackground,
        }
    }
}

/// Smallest `n` such that `2^n >= color_count`, minimum `1` (a GIF color
/// table always has at least 2 entries).
fn table_bit_depth(color_count: usize) -> u8 {
    let mut depth = 1u8;
    while (1usize << depth) < color_count {
        depth += 1;
    }
    depth
}

/// LZW requires a minimum code size of 2, even for 1- or 2-color images.
fn lzw_min_code_size(color_count: usize) -> u8 {
    table_bit_depth(color_count).max(2)
}

fn write_color_table<W: Write>(w: &mut W, palette: &Palette, depth: u8) -> io::Result<()> {
    let size = 1usize << depth;
    for i in 0..size {
        if i < palette.len() {
            let c = palette.color(i);
            w.write_all(&[c[0], c[1], c[2]])?;
        } else {
            w.write_all(&[0, 0, 0])?;
        }
    }
    Ok(())
}

struct BitWriter {
    bytes: Vec<u8>,
    accumulator: u32,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            accumulator: 0,
            bits: 0,
        }
    }

    fn write_code(&mut self, code: u16, width: u8) {
        self.accumulator |= (code as u32) << self.bits;
        self.bits += width as u32;
        while self.bits >= 8 {
            self.bytes.push((self.accumulator & 0xFF) as u8);
            self.accumulator >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push((self.accumulator & 0xFF) as u8);
        }
        self.bytes
    }
}

/// LZW-encode `indices` (palette bytes) with the GIF dialect: a `CLEAR`
/// code at the start (and whenever the 4096-entry table fills), codes
/// keyed by `(prefix_code, next_byte)`, and an `EOI` code at the end.
pub(crate) fn lzw_encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let clear_code: u16 = 1 << min_code_size;
    let end_code: u16 = clear_code + 1;
    let mut code_size = min_code_size + 1;
    let mut next_code = end_code + 1;
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut writer = BitWriter::new();

    writer.write_code(clear_code, code_size);

    if indices.is_empty() {
        writer.write_code(end_code, code_size);
        return writer.finish();
    }

    let mut prefix: u16 = indices[0] as u16;
    for &byte in &indices[1..] {
        if let Some(&code) = table.get(&(prefix, byte)) {
            prefix = code;
            continue;
        }

        writer.write_code(prefix, code_size);

        if next_code < 4096 {
            table.insert((prefix, byte), next_code);
            if next_code == (1u16 << code_size) && code_size < 12 {
                code_size += 1;
            }
            next_code += 1;
        } else {
            writer.write_code(clear_code, code_size);
            table.clear();
            code_size = min_code_size + 1;
            next_code = end_code + 1;
        }

        prefix = byte as u16;
    }
    writer.write_code(prefix, code_size);
    writer.write_code(end_code, code_size);

    writer.finish()
}

fn write_sub_blocks<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(255) {
        w.write_all(&[chunk.len() as u8])?;
        w.write_all(chunk)?;
    }
    w.write_all(&[0u8])?;
    Ok(())
}

fn write_graphic_control_extension<W: Write>(
    w: &mut W,
    delay_cs: u16,
    disposal: DisposalMethod,
    transparent_index: Option<u8>,
) -> io::Result<()> {
    w.write_all(&[0x21, 0xF9, 4])?;
    let transparent_flag = transparent_index.is_some() as u8;
    let packed = ((disposal as u8) << 2) | transparent_flag;
    w.write_all(&[packed])?;
    w.write_all(&delay_cs.to_le_bytes())?;
    w.write_all(&[transparent_index.unwrap_or(0)])?;
    w.write_all(&[0])?; // block terminator
    Ok(())
}

fn write_netscape_extension<W: Write>(w: &mut W, repeat: u16) -> io::Result<()> {
    w.write_all(&[0x21, 0xFF, 11])?;
    w.write_all(b"NETSCAPE2.0")?;
    w.write_all(&[3, 1])?;
    w.write_all(&repeat.to_le_bytes())?;
    w.write_all(&[0])?;
    Ok(())
}

fn write_image_data<W: Write>(w: &mut W, frame: &GifFrame, local_palette: Option<&Palette>) -> io::Result<()> {
    let min_code_size = lzw_min_code_size(local_palette.map_or(frame.palette.len(), |p| p.len()));
    w.write_all(&[min_code_size])?;
    let encoded = lzw_encode(frame.indexed.indices(), min_code_size);
    write_sub_blocks(w, &encoded)
}

/// Write a GIF89a animation (or still image, for a single frame).
pub fn write_gif<W: Write>(
    w: &mut W,
    frames: &[GifFrame],
    mode: PaletteMode,
    options: &GifOptions,
) -> Result<(), EncodeError> {
    if frames.is_empty() {
        return Err(EncodeError::Sequence("no frames to encode".into()));
    }
    let (width, height) = (frames[0].indexed.width(), frames[0].indexed.height());
    for frame in frames {
        if frame.indexed.width() != width || frame.indexed.height() != height {
            return Err(EncodeError::Sequence(format!(
                "frame {}x{} does not match first frame {}x{}",
                frame.indexed.width(),
                frame.indexed.height(),
                width,
                height
            )));
        }
    }
    if options.fps <= 0.0 {
        return Err(EncodeError::Sequence(format!("fps must be positive, got {}", options.fps)));
    }

    w.write_all(b"GIF89a")?;

    let global_depth = match &mode {
        PaletteMode::Global(palette) => table_bit_depth(palette.len()),
        PaletteMode::PerFrame => table_bit_depth(frames[0].palette.len()),
    };
    let has_gct = matches!(mode, PaletteMode::Global(_));

    let lsd_packed = (has_gct as u8) << 7 | (global_depth - 1) << 4 | (global_depth - 1);
    w.write_all(&(width as u16).to_le_bytes())?;
    w.write_all(&(height as u16).to_le_bytes())?;
    w.write_all(&[lsd_packed, 0, 0])?; // background index, pixel aspect ratio

    if let PaletteMode::Global(palette) = &mode {
        write_color_table(w, palette, global_depth)?;
    }

    write_netscape_extension(w, options.repeat)?;

    let delay_cs = (100.0 / options.fps).round() as u16;

    for frame in frames {
        let transparent_index = if frame.palette.has_transparency() { Some(0) } else { None };
        write_graphic_control_extension(w, delay_cs, options.disposal, transparent_index)?;

        let local = match mode {
            PaletteMode::PerFrame => Some(frame.palette),
            PaletteMode::Global(_) => None,
        };
        let local_flag = local.is_some() as u8;
        let local_depth = local.map(|p| table_bit_depth(p.len())).unwrap_or(0);
        let image_packed = (local_flag << 7) | if local.is_some() { local_depth - 1 } else { 0 };

        w.write_all(&[0x2C])?;
        w.write_all(&0u16.to_le_bytes())?; // left
        w.write_all(&0u16.to_le_bytes())?; // top
        w.write_all(&(width as u16).to_le_bytes())?;
        w.write_all(&(height as u16).to_le_bytes())?;
        w.write_all(&[image_packed])?;

        if let Some(local_palette) = local {
            write_color_table(w, local_palette, local_depth)?;
        }

        write_image_data(w, frame, local)?;
    }

    w.write_all(&[TRAILER])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_palette() -> Palette {
        Palette::exact(&[[0, 0, 0, 0], [0xFF, 0, 0, 255], [0, 0xFF, 0, 255]]).unwrap()
    }

    /// Minimal GIF LZW decoder, just enough to round-trip what
    /// [`lzw_encode`] produces, for the test suite to verify against.
    fn lzw_decode(data: &[u8], min_code_size: u8) -> Vec<u8> {
        let clear_code: u16 = 1 << min_code_size;
        let end_code: u16 = clear_code + 1;
        let mut code_size = min_code_size + 1;

        let mut bitpos = 0usize;
        let read_code = |bitpos: &mut usize, code_size: u8| -> u16 {
            let mut value = 0u32;
            for b in 0..code_size {
                let byte = data[(*bitpos + b as usize) / 8];
                let bit = (byte >> ((*bitpos + b as usize) % 8)) & 1;
                value |= (bit as u32) << b;
            }
            *bitpos += code_size as usize;
            value as u16
        };

        let mut table: Vec<Vec<u8>> = Vec::new();
        let reset_table = |table: &mut Vec<Vec<u8>>, min_code_size: u8| {
            table.clear();
            for i in 0..(1u16 << min_code_size) {
                table.push(vec![i as u8]);
            }
            table.push(Vec::new()); // clear
            table.push(Vec::new()); // end
        };
        reset_table(&mut table, min_code_size);

        let mut out = Vec::new();
        let mut prev: Option<Vec<u8>> = None;

        loop {
            let code = read_code(&mut bitpos, code_size);
            if code == clear_code {
                reset_table(&mut table, min_code_size);
                code_size = min_code_size + 1;
                prev = None;
                continue;
            }
            if code == end_code {
                break;
            }

            let entry = if (code as usize) < table.len() {
                table[code as usize].clone()
            } else if let Some(p) = &prev {
                let mut e = p.clone();
                e.push(p[0]);
                e
            } else {
                break;
            };

            out.extend_from_slice(&entry);

            if let Some(p) = prev {
                let mut new_entry = p;
                new_entry.push(entry[0]);
                table.push(new_entry);
                if table.len() == (1usize << code_size) && code_size < 12 {
                    code_size += 1;
                }
            }
            prev = Some(entry);
        }
        out
    }

    fn unpack_sub_blocks(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pos = 0;
        loop {
            let len = data[pos] as usize;
            pos += 1;
            if len == 0 {
                break;
            }
            out.extend_from_slice(&data[pos..pos + len]);
            pos += len;
        }
        out
    }

    #[test]
    fn lzw_round_trips_simple_indices() {
        let indices = [0u8, 0, 1, 1, 2, 0, 1, 2, 2, 2, 0, 1];
        let encoded = lzw_encode(&indices, 2);
        let decoded = lzw_decode(&encoded, 2);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn lzw_round_trips_long_repetitive_run() {
        let indices: Vec<u8> = (0..2000).map(|i| (i % 3) as u8).collect();
        let encoded = lzw_encode(&indices, 2);
        let decoded = lzw_decode(&encoded, 2);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn header_and_trailer_bytes() {
        let palette = global_palette();
        let frame = IndexedFrame::new(2, 2, vec![1, 2, 1, 2]);
        let gif_frame = GifFrame {
            indexed: &frame,
            palette: &palette,
        };
        let mut out = Vec::new();
        write_gif(&mut out, &[gif_frame], PaletteMode::Global(&palette), &GifOptions::default()).unwrap();

        assert_eq!(&out[0..6], b"GIF89a");
        assert_eq!(*out.last().unwrap(), TRAILER);
    }

    #[test]
    fn two_frame_animation_has_two_image_separators_and_netscape_block() {
        let palette = global_palette();
        let f1 = IndexedFrame::new(1, 1, vec![1]);
        let f2 = IndexedFrame::new(1, 1, vec![2]);
        let frames = vec![
            GifFrame { indexed: &f1, palette: &palette },
            GifFrame { indexed: &f2, palette: &palette },
        ];
        let options = GifOptions { fps: 2.0, repeat: 0, ..Default::default() };
        let mut out = Vec::new();
        write_gif(&mut out, &frames, PaletteMode::Global(&palette), &options).unwrap();

        let image_separators = out.iter().filter(|&&b| b == 0x2C).count();
        assert_eq!(image_separators, 2);
        assert!(out.windows(11).any(|w| w == b"NETSCAPE2.0"));
    }

    #[test]
    fn delay_matches_fps() {
        let palette = global_palette();
        let frame = IndexedFrame::new(1, 1, vec![1]);
        let gif_frame = GifFrame { indexed: &frame, palette: &palette };
        let options = GifOptions { fps: 2.0, ..Default::default() };
        let mut out = Vec::new();
        write_gif(&mut out, &[gif_frame], PaletteMode::Global(&palette), &options).unwrap();

        // Graphic Control Extension: 0x21 0xF9 0x04 <packed> <delay_lo> <delay_hi> ...
        let gce_pos = out.windows(2).position(|w| w == [0x21, 0xF9]).unwrap();
        let delay = u16::from_le_bytes([out[gce_pos + 4], out[gce_pos + 5]]);
        assert_eq!(delay, 50); // round(100 / 2)
    }

    #[test]
    fn per_frame_mode_emits_local_color_tables_and_no_gct_flag() {
        let p1 = global_palette();
        let p2 = Palette::exact(&[[0, 0, 0, 0], [0, 0, 0xFF, 255]]).unwrap();
        let f1 = IndexedFrame::new(1, 1, vec![1]);
        let f2 = IndexedFrame::new(1, 1, vec![1]);
        let frames = vec![
            GifFrame { indexed: &f1, palette: &p1 },
            GifFrame { indexed: &f2, palette: &p2 },
        ];
        let mut out = Vec::new();
        write_gif(&mut out, &frames, PaletteMode::PerFrame, &GifOptions::default()).unwrap();

        // LSD packed byte (byte 10): GCT flag must be 0.
        assert_eq!(out[10] & 0x80, 0);
        // Each image descriptor's packed byte (local color table flag) must be set.
        let image_descriptor_positions: Vec<usize> =
            out.iter().enumerate().filter(|&(_, &b)| b == 0x2C).map(|(i, _)| i).collect();
        assert_eq!(image_descriptor_positions.len(), 2);
        for pos in image_descriptor_positions {
            let packed = out[pos + 9];
            assert_eq!(packed & 0x80, 0x80);
        }
    }

    #[test]
    fn single_frame_image_data_round_trips_through_lzw_decode() {
        let palette = global_palette();
        let indices = vec![0u8, 1, 2, 1, 0, 2, 1, 1, 2, 0, 0, 1];
        let frame = IndexedFrame::new(4, 3, indices.clone());
        let gif_frame = GifFrame { indexed: &frame, palette: &palette };
        let mut out = Vec::new();
        write_gif(&mut out, &[gif_frame], PaletteMode::Global(&palette), &GifOptions::default()).unwrap();

        let image_sep = out.iter().position(|&b| b == 0x2C).unwrap();
        let min_code_size = out[image_sep + 10];
        let data_start = image_sep + 11;
        let packed_data = unpack_sub_blocks(&out[data_start..]);
        let decoded = lzw_decode(&packed_data, min_code_size);
        assert_eq!(decoded, indices);
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let palette = global_palette();
        let f1 = IndexedFrame::new(2, 2, vec![0, 0, 0, 0]);
        let f2 = IndexedFrame::new(3, 2, vec![0, 0, 0, 0, 0, 0]);
        let frames = vec![
            GifFrame { indexed: &f1, palette: &palette },
            GifFrame { indexed: &f2, palette: &palette },
        ];
        let mut out = Vec::new();
        let result = write_gif(&mut out, &frames, PaletteMode::Global(&palette), &GifOptions::default());
        assert!(matches!(result, Err(EncodeError::Sequence(_))));
    }

    #[test]
    fn rejects_empty_frames() {
        let palette = global_palette();
        let mut out = Vec::new();
        let result = write_gif(&mut out, &[], PaletteMode::Global(&palette), &GifOptions::default());
        assert!(matches!(result, Err(EncodeError::Sequence(_))));
    }
}
