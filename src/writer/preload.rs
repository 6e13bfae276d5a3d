//! Preload palette file format (SPEC_FULL §10): 256×4 RGBA bytes followed
//! by the 32768-byte RGB555 mapping table, letting a caller persist a
//! [`Palette`] and reload it without re-running analysis.

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::error::EncodeError;
use crate::palette::{Palette, MAPPING_SIZE, MAX_COLORS};

const FILE_SIZE: usize = MAX_COLORS * 4 + MAPPING_SIZE;

/// Write `palette` as a preload file: 256 RGBA entries (padded with zero
/// past `palette.len()`), then the full 32768-byte mapping table.
pub fn write_preload_file<W: Write>(w: &mut W, palette: &Palette) -> Result<(), EncodeError> {
    let mut colors = [0u8; MAX_COLORS * 4];
    for (i, chunk) in colors.chunks_exact_mut(4).enumerate() {
        if i < palette.len() {
            chunk.copy_from_slice(&palette.color(i));
        }
    }
    w.write_all(&colors)?;
    w.write_all(palette.mapping_table().as_slice())?;
    Ok(())
}

/// Read a preload file written by [`write_preload_file`] back into a
/// [`Palette`], using the stored mapping table directly rather than
/// recomputing it.
///
/// `color_count` is the number of leading entries in the 256-slot color
/// block that are actually in use (the file itself does not record this,
/// since every slot past it is zero-padded anyway); callers that wrote
/// the file know this value already.
pub fn load_preload_file<R: Read>(r: &mut R, color_count: usize) -> Result<Palette, EncodeError> {
    if color_count == 0 || color_count > MAX_COLORS {
        return Err(EncodeError::Sequence(format!(
            "color_count {color_count} out of range 1..={MAX_COLORS}"
        )));
    }

    let mut buf = vec![0u8; FILE_SIZE];
    r.read_exact(&mut buf).map_err(io_to_encode_error)?;

    let colors: Vec<[u8; 4]> = buf[..MAX_COLORS * 4][..color_count * 4]
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();

    let mut mapping = [0u8; MAPPING_SIZE];
    mapping.copy_from_slice(&buf[MAX_COLORS * 4..]);

    Ok(Palette::from_raw_parts(colors, Arc::new(mapping))?)
}

fn io_to_encode_error(e: io::Error) -> EncodeError {
    EncodeError::Io(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_palette() {
        let palette = Palette::exact(&[[0, 0, 0, 0], [255, 0, 0, 255], [0, 255, 0, 255]]).unwrap();
        let mut buf = Vec::new();
        write_preload_file(&mut buf, &palette).unwrap();
        assert_eq!(buf.len(), FILE_SIZE);

        let reloaded = load_preload_file(&mut &buf[..], palette.len()).unwrap();
        assert_eq!(reloaded.len(), palette.len());
        assert_eq!(reloaded.color(0), palette.color(0));
        assert_eq!(reloaded.color(1), palette.color(1));
        assert_eq!(reloaded.color(2), palette.color(2));
        for key in 0..MAPPING_SIZE {
            assert_eq!(
                reloaded.nearest_for_rgb555(key as u16),
                palette.nearest_for_rgb555(key as u16)
            );
        }
    }

    #[test]
    fn file_is_exactly_spec_sized() {
        let palette = Palette::exact(&[[0, 0, 0, 255], [255, 255, 255, 255]]).unwrap();
        let mut buf = Vec::new();
        write_preload_file(&mut buf, &palette).unwrap();
        assert_eq!(buf.len(), 256 * 4 + 32768);
    }

    #[test]
    fn rejects_zero_color_count() {
        let buf = vec![0u8; FILE_SIZE];
        let result = load_preload_file(&mut &buf[..], 0);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_truncated_file() {
        let buf = vec![0u8; FILE_SIZE - 1];
        let result = load_preload_file(&mut &buf[..], 4);
        assert!(result.is_err());
    }
}
