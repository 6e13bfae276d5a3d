//! Container writers: GIF89a, indexed PNG8 (with optional APNG-style
//! animation), and truecolor APNG, plus the preload palette file format.

mod apng;
mod gif;
mod png8;
mod png_chunk;
mod preload;

pub use apng::{write_apng, ApngOptions};
pub use gif::{write_gif, DisposalMethod, GifFrame, GifOptions, PaletteMode};
pub use png8::{write_png8, FrameControl, Png8Options};
pub use preload::{load_preload_file, write_preload_file};
