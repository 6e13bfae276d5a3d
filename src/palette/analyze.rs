//! Palette construction by analyzing source imagery.
//!
//! All four analyzers end the same way: call [`Palette::exact`] on the
//! chosen colors, which builds the RGB555 mapping table. They differ only
//! in how they pick which colors to keep.

use std::collections::HashMap;

use crate::color::{difference_analyzing, difference_hw, hue_sector, LinearRgb, Oklab, Srgb};
use crate::image::Frame;

use super::error::PaletteError;
use super::palette::Palette;

const OPAQUE_THRESHOLD: u8 = 128;
const HUE_SECTORS: usize = 16;

/// An opaque candidate color plus how often it appeared in the source.
#[derive(Clone, Copy)]
struct Candidate {
    rgb: [u8; 3],
    lab: Oklab,
    count: u32,
}

fn histogram(frames: &[&Frame], bucket_bits: u32) -> (Vec<Candidate>, bool) {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    let mut has_translucent = false;
    let shift = 8 - bucket_bits;

    for frame in frames {
        for &pixel in frame.pixels() {
            let a = (pixel & 0xFF) as u8;
            if a < OPAQUE_THRESHOLD {
                has_translucent = true;
                continue;
            }
            let r = ((pixel >> 24) & 0xFF) as u8 >> shift;
            let g = ((pixel >> 16) & 0xFF) as u8 >> shift;
            let b = ((pixel >> 8) & 0xFF) as u8 >> shift;
            let key = (r as u32) << 16 | (g as u32) << 8 | b as u32;
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let candidates = counts
        .into_iter()
        .map(|(key, count)| {
            let r = (((key >> 16) & 0xFF) as u8) << shift;
            let g = (((key >> 8) & 0xFF) as u8) << shift;
            let b = ((key & 0xFF) as u8) << shift;
            let rgb = [r, g, b];
            let lab = Oklab::from(LinearRgb::from(Srgb::from_u8(r, g, b)));
            Candidate { rgb, lab, count }
        })
        .collect();

    (candidates, has_translucent)
}

/// Farthest-point selection: repeatedly picks the unchosen candidate whose
/// minimum distance to the already-chosen set is both largest and at
/// least `threshold`. If too few candidates clear the threshold, relax it
/// geometrically and keep going.
fn select_peaks(mut candidates: Vec<Candidate>, want: usize, mut threshold: f32) -> Vec<Candidate> {
    if candidates.is_empty() || want == 0 {
        return Vec::new();
    }
    candidates.sort_by(|a, b| b.count.cmp(&a.count));

    let mut chosen = vec![candidates.remove(0)];

    while chosen.len() < want && !candidates.is_empty() {
        let mut best_idx = None;
        let mut best_min_dist = -1.0f32;

        for (i, cand) in candidates.iter().enumerate() {
            let min_dist = chosen
                .iter()
                .map(|c| difference_analyzing(cand.lab, c.lab))
                .fold(f32::MAX, f32::min);
            if min_dist > best_min_dist {
                best_min_dist = min_dist;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(i) if best_min_dist >= threshold => {
                chosen.push(candidates.remove(i));
            }
            Some(_) => {
                // Nothing clears the current threshold; relax and retry.
                threshold *= 0.7;
                if threshold < 1e-4 {
                    // Threshold exhausted: take whatever is left by
                    // descending frequency rather than loop forever.
                    candidates.sort_by(|a, b| b.count.cmp(&a.count));
                    while chosen.len() < want && !candidates.is_empty() {
                        chosen.push(candidates.remove(0));
                    }
                }
            }
            None => break,
        }
    }

    chosen
}

fn finish(chosen: Vec<Candidate>, has_transparency: bool) -> Result<Palette, PaletteError> {
    let mut colors: Vec<[u8; 4]> = Vec::with_capacity(chosen.len() + 1);
    if has_transparency {
        colors.push([0, 0, 0, 0]);
    }
    if chosen.is_empty() {
        // Degenerate (fully transparent or empty) input: fall back to
        // black and white so a palette still exists.
        colors.push([0, 0, 0, 255]);
        colors.push([255, 255, 255, 255]);
    } else {
        for c in chosen {
            colors.push([c.rgb[0], c.rgb[1], c.rgb[2], 255]);
        }
    }
    Palette::exact(&colors)
}

/// Analyze a single frame: histogram opaque colors, then farthest-point
/// select up to `color_count - 1` of them (minus one for the transparent
/// slot, if needed).
pub fn analyze(frame: &Frame, threshold: f32, color_count: usize) -> Result<Palette, PaletteError> {
    analyze_many(&[frame], threshold, color_count)
}

/// Same as [`analyze`] but merges histograms across multiple frames first,
/// so a shared palette can represent an entire animation.
pub fn analyze_many(
    frames: &[&Frame],
    threshold: f32,
    color_count: usize,
) -> Result<Palette, PaletteError> {
    let (candidates, has_transparency) = histogram(frames, 8);
    let want = color_count.saturating_sub(if has_transparency { 1 } else { 0 }).max(1);
    let chosen = select_peaks(candidates, want, threshold);
    finish(chosen, has_transparency)
}

/// Lower-quality variant of [`analyze`] used when many frames must be
/// aggregated cheaply: buckets colors at 4 bits per channel before
/// histogramming instead of the full 8.
pub fn analyze_fast(
    frames: &[&Frame],
    threshold: f32,
    color_count: usize,
) -> Result<Palette, PaletteError> {
    let (candidates, has_transparency) = histogram(frames, 4);
    let want = color_count.saturating_sub(if has_transparency { 1 } else { 0 }).max(1);
    let chosen = select_peaks(candidates, want, threshold);
    finish(chosen, has_transparency)
}

/// Partitions candidates into 16 hue sectors first, reserving at least one
/// representative (the most frequent) per non-empty sector, then fills any
/// remaining slots by farthest-point selection over the union of leftover
/// candidates. Produces more balanced small palettes than plain `analyze`.
pub fn analyze_hue_wise(
    frame: &Frame,
    threshold: f32,
    color_count: usize,
) -> Result<Palette, PaletteError> {
    let (candidates, has_transparency) = histogram(&[frame], 8);
    let want = color_count.saturating_sub(if has_transparency { 1 } else { 0 }).max(1);

    let mut sectors: Vec<Vec<Candidate>> = vec![Vec::new(); HUE_SECTORS + 1];
    for c in candidates {
        let sector = hue_sector(c.lab, HUE_SECTORS);
        sectors[sector].push(c);
    }

    let mut chosen: Vec<Candidate> = Vec::new();
    let mut leftovers: Vec<Candidate> = Vec::new();
    for bucket in sectors.iter_mut() {
        bucket.sort_by(|a, b| b.count.cmp(&a.count));
        if let Some(representative) = bucket.first().copied() {
            if chosen.len() < want {
                chosen.push(representative);
                leftovers.extend(bucket.iter().skip(1).copied());
            } else {
                leftovers.extend(bucket.iter().copied());
            }
        }
    }

    if chosen.len() < want {
        // Rank leftovers by how far they are from everything already
        // chosen, same metric as `select_peaks`, but seeded with the
        // hue-wise representatives instead of starting from scratch.
        let remaining = want - chosen.len();
        let mut extra = Vec::new();
        let mut pool = leftovers;
        while extra.len() < remaining && !pool.is_empty() {
            let mut best_idx = 0;
            let mut best_min_dist = -1.0f32;
            for (i, cand) in pool.iter().enumerate() {
                let min_dist = chosen
                    .iter()
                    .chain(extra.iter())
                    .map(|c| difference_hw(cand.lab, c.lab))
                    .fold(f32::MAX, f32::min);
                if min_dist > best_min_dist {
                    best_min_dist = min_dist;
                    best_idx = i;
                }
            }
            if best_min_dist < threshold * 0.3 && extra.len() + chosen.len() >= want.min(2) {
                break;
            }
            extra.push(pool.remove(best_idx));
        }
        chosen.extend(extra);
    }

    finish(chosen, has_transparency)
}

/// Builds a large (1024-color) deterministic candidate palette covering
/// the RGB cube evenly, then repeatedly removes whichever candidate has
/// the smallest nearest-neighbor distance until `color_count` remain.
pub fn analyze_reductive(color_count: usize) -> Result<Palette, PaletteError> {
    let want = color_count.max(1).min(super::palette::MAX_COLORS);

    let mut candidates: Vec<Candidate> = Vec::with_capacity(1024);
    for i in 0..1024u32 {
        let (x, y) = crate::noise::r2::point(i as u64);
        let z = (((i as f32 * 0.6180339887) % 1.0) + 1.0) % 1.0;
        let r = (x * 255.0).round() as u8;
        let g = (y * 255.0).round() as u8;
        let b = (z * 255.0).round() as u8;
        let lab = Oklab::from(LinearRgb::from(Srgb::from_u8(r, g, b)));
        candidates.push(Candidate {
            rgb: [r, g, b],
            lab,
            count: 1,
        });
    }

    // Dedup identical colors so the reduction loop doesn't spend its
    // budget removing duplicates one at a time.
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.rgb));

    while candidates.len() > want {
        let mut worst_idx = 0;
        let mut worst_dist = f32::MAX;
        for i in 0..candidates.len() {
            let mut nearest = f32::MAX;
            for j in 0..candidates.len() {
                if i == j {
                    continue;
                }
                let d = difference_analyzing(candidates[i].lab, candidates[j].lab);
                if d < nearest {
                    nearest = d;
                }
            }
            if nearest < worst_dist {
                worst_dist = nearest;
                worst_idx = i;
            }
        }
        candidates.remove(worst_idx);
    }

    finish(candidates, false)
}
