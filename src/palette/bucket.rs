//! Pixel filtering, quantization, scoring and distinct-color selection.

use super::AccentColor;
use super::hsl::Hsl;
use std::collections::HashMap;

/// Channel step used when quantizing.
pub const QUANT_STEP: u8 = 20;

/// Maximum number of accents returned from one image.
pub const MAX_ACCENTS: usize = 5;

const MIN_ALPHA: u8 = 128;
const NEAR_BLACK: u8 = 10;
const NEAR_WHITE: u8 = 250;

const SATURATION_WEIGHT: f64 = 5.0;
const LUMINANCE_WEIGHT: f64 = 2.0;

/// Quantized rgb triple; pixels sharing a key count as one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorKey {
    pub fn quantize(r: u8, g: u8, b: u8) -> Self {
        // channels are unsigned, so integer division is the floor
        let q = |c: u8| c / QUANT_STEP * QUANT_STEP;
        Self {
            r: q(r),
            g: q(g),
            b: q(b),
        }
    }

    fn packed(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone)]
pub struct ColorBucket {
    pub key: ColorKey,
    pub count: u32,
    pub hsl: Hsl,
}

impl ColorBucket {
    fn new(key: ColorKey) -> Self {
        Self {
            key,
            count: 0,
            hsl: Hsl::from_rgb(key.r, key.g, key.b),
        }
    }

    /// Frequency (log-damped) plus saturation and mid-lightness preference.
    pub fn score(&self) -> f64 {
        let count_score = f64::from(self.count).ln();
        let saturation_score = self.hsl.s * 3.0;
        let luminance_score = 1.0 - (self.hsl.l - 0.5).abs();
        count_score + saturation_score * SATURATION_WEIGHT + luminance_score * LUMINANCE_WEIGHT
    }
}

/// Transparent, near-black and near-white pixels never form a bucket.
fn is_filtered([r, g, b, a]: [u8; 4]) -> bool {
    a < MIN_ALPHA
        || (r < NEAR_BLACK && g < NEAR_BLACK && b < NEAR_BLACK)
        || (r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE)
}

pub fn aggregate(pixels: &[[u8; 4]]) -> HashMap<ColorKey, ColorBucket> {
    let mut buckets: HashMap<ColorKey, ColorBucket> = HashMap::new();
    for &px in pixels {
        if is_filtered(px) {
            continue;
        }
        let key = ColorKey::quantize(px[0], px[1], px[2]);
        buckets
            .entry(key)
            .or_insert_with(|| ColorBucket::new(key))
            .count += 1;
    }
    buckets
}

/// Buckets ordered by score, highest first. Equal scores fall back to the
/// lowest packed rgb so the order never depends on map iteration.
pub fn rank(buckets: HashMap<ColorKey, ColorBucket>) -> Vec<ColorBucket> {
    let mut scored: Vec<(f64, ColorBucket)> =
        buckets.into_values().map(|b| (b.score(), b)).collect();
    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| a.key.packed().cmp(&b.key.packed()))
    });
    scored.into_iter().map(|(_, b)| b).collect()
}

pub fn select(ranked: &[ColorBucket]) -> Vec<AccentColor> {
    let mut palette: Vec<AccentColor> = Vec::with_capacity(MAX_ACCENTS);
    for bucket in ranked {
        if palette.len() >= MAX_ACCENTS {
            break;
        }
        let hex = bucket.key.hex();
        if palette.iter().all(|p| p.value != hex) {
            palette.push(AccentColor {
                name: format!("Sampled {}", palette.len() + 1),
                value: hex,
            });
        }
    }
    palette
}

/// Stages 2-4 over an already sampled RGBA grid.
pub fn palette_from_pixels(pixels: &[[u8; 4]]) -> Vec<AccentColor> {
    let buckets = aggregate(pixels);
    tracing::debug!(pixels = pixels.len(), buckets = buckets.len(), "aggregated palette buckets");
    select(&rank(buckets))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: usize = 50 * 50;

    fn grid_of(parts: &[([u8; 4], usize)]) -> Vec<[u8; 4]> {
        let mut out = Vec::with_capacity(GRID);
        for &(px, n) in parts {
            out.extend(std::iter::repeat_n(px, n));
        }
        assert_eq!(out.len(), GRID);
        out
    }

    fn is_hex(v: &str) -> bool {
        v.len() == 7
            && v.starts_with('#')
            && v[1..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_quantize_floors_to_step() {
        assert_eq!(ColorKey::quantize(255, 77, 0), ColorKey { r: 240, g: 60, b: 0 });
        assert_eq!(ColorKey::quantize(19, 20, 39), ColorKey { r: 0, g: 20, b: 20 });
        assert_eq!(ColorKey::quantize(0, 212, 255).hex(), "#00c8f0");
    }

    #[test]
    fn test_hex_is_zero_padded_lowercase() {
        assert_eq!(ColorKey { r: 0, g: 160, b: 240 }.hex(), "#00a0f0");
        assert_eq!(ColorKey { r: 0, g: 0, b: 0 }.hex(), "#000000");
    }

    #[test]
    fn test_filters() {
        assert!(is_filtered([200, 10, 10, 127]));
        assert!(is_filtered([9, 9, 9, 255]));
        assert!(is_filtered([251, 251, 251, 255]));
        assert!(!is_filtered([10, 9, 9, 255]));
        assert!(!is_filtered([250, 251, 251, 255]));
        assert!(!is_filtered([200, 10, 10, 128]));
    }

    #[test]
    fn test_bucket_counts_are_positive() {
        let pixels = grid_of(&[([200, 40, 40, 255], 1000), ([0, 0, 0, 0], 1500)]);
        let buckets = aggregate(&pixels);
        assert_eq!(buckets.len(), 1);
        assert!(buckets.values().all(|b| b.count >= 1));
        assert_eq!(buckets[&ColorKey { r: 200, g: 40, b: 40 }].count, 1000);
    }

    #[test]
    fn test_score_formula() {
        let bucket = ColorBucket {
            key: ColorKey { r: 0, g: 0, b: 0 },
            count: 10,
            hsl: Hsl { h: 0.0, s: 0.5, l: 0.25 },
        };
        let expected = 10f64.ln() + 1.5 * 5.0 + 0.75 * 2.0;
        assert!((bucket.score() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_black_and_white_images_are_empty() {
        assert!(palette_from_pixels(&grid_of(&[([0, 0, 0, 255], GRID)])).is_empty());
        assert!(palette_from_pixels(&grid_of(&[([255, 255, 255, 255], GRID)])).is_empty());
    }

    #[test]
    fn test_transparent_image_is_empty() {
        assert!(palette_from_pixels(&grid_of(&[([255, 77, 0, 0], GRID)])).is_empty());
    }

    #[test]
    fn test_dominant_orange_then_cyan() {
        let pixels = grid_of(&[
            ([255, 77, 0, 255], 1500),
            ([5, 5, 5, 255], 750),
            ([0, 212, 255, 255], 250),
        ]);
        let out = palette_from_pixels(&pixels);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, "#f03c00");
        assert_eq!(out[0].name, "Sampled 1");
        assert_eq!(out[1].value, "#00c8f0");
        assert_eq!(out[1].name, "Sampled 2");
    }

    #[test]
    fn test_ten_ten_ten_is_not_near_black() {
        // the near-black cut is strict: (10,10,10) survives and lands in #000000
        let pixels = grid_of(&[
            ([255, 77, 0, 255], 1500),
            ([10, 10, 10, 255], 750),
            ([0, 212, 255, 255], 250),
        ]);
        let out = palette_from_pixels(&pixels);
        let values: Vec<&str> = out.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, ["#f03c00", "#00c8f0", "#000000"]);
    }

    #[test]
    fn test_saturation_beats_muted_at_equal_frequency() {
        // (240,20,20): s ~ 0.88, (140,120,120): s ~ 0.08, both l ~ 0.51
        let pixels = grid_of(&[([140, 120, 120, 255], 1250), ([240, 20, 20, 255], 1250)]);
        let out = palette_from_pixels(&pixels);
        assert_eq!(out[0].value, "#f01414");
        assert_eq!(out[1].value, "#8c7878");
    }

    #[test]
    fn test_small_jitter_within_step_is_invisible() {
        let base = grid_of(&[
            ([200, 40, 60, 255], 800),
            ([20, 100, 180, 255], 900),
            ([120, 200, 40, 255], 800),
        ]);
        let jittered: Vec<[u8; 4]> = base
            .iter()
            .enumerate()
            .map(|(i, &[r, g, b, a])| {
                let j = (i % 20) as u8;
                [r + j, g + j, b + j, a]
            })
            .collect();
        assert_eq!(palette_from_pixels(&base), palette_from_pixels(&jittered));
    }

    #[test]
    fn test_at_most_five_distinct_well_formed() {
        // 25 distinct chromatic buckets, 100 pixels each
        let mut pixels = Vec::with_capacity(GRID);
        for i in 0..25u8 {
            let px = [20 + (i % 5) * 40, 20 + (i / 5) * 40, 200, 255];
            pixels.extend(std::iter::repeat_n(px, 100));
        }
        let out = palette_from_pixels(&pixels);
        assert_eq!(out.len(), MAX_ACCENTS);
        for (i, accent) in out.iter().enumerate() {
            assert!(is_hex(&accent.value), "{}", accent.value);
            assert_eq!(accent.name, format!("Sampled {}", i + 1));
            assert!(out[..i].iter().all(|p| p.value != accent.value));
        }
    }

    #[test]
    fn test_equal_scores_prefer_lowest_rgb() {
        // mirror-image hues share s and l, and have equal counts
        let pixels = grid_of(&[([0, 100, 200, 255], 1250), ([200, 100, 0, 255], 1250)]);
        let out = palette_from_pixels(&pixels);
        assert_eq!(out[0].value, "#0064c8");
        assert_eq!(out[1].value, "#c86400");
    }
}
