//! RGB -> HSL conversion used by the bucket scorer.

/// Hue, saturation and lightness, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    /// Standard piecewise conversion from 8-bit channels.
    ///
    /// When two channels tie for the maximum the hue sector is picked in
    /// r, g, b order.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = f64::from(r) / 255.0;
        let g = f64::from(g) / 255.0;
        let b = f64::from(b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Self { h: 0.0, s: 0.0, l };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Self { h: h / 6.0, s, l }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_achromatic() {
        let black = Hsl::from_rgb(0, 0, 0);
        assert_eq!(black, Hsl { h: 0.0, s: 0.0, l: 0.0 });

        let grey = Hsl::from_rgb(120, 120, 120);
        assert_eq!(grey.h, 0.0);
        assert_eq!(grey.s, 0.0);
        assert!(close(grey.l, 120.0 / 255.0));
    }

    #[test]
    fn test_primaries() {
        let red = Hsl::from_rgb(255, 0, 0);
        assert!(close(red.h, 0.0) && close(red.s, 1.0) && close(red.l, 0.5));

        let green = Hsl::from_rgb(0, 255, 0);
        assert!(close(green.h, 1.0 / 3.0));

        let blue = Hsl::from_rgb(0, 0, 255);
        assert!(close(blue.h, 2.0 / 3.0));
    }

    #[test]
    fn test_red_sector_wraps_when_blue_exceeds_green() {
        // magenta-ish red: hue must land near the top of the circle, not negative
        let hsl = Hsl::from_rgb(240, 0, 120);
        assert!(hsl.h > 0.9 && hsl.h < 1.0);
    }

    #[test]
    fn test_light_saturation_branch() {
        // l > 0.5 uses d / (2 - max - min)
        let hsl = Hsl::from_rgb(255, 200, 200);
        let max = 1.0;
        let min = 200.0 / 255.0;
        assert!(close(hsl.s, (max - min) / (2.0 - max - min)));
        assert!(hsl.l > 0.5);
    }

    #[test]
    fn test_components_stay_in_unit_range() {
        for r in (0..=255).step_by(20) {
            for g in (0..=255).step_by(20) {
                for b in (0..=255).step_by(20) {
                    let hsl = Hsl::from_rgb(r as u8, g as u8, b as u8);
                    for c in [hsl.h, hsl.s, hsl.l] {
                        assert!((0.0..=1.0).contains(&c), "{r},{g},{b} -> {hsl:?}");
                    }
                }
            }
        }
    }
}
