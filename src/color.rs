// ============================================================================
// COLOR UTILITIES - hex <-> RGBA conversion and flood-fill tolerance margins
// ============================================================================

use image::Rgba;

use crate::error::{EngineError, Result};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
/// Selection box outline (#4088DA).
pub const SELECTION_BLUE: Rgba<u8> = Rgba([0x40, 0x88, 0xda, 255]);

/// Parse `#rrggbbaa` (or `#rrggbb`, alpha = ff) into RGBA.
///
/// Anything else is a caller bug and is reported, never defaulted.
pub fn hex_to_rgba(hex: &str) -> Result<Rgba<u8>> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| EngineError::InvalidColor(hex.to_string()))?;
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return Err(EngineError::InvalidColor(hex.to_string()));
    }

    let byte = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| EngineError::InvalidColor(hex.to_string()))
    };
    let a = if digits.len() == 8 { byte(6)? } else { 255 };
    Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, a]))
}

/// Lowercase `#rrggbbaa`.
pub fn rgba_to_hex(color: Rgba<u8>) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color[0], color[1], color[2], color[3]
    )
}

pub fn alpha_to_byte(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn byte_to_alpha(byte: u8) -> f32 {
    byte as f32 / 255.0
}

/// Replace the alpha byte of a hex colour, validating the input.
pub fn with_alpha(hex: &str, alpha: f32) -> Result<String> {
    let mut c = hex_to_rgba(hex)?;
    c[3] = alpha_to_byte(alpha);
    Ok(rgba_to_hex(c))
}

/// Colour used for stroking/filling: the RGB of `color` at `alpha` opacity.
/// The stored hex alpha is advisory; the float alpha drives compositing.
pub fn opaque(color: Rgba<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

// ============================================================================
// TOLERANCE MARGINS
// ============================================================================

/// Per-channel accepted ranges around a target colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToleranceMargins {
    pub inf: [i16; 3],
    pub sup: [i16; 3],
}

/// Channel spacing for a 0..=100 tolerance: `round(t/100 * 255 / 2)`.
pub fn tolerance_spacing(tolerance: f32) -> i16 {
    ((tolerance.clamp(0.0, 100.0) / 100.0) * 255.0 / 2.0).round() as i16
}

impl ToleranceMargins {
    pub fn around(target: Rgba<u8>, tolerance: f32) -> Self {
        let spacing = tolerance_spacing(tolerance);
        let mut inf = [0i16; 3];
        let mut sup = [0i16; 3];
        for c in 0..3 {
            let v = target[c] as i16;
            inf[c] = (v - spacing).clamp(0, 255);
            sup[c] = (v + spacing).clamp(0, 255);
        }
        Self { inf, sup }
    }

    /// A pixel passes when ANY of R, G or B sits inside its margin.
    /// Alpha is never considered. Out-of-canvas sentinels (-1) never pass
    /// because every lower bound is >= 0.
    pub fn tolerates(&self, pixel: [i16; 4]) -> bool {
        (0..3).any(|c| pixel[c] >= self.inf[c] && pixel[c] <= self.sup[c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_eight_and_six_digit_hex() {
        assert_eq!(hex_to_rgba("#102030ff").unwrap(), Rgba([16, 32, 48, 255]));
        assert_eq!(hex_to_rgba("#10203080").unwrap(), Rgba([16, 32, 48, 128]));
        assert_eq!(hex_to_rgba("#ABCDEF").unwrap(), Rgba([0xab, 0xcd, 0xef, 255]));
    }

    #[test]
    fn malformed_hex_is_an_error() {
        for bad in ["", "000000ff", "#12345", "#gg0000ff", "#0000000", "#ééé"] {
            assert!(
                matches!(hex_to_rgba(bad), Err(EngineError::InvalidColor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn hex_output_is_lowercase_eight_digits() {
        assert_eq!(rgba_to_hex(Rgba([255, 0, 171, 7])), "#ff00ab07");
    }

    #[test]
    fn with_alpha_rewrites_only_the_alpha_byte() {
        assert_eq!(with_alpha("#11223344", 1.0).unwrap(), "#112233ff");
        assert_eq!(with_alpha("#11223344", 0.0).unwrap(), "#11223300");
        assert_eq!(with_alpha("#112233ff", 0.5).unwrap(), "#11223380");
    }

    #[test]
    fn margins_for_128_at_tolerance_20() {
        assert_eq!(tolerance_spacing(20.0), 26);
        let m = ToleranceMargins::around(Rgba([128, 128, 128, 255]), 20.0);
        assert_eq!(m.inf, [102, 102, 102]);
        assert_eq!(m.sup, [154, 154, 154]);
    }

    #[test]
    fn margins_clamp_to_channel_range() {
        let m = ToleranceMargins::around(Rgba([10, 250, 128, 255]), 100.0);
        assert_eq!(m.inf[0], 0);
        assert_eq!(m.sup[1], 255);
        assert_eq!(m.inf[2], 0);
        assert_eq!(m.sup[2], 255);
    }

    #[test]
    fn tolerance_is_or_across_channels() {
        let m = ToleranceMargins::around(Rgba([0, 0, 200, 255]), 0.0);
        // Only blue matches, red and green are far away: still tolerated.
        assert!(m.tolerates([255, 255, 200, 255]));
        assert!(!m.tolerates([255, 255, 199, 255]));
    }

    #[test]
    fn sentinel_never_tolerated() {
        let m = ToleranceMargins::around(Rgba([0, 0, 0, 255]), 100.0);
        assert!(!m.tolerates([-1, -1, -1, -1]));
    }
}
