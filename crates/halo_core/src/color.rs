//! Color types and the small amount of color math the theme needs
//!
//! [`Color`] stores straight (non-premultiplied) sRGB channels in `0.0..=1.0`.
//! [`Hsla`] is the cylindrical form the palette generator works in: hue in
//! degrees, saturation and lightness in percent.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a string is not a valid hex color.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,

    #[error("invalid hex color `{0}` (expected #rgb, #rgba, #rrggbb or #rrggbbaa)")]
    InvalidHex(String),
}

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    pub fn parse_hex(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ColorParseError::Empty);
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let invalid = || ColorParseError::InvalidHex(input.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        let short = |c: char| {
            let s: String = [c, c].iter().collect();
            u8::from_str_radix(&s, 16).map_err(|_| invalid())
        };

        let (r, g, b, a) = match digits.len() {
            3 | 4 => {
                let mut chars = digits.chars();
                let mut next = || chars.next().ok_or_else(invalid).and_then(short);
                let (r, g, b) = (next()?, next()?, next()?);
                let a = if digits.len() == 4 { next()? } else { 255 };
                (r, g, b, a)
            }
            6 | 8 => {
                let a = if digits.len() == 8 {
                    channel(&digits[6..8])?
                } else {
                    255
                };
                (
                    channel(&digits[0..2])?,
                    channel(&digits[2..4])?,
                    channel(&digits[4..6])?,
                    a,
                )
            }
            _ => return Err(invalid()),
        };

        Ok(Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ))
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Perceived brightness in `0.0..=1.0` (ITU-R BT.601 weights).
    pub fn brightness(&self) -> f32 {
        (self.r * 299.0 + self.g * 587.0 + self.b * 114.0) / 1000.0
    }

    /// A color is dark when its perceived brightness is below one half.
    pub fn is_dark(&self) -> bool {
        self.brightness() < 0.5
    }

    pub fn to_hsla(&self) -> Hsla {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;
        let l = (max + min) / 2.0;

        if delta <= f32::EPSILON {
            return Hsla::new(0.0, 0.0, l * 100.0).with_alpha(self.a);
        }

        let s = delta / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == self.r {
            ((self.g - self.b) / delta).rem_euclid(6.0)
        } else if max == self.g {
            (self.b - self.r) / delta + 2.0
        } else {
            (self.r - self.g) / delta + 4.0
        };

        Hsla::new(h * 60.0, s * 100.0, l * 100.0).with_alpha(self.a)
    }

    /// `#rrggbb`, or `#rrggbbaa` when the color is translucent.
    pub fn to_hex_string(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a < 1.0 {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        } else {
            format!(
                "#{:02x}{:02x}{:02x}",
                byte(self.r),
                byte(self.g),
                byte(self.b)
            )
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

/// Hue/saturation/lightness color with alpha.
///
/// `h` is in degrees `0.0..360.0`, `s` and `l` are percentages `0.0..=100.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Hsla {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 100.0),
            l: l.clamp(0.0, 100.0),
            a: 1.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha.clamp(0.0, 1.0);
        self
    }

    /// Rotate the hue by `degrees`, wrapping around the color wheel.
    pub fn rotate(mut self, degrees: f32) -> Self {
        self.h = (self.h + degrees).rem_euclid(360.0);
        self
    }

    /// Raise lightness by `amount` (a fraction, `0.1` adds ten points).
    pub fn lighten(mut self, amount: f32) -> Self {
        self.l = (self.l + amount * 100.0).clamp(0.0, 100.0);
        self
    }

    pub fn darken(self, amount: f32) -> Self {
        self.lighten(-amount)
    }

    /// Hue-shifted companions of this color, in harmony order.
    pub fn harmonies(&self, harmony: Harmony) -> Vec<Hsla> {
        harmony
            .hue_shifts()
            .iter()
            .map(|shift| self.rotate(*shift))
            .collect()
    }

    pub fn to_color(&self) -> Color {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = self.h / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Color::rgba(r + m, g + m, b + m, self.a)
    }

    /// CSS color level 4 `hsl()` text.
    ///
    /// Hue, saturation and lightness are rounded to whole numbers before
    /// formatting; alpha keeps three decimals and is omitted when opaque.
    pub fn to_css(&self) -> String {
        let h = self.h.round().rem_euclid(360.0);
        let s = self.s.round();
        let l = self.l.round();
        if self.a < 1.0 {
            let a = (self.a * 1000.0).round() / 1000.0;
            format!("hsl({h:.1} {s:.1}% {l:.1}% / {a})")
        } else {
            format!("hsl({h:.1} {s:.1}% {l:.1}%)")
        }
    }
}

impl From<Color> for Hsla {
    fn from(color: Color) -> Self {
        color.to_hsla()
    }
}

impl From<Hsla> for Color {
    fn from(hsla: Hsla) -> Self {
        hsla.to_color()
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Color-wheel harmonies, expressed as hue shifts from the base color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Harmony {
    Analogous,
    Complementary,
    SplitComplementary,
    Triadic,
    Tetradic,
}

impl Harmony {
    pub fn hue_shifts(self) -> &'static [f32] {
        match self {
            Self::Analogous => &[-30.0, 0.0, 30.0],
            Self::Complementary => &[0.0, 180.0],
            Self::SplitComplementary => &[0.0, 150.0, 210.0],
            Self::Triadic => &[0.0, 120.0, 240.0],
            Self::Tetradic => &[0.0, 90.0, 180.0, 270.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn parse_long_and_short_forms() {
        let long = Color::parse_hex("#ff8800").unwrap();
        let short = Color::parse_hex("f80").unwrap();
        assert_eq!(long, short);
        assert!(approx(long.g, 0x88 as f32 / 255.0));

        let translucent = Color::parse_hex("#ff880080").unwrap();
        assert!(approx(translucent.a, 128.0 / 255.0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(Color::parse_hex("  "), Err(ColorParseError::Empty));
        assert!(matches!(
            Color::parse_hex("#12345"),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse_hex("#gggggg"),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse_hex("#ffé"),
            Err(ColorParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn hsl_of_primaries() {
        let red = Color::from_hex(0xFF0000).to_hsla();
        assert!(approx(red.h, 0.0) && approx(red.s, 100.0) && approx(red.l, 50.0));

        let blue = Color::from_hex(0x0000FF).to_hsla();
        assert!(approx(blue.h, 240.0));

        let gray = Color::from_hex(0x808080).to_hsla();
        assert!(approx(gray.s, 0.0));
        assert!(approx(gray.h, 0.0));
    }

    #[test]
    fn hsl_round_trip() {
        for hex in [0x01CA8A, 0x1E66F5, 0xD20F39, 0x7F7F7F, 0x123456] {
            let color = Color::from_hex(hex);
            let back = color.to_hsla().to_color();
            assert_eq!(back.to_hex_string(), color.to_hex_string(), "{hex:06x}");
        }
    }

    #[test]
    fn rotate_wraps_around() {
        let base = Hsla::new(350.0, 50.0, 50.0);
        assert!(approx(base.rotate(40.0).h, 30.0));
        assert!(approx(base.rotate(-400.0).h, 310.0));
    }

    #[test]
    fn lighten_clamps() {
        let c = Hsla::new(10.0, 50.0, 95.0).lighten(0.1);
        assert_eq!(c.l, 100.0);
        let d = Hsla::new(10.0, 50.0, 5.0).darken(0.1);
        assert_eq!(d.l, 0.0);
    }

    #[test]
    fn analogous_harmony_has_three_members() {
        let base = Hsla::new(10.0, 50.0, 50.0);
        let hues: Vec<f32> = base
            .harmonies(Harmony::Analogous)
            .iter()
            .map(|c| c.h.round())
            .collect();
        assert_eq!(hues, vec![340.0, 10.0, 40.0]);
    }

    #[test]
    fn css_text() {
        assert_eq!(Hsla::new(0.0, 0.0, 100.0).to_css(), "hsl(0.0 0.0% 100.0%)");
        assert_eq!(
            Hsla::new(200.4, 12.0, 5.0).with_alpha(0.3).to_css(),
            "hsl(200.0 12.0% 5.0% / 0.3)"
        );
    }

    #[test]
    fn darkness_threshold() {
        assert!(Color::BLACK.is_dark());
        assert!(!Color::WHITE.is_dark());
        assert!(Color::from_hex(0x1E3A8A).is_dark());
        assert!(!Color::from_hex(0xFACC15).is_dark());
    }
}
