//! Color palettes for element generation.
//!
//! A palette is a fixed, non-empty list of RGB colors. Each element draws one
//! entry uniformly at generation time and keeps it for the field's lifetime.
//!
//! ```ignore
//! let palette = Palette::from_hex(&["#ff0033", "#0088ff"])?.with_intensity(3.0);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// A bounded set of colors elements are drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaletteDef", into = "PaletteDef")]
pub struct Palette {
    colors: Vec<Vec3>,
    intensity: f32,
}

/// Serialized form: hex strings plus an intensity multiplier.
#[derive(Serialize, Deserialize)]
struct PaletteDef {
    colors: Vec<String>,
    #[serde(default = "default_intensity")]
    intensity: f32,
}

fn default_intensity() -> f32 {
    1.0
}

impl Palette {
    /// Build a palette from RGB colors (each channel 0-1).
    pub fn new(colors: Vec<Vec3>) -> Result<Self, FieldError> {
        if colors.is_empty() {
            return Err(FieldError::EmptyPalette);
        }
        Ok(Self {
            colors,
            intensity: 1.0,
        })
    }

    /// Build a palette from `#rrggbb` strings.
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, FieldError> {
        let colors = hex
            .iter()
            .map(|s| parse_hex(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(colors)
    }

    /// Multiply every color by `intensity` when sampled.
    ///
    /// Values above 1.0 push colors into HDR range for bloom.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity.max(0.0);
        self
    }

    /// Number of base colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a constructed palette.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Intensity multiplier.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Color at `index` (wrapping) with intensity applied.
    pub fn color(&self, index: usize) -> Vec3 {
        self.colors[index % self.colors.len()] * self.intensity
    }

    /// Pick a color from a uniform sample in `[0, 1)`.
    pub fn pick(&self, u: f32) -> Vec3 {
        let idx = (u.clamp(0.0, 1.0) * self.colors.len() as f32) as usize;
        self.color(idx.min(self.colors.len() - 1))
    }

    /// A single white entry.
    pub fn white() -> Self {
        Self {
            colors: vec![Vec3::ONE],
            intensity: 1.0,
        }
    }

    /// Saturated rainbow bulbs: red, orange, yellow, green, cyan, blue, purple, hot pink.
    pub fn rainbow_bulbs() -> Self {
        Self::from_static(&[
            "#ff0000", "#ff8800", "#ffff00", "#00ff00", "#00ffff", "#0000ff", "#9900ff", "#ff0080",
        ])
    }

    /// Classic C9 string lights, including cool and warm whites.
    pub fn c9_bulbs() -> Self {
        Self::from_static(&[
            "#ff0033", "#0088ff", "#ffcc00", "#00ff66", "#ffffff", "#aa00ff", "#ff6600", "#ff0099",
            "#00ffff", "#ffdbb0",
        ])
    }

    pub(crate) fn from_static(hex: &[&str]) -> Self {
        Self {
            colors: hex.iter().filter_map(|s| parse_hex(s).ok()).collect(),
            intensity: 1.0,
        }
    }
}

impl TryFrom<PaletteDef> for Palette {
    type Error = FieldError;

    fn try_from(def: PaletteDef) -> Result<Self, Self::Error> {
        Ok(Palette::from_hex(&def.colors)?.with_intensity(def.intensity))
    }
}

impl From<Palette> for PaletteDef {
    fn from(p: Palette) -> Self {
        PaletteDef {
            colors: p.colors.iter().map(|&c| to_hex(c)).collect(),
            intensity: p.intensity,
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional) into 0-1 RGB.
pub fn parse_hex(s: &str) -> Result<Vec3, FieldError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FieldError::InvalidColor(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| FieldError::InvalidColor(s.to_string()))
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn to_hex(c: Vec3) -> String {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", q(c.x), q(c.y), q(c.z))
}
