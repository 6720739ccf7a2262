use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("expected #RRGGBB, got '{0}'")]
    InvalidFormat(String),
}

/// sRGB color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Accepts exactly `#RRGGBB`, hex digits in either case.
    pub fn parse_hex(input: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError::InvalidFormat(input.to_string());

        let digits = input.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        Ok(Color::rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = [self.r, self.g, self.b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn luminance(&self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Stars that stay visible against this background.
    pub fn star_contrast(&self) -> Color {
        if self.luminance() > 0.5 {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }

    /// Linear-space components for an sRGB render target.
    pub fn to_linear(&self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundPreset {
    pub label: &'static str,
    pub color: Color,
}

pub fn presets() -> [BackgroundPreset; 5] {
    [
        BackgroundPreset {
            label: "Black",
            color: Color::BLACK,
        },
        BackgroundPreset {
            label: "Navy",
            color: Color::rgb8(0x00, 0x00, 0x33),
        },
        BackgroundPreset {
            label: "Deep Purple",
            color: Color::rgb8(0x1a, 0x00, 0x33),
        },
        BackgroundPreset {
            label: "Dark Teal",
            color: Color::rgb8(0x00, 0x33, 0x33),
        },
        BackgroundPreset {
            label: "White",
            color: Color::WHITE,
        },
    ]
}
