//! CSS-style colour strings and HSL blending.
//!
//! Colour keyframes are stored as the strings the author typed. Interpolation
//! parses both endpoints, blends them in HSL space and writes the result back
//! in the notation of the earlier endpoint.

use std::fmt;

use crate::{Result, SyncFrameError};

/// Notation a colour string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    /// `#rgb`, recomposed as `#rrggbb`.
    ShortHex,
    Hex,
    HexAlpha,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
}

/// A parsed colour with straight (non-premultiplied) channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
    pub format: ColorFormat,
}

/// Hue, saturation, lightness and alpha, all normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

impl Color {
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| bad_color(input));
        }

        let lower = s.to_ascii_lowercase();
        let (name, args) = lower
            .split_once('(')
            .and_then(|(name, rest)| rest.strip_suffix(')').map(|args| (name.trim(), args)))
            .ok_or_else(|| bad_color(input))?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();

        let color = match (name, parts.len()) {
            ("rgb", 3) | ("rgba", 4) => {
                let r = parse_channel(parts[0])?;
                let g = parse_channel(parts[1])?;
                let b = parse_channel(parts[2])?;
                let (a, format) = if parts.len() == 4 {
                    (parse_alpha(parts[3])?, ColorFormat::Rgba)
                } else {
                    (1.0, ColorFormat::Rgb)
                };
                Color {
                    r,
                    g,
                    b,
                    a,
                    format,
                }
            }
            ("hsl", 3) | ("hsla", 4) => {
                let h = parse_number(parts[0].trim_end_matches("deg"))?;
                let s = parse_percent(parts[1])?;
                let l = parse_percent(parts[2])?;
                let (a, format) = if parts.len() == 4 {
                    (parse_alpha(parts[3])?, ColorFormat::Hsla)
                } else {
                    (1.0, ColorFormat::Hsl)
                };
                let hsla = Hsla {
                    h: (h / 360.0).rem_euclid(1.0),
                    s,
                    l,
                    a,
                };
                Color::from_hsla(hsla, format)
            }
            _ => return Err(bad_color(input)),
        };

        Ok(color)
    }

    pub fn to_hsla(self) -> Hsla {
        let (r, g, b) = (self.r, self.g, self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta <= f64::EPSILON {
            return Hsla {
                h: 0.0,
                s: 0.0,
                l,
                a: self.a,
            };
        }

        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let h = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Hsla {
            h: h / 6.0,
            s,
            l,
            a: self.a,
        }
    }

    pub fn from_hsla(hsla: Hsla, format: ColorFormat) -> Self {
        let h = hsla.h.rem_euclid(1.0);
        let s = hsla.s.clamp(0.0, 1.0);
        let l = hsla.l.clamp(0.0, 1.0);
        let a = hsla.a.clamp(0.0, 1.0);

        if s == 0.0 {
            return Color {
                r: l,
                g: l,
                b: l,
                a,
                format,
            };
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Color {
            r: hue_to_rgb(p, q, h + 1.0 / 3.0),
            g: hue_to_rgb(p, q, h),
            b: hue_to_rgb(p, q, h - 1.0 / 3.0),
            a,
            format,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (byte(self.r), byte(self.g), byte(self.b), byte(self.a));

        match self.format {
            ColorFormat::ShortHex | ColorFormat::Hex => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            ColorFormat::HexAlpha => write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}"),
            ColorFormat::Rgb => write!(f, "rgb({r}, {g}, {b})"),
            ColorFormat::Rgba => write!(f, "rgba({r}, {g}, {b}, {})", round3(self.a)),
            ColorFormat::Hsl | ColorFormat::Hsla => {
                let hsla = self.to_hsla();
                let h = (hsla.h * 360.0).round() % 360.0;
                let s = (hsla.s * 100.0).round();
                let l = (hsla.l * 100.0).round();
                if self.format == ColorFormat::Hsl {
                    write!(f, "hsl({h}, {s}%, {l}%)")
                } else {
                    write!(f, "hsla({h}, {s}%, {l}%, {})", round3(self.a))
                }
            }
        }
    }
}

/// Blends two colour strings in HSL space along the shortest hue arc.
///
/// The result uses the notation of `from`. Fails when either side does not
/// parse.
pub fn blend(from: &str, to: &str, t: f64) -> Result<String> {
    let a = Color::parse(from)?;
    let b = Color::parse(to)?;
    let blended = blend_hsla(a.to_hsla(), b.to_hsla(), t);
    Ok(Color::from_hsla(blended, a.format).to_string())
}

/// Channel-wise HSL interpolation. Hue wraps at 1.0 and always travels the
/// shorter way round.
pub fn blend_hsla(a: Hsla, b: Hsla, t: f64) -> Hsla {
    let mut dh = b.h - a.h;
    if dh > 0.5 {
        dh -= 1.0;
    } else if dh < -0.5 {
        dh += 1.0;
    }

    Hsla {
        h: (a.h + dh * t).rem_euclid(1.0),
        s: a.s + (b.s - a.s) * t,
        l: a.l + (b.l - a.l) * t,
        a: a.a + (b.a - a.a) * t,
    }
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |pair: &str| u8::from_str_radix(pair, 16).ok().map(|v| f64::from(v) / 255.0);

    match hex.len() {
        3 => {
            let nibble = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .ok()
                    .map(|v| f64::from(v * 17) / 255.0)
            };
            Some(Color {
                r: nibble(0)?,
                g: nibble(1)?,
                b: nibble(2)?,
                a: 1.0,
                format: ColorFormat::ShortHex,
            })
        }
        6 | 8 => Some(Color {
            r: byte(&hex[0..2])?,
            g: byte(&hex[2..4])?,
            b: byte(&hex[4..6])?,
            a: if hex.len() == 8 { byte(&hex[6..8])? } else { 1.0 },
            format: if hex.len() == 8 {
                ColorFormat::HexAlpha
            } else {
                ColorFormat::Hex
            },
        }),
        _ => None,
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SyncFrameError::malformed(format!("`{s}` is not a number")))
}

fn parse_channel(s: &str) -> Result<f64> {
    match s.strip_suffix('%') {
        Some(pct) => Ok((parse_number(pct)? / 100.0).clamp(0.0, 1.0)),
        None => Ok((parse_number(s)? / 255.0).clamp(0.0, 1.0)),
    }
}

fn parse_percent(s: &str) -> Result<f64> {
    let value = parse_number(s.strip_suffix('%').unwrap_or(s))?;
    Ok((value / 100.0).clamp(0.0, 1.0))
}

fn parse_alpha(s: &str) -> Result<f64> {
    match s.strip_suffix('%') {
        Some(pct) => Ok((parse_number(pct)? / 100.0).clamp(0.0, 1.0)),
        None => Ok(parse_number(s)?.clamp(0.0, 1.0)),
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn bad_color(input: &str) -> SyncFrameError {
    SyncFrameError::malformed(format!("`{input}` is not a colour"))
}
