use std::collections::{hash_map::Entry::*, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rand::Rng;

const PALETTES_JSON: &str = include_str!("palettes.json");

/// A straight (non-premultiplied) RGBA color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Packs into the premultiplied `0xAARRGGBB` layout used by canvas storage.
    pub fn to_premultiplied(self) -> u32 {
        let a = u32::from(self.a);
        let mul = |c: u8| (u32::from(c) * a + 127) / 255;
        (a << 24) | (mul(self.r) << 16) | (mul(self.g) << 8) | mul(self.b)
    }

    /// Inverse of [`Color::to_premultiplied`], up to rounding for translucent pixels.
    pub fn from_premultiplied(px: u32) -> Self {
        let a = (px >> 24) as u8;
        if a == 0 {
            return Color::TRANSPARENT;
        }
        let un = |shift: u32| {
            let c = (px >> shift) & 0xff;
            ((c * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
        };
        Color::rgba(un(16), un(8), un(0), a)
    }

    /// Rec. 601 luma in `0.0..=255.0`, ignoring alpha.
    pub fn luma(self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid color {:?}: expected #rrggbb or #rrggbbaa",
            self.0
        )
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let err = || ParseColorError(s.to_string());
        let bytes = hex::decode(digits).map_err(|_| err())?;
        match bytes[..] {
            [r, g, b] => Ok(Color::rgb(r, g, b)),
            [r, g, b, a] => Ok(Color::rgba(r, g, b, a)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        if c.a == 0xff {
            format!("#{}", hex::encode([c.r, c.g, c.b]))
        } else {
            format!("#{}", hex::encode([c.r, c.g, c.b, c.a]))
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(*self))
    }
}

/// A non-empty set of colors that is sampled uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSet(Vec<Color>);

impl ColorSet {
    /// Returns `None` for an empty list.
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(ColorSet(colors))
        }
    }

    pub fn single(color: Color) -> Self {
        ColorSet(vec![color])
    }

    pub fn pick(&self, rng: &mut Rng) -> Color {
        *rng.choice(&self.0)
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.0
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WirePalette {
    name: String,
    front: Vec<Color>,
    background: Vec<Color>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WirePaletteDb {
    palettes: Vec<WirePalette>,
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub front: ColorSet,
    pub background: ColorSet,
}

#[derive(Debug)]
pub struct PaletteDb {
    palettes: HashMap<String, Palette>,
}

#[derive(Debug)]
pub enum WireFormatError {
    DuplicatePalette { name: String },
    EmptyColors { palette: String },
}

impl fmt::Display for WireFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePalette { name } => write!(f, "palette {:?} defined twice", name),
            Self::EmptyColors { palette } => {
                write!(f, "palette {:?} has an empty color list", palette)
            }
        }
    }
}

impl std::error::Error for WireFormatError {}

impl PaletteDb {
    pub fn from_bundle() -> Self {
        let wire: WirePaletteDb =
            serde_json::from_str(PALETTES_JSON).expect("bundled data is invalid JSON");
        PaletteDb::from_wire(wire).expect("bundled data is not a valid database")
    }

    pub fn from_wire(wire: WirePaletteDb) -> Result<Self, WireFormatError> {
        let mut palettes = HashMap::with_capacity(wire.palettes.len());
        for WirePalette {
            name,
            front,
            background,
        } in wire.palettes
        {
            let empty = || WireFormatError::EmptyColors {
                palette: name.clone(),
            };
            let palette = Palette {
                front: ColorSet::new(front).ok_or_else(empty)?,
                background: ColorSet::new(background).ok_or_else(empty)?,
            };
            match palettes.entry(name) {
                Occupied(o) => {
                    let name = o.remove_entry().0;
                    return Err(WireFormatError::DuplicatePalette { name });
                }
                Vacant(v) => v.insert(palette),
            };
        }
        Ok(PaletteDb { palettes })
    }

    pub fn palette(&self, name: &str) -> Option<&Palette> {
        self.palettes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }
}
