use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CaptchaError {
    InvalidDimension { width: i32, height: i32 },
    FontParse(String),
    FontIo {
        path: PathBuf,
        source: std::io::Error,
    },
    NoFonts,
    GlyphNotFound(char),
    UnknownPalette(String),
    Encode(image::ImageError),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CaptchaError {
    /// Whether this error comes from the caller's configuration rather than from rendering.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::FontParse(_) | Self::FontIo { .. } | Self::NoFonts | Self::UnknownPalette(_)
        )
    }
}

impl fmt::Display for CaptchaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { width, height } => {
                write!(f, "invalid canvas dimensions {}x{}", width, height)
            }
            Self::FontParse(msg) => write!(f, "failed to parse font: {}", msg),
            Self::FontIo { path, .. } => write!(f, "failed to read font {}", path.display()),
            Self::NoFonts => f.write_str("no fonts configured; add at least one before rendering"),
            Self::GlyphNotFound(ch) => {
                write!(f, "no glyph for U+{:04X} ({})", *ch as u32, ch.escape_default())
            }
            Self::UnknownPalette(name) => write!(f, "unknown palette {:?}", name),
            Self::Encode(_) => f.write_str("failed to encode image"),
            Self::Write { path, .. } => write!(f, "failed to write {}", path.display()),
        }
    }
}

impl std::error::Error for CaptchaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontIo { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for CaptchaError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_classification() {
        assert!(CaptchaError::NoFonts.is_config_error());
        assert!(CaptchaError::FontParse("bad magic".into()).is_config_error());
        assert!(!CaptchaError::GlyphNotFound('x').is_config_error());
        assert!(!CaptchaError::InvalidDimension {
            width: 0,
            height: 1
        }
        .is_config_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CaptchaError::GlyphNotFound('é').to_string(),
            "no glyph for U+00E9 (\\u{e9})"
        );
        assert_eq!(
            CaptchaError::InvalidDimension {
                width: 0,
                height: 20
            }
            .to_string(),
            "invalid canvas dimensions 0x20"
        );
    }
}
