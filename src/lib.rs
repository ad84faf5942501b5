pub mod canvas;
pub mod captcha;
pub mod color;
pub mod config;
pub mod distort;
pub mod error;
pub mod glyph;
pub mod math;
pub mod rand;

pub use captcha::{Captcha, DisturbLevel, Render, TextKind};
pub use error::CaptchaError;
