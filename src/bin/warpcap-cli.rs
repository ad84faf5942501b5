use core::fmt::Debug;
use std::path::PathBuf;
use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use clap::Parser;
use log::info;

use warpcap::captcha::{Captcha, TextKind};
use warpcap::color::PaletteDb;
use warpcap::rand::Rng;

#[derive(Parser)]
struct Opts {
    /// Text to render. A random string is generated (and printed) when omitted.
    text: Option<String>,
    /// Hex seed for a reproducible image; seeded from the clock otherwise.
    #[clap(long)]
    seed: Option<Seed>,
    #[clap(short, long, default_value = "captcha.png")]
    output: PathBuf,
    /// Length of generated text.
    #[clap(long, default_value = "4")]
    length: usize,
    /// Character range of generated text.
    #[clap(long, value_enum, default_value = "all")]
    kind: TextKind,
    #[clap(flatten)]
    config: warpcap::config::Config,
}

#[derive(Clone)]
struct Seed(pub Vec<u8>);
impl Seed {
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
impl FromStr for Seed {
    type Err = anyhow::Error;
    fn from_str(mut s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            s = &s[2..];
        }
        let bytes: Vec<u8> = hex::decode(s).context("seed must be hex")?;
        Ok(Seed(bytes))
    }
}
impl Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("0x")?;
        f.write_str(&hex::encode(&self.0))
    }
}
impl Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    let palettes = PaletteDb::from_bundle();
    let mut captcha = Captcha::from_config(&opts.config, &palettes).with_context(|| {
        let mut names: Vec<&str> = palettes.names().collect();
        names.sort_unstable();
        format!("invalid configuration (palettes: {})", names.join(", "))
    })?;
    if captcha.font_count() == 0 {
        info!("no --font given; using the built-in pixel font");
        captcha.add_glyph_source(warpcap::glyph::PixelFont);
    }

    let mut rng = match &opts.seed {
        Some(seed) => {
            info!("seed: {}", seed);
            Rng::from_seed(seed.as_bytes())
        }
        None => Rng::from_time(),
    };

    let (render, text) = match opts.text {
        Some(text) => (captcha.draw(&text, &mut rng)?, text),
        None => {
            let (render, text) = captcha.create(opts.length, opts.kind, &mut rng)?;
            println!("{}", text);
            (render, text)
        }
    };
    if !render.skipped.is_empty() {
        info!("skipped characters without glyphs: {:?}", render.skipped);
    }

    render.canvas.write_png(&opts.output)?;
    info!(
        "wrote png: {} ({} chars, {}x{})",
        opts.output.display(),
        text.chars().count(),
        render.canvas.width(),
        render.canvas.height()
    );
    Ok(())
}
