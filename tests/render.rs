use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::ImageFormat;

use warpcap::canvas::PixelCanvas;
use warpcap::color::Color;
use warpcap::distort::{distort, Wave};
use warpcap::glyph::PixelFont;
use warpcap::rand::Rng;
use warpcap::{Captcha, DisturbLevel};

fn captcha(width: i32, height: i32) -> Captcha {
    let mut captcha = Captcha::new();
    captcha.add_glyph_source(PixelFont);
    captcha.add_glyph_source(PixelFont);
    captcha.set_size(width, height);
    captcha
}

fn temp_png(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("warpcap-{}-{}.png", std::process::id(), name))
}

fn read_png(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
    );
    let reader = image::io::Reader::with_format(reader, ImageFormat::Png);
    Ok(reader.decode().context("Failed to decode image")?.into_rgba8())
}

#[test]
fn output_has_requested_size() -> anyhow::Result<()> {
    for (w, h) in [(48, 20), (82, 32), (160, 60), (300, 41)] {
        let render = captcha(w, h).draw("Size", &mut Rng::from_seed(b"size"))?;
        assert_eq!(render.canvas.size(), (w, h));
    }
    Ok(())
}

#[test]
fn undersized_requests_are_clamped() -> anyhow::Result<()> {
    let render = captcha(1, 1).draw("ab", &mut Rng::from_seed(b"tiny"))?;
    assert_eq!(render.canvas.size(), (48, 20));
    Ok(())
}

#[test]
fn clock_seeded_entry_point() -> anyhow::Result<()> {
    let image = captcha(82, 32).create_image("A1b2")?;
    assert_eq!(image.size(), (82, 32));
    Ok(())
}

/// Black text on white at the default size: the result must not be blank, must contain dark
/// pixels, and must differ from the same scene composed without the warp.
#[test]
fn default_scene_is_warped_and_visible() -> anyhow::Result<()> {
    let mut captcha = captcha(82, 32);
    captcha.set_disturbance(DisturbLevel::NORMAL);
    captcha.set_front_colors(vec![Color::BLACK]);
    captcha.set_background_colors(vec![Color::WHITE]);
    let render = captcha.draw("A1b2", &mut Rng::from_seed(b"example"))?;

    assert_eq!(render.canvas.size(), (82, 32));
    assert_eq!(render.glyphs.len(), 4);
    assert!(render.skipped.is_empty());

    let white = Color::WHITE.to_premultiplied();
    assert!(render.canvas.data().iter().any(|&p| p != white));

    let dark = (0..32)
        .flat_map(|y| (0..82).map(move |x| (x, y)))
        .filter_map(|(x, y)| render.canvas.pixel(x, y))
        .filter(|c| c.luma() < 64.0)
        .count();
    assert!(dark > 0, "no pixel near the front color");

    let mut plain = PixelCanvas::new(82, 32)?;
    plain.fill(Color::WHITE);
    plain.blit(0, 0, &render.layer);
    assert_ne!(plain.data(), render.canvas.data());
    Ok(())
}

#[test]
fn distortion_of_a_render_is_repeatable() -> anyhow::Result<()> {
    let render = captcha(82, 32).draw("Wave", &mut Rng::from_seed(b"repeat"))?;
    let wave = Wave {
        amplitude: 4.0,
        period: 90.0,
    };
    let mut a = PixelCanvas::new(82, 32)?;
    let mut b = PixelCanvas::new(82, 32)?;
    distort(&render.layer, &mut a, wave);
    distort(&render.layer, &mut b, wave);
    assert_eq!(a.data(), b.data());
    Ok(())
}

#[test]
fn png_bytes_round_trip() -> anyhow::Result<()> {
    let render = captcha(82, 32).draw("R0und", &mut Rng::from_seed(b"png"))?;
    let png = render.canvas.encode_png()?;
    let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)?.into_rgba8();
    assert_eq!(decoded, render.canvas.to_rgba_image());
    Ok(())
}

#[test]
fn written_png_round_trips() -> anyhow::Result<()> {
    let render = captcha(100, 40).draw("File", &mut Rng::from_seed(b"file"))?;
    let path = temp_png("round-trip");
    render.canvas.write_png(&path)?;
    let decoded = read_png(&path);
    std::fs::remove_file(&path).ok();
    let decoded = decoded?;

    assert_eq!((decoded.width(), decoded.height()), (100, 40));
    for (x, y, px) in decoded.enumerate_pixels() {
        let c = render
            .canvas
            .pixel(x as i32, y as i32)
            .context("pixel out of range")?;
        assert_eq!(px.0, [c.r, c.g, c.b, c.a], "at ({}, {})", x, y);
    }
    Ok(())
}

#[test]
fn translucent_png_file_matches_pixels() -> anyhow::Result<()> {
    let mut captcha = captcha(82, 32);
    captcha.set_background_colors(vec![
        Color::rgba(255, 255, 255, 128),
        Color::rgba(200, 100, 50, 128),
        Color::rgba(10, 250, 130, 200),
    ]);
    let render = captcha.draw("Alfa", &mut Rng::from_seed(b"alpha"))?;
    let path = temp_png("translucent");
    render.canvas.write_png(&path)?;
    let written = std::fs::read(&path);
    let decoded = read_png(&path);
    std::fs::remove_file(&path).ok();
    let (written, decoded) = (written?, decoded?);

    assert_eq!(written, render.canvas.encode_png()?);
    assert!(decoded.pixels().any(|px| px.0[3] < 255), "scene is opaque");
    assert_eq!(decoded, render.canvas.to_rgba_image());
    Ok(())
}
