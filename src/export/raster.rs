//! SVG rasterization.
//!
//! Views are flattened onto an opaque theme background so the same pixels
//! serve both PNG export and PDF page images.

use std::io::Cursor;
use std::sync::{Arc, LazyLock};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use resvg::tiny_skia::{Color, Pixmap, Transform};

use crate::engine::{EngineError, Theme};

/// System fonts, loaded once per process.
static FONTS: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    crate::debug!("export"; "loaded {} font faces", db.len());
    Arc::new(db)
});

fn options() -> usvg::Options<'static> {
    let mut options = usvg::Options::default();
    options.fontdb = Arc::clone(&FONTS);
    options
}

/// Rasterize `svg` at `scale` onto the theme's background color.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize(svg: &str, theme: Theme, scale: f32) -> Result<RgbImage, EngineError> {
    let tree = usvg::Tree::from_str(svg, &options())
        .map_err(|e| EngineError::Render(format!("invalid svg: {e}")))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    if width == 0 || height == 0 {
        return Err(EngineError::Render(format!(
            "empty raster size {width}x{height}"
        )));
    }

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| EngineError::Render(format!("cannot allocate {width}x{height} canvas")))?;
    let [r, g, b] = theme.background();
    pixmap.fill(Color::from_rgba8(r, g, b, 255));
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    // Opaque background, so premultiplied and straight alpha coincide
    let rgba = RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| EngineError::Render("pixel buffer size mismatch".into()))?;
    Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
}

/// Rasterize and PNG-encode `svg`.
pub fn encode_png(svg: &str, theme: Theme, scale: f32) -> Result<Vec<u8>, EngineError> {
    let image = rasterize(svg, theme, scale)?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| EngineError::Render(format!("png encoding failed: {e}")))?;
    Ok(bytes)
}
