//! Explicit dimensions on rendered SVG.
//!
//! Hosts display and rasterize the markup standalone, so the root `<svg>`
//! must carry `width` and `height`. Engines that only emit a `viewBox` get
//! the requested size injected.

use std::sync::LazyLock;

use regex::Regex;

use super::EngineError;

static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg(?:[ \t\r\n][^>]*)?>").expect("valid regex"));
static WIDTH_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n]width[ \t\r\n]*=").expect("valid regex"));
static HEIGHT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n]height[ \t\r\n]*=").expect("valid regex"));

/// Return `svg` with `width`/`height` on the root element, adding whichever
/// is missing. Existing values are left untouched.
pub fn ensure_dimensions(svg: &str, width: f64, height: f64) -> Result<String, EngineError> {
    let Some(tag) = SVG_OPEN_TAG.find(svg) else {
        return Err(EngineError::Render(
            "engine output has no <svg> root element".into(),
        ));
    };

    let tag_text = tag.as_str();
    let has_width = WIDTH_ATTR.is_match(tag_text);
    let has_height = HEIGHT_ATTR.is_match(tag_text);
    if has_width && has_height {
        return Ok(svg.to_string());
    }

    let mut injected = String::new();
    if !has_width {
        injected.push_str(&format!(" width=\"{}\"", format_number(width)));
    }
    if !has_height {
        injected.push_str(&format!(" height=\"{}\"", format_number(height)));
    }

    // Insert right after `<svg`
    let at = tag.start() + "<svg".len();
    let mut out = String::with_capacity(svg.len() + injected.len());
    out.push_str(&svg[..at]);
    out.push_str(&injected);
    out.push_str(&svg[at..]);
    Ok(out)
}

/// Format a dimension without a trailing `.0` for whole numbers.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
