//! Deterministic code -> color assignment.
//!
//! Cell colors are derived by hashing the interned block code, so a given
//! code always renders the same color within a session without a lookup
//! table. Codes are pass-scoped (the interner reassigns them on every
//! rebuild), so nothing here relies on code-to-color identity surviving a
//! rebuild -- after one, the diff renderer is invalidated and every visible
//! cell is recolored anyway.

use super::Rgba;

/// Saturation for generated cell colors.
const SATURATION: f32 = 0.55;

/// Lightness for generated cell colors.
const LIGHTNESS: f32 = 0.50;

/// The color for an interned block code.
///
/// Hashes the code with BLAKE3 and maps the first two digest bytes to a hue,
/// at fixed saturation and lightness. Code 0 is "empty" and is never shown,
/// but hashing it is still well-defined.
pub fn color_for_code(code: u32) -> Rgba {
    let digest = blake3::hash(&code.to_le_bytes());
    let bytes = digest.as_bytes();
    let hue = u16::from_le_bytes([bytes[0], bytes[1]]) as f32 / u16::MAX as f32 * 360.0;
    let [r, g, b] = hsl_to_rgb(hue, SATURATION, LIGHTNESS);
    [r, g, b, 1.0]
}

/// Convert HSL (`h` in degrees, `s`/`l` in `0..=1`) to RGB in `0..=1`.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = (h / 60.0) % 6.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r1 + m, g1 + m, b1 + m]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
