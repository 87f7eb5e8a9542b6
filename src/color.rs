//! Hex color parsing for draw options.

/// Shadow pass color: dark gray, fully opaque.
pub const SHADOW_COLOR: [f32; 4] = [0.266, 0.266, 0.266, 1.0];

/// Used when a draw color fails to parse.
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Parse "#RRGGBB" or "#RGB" (leading `#` optional). Returns None on invalid input.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !hex.is_ascii() {
        return None;
    }
    let digit = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    match hex.len() {
        6 => Some([digit(0..2)?, digit(2..4)?, digit(4..6)?]),
        3 => Some([digit(0..1)? * 17, digit(1..2)? * 17, digit(2..3)? * 17]),
        _ => None,
    }
}

/// Opaque RGBA in 0.0-1.0 for a hex color, without any color-space conversion.
pub fn hex_to_rgba(s: &str) -> Option<[f32; 4]> {
    let [r, g, b] = parse_hex_color(s)?;
    Some([
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        1.0,
    ])
}
