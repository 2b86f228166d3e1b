//! CSS hex color parsing.

use peniko::Color;

/// Parse a CSS hex color string (`#rgb`, `#rrggbb`, or `#rrggbbaa`).
/// Unparseable strings fall back to opaque gray.
pub fn parse_hex_color(color: &str) -> Color {
    parse(color).unwrap_or(Color::from_rgba8(128, 128, 128, 255))
}

fn parse(color: &str) -> Option<Color> {
    let hex = color.strip_prefix('#')?;
    // Wire strings are arbitrary; multibyte input must not hit the
    // byte-range slices below.
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16));
            let r = digits.next()?? as u8;
            let g = digits.next()?? as u8;
            let b = digits.next()?? as u8;
            Some(Color::from_rgba8(r * 17, g * 17, b * 17, 255))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = if hex.len() == 8 {
                u8::from_str_radix(&hex[6..8], 16).ok()?
            } else {
                255
            };
            Some(Color::from_rgba8(r, g, b, a))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit() {
        assert_eq!(
            parse_hex_color("#4285f4").to_rgba8(),
            Color::from_rgba8(0x42, 0x85, 0xf4, 255).to_rgba8()
        );
    }

    #[test]
    fn test_parse_three_digit() {
        assert_eq!(
            parse_hex_color("#f00").to_rgba8(),
            Color::from_rgba8(255, 0, 0, 255).to_rgba8()
        );
    }

    #[test]
    fn test_parse_eight_digit_with_alpha() {
        assert_eq!(
            parse_hex_color("#00000080").to_rgba8(),
            Color::from_rgba8(0, 0, 0, 0x80).to_rgba8()
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_gray() {
        let gray = Color::from_rgba8(128, 128, 128, 255).to_rgba8();
        assert_eq!(parse_hex_color("red").to_rgba8(), gray);
        assert_eq!(parse_hex_color("#12345").to_rgba8(), gray);
        assert_eq!(parse_hex_color("#gggggg").to_rgba8(), gray);
    }

    #[test]
    fn test_multibyte_input_falls_back_to_gray() {
        let gray = Color::from_rgba8(128, 128, 128, 255).to_rgba8();
        // 6 bytes but not 6 ASCII digits; must not panic on slicing.
        assert_eq!(parse_hex_color("#aa\u{20ac}b").to_rgba8(), gray);
        assert_eq!(parse_hex_color("#€€€").to_rgba8(), gray);
    }
}
