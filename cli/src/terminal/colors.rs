use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 94, g: 176, b: 255 };
pub const SECONDARY: Color = Color::TrueColor { r: 170, g: 140, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 196, b: 87 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 214, g: 214, b: 214 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 110, g: 220, b: 170 };
pub const HOSTNAME: Color = PRIMARY;
pub const UNKNOWN: Color = Color::BrightBlack;
pub const ONLINE: Color = Color::Green;

/// Round trip time buckets: below 10 ms, below 100 ms, anything slower.
pub const LATENCY_FAST: Color = Color::Green;
pub const LATENCY_MEDIUM: Color = Color::Yellow;
pub const LATENCY_SLOW: Color = Color::Red;

pub fn latency(response_time_ms: f64) -> Color {
    match response_time_ms {
        ms if ms < 10.0 => LATENCY_FAST,
        ms if ms < 100.0 => LATENCY_MEDIUM,
        _ => LATENCY_SLOW,
    }
}
