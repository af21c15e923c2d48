use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::BrightBlue;
pub const IPV6_ADDR: Color = Color::BrightMagenta;
pub const HOSTNAME: Color = Color::Cyan;

pub const OUTCOME_SUCCESS: Color = Color::Green;
pub const OUTCOME_TIMEOUT: Color = Color::Yellow;
pub const OUTCOME_ERROR: Color = Color::Red;
