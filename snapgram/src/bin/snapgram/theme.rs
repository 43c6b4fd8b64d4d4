use colored::Color;

/// CLI color theme configuration
pub struct ColorTheme {
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

pub const THEME: ColorTheme = ColorTheme {
    error: Color::Red,
    warning: Color::Yellow,
    info: Color::Blue,
};

/// Icons for different message types
pub struct Icons {
    pub warning: &'static str,
    pub info: &'static str,
    pub heart: &'static str,
}

pub const ICONS: Icons = Icons {
    warning: "⚠",
    info: "ℹ",
    heart: "♥",
};
