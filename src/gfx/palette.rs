//! Colour schemes and role-based colour lookup
//!
//! Widgets never store concrete colours for themed parts. They store a
//! [`Paint`] naming a role and a shade, and resolve it against the active
//! [`Palette`] each render, so switching scheme recolours the whole tree.

use super::Color;
use std::collections::HashMap;

/// Named colour scheme an application can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    #[default]
    Normal,
    Dark,
    Light,
}

impl Scheme {
    pub const ALL: [Scheme; 3] = [Scheme::Normal, Scheme::Dark, Scheme::Light];

    /// Parse a scheme name. Unknown names return None so callers can log them.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Semantic colour slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Background,
    Item,
    Accent,
    Warning,
    Error,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Background,
        Role::Item,
        Role::Accent,
        Role::Warning,
        Role::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Item => "item",
            Self::Accent => "accent",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Brightness modifier, blending toward black (negative) or white (positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shade {
    Darkest,
    Darker,
    Dark,
    #[default]
    Normal,
    Light,
    Lighter,
    Lightest,
}

impl Shade {
    /// Blend factor in quarters: -3..=3
    fn quarters(&self) -> i32 {
        match self {
            Self::Darkest => -3,
            Self::Darker => -2,
            Self::Dark => -1,
            Self::Normal => 0,
            Self::Light => 1,
            Self::Lighter => 2,
            Self::Lightest => 3,
        }
    }

    fn apply(&self, c: Color) -> Color {
        let q = self.quarters();
        if q == 0 {
            return c;
        }
        let target: i32 = if q < 0 { 0 } else { 255 };
        let amount = q.abs();
        let mix = |v: u8| (v as i32 + (target - v as i32) * amount / 4) as u8;
        Color::rgba(mix(c.r), mix(c.g), mix(c.b), c.a)
    }
}

/// A colour as declared on a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Role(Role, Shade),
    Rgb(Color),
}

impl Paint {
    pub const fn role(role: Role) -> Self {
        Paint::Role(role, Shade::Normal)
    }
}

impl From<Role> for Paint {
    fn from(role: Role) -> Self {
        Paint::role(role)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Rgb(color)
    }
}

/// Built-in colour for a scheme/role pair
fn builtin(scheme: Scheme, role: Role) -> Color {
    match (scheme, role) {
        (Scheme::Normal, Role::Background) => Color::rgb(200, 200, 200),
        (Scheme::Normal, Role::Item) => Color::rgb(20, 20, 20),
        (Scheme::Normal, Role::Accent) => Color::rgb(100, 100, 200),
        (Scheme::Normal, Role::Warning) => Color::rgb(250, 160, 45),
        (Scheme::Normal, Role::Error) => Color::rgb(250, 50, 50),

        (Scheme::Dark, Role::Background) => Color::rgb(50, 50, 50),
        (Scheme::Dark, Role::Item) => Color::rgb(220, 220, 220),
        (Scheme::Dark, Role::Accent) => Color::rgb(50, 50, 150),
        (Scheme::Dark, Role::Warning) => Color::rgb(200, 110, 0),
        (Scheme::Dark, Role::Error) => Color::rgb(200, 0, 0),

        (Scheme::Light, Role::Background) => Color::rgb(250, 250, 250),
        (Scheme::Light, Role::Item) => Color::rgb(50, 50, 50),
        (Scheme::Light, Role::Accent) => Color::rgb(150, 150, 250),
        (Scheme::Light, Role::Warning) => Color::rgb(250, 210, 95),
        (Scheme::Light, Role::Error) => Color::rgb(250, 100, 100),
    }
}

/// Process-wide palette: active scheme plus per-scheme overrides from config
#[derive(Debug, Clone, Default)]
pub struct Palette {
    scheme: Scheme,
    overrides: HashMap<(Scheme, Role), Color>,
}

impl Palette {
    pub fn new(overrides: HashMap<(Scheme, Role), Color>) -> Self {
        Self {
            scheme: Scheme::Normal,
            overrides,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn set_scheme(&mut self, scheme: Scheme) {
        if self.scheme != scheme {
            tracing::debug!(from = self.scheme.as_str(), to = scheme.as_str(), "Palette scheme switched");
        }
        self.scheme = scheme;
    }

    pub fn color(&self, role: Role) -> Color {
        self.overrides
            .get(&(self.scheme, role))
            .copied()
            .unwrap_or_else(|| builtin(self.scheme, role))
    }

    pub fn shade(&self, role: Role, shade: Shade) -> Color {
        shade.apply(self.color(role))
    }

    pub fn resolve(&self, paint: Paint) -> Color {
        match paint {
            Paint::Role(role, shade) => self.shade(role, shade),
            Paint::Rgb(color) => color,
        }
    }
}

/// Parse `#rrggbb` / `rrggbb` (optionally `#rrggbbaa`)
pub fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_switch_changes_role_colors() {
        let mut palette = Palette::default();
        assert_eq!(palette.color(Role::Background), Color::rgb(200, 200, 200));

        palette.set_scheme(Scheme::Dark);
        assert_eq!(palette.color(Role::Background), Color::rgb(50, 50, 50));
        assert_eq!(
            palette.resolve(Paint::role(Role::Item)),
            Color::rgb(220, 220, 220)
        );
    }

    #[test]
    fn test_overrides_apply_only_to_their_scheme() {
        let mut overrides = HashMap::new();
        overrides.insert((Scheme::Light, Role::Accent), Color::rgb(1, 2, 3));
        let mut palette = Palette::new(overrides);

        assert_eq!(palette.color(Role::Accent), Color::rgb(100, 100, 200));
        palette.set_scheme(Scheme::Light);
        assert_eq!(palette.color(Role::Accent), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_shades_blend_toward_extremes() {
        let palette = Palette::default();
        // 200 -> halfway to black
        assert_eq!(
            palette.shade(Role::Background, Shade::Darker),
            Color::rgb(100, 100, 100)
        );
        // 20 + (235 * 3 / 4)
        assert_eq!(
            palette.shade(Role::Item, Shade::Lightest),
            Color::rgb(196, 196, 196)
        );
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(parse_hex("00000080"), Some(Color::rgba(0, 0, 0, 128)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("zzzzzz"), None);
        assert_eq!(Scheme::from_name("DARK"), Some(Scheme::Dark));
        assert_eq!(Scheme::from_name("sepia"), None);
    }
}
