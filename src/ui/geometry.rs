//! Declared → resolved geometry
//!
//! A component declares each of x, y, width and height independently as an
//! absolute pixel value or a percentage of its parent. Resolution also needs
//! the parent's resolved size and the UI scale, so [`Geometry`] caches the
//! full input it last resolved from and recomputes whenever any part differs.

use crate::gfx::{Point, Rect, Size};
use anyhow::{bail, Context, Result};

/// One declared dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Px(i32),
    Percent(i32),
}

impl Dim {
    /// Parse `"42"` or `"42%"`
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        match value.strip_suffix('%') {
            Some(pct) => pct
                .trim()
                .parse()
                .map(Dim::Percent)
                .with_context(|| format!("Invalid percentage: {value:?}")),
            None => value
                .parse()
                .map(Dim::Px)
                .with_context(|| format!("Invalid pixel value: {value:?}")),
        }
    }

    /// Parse a `"x,y"` pair such as `"50%,50%"`
    pub fn parse_pair(value: &str) -> Result<(Dim, Dim)> {
        let Some((a, b)) = value.split_once(',') else {
            bail!("Expected \"a,b\" pair, got {value:?}");
        };
        Ok((Dim::parse(a)?, Dim::parse(b)?))
    }

    fn resolve(self, parent: i32, scale: f32, scaled: bool, fixed: bool) -> i32 {
        match self {
            Dim::Px(v) | Dim::Percent(v) if fixed => v,
            Dim::Px(v) if scaled => (v as f32 * scale).round() as i32,
            Dim::Px(v) => v,
            Dim::Percent(pct) => {
                (pct as i64 * parent as i64 / 100).clamp(i32::MIN as i64, i32::MAX as i64) as i32
            }
        }
    }
}

impl From<i32> for Dim {
    fn from(v: i32) -> Self {
        Dim::Px(v)
    }
}

/// Declared position and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declared {
    pub x: Dim,
    pub y: Dim,
    pub width: Dim,
    pub height: Dim,
}

impl Declared {
    pub fn new(x: impl Into<Dim>, y: impl Into<Dim>, width: impl Into<Dim>, height: impl Into<Dim>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
        }
    }

    /// Absolute pixels for everything
    pub fn px(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, width, height)
    }

    /// Parse `"x,y"` and `"w,h"` pairs
    pub fn parse(position: &str, size: &str) -> Result<Self> {
        let (x, y) = Dim::parse_pair(position)?;
        let (width, height) = Dim::parse_pair(size)?;
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Fill the parent
    pub fn full() -> Self {
        Self::new(0, 0, Dim::Percent(100), Dim::Percent(100))
    }
}

/// Horizontal and vertical UI scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    /// Physical over logical, per axis. A degenerate logical size yields identity.
    pub fn between(physical: Size, logical: Size) -> Self {
        if logical.width <= 0 || logical.height <= 0 {
            return Self::IDENTITY;
        }
        Self {
            x: physical.width as f32 / logical.width as f32,
            y: physical.height as f32 / logical.height as f32,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Resolution behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryFlags {
    /// Multiply absolute values by the UI scale
    pub resizable: bool,
    /// Skip percentage and scale logic entirely
    pub fixed_size: bool,
}

/// Everything a resolution depends on
#[derive(Debug, Clone, Copy, PartialEq)]
struct LayoutKey {
    declared: Declared,
    parent: Size,
    scale: Scale,
    flags: GeometryFlags,
}

/// Pure resolution of declared geometry against a parent
pub fn resolve(declared: &Declared, parent: Size, scale: Scale, flags: GeometryFlags) -> Rect {
    let GeometryFlags {
        resizable,
        fixed_size,
    } = flags;
    Rect::new(
        declared.x.resolve(parent.width, scale.x, resizable, fixed_size),
        declared.y.resolve(parent.height, scale.y, resizable, fixed_size),
        declared
            .width
            .resolve(parent.width, scale.x, resizable, fixed_size)
            .max(0),
        declared
            .height
            .resolve(parent.height, scale.y, resizable, fixed_size)
            .max(0),
    )
}

/// Declared geometry plus its cached resolution
#[derive(Debug, Clone)]
pub struct Geometry {
    declared: Declared,
    pub flags: GeometryFlags,
    cached: Option<LayoutKey>,
    computed: Rect,
}

impl Geometry {
    pub fn new(declared: Declared) -> Self {
        Self {
            declared,
            flags: GeometryFlags::default(),
            cached: None,
            computed: Rect::default(),
        }
    }

    pub fn declared(&self) -> &Declared {
        &self.declared
    }

    pub fn set_position(&mut self, x: impl Into<Dim>, y: impl Into<Dim>) {
        self.declared.x = x.into();
        self.declared.y = y.into();
    }

    pub fn set_size(&mut self, width: impl Into<Dim>, height: impl Into<Dim>) {
        self.declared.width = width.into();
        self.declared.height = height.into();
    }

    /// Last resolved rectangle, relative to the parent
    pub fn computed(&self) -> Rect {
        self.computed
    }

    pub fn position(&self) -> Point {
        self.computed.origin()
    }

    pub fn size(&self) -> Size {
        self.computed.size()
    }

    fn key(&self, parent: Size, scale: Scale) -> LayoutKey {
        LayoutKey {
            declared: self.declared,
            parent,
            scale,
            flags: self.flags,
        }
    }

    /// True when the cached resolution no longer matches the inputs
    pub fn is_stale(&self, parent: Size, scale: Scale) -> bool {
        self.cached != Some(self.key(parent, scale))
    }

    /// Unconditionally re-resolve
    pub fn refresh(&mut self, parent: Size, scale: Scale) -> Rect {
        let key = self.key(parent, scale);
        self.computed = resolve(&key.declared, parent, scale, key.flags);
        self.cached = Some(key);
        self.computed
    }

    /// Re-resolve only if stale. Returns true when the rectangle changed.
    pub fn sync(&mut self, parent: Size, scale: Scale) -> bool {
        if !self.is_stale(parent, scale) {
            return false;
        }
        let before = self.computed;
        self.refresh(parent, scale) != before
    }

    /// Force the next sync to recompute (orientation change, explicit refresh)
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_child_in_hundred_pixel_parent() {
        let declared = Declared::parse("50%,50%", "10%,10%").unwrap();
        let rect = resolve(
            &declared,
            Size::new(100, 100),
            Scale::IDENTITY,
            GeometryFlags::default(),
        );
        assert_eq!(rect, Rect::new(50, 50, 10, 10));
    }

    #[test]
    fn test_huge_percent_saturates() {
        let declared = Declared::new(Dim::Percent(50_000_000), 0, Dim::Percent(i32::MAX), 10);
        let rect = resolve(
            &declared,
            Size::new(240, 320),
            Scale::IDENTITY,
            GeometryFlags::default(),
        );
        assert_eq!(rect.x, 120_000_000);
        assert_eq!(rect.width, i32::MAX);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut g = Geometry::new(Declared::parse("33%,10", "25%,50%").unwrap());
        let first = g.refresh(Size::new(240, 280), Scale::IDENTITY);
        let second = g.refresh(Size::new(240, 280), Scale::IDENTITY);
        assert_eq!(first, second);
        assert_eq!(first, Rect::new(79, 10, 60, 140));
        assert!(!g.sync(Size::new(240, 280), Scale::IDENTITY));
    }

    #[test]
    fn test_stale_on_any_input_change() {
        let mut g = Geometry::new(Declared::new(0, 0, Dim::Percent(50), 20));
        g.refresh(Size::new(100, 100), Scale::IDENTITY);

        assert!(g.is_stale(Size::new(200, 100), Scale::IDENTITY));
        assert!(g.is_stale(Size::new(100, 100), Scale { x: 2.0, y: 1.0 }));

        g.set_size(Dim::Percent(60), 20);
        assert!(g.is_stale(Size::new(100, 100), Scale::IDENTITY));
        assert!(g.sync(Size::new(100, 100), Scale::IDENTITY));
        assert_eq!(g.size(), Size::new(60, 20));
    }

    #[test]
    fn test_scale_applies_only_to_resizable_pixels() {
        let declared = Declared::new(10, 10, 20, Dim::Percent(50));
        let scale = Scale { x: 2.0, y: 1.5 };

        let plain = resolve(&declared, Size::new(100, 100), scale, GeometryFlags::default());
        assert_eq!(plain, Rect::new(10, 10, 20, 50));

        let flags = GeometryFlags {
            resizable: true,
            fixed_size: false,
        };
        let scaled = resolve(&declared, Size::new(100, 100), scale, flags);
        assert_eq!(scaled, Rect::new(20, 15, 40, 50));
    }

    #[test]
    fn test_fixed_size_ignores_parent_and_scale() {
        let declared = Declared::px(0, 0, 240, 280);
        let flags = GeometryFlags {
            resizable: true,
            fixed_size: true,
        };
        let rect = resolve(&declared, Size::new(10, 10), Scale { x: 3.0, y: 3.0 }, flags);
        assert_eq!(rect, Rect::new(0, 0, 240, 280));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Dim::parse("abc").is_err());
        assert!(Dim::parse("5x%").is_err());
        assert!(Dim::parse_pair("50%").is_err());
        assert_eq!(Dim::parse(" 12% ").unwrap(), Dim::Percent(12));
    }
}
