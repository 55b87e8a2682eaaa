//! Pixel primitives shared by every layer above the display
//!
//! Coordinates are signed so off-surface geometry (scrolled content, negative
//! offsets) can be expressed and clipped instead of wrapping.

pub mod font;
pub mod palette;

pub use font::{BlockFont, FontCache};
pub use palette::{Paint, Palette, Role, Scheme, Shade};

// ─────────────────────────────────────────────────────────────────────────────
// Geometry primitives
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA colour, straight (non-premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Shift every channel by `delta`, clamped to 0..=255. Alpha is untouched.
    pub fn shifted(self, delta: i16) -> Self {
        let shift = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
        Self {
            r: shift(self.r),
            g: shift(self.g),
            b: shift(self.b),
            a: self.a,
        }
    }

    /// Composite `self` over `dst`
    pub fn over(self, dst: Color) -> Color {
        match self.a {
            255 => self,
            0 => dst,
            a => {
                let a = a as u32;
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
                Color {
                    r: mix(self.r, dst.r),
                    g: mix(self.g, dst.g),
                    b: mix(self.b, dst.b),
                    a: (a + dst.a as u32 * inv / 255).min(255) as u8,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }

    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }

    pub fn translated(&self, by: Point) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surface
// ─────────────────────────────────────────────────────────────────────────────

/// Owned pixel buffer
///
/// Every component renders into one of these, and the shell composes them into
/// the framebuffer it hands to the display.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    size: Size,
    pixels: Vec<Color>,
}

impl Surface {
    /// Create a fully transparent surface. Negative sizes clamp to zero.
    pub fn new(size: Size) -> Self {
        let size = Size::new(size.width.max(0), size.height.max(0));
        Self {
            size,
            pixels: vec![Color::TRANSPARENT; (size.width * size.height) as usize],
        }
    }

    pub fn filled(size: Size, color: Color) -> Self {
        let mut surface = Self::new(size);
        surface.fill(color);
        surface
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Reallocate if the size changed. Returns true when a new buffer was made.
    pub fn ensure_size(&mut self, size: Size) -> bool {
        if self.size == size {
            return false;
        }
        *self = Surface::new(size);
        true
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some((y * self.size.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Overwrite a pixel (no blending)
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Blend a rectangle of `color` onto the surface, clipped to bounds
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width).min(self.size.width);
        let y1 = (rect.y + rect.height).min(self.size.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let i = (y * self.size.width + x) as usize;
                self.pixels[i] = color.over(self.pixels[i]);
            }
        }
    }

    /// Draw an inset frame `width` pixels thick along the surface edges
    pub fn draw_border(&mut self, width: i32, color: Color) {
        if width <= 0 {
            return;
        }
        let Size {
            width: w,
            height: h,
        } = self.size;
        self.fill_rect(Rect::new(0, 0, w, width), color);
        self.fill_rect(Rect::new(0, h - width, w, width), color);
        self.fill_rect(Rect::new(0, width, width, h - 2 * width), color);
        self.fill_rect(Rect::new(w - width, width, width, h - 2 * width), color);
    }

    /// Alpha-composite `src` with its top-left corner at `at`, clipped
    pub fn blit(&mut self, src: &Surface, at: Point) {
        let x0 = at.x.max(0);
        let y0 = at.y.max(0);
        let x1 = (at.x + src.size.width).min(self.size.width);
        let y1 = (at.y + src.size.height).min(self.size.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let s = src.pixels[((y - at.y) * src.size.width + (x - at.x)) as usize];
                let i = (y * self.size.width + x) as usize;
                self.pixels[i] = s.over(self.pixels[i]);
            }
        }
    }

    /// Nearest-neighbour rescale
    pub fn scaled(&self, size: Size) -> Surface {
        let mut out = Surface::new(size);
        if self.size.width == 0 || self.size.height == 0 {
            return out;
        }
        for y in 0..out.size.height {
            let sy = y * self.size.height / out.size.height.max(1);
            for x in 0..out.size.width {
                let sx = x * self.size.width / out.size.width.max(1);
                out.pixels[(y * out.size.width + x) as usize] =
                    self.pixels[(sy * self.size.width + sx) as usize];
            }
        }
        out
    }
}
