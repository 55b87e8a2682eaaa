// Display boundary
//
// Everything the shell needs from the physical screen: raw pointer input,
// presenting a finished framebuffer, and the screen size. Two backends:
//
// - HeadlessDisplay  scripted input, keeps frames in memory (tests, --headless)
// - TerminalDisplay  crossterm + ratatui, two pixels per character cell

mod memory;
mod terminal;

pub use memory::HeadlessDisplay;
pub use terminal::{restore_terminal, TerminalDisplay};

use crate::gfx::{Point, Size, Surface};
use anyhow::Result;

/// Input as the display reports it, before the press-track state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    /// The screen changed size (or was re-laid out); the payload is the new size
    Resize(Size),
    /// The user asked to leave the shell
    Quit,
}

pub trait Display {
    /// Screen size in pixels
    fn size(&self) -> Size;

    /// Next pending input, without blocking
    fn poll(&mut self) -> Result<Option<RawInput>>;

    /// Show a finished frame
    fn present(&mut self, frame: &Surface) -> Result<()>;

    /// Whether a user can answer prompts (recovery panel, dialogs)
    fn is_interactive(&self) -> bool;

    /// Release the screen. Safe to call more than once.
    fn shutdown(&mut self) -> Result<()>;
}
