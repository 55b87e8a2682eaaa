// Terminal display
//
// The framebuffer is scaled to fit the terminal (keeping its aspect ratio)
// and drawn with upper half blocks: each cell shows two vertical pixels, the
// top one as foreground and the bottom one as background. Mouse positions
// are mapped back through the same viewport.

use super::{Display, RawInput};
use crate::gfx::{Color, Point, Size, Surface};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, buffer::Buffer, layout::Rect, widgets::Widget, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Logical screen the shell draws at
    screen: Size,
    /// Cells the last frame occupied
    viewport: Rect,
    active: bool,
}

impl TerminalDisplay {
    /// Take over the terminal: raw mode, alternate screen, mouse capture
    pub fn new(screen: Size) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;
        tracing::debug!(width = screen.width, height = screen.height, "Terminal display ready");

        Ok(Self {
            terminal,
            screen,
            viewport: Rect::default(),
            active: true,
        })
    }

    fn translate_mouse(&self, mouse: MouseEvent) -> Option<RawInput> {
        translate_mouse(self.viewport, self.screen, mouse)
    }
}

/// Map a cell position to a screen pixel. Cells in the letterbox margin map
/// to `None` unless `clamp` pulls them onto the nearest edge.
fn to_pixel(vp: Rect, screen: Size, column: u16, row: u16, clamp: bool) -> Option<Point> {
    if vp.width == 0 || vp.height == 0 {
        return None;
    }
    let inside = column >= vp.x && column < vp.x + vp.width && row >= vp.y && row < vp.y + vp.height;
    if !inside && !clamp {
        return None;
    }
    let col = column.saturating_sub(vp.x).min(vp.width - 1) as i32;
    let row = row.saturating_sub(vp.y).min(vp.height - 1) as i32;
    Some(Point::new(
        col * screen.width / vp.width as i32,
        row * 2 * screen.height / (vp.height as i32 * 2),
    ))
}

/// Presses only start on the framebuffer; moves and releases outside it are
/// clamped so a press in progress still ends
fn translate_mouse(vp: Rect, screen: Size, mouse: MouseEvent) -> Option<RawInput> {
    let at = |clamp| to_pixel(vp, screen, mouse.column, mouse.row, clamp);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => at(false).map(RawInput::PointerDown),
        MouseEventKind::Drag(MouseButton::Left) => at(true).map(RawInput::PointerMove),
        MouseEventKind::Up(MouseButton::Left) => at(true).map(RawInput::PointerUp),
        _ => None,
    }
}

fn is_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Largest cell rectangle with the screen's aspect ratio, centred in `area`
fn fit(area: Rect, screen: Size) -> Rect {
    if screen.width <= 0 || screen.height <= 0 || area.width == 0 || area.height == 0 {
        return Rect::default();
    }
    let avail_w = area.width as f64;
    let avail_h = area.height as f64 * 2.0;
    let scale = (avail_w / screen.width as f64).min(avail_h / screen.height as f64);
    let width = ((screen.width as f64 * scale) as u16).clamp(1, area.width);
    let height = ((screen.height as f64 * scale / 2.0) as u16).clamp(1, area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// A pre-scaled framebuffer, two pixel rows per cell row
struct HalfBlocks<'a>(&'a Surface);

fn to_terminal(c: Color) -> ratatui::style::Color {
    let c = c.over(Color::BLACK);
    ratatui::style::Color::Rgb(c.r, c.g, c.b)
}

impl Widget for HalfBlocks<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let top = self.0.get(col as i32, row as i32 * 2).unwrap_or(Color::BLACK);
                let bottom = self
                    .0
                    .get(col as i32, row as i32 * 2 + 1)
                    .unwrap_or(Color::BLACK);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(to_terminal(top))
                        .set_bg(to_terminal(bottom));
                }
            }
        }
    }
}

impl Display for TerminalDisplay {
    fn size(&self) -> Size {
        self.screen
    }

    fn poll(&mut self) -> Result<Option<RawInput>> {
        while event::poll(Duration::ZERO).context("Failed to poll terminal events")? {
            let input = match event::read().context("Failed to read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press && is_quit(key) => Some(RawInput::Quit),
                Event::Mouse(mouse) => self.translate_mouse(mouse),
                Event::Resize(columns, rows) => {
                    tracing::debug!(columns, rows, "Terminal resized");
                    self.terminal.autoresize().context("Failed to resize terminal")?;
                    Some(RawInput::Resize(self.screen))
                }
                _ => None,
            };
            if input.is_some() {
                return Ok(input);
            }
        }
        Ok(None)
    }

    fn present(&mut self, frame: &Surface) -> Result<()> {
        let screen = self.screen;
        let mut viewport = self.viewport;
        self.terminal
            .draw(|f| {
                viewport = fit(f.area(), screen);
                let scaled = frame.scaled(Size::new(viewport.width as i32, viewport.height as i32 * 2));
                f.render_widget(HalfBlocks(&scaled), viewport);
            })
            .context("Failed to draw terminal")?;
        self.viewport = viewport;
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn shutdown(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .context("Failed to restore terminal")?;
        self.terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Best-effort terminal restore for the panic hook, where the display
/// itself is out of reach
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_and_centres() {
        // 240x320 pixels in 80x24 cells → 48 pixel rows available → 36x24 cells
        let vp = fit(Rect::new(0, 0, 80, 24), Size::new(240, 320));
        assert_eq!(vp.height, 24);
        assert_eq!(vp.width, 36);
        assert_eq!(vp.x, 22);
        assert_eq!(vp.y, 0);
    }

    #[test]
    fn test_fit_degenerate() {
        assert_eq!(fit(Rect::new(0, 0, 0, 10), Size::new(10, 10)), Rect::default());
        assert_eq!(fit(Rect::new(0, 0, 10, 10), Size::new(0, 10)), Rect::default());
    }

    #[test]
    fn test_margin_press_is_ignored() {
        let vp = fit(Rect::new(0, 0, 80, 24), Size::new(240, 320));
        let screen = Size::new(240, 320);
        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        // Left of the viewport (x=22) is letterbox
        let down = MouseEventKind::Down(MouseButton::Left);
        assert_eq!(translate_mouse(vp, screen, mouse(down, 5, 23)), None);
        assert_eq!(
            translate_mouse(vp, screen, mouse(down, 22, 0)),
            Some(RawInput::PointerDown(Point::new(0, 0)))
        );

        // A release out there still closes the press, on the edge
        let up = MouseEventKind::Up(MouseButton::Left);
        assert_eq!(
            translate_mouse(vp, screen, mouse(up, 5, 0)),
            Some(RawInput::PointerUp(Point::new(0, 0)))
        );
        assert_eq!(translate_mouse(Rect::default(), screen, mouse(up, 5, 0)), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
