// Error recovery
//
// Every failure the loop catches ends up here. A report goes to
// `<data_dir>/last_error.txt`, then (if someone is watching) a full-screen
// panel offers "Return" or the recovery menu:
//
//   ┌──────────────────────┐
//   │ Return               │  nothing else happens
//   │ Stop all apps        │  close everything, back to home
//   │ Stop current app     │  fully close the foreground app
//   │ Exit                 │  leave the shell
//   └──────────────────────┘
//
// If writing the report or driving the panel fails, recovery itself has
// failed and the error is fatal.

use super::{Failure, Shell};
use crate::apps::HOME;
use crate::display::RawInput;
use crate::error::ShellError;
use crate::gfx::{Color, FontCache, Point, Rect, Surface};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

const REPORT_FILE: &str = "last_error.txt";
const REPORT_LOG_LINES: usize = 50;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const PANEL_BG: Color = Color::rgb(200, 100, 100);
const LIGHT_TEXT: Color = Color::rgb(200, 200, 200);
const DARK_TEXT: Color = Color::rgb(20, 20, 20);
const BAND: i32 = 40;
const HEADING_SIZE: u32 = 12;
const BODY_SIZE: u32 = 8;

/// What the user picked from the recovery menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    Return,
    StopAll,
    StopCurrent,
    Exit,
}

impl RecoveryChoice {
    const MENU: [(RecoveryChoice, &'static str, Color); 4] = [
        (RecoveryChoice::Return, "Return", Color::rgb(200, 200, 200)),
        (RecoveryChoice::StopAll, "Stop all apps and return", Color::rgb(20, 200, 20)),
        (RecoveryChoice::StopCurrent, "Stop current app and return", Color::rgb(20, 20, 200)),
        (RecoveryChoice::Exit, "Exit completely", Color::rgb(200, 20, 20)),
    ];

    /// Menu band under screen row `y` on a screen `height` pixels tall
    fn at(y: i32, height: i32) -> Self {
        let band = (y.max(0) * 4 / height.max(1)).clamp(0, 3) as usize;
        Self::MENU[band].0
    }
}

impl Shell {
    pub fn report_path(&self) -> PathBuf {
        self.config.data_dir.join(REPORT_FILE)
    }

    /// Handle one caught failure. An error return means recovery itself
    /// failed and the shell must exit.
    pub fn recover(&mut self, failure: Failure) -> Result<()> {
        tracing::error!(
            origin = %failure.origin,
            app = failure.app.as_deref().unwrap_or("-"),
            error = %format!("{:#}", failure.error),
            "Recovering from failure"
        );

        let path = self
            .write_report(&failure)
            .map_err(|e| ShellError::Fatal(format!("could not write error report: {e:#}")))?;

        let choice = if self.display.is_interactive() {
            self.failure_panel(&failure, &path)
                .map_err(|e| ShellError::Fatal(format!("recovery panel failed: {e:#}")))?
        } else {
            RecoveryChoice::Return
        };
        self.apply_recovery(choice);
        Ok(())
    }

    /// Show the recovery menu without a failure (function bar clock)
    pub(crate) fn open_recovery_menu(&mut self) -> Result<()> {
        if !self.display.is_interactive() {
            tracing::debug!("Recovery menu needs an interactive display");
            return Ok(());
        }
        let choice = self.recovery_menu()?;
        self.apply_recovery(choice);
        Ok(())
    }

    fn write_report(&self, failure: &Failure) -> Result<PathBuf> {
        let dir = &self.config.data_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let recent: Vec<String> = self
            .logs
            .recent(REPORT_LOG_LINES)
            .iter()
            .map(|entry| entry.render())
            .collect();
        let report = format!(
            "pocket-shell error report\n\
             Time: {}\n\
             \n\
             Open apps: {:?}\n\
             Application: {}\n\
             Message: {}\n\
             Additional data:\n{}\n\
             \n\
             Tasks: {:?}\n\
             \n\
             Error:\n{:?}\n\
             \n\
             Recent log:\n{}\n",
            failure.at.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.apps.recency(),
            failure.app.as_deref().unwrap_or("None"),
            failure.origin,
            failure.data.as_deref().unwrap_or("None"),
            self.scheduler.describe(),
            failure.error,
            recent.join("\n"),
        );

        let path = self.report_path();
        std::fs::write(&path, report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Error report saved");
        Ok(path)
    }

    /// Full-screen failure notice: "Recovery Menu" band above "Return"
    fn failure_panel(&mut self, failure: &Failure, path: &std::path::Path) -> Result<RecoveryChoice> {
        let screen = self.screen;
        let fonts = self.fonts.as_ref();
        let frame = &mut self.framebuffer;
        frame.fill(PANEL_BG);
        draw_text(frame, fonts, "Failure detected.", Point::new(20, 20), HEADING_SIZE, LIGHT_TEXT);
        draw_text(frame, fonts, "Report saved.", Point::new(20, 60), BODY_SIZE, LIGHT_TEXT);
        let mut y = 72;
        for line in fonts.wrap(&path.display().to_string(), BODY_SIZE, screen.width - 40) {
            draw_text(frame, fonts, &line, Point::new(20, y), BODY_SIZE, LIGHT_TEXT);
            y += BODY_SIZE as i32 + 2;
        }
        y += 10;
        draw_text(frame, fonts, "Message:", Point::new(20, y), BODY_SIZE, LIGHT_TEXT);
        for line in fonts.wrap(&failure.origin, BODY_SIZE, screen.width - 40) {
            y += BODY_SIZE as i32 + 2;
            draw_text(frame, fonts, &line, Point::new(20, y), BODY_SIZE, LIGHT_TEXT);
        }

        let menu_top = screen.height - 2 * BAND;
        let return_top = screen.height - BAND;
        frame.fill_rect(Rect::new(0, menu_top, screen.width, BAND), Color::rgb(50, 50, 50));
        draw_text(frame, fonts, "Open Recovery Menu", Point::new(20, menu_top + 12), BODY_SIZE, LIGHT_TEXT);
        frame.fill_rect(Rect::new(0, return_top, screen.width, BAND), LIGHT_TEXT);
        draw_text(frame, fonts, "Return", Point::new(20, return_top + 12), BODY_SIZE, DARK_TEXT);
        self.display.present(&self.framebuffer)?;

        loop {
            match self.wait_input()? {
                RawInput::Quit => return Ok(RecoveryChoice::Exit),
                RawInput::PointerDown(at) if at.y >= return_top => return Ok(RecoveryChoice::Return),
                RawInput::PointerDown(at) if at.y >= menu_top => return self.recovery_menu(),
                RawInput::Resize(size) => {
                    self.resize(size);
                    return self.failure_panel(failure, path);
                }
                _ => {}
            }
        }
    }

    fn recovery_menu(&mut self) -> Result<RecoveryChoice> {
        tracing::info!("Recovery menu entered");
        self.events.clear();

        let screen = self.screen;
        let band = (screen.height / 4).max(1);
        let fonts = self.fonts.as_ref();
        let frame = &mut self.framebuffer;
        frame.fill(Color::BLACK);
        for (i, (_, label, color)) in RecoveryChoice::MENU.iter().enumerate() {
            let top = i as i32 * band;
            frame.fill_rect(Rect::new(0, top, screen.width, band), *color);
            draw_text(frame, fonts, label, Point::new(20, top + band / 2 - 4), BODY_SIZE, DARK_TEXT);
        }
        self.display.present(&self.framebuffer)?;

        loop {
            match self.wait_input()? {
                RawInput::Quit => return Ok(RecoveryChoice::Exit),
                RawInput::PointerDown(at) => return Ok(RecoveryChoice::at(at.y, screen.height)),
                RawInput::Resize(size) => {
                    self.resize(size);
                    return self.recovery_menu();
                }
                _ => {}
            }
        }
    }

    /// Block until the display reports something
    fn wait_input(&mut self) -> Result<RawInput> {
        loop {
            if let Some(input) = self.display.poll()? {
                return Ok(input);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn apply_recovery(&mut self, choice: RecoveryChoice) {
        tracing::info!(?choice, "Recovery choice");
        match choice {
            RecoveryChoice::Return => {}
            RecoveryChoice::StopAll => {
                if let Err(error) = self.stop_all() {
                    tracing::error!(error = %error, "Stopping all applications failed");
                }
            }
            RecoveryChoice::StopCurrent => {
                if let Err(error) = self.full_close_current() {
                    tracing::error!(error = %error, "Regular stop failed, returning home");
                    if let Err(error) = self.activate(HOME) {
                        tracing::error!(error = %error, "Could not return home");
                    }
                }
            }
            RecoveryChoice::Exit => self.request_exit(),
        }
        // Presses made while the panel was up belong to it
        self.events.clear();
    }
}

fn draw_text(target: &mut Surface, fonts: &dyn FontCache, text: &str, at: Point, size: u32, color: Color) {
    let glyphs = fonts.rasterize(text, size, color);
    target.blit(&glyphs, at);
}
