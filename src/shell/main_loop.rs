// Main loop
//
// One frame, in this order:
//
//   1. frame clock tick, adapt the target rate
//   2. drain display input into the press tracker
//   3. scheduler tick (application tasks included)
//   4. failures from step 3 go through recovery
//   5. layout of the active application and the function bar
//   6. dispatch the latest pointer event against the just-updated tree
//   7. render application, function bar, low-rate indicator
//   8. present
//   9. hand the display to an accepted immersive application, if any
//
// Handlers and render passes run guarded; a failure in either goes through
// recovery and the loop carries on. Only a failure of recovery itself (or
// of the display) ends the loop with an error.

use super::{Failure, Shell};
use crate::display::RawInput;
use crate::gfx::{Color, Point, Rect, Role, Size};
use crate::util::guarded;
use anyhow::{Context, Result};
use chrono::Local;
use std::thread;
use std::time::Instant;

const INDICATOR: i32 = 5;

impl Shell {
    /// Run frames until exit is requested or `max_frames` have run, then
    /// stop every task and release the display
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<()> {
        tracing::info!(
            target_fps = self.clock.target(),
            max_frames = ?max_frames,
            "Main loop started"
        );
        let mut frames: u64 = 0;
        let result = loop {
            if self.should_exit || max_frames.is_some_and(|max| frames >= max) {
                break Ok(());
            }
            let started = Instant::now();
            if let Err(error) = self.run_frame(started) {
                break Err(error);
            }
            frames += 1;

            let pause = self.clock.remaining(started, Instant::now());
            if !pause.is_zero() && !self.should_exit {
                thread::sleep(pause);
            }
        };
        tracing::info!(frames, "Main loop finished");
        self.shutdown();
        result
    }

    pub fn shutdown(&mut self) {
        self.stop_all_tasks();
        if let Err(error) = self.display.shutdown() {
            tracing::warn!(error = %error, "Display shutdown failed");
        }
    }

    /// One iteration of the loop, with `now` as the frame start
    pub fn run_frame(&mut self, now: Instant) -> Result<()> {
        if let Some(measured) = self.clock.tick(now) {
            self.clock.adjust(measured);
        }

        self.drain_input(now)?;
        if self.should_exit {
            return Ok(());
        }

        self.tick_tasks();
        for failure in self.take_failures() {
            self.recover(failure)?;
        }

        self.layout()?;
        self.dispatch_latest()?;
        self.render()?;
        self.display
            .present(&self.framebuffer)
            .context("Failed to present frame")?;

        if let Some((app, entry)) = self.pending_immersion.take() {
            if let Err(error) = self.run_immersive(&app, &entry) {
                let failure = Failure::new("Immersive mode failed", error).with_app(Some(app));
                self.recover(failure)?;
            }
            self.refresh_all();
        }
        Ok(())
    }

    /// Screen changed size: rebuild the bar and re-resolve every application
    pub fn resize(&mut self, size: Size) {
        tracing::info!(width = size.width, height = size.height, "Screen resized");
        self.screen = size;
        self.framebuffer.ensure_size(size);
        self.bar.resize(size.width);
        self.refresh_all();
    }

    fn drain_input(&mut self, now: Instant) -> Result<()> {
        while let Some(input) = self.display.poll()? {
            match input {
                RawInput::PointerDown(at) => self.events.pointer_down(at, now),
                RawInput::PointerMove(at) => self.events.pointer_move(at),
                RawInput::PointerUp(at) => self.events.pointer_up(at, now),
                RawInput::Resize(size) => self.resize(size),
                RawInput::Quit => {
                    self.request_exit();
                    break;
                }
            }
        }
        Ok(())
    }

    fn layout(&mut self) -> Result<()> {
        self.bar
            .container_mut()
            .layout(&self.palette, self.fonts.as_ref());

        let Some(container) = self.apps.active_container_mut() else {
            return Ok(());
        };
        let (palette, fonts) = (&self.palette, self.fonts.as_ref());
        let result = guarded(|| {
            container.layout(palette, fonts);
            Ok(())
        });
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.ui_failure(error),
        }
    }

    fn dispatch_latest(&mut self) -> Result<()> {
        let Some(event) = self.events.latest_complete() else {
            return Ok(());
        };
        let top = self.app_area().height;
        let action = if event.origin.y < top {
            self.apps
                .active_container_mut()
                .and_then(|container| container.dispatch(&event))
        } else {
            self.bar.dispatch(&event, top)
        };
        let Some(action) = action else {
            return Ok(());
        };

        if let Err(error) = guarded(|| action(self)) {
            let failure = Failure::new("Event execution error", error)
                .with_app(self.apps.active().map(str::to_string))
                .with_data(format!("Pointer event: {event:?}"));
            self.recover(failure)?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let background = self.palette.color(Role::Background);
        self.framebuffer.fill(background);

        if let Some(container) = self.apps.active_container_mut() {
            let (frame, palette, fonts) = (&mut self.framebuffer, &self.palette, self.fonts.as_ref());
            if let Err(error) = guarded(|| container.render(frame, palette, fonts, Point::default())) {
                self.ui_failure(error)?;
            }
        }

        let top = self.app_area().height;
        self.bar.tick_clock(Local::now());
        self.bar.set_alert(self.notifications.has_unseen());
        self.bar
            .container_mut()
            .render(&mut self.framebuffer, &self.palette, self.fonts.as_ref(), Point::new(0, top))
            .context("Failed to render function bar")?;

        if self.clock.is_low() {
            let screen = self.screen;
            self.framebuffer.fill_rect(
                Rect::new(screen.width - INDICATOR, screen.height - INDICATOR, INDICATOR, INDICATOR),
                Color::RED,
            );
        }
        Ok(())
    }

    /// Layout or render of the foreground application failed: recover, then
    /// close it
    fn ui_failure(&mut self, error: anyhow::Error) -> Result<()> {
        let app = self.apps.active().map(str::to_string);
        let failure = Failure::new("UI error", error)
            .with_app(app)
            .with_data(format!("FPS: {}", self.clock.target()));
        self.recover(failure)?;
        self.full_close_current()
            .or_else(|error| {
                tracing::error!(error = %error, "Could not close the failing application");
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::HOME;
    use crate::display::HeadlessDisplay;
    use crate::ui::{Component, Declared, Overlay};
    use anyhow::bail;
    use std::time::Duration;

    fn booted() -> (Shell, HeadlessDisplay) {
        let (mut shell, display) = Shell::for_tests_with_display();
        shell.boot(None).unwrap();
        (shell, display)
    }

    fn tap(display: &HeadlessDisplay, x: i32, y: i32) {
        display.push(RawInput::PointerDown(Point::new(x, y)));
        display.push(RawInput::PointerUp(Point::new(x, y)));
    }

    #[test]
    fn test_frame_is_presented() {
        let (mut shell, display) = booted();
        shell.run_frame(Instant::now()).unwrap();

        assert_eq!(display.frames_presented(), 1);
        let frame = display.last_frame().unwrap();
        assert_eq!(frame.size(), Size::new(240, 320));
        assert_eq!(shell.function_bar().title(), "Home");
        assert_eq!(shell.function_bar().clock_text().len(), 5);
    }

    #[test]
    fn test_launcher_click_opens_app() {
        let (mut shell, display) = booted();
        // The launcher builds its buttons on its first tick, in the same
        // frame the press is dispatched
        tap(&display, 50, 45);
        shell.run_frame(Instant::now()).unwrap();

        assert_eq!(shell.apps().active(), Some("tasks"));
        assert_eq!(shell.function_bar().title(), "Task Demo");
    }

    #[test]
    fn test_bar_title_switches_to_previous() {
        let (mut shell, display) = booted();
        shell.activate("tasks").unwrap();
        shell.run_frame(Instant::now()).unwrap();

        tap(&display, 100, 300);
        shell.run_frame(Instant::now() + Duration::from_millis(40)).unwrap();
        assert_eq!(shell.apps().active(), Some(HOME));
        assert!(!shell.apps().recency().iter().any(|name| name == "tasks"));
    }

    #[test]
    fn test_failing_handler_is_recovered() {
        let (mut shell, display) = booted();
        let panel = Component::panel(Declared::px(0, 0, 240, 280))
            .with_child(Component::button(Declared::px(0, 0, 100, 100), "Break").on_click(|_| bail!("handler broke")));
        Overlay::new("Broken", panel).show(&mut shell, HOME).unwrap();

        tap(&display, 20, 20);
        shell.run_frame(Instant::now()).unwrap();

        let report = std::fs::read_to_string(shell.report_path()).unwrap();
        assert!(report.contains("Event execution error"));
        assert!(report.contains("handler broke"));
        assert_eq!(shell.apps().active(), Some(HOME));
        assert_eq!(display.frames_presented(), 1);
    }

    #[test]
    fn test_resize_updates_areas() {
        let (mut shell, display) = booted();
        display.resize(Size::new(320, 240));
        shell.run_frame(Instant::now()).unwrap();

        assert_eq!(shell.screen(), Size::new(320, 240));
        assert_eq!(shell.app_area(), Size::new(320, 200));
        assert_eq!(shell.apps().area(), Size::new(320, 200));
        assert_eq!(display.last_frame().unwrap().size(), Size::new(320, 240));
    }

    #[test]
    fn test_quit_stops_loop_and_display() {
        let (mut shell, display) = booted();
        display.push(RawInput::Quit);
        shell.run(None).unwrap();

        assert!(shell.should_exit());
        assert!(display.is_shut_down());
        assert_eq!(display.frames_presented(), 0);
        assert_eq!(shell.scheduler.active_count(), 0);
    }

    #[test]
    fn test_frame_limit() {
        let (mut shell, display) = booted();
        shell.run(Some(3)).unwrap();
        assert_eq!(display.frames_presented(), 3);
        assert!(display.is_shut_down());
    }
}
