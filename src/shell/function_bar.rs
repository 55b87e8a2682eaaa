//! Bottom strip: menu button, application title, clock
//!
//! - menu: click opens home (or closes the current app when home is already
//!   up), long click fully closes the current app
//! - title: click switches to the previous app
//! - clock: click toggles the notification menu, long click opens the
//!   recovery menu; red while unseen notifications wait

use super::Shell;
use crate::apps::HOME;
use crate::gfx::{Color, Paint, Point, Role, Shade, Size};
use crate::input::PointerEvent;
use crate::ui::{Action, AppContainer, Component, ComponentId, Declared, Dim};
use chrono::{DateTime, Local};

const MENU_WIDTH: i32 = 40;
const TITLE_SIZE: u32 = 16;
const CLOCK_WIDTH: i32 = 48;
const ALERT: Color = Color::rgb(255, 59, 59);

pub struct FunctionBar {
    container: AppContainer,
    height: i32,
    title: ComponentId,
    clock: ComponentId,
    alert: bool,
}

impl FunctionBar {
    pub fn new(width: i32, height: i32) -> Self {
        let mut container = AppContainer::new(Size::new(width, height), None);

        let menu = Component::button(Declared::px(0, 0, MENU_WIDTH, height), "≡")
            .with_background(Paint::Role(Role::Background, Shade::Darker))
            .on_click(|shell| shell.bar_menu())
            .on_long_click(|shell| shell.full_close_current());

        // Text nodes size to their content, so the hit area is a panel behind them
        let title_text = Component::text(4, Dim::Percent(25), "", TITLE_SIZE);
        let title = title_text.id();
        let title_area = Component::panel(Declared::new(
            MENU_WIDTH,
            0,
            (width - MENU_WIDTH - CLOCK_WIDTH).max(0),
            height,
        ))
        .transparent()
        .opaque_to_children()
        .with_child(title_text)
        .on_click(|shell| shell.switch_to_previous());

        let clock_text = Component::text(2, Dim::Percent(25), "--:--", TITLE_SIZE)
            .with_text_color(Role::Accent);
        let clock = clock_text.id();
        let clock_area = Component::panel(Declared::new(
            (width - CLOCK_WIDTH).max(0),
            0,
            CLOCK_WIDTH,
            height,
        ))
        .transparent()
        .opaque_to_children()
        .with_child(clock_text)
        .on_click(|shell| shell.toggle_notification_menu())
        .on_long_click(|shell| shell.open_recovery_menu());

        container.add(menu);
        container.add(title_area);
        container.add(clock_area);

        Self {
            container,
            height,
            title,
            clock,
            alert: false,
        }
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn title(&self) -> &str {
        self.container
            .find(self.title)
            .and_then(|c| c.text_content())
            .unwrap_or("")
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title() == title {
            return;
        }
        if let Some(node) = self.container.find_mut(self.title) {
            node.set_text(title);
        }
    }

    pub fn clock_text(&self) -> &str {
        self.container
            .find(self.clock)
            .and_then(|c| c.text_content())
            .unwrap_or("")
    }

    /// Show `now` as HH:MM
    pub fn tick_clock(&mut self, now: DateTime<Local>) {
        let stamp = now.format("%H:%M").to_string();
        if self.clock_text() == stamp {
            return;
        }
        if let Some(node) = self.container.find_mut(self.clock) {
            node.set_text(stamp);
        }
    }

    pub fn is_alert(&self) -> bool {
        self.alert
    }

    /// Paint the clock red while `on`
    pub fn set_alert(&mut self, on: bool) {
        if self.alert == on {
            return;
        }
        self.alert = on;
        let color = if on { Paint::Rgb(ALERT) } else { Paint::role(Role::Accent) };
        if let Some(node) = self.container.find_mut(self.clock) {
            node.set_text_color(color);
        }
    }

    /// Rebuild for a new screen width, keeping title, clock and alert
    pub fn resize(&mut self, width: i32) {
        let title = self.title().to_string();
        let clock = self.clock_text().to_string();
        let alert = self.alert;
        *self = Self::new(width, self.height);
        self.set_title(&title);
        self.set_alert(alert);
        if let Some(node) = self.container.find_mut(self.clock) {
            node.set_text(clock);
        }
    }

    pub(crate) fn container_mut(&mut self) -> &mut AppContainer {
        &mut self.container
    }

    /// Route an event already known to start inside the bar; `top` is the
    /// bar's y offset on screen
    pub(crate) fn dispatch(&mut self, event: &PointerEvent, top: i32) -> Option<Action> {
        let shift = Point::new(0, -top);
        let local = PointerEvent {
            kind: event.kind,
            origin: event.origin.offset(shift),
            position: event.position.offset(shift),
        };
        self.container.dispatch(&local)
    }
}

impl Shell {
    /// Menu button: open home, or close the current app when home is up
    fn bar_menu(&mut self) -> anyhow::Result<()> {
        if self.apps.active() == Some(HOME) {
            self.full_close_current()
        } else {
            self.activate(HOME)
        }
    }
}
