//! Notifications
//!
//! Applications post notifications to the shell's queue, newest first. The
//! clock in the function bar turns red while unseen ones wait, and a click
//! on it toggles the notification menu over the active application.
//!
//! In the menu a click on an entry clears it, closes the menu and runs its
//! action (by default: open the application that posted it). A long click
//! only clears it. Permanent notifications ignore both and survive "Clear";
//! only [`Shell::force_clear_notification`] removes them.

use super::Shell;
use crate::gfx::{Color, Role};
use crate::ui::{ChildOwning, Component, ComponentId, Declared, Dim, Handler, Overlay};
use anyhow::Result;
use chrono::{DateTime, Local};
use std::fmt;
use std::rc::Rc;

const MENU_TITLE: &str = "Notifications";
const HEADER_HEIGHT: i32 = 20;
const ROW_HEIGHT: i32 = 40;
const CLEAR_WIDTH: i32 = 50;
const TITLE_SIZE: u32 = 14;
const BODY_SIZE: u32 = 8;
const MENU_BACKGROUND: Color = Color::rgba(20, 20, 20, 200);
const MENU_TEXT: Color = Color::rgb(200, 200, 200);

/// Queue-assigned identity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

pub struct Notification {
    id: NotificationId,
    pub title: String,
    pub text: String,
    /// Application that posted it
    pub source: Option<String>,
    pub at: DateTime<Local>,
    permanent: bool,
    active: bool,
    on_selected: Option<Handler>,
}

impl Notification {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: NotificationId::default(),
            title: title.into(),
            text: text.into(),
            source: None,
            at: Local::now(),
            permanent: false,
            active: true,
            on_selected: None,
        }
    }

    pub fn from_app(mut self, app: impl Into<String>) -> Self {
        self.source = Some(app.into());
        self
    }

    /// Survives regular clearing
    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    /// Run instead of opening the source application when selected
    pub fn on_selected(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.on_selected = Some(Rc::new(f));
        self
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark for removal on the next sweep; permanent ones refuse
    fn deactivate(&mut self) -> bool {
        if self.permanent {
            return false;
        }
        self.active = false;
        true
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("source", &self.source)
            .field("permanent", &self.permanent)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Posted notifications, newest first
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    unseen: bool,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut notification: Notification) -> NotificationId {
        self.next_id += 1;
        notification.id = NotificationId(self.next_id);
        let id = notification.id;
        self.items.insert(0, notification);
        self.unseen = true;
        id
    }

    /// Clear one notification. Returns whether it was removed.
    pub fn clear(&mut self, id: NotificationId) -> bool {
        let removed = self
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .is_some_and(Notification::deactivate);
        self.sweep();
        removed
    }

    /// Remove one notification, permanent or not
    pub fn force_clear(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop everything no longer active
    pub fn sweep(&mut self) {
        self.items.retain(Notification::is_active);
    }

    /// Clear every notification that allows it
    pub fn clear_all(&mut self) {
        for notification in self.items.iter_mut() {
            notification.deactivate();
        }
        self.sweep();
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether something was posted since the menu was last opened
    pub fn has_unseen(&self) -> bool {
        self.unseen
    }

    pub fn mark_seen(&mut self) {
        self.unseen = false;
    }
}

impl Shell {
    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notify(&mut self, notification: Notification) -> NotificationId {
        tracing::info!(
            title = %notification.title,
            source = notification.source.as_deref().unwrap_or("-"),
            permanent = notification.permanent,
            "Notification posted"
        );
        let id = self.notifications.push(notification);
        self.refresh_notification_menu();
        id
    }

    pub fn toggle_notification_menu(&mut self) -> Result<()> {
        match self.shown_notification_menu() {
            Some((app, id)) => {
                self.notification_menu = None;
                self.dismiss_overlay(&app, id)
            }
            None => self.show_notification_menu(),
        }
    }

    pub fn is_notification_menu_shown(&self) -> bool {
        self.shown_notification_menu().is_some()
    }

    /// Clear `id`, close the menu, then run the notification's action
    pub fn select_notification(&mut self, id: NotificationId) -> Result<()> {
        let Some(notification) = self.notifications.get(id) else {
            return Ok(());
        };
        let action = notification.on_selected.clone();
        let source = notification.source.clone();
        self.notifications.clear(id);
        if let Some((app, menu)) = self.shown_notification_menu() {
            self.notification_menu = None;
            self.dismiss_overlay(&app, menu)?;
        }
        tracing::debug!(notification = %id, "Notification selected");
        match (action, source) {
            (Some(action), _) => action(self),
            (None, Some(app)) => self.open_by_name(&app),
            (None, None) => Ok(()),
        }
    }

    pub fn clear_notification(&mut self, id: NotificationId) {
        if self.notifications.clear(id) {
            self.refresh_notification_menu();
        }
    }

    pub fn force_clear_notification(&mut self, id: NotificationId) {
        if self.notifications.force_clear(id) {
            self.refresh_notification_menu();
        }
    }

    pub fn clear_all_notifications(&mut self) {
        self.notifications.clear_all();
        self.refresh_notification_menu();
    }

    /// Menu overlay, while it is the top layer of the active application
    fn shown_notification_menu(&self) -> Option<(String, ComponentId)> {
        let (app, id) = self.notification_menu.clone()?;
        if self.apps.active() != Some(app.as_str()) {
            return None;
        }
        let top = self.apps.get(&app)?.container().top_overlay()?.0;
        (top == id).then_some((app, id))
    }

    fn show_notification_menu(&mut self) -> Result<()> {
        let Some(app) = self.apps.active().map(str::to_string) else {
            return Ok(());
        };
        self.notifications.mark_seen();
        let overlay = self.notification_overlay();
        let id = self.push_overlay(&app, overlay)?;
        self.notification_menu = Some((app, id));
        Ok(())
    }

    /// Rebuild an open menu after the queue changed
    fn refresh_notification_menu(&mut self) {
        let Some((app, id)) = self.shown_notification_menu() else {
            return;
        };
        let rebuilt = self
            .dismiss_overlay(&app, id)
            .and_then(|()| self.show_notification_menu());
        if let Err(error) = rebuilt {
            tracing::warn!(error = %error, "Could not refresh the notification menu");
        }
    }

    fn notification_overlay(&self) -> Overlay {
        let area = self.app_area();
        let (width, height) = (area.width * 4 / 5, area.height * 3 / 4);

        let mut list = Component::scrollable(Declared::px(0, HEADER_HEIGHT, width, (height - HEADER_HEIGHT).max(0)))
            .transparent();
        for (i, notification) in self.notifications.iter().enumerate() {
            list.add_child(notification_row(notification, i as i32 * ROW_HEIGHT));
        }

        let panel = Component::panel(Declared::new(Dim::Percent(20), Dim::Percent(25), width, height))
            .with_background(MENU_BACKGROUND)
            .with_child(Component::text(1, 1, MENU_TITLE, TITLE_SIZE).with_text_color(MENU_TEXT))
            .with_child(
                Component::button(Declared::px(width - CLEAR_WIDTH, 0, CLEAR_WIDTH, HEADER_HEIGHT), "Clear")
                    .with_border(1, Role::Item)
                    .on_click(|shell| {
                        shell.clear_all_notifications();
                        Ok(())
                    }),
            )
            .with_child(list);
        Overlay::new(MENU_TITLE, panel)
    }
}

fn notification_row(notification: &Notification, y: i32) -> Component {
    let id = notification.id;
    let body = format!("{}  {}", notification.at.format("%H:%M"), notification.text);
    Component::panel(Declared::new(0, y, Dim::Percent(100), ROW_HEIGHT))
        .transparent()
        .opaque_to_children()
        .with_child(Component::text(4, 2, notification.title.as_str(), TITLE_SIZE).with_text_color(MENU_TEXT))
        .with_child(Component::text(4, 22, body, BODY_SIZE).with_text_color(MENU_TEXT))
        .on_click(move |shell| shell.select_notification(id))
        .on_long_click(move |shell| {
            shell.clear_notification(id);
            Ok(())
        })
}
