//! Overlays and dialogs
//!
//! An overlay is a full-size transparent base holding one panel. While it is
//! up the base is the only child of the application root, so it swallows
//! every pointer event that misses the panel: plain overlays close on such a
//! click, dialogs are modal and ignore it.
//!
//! Dialogs are overlays whose panel carries a message and a row of response
//! buttons. Choosing a response closes the dialog first, then hands the
//! response to the completion callback.

use super::component::{Component, ComponentId};
use super::geometry::{Declared, Dim};
use crate::gfx::{Paint, Role, Shade};
use crate::input::EventKind;
use crate::shell::Shell;
use anyhow::Result;
use std::rc::Rc;

/// Called once with the chosen response, after the dialog has closed
pub type ResponseCallback = Box<dyn FnOnce(&mut Shell, &str) -> Result<()>>;

const DIALOG_HEIGHT: i32 = 130;
const BUTTON_HEIGHT: i32 = 40;
const MESSAGE_SIZE: u32 = 16;

/// A modal or dismissable layer over an application's tree
pub struct Overlay {
    base: Component,
    title: String,
    modal: bool,
    on_response: Option<ResponseCallback>,
}

impl Overlay {
    pub fn new(title: impl Into<String>, panel: Component) -> Self {
        Self::with_base(
            Component::panel(Declared::full()).transparent().with_child(panel),
            title,
        )
    }

    fn with_base(base: Component, title: impl Into<String>) -> Self {
        Self {
            base,
            title: title.into(),
            modal: false,
            on_response: None,
        }
    }

    /// Identity of the overlay, used to close exactly this layer
    pub fn id(&self) -> ComponentId {
        self.base.id()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    /// Ignore clicks outside the panel
    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    /// Push onto `app`'s overlay stack
    pub fn show(self, shell: &mut Shell, app: &str) -> Result<ComponentId> {
        shell.push_overlay(app, self)
    }

    /// Wire the outside-click dismissal to the owning application
    pub(crate) fn attach(&mut self, app: &str) {
        if self.modal {
            return;
        }
        let app = app.to_string();
        let id = self.id();
        self.base.set_binding(
            EventKind::Click,
            Some(Rc::new(move |shell: &mut Shell| shell.dismiss_overlay(&app, id))),
        );
    }

    pub(crate) fn into_parts(self) -> (Component, String, Option<ResponseCallback>) {
        (self.base, self.title, self.on_response)
    }
}

/// Visual flavour of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

impl DialogKind {
    fn background(self) -> Paint {
        match self {
            DialogKind::Info => Paint::role(Role::Background),
            DialogKind::Warning => Paint::role(Role::Warning),
            DialogKind::Error => Paint::role(Role::Error),
        }
    }
}

/// Builder for a modal dialog
pub struct Dialog {
    kind: DialogKind,
    title: String,
    message: String,
    responses: Vec<String>,
    on_response: Option<ResponseCallback>,
}

impl Dialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>, responses: &[&str]) -> Self {
        Self {
            kind: DialogKind::Info,
            title: title.into(),
            message: message.into(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            on_response: None,
        }
    }

    pub fn ok(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, &["OK"])
    }

    pub fn yes_no(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, &["Yes", "No"])
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            ..Self::new("Error", message, &["Acknowledged"])
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Warning,
            ..Self::new("Warning", message, &["OK"])
        }
    }

    pub fn on_response(mut self, f: impl FnOnce(&mut Shell, &str) -> Result<()> + 'static) -> Self {
        self.on_response = Some(Box::new(f));
        self
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    /// Lay the dialog out as an overlay owned by `app`
    pub fn build(self, app: &str) -> Overlay {
        let base = Component::panel(Declared::full()).transparent();
        let id = base.id();

        let mut panel = Component::panel(Declared::new(0, Dim::Percent(30), Dim::Percent(100), DIALOG_HEIGHT))
            .with_background(self.kind.background())
            .with_border(3, Role::Item)
            .with_child(Component::wrapped_text(4, 4, self.message, MESSAGE_SIZE));

        let count = self.responses.len().max(1) as i32;
        for (i, response) in self.responses.into_iter().enumerate() {
            let declared = Declared::new(
                Dim::Percent(i as i32 * 100 / count),
                DIALOG_HEIGHT - BUTTON_HEIGHT,
                Dim::Percent(100 / count),
                BUTTON_HEIGHT,
            );
            let app = app.to_string();
            let mut button = Component::button(declared, response.as_str())
                .with_border(1, Role::Item)
                .on_click(move |shell: &mut Shell| shell.record_dialog_response(&app, id, &response));
            if i == 0 && count > 1 {
                button = button.with_background(Paint::Role(Role::Accent, Shade::Light));
            }
            panel = panel.with_child(button);
        }

        Overlay {
            modal: true,
            on_response: self.on_response,
            ..Overlay::with_base(base.with_child(panel), self.title)
        }
    }

    pub fn show(self, shell: &mut Shell, app: &str) -> Result<ComponentId> {
        let overlay = self.build(app);
        shell.push_overlay(app, overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::traits::ChildOwning;
    use crate::ui::Widget;

    fn panel_of(overlay: &Overlay) -> &Component {
        &overlay.base.children()[0]
    }

    #[test]
    fn test_dialog_builds_message_and_buttons() {
        let overlay = Dialog::yes_no("Launch", "Start the thing?").build("demo");
        assert!(overlay.is_modal());
        assert_eq!(overlay.title(), "Launch");

        let panel = panel_of(&overlay);
        let buttons: Vec<_> = panel
            .children()
            .iter()
            .filter(|c| matches!(c.widget(), Widget::Button))
            .collect();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].text_content(), Some("Yes"));
        assert_eq!(buttons[1].text_content(), Some("No"));
        assert!(buttons.iter().all(|b| b.bindings().on_click.is_some()));
        assert_eq!(panel.children()[0].text_content(), Some("Start the thing?"));
    }

    #[test]
    fn test_error_and_warning_flavours() {
        let error = Dialog::error("disk on fire");
        assert_eq!(error.kind(), DialogKind::Error);
        assert_eq!(error.responses(), ["Acknowledged".to_string()]);

        let overlay = error.build("demo");
        assert_eq!(overlay.title(), "Error");
        assert_eq!(panel_of(&overlay).options.background, Paint::role(Role::Error));

        let warning = Dialog::warning("low battery").build("demo");
        assert_eq!(panel_of(&warning).options.background, Paint::role(Role::Warning));
    }

    #[test]
    fn test_plain_overlay_dismisses_only_when_not_modal() {
        let mut plain = Overlay::new("Menu", Component::panel(Declared::px(10, 10, 50, 50)));
        plain.attach("demo");
        assert!(plain.base.bindings().on_click.is_some());

        let mut modal = Overlay::new("Menu", Component::panel(Declared::px(10, 10, 50, 50))).modal();
        modal.attach("demo");
        assert!(modal.base.bindings().on_click.is_none());
    }
}
