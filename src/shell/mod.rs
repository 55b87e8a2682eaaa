// Shell context
//
// One `Shell` owns everything the running system has: the display, the
// palette and fonts, the input queue, the scheduler, the installed
// applications and the function bar. It is passed explicitly (`&mut Shell`)
// to every widget handler, task body and application hook; there is no
// global state.
//
//   ┌──────────────────────────── screen ───────────────────────────┐
//   │  active application's container (overlays on top)           │
//   │                                                               │
//   ├───────────────────────────────────────────────────────────────┤
//   │  function bar: [menu] title ...................... HH:MM (!) │
//   └───────────────────────────────────────────────────────────────┘

mod frame_clock;
mod function_bar;
mod main_loop;
mod notifications;
mod recovery;

pub use frame_clock::FrameClock;
pub use function_bar::FunctionBar;
pub use notifications::{Notification, NotificationId, NotificationQueue};
pub use recovery::RecoveryChoice;

use crate::apps::{builtin, AppManager, ModuleRegistry};
use crate::config::Config;
use crate::display::{Display, HeadlessDisplay};
use crate::error::ShellError;
use crate::gfx::{BlockFont, FontCache, Palette, Scheme, Size, Surface};
use crate::input::EventQueue;
use crate::logging::LogBuffer;
use crate::tasks::{Scheduler, TaskFailure};
use crate::ui::{ComponentId, Overlay};
use anyhow::Result;
use chrono::{DateTime, Local};

/// A failure waiting for error recovery
#[derive(Debug)]
pub struct Failure {
    /// Where it happened, e.g. "Task 'sync' failed" or "UI error"
    pub origin: String,
    /// Application involved, when known
    pub app: Option<String>,
    /// Extra state for the report
    pub data: Option<String>,
    pub error: anyhow::Error,
    pub at: DateTime<Local>,
}

impl Failure {
    pub fn new(origin: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            origin: origin.into(),
            app: None,
            data: None,
            error,
            at: Local::now(),
        }
    }

    pub fn with_app(mut self, app: Option<String>) -> Self {
        self.app = app;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

pub struct Shell {
    pub(crate) config: Config,
    screen: Size,
    pub(crate) display: Box<dyn Display>,
    framebuffer: Surface,
    pub(crate) palette: Palette,
    pub(crate) fonts: Box<dyn FontCache>,
    events: EventQueue,
    pub(crate) scheduler: Scheduler,
    pub(crate) apps: AppManager,
    pub(crate) registry: ModuleRegistry,
    bar: FunctionBar,
    clock: FrameClock,
    failures: Vec<Failure>,
    notifications: NotificationQueue,
    /// (application, overlay) of the last notification menu shown
    notification_menu: Option<(String, ComponentId)>,
    logs: LogBuffer,
    should_exit: bool,
    /// (application, entry) accepted for immersive mode, run after the frame
    pub(crate) pending_immersion: Option<(String, String)>,
}

impl Shell {
    /// Build a shell around `display`. Builtin modules are registered but no
    /// application is installed yet.
    pub fn new(config: Config, display: Box<dyn Display>, logs: LogBuffer) -> Self {
        let screen = display.size();
        let bar_height = config.display.bar_height.clamp(0, screen.height);
        let app_area = Size::new(screen.width, screen.height - bar_height);

        let mut registry = ModuleRegistry::new();
        builtin::register(&mut registry);

        tracing::debug!(
            width = screen.width,
            height = screen.height,
            bar_height,
            data_dir = %config.data_dir.display(),
            "Creating shell"
        );

        Self {
            screen,
            display,
            framebuffer: Surface::new(screen),
            palette: config.palette.build(),
            fonts: Box::new(BlockFont),
            events: EventQueue::new(config.display.long_click()),
            scheduler: Scheduler::new(),
            apps: AppManager::new(app_area, &config.data_dir),
            registry,
            bar: FunctionBar::new(screen.width, bar_height),
            clock: FrameClock::new(config.display.fps_min, config.display.fps_max),
            failures: Vec::new(),
            notifications: NotificationQueue::new(),
            notification_menu: None,
            logs,
            should_exit: false,
            pending_immersion: None,
            config,
        }
    }

    /// Shell over an in-memory display of the configured size
    pub fn headless(config: Config, logs: LogBuffer) -> (Self, HeadlessDisplay) {
        let display = HeadlessDisplay::new(Size::new(config.display.width, config.display.height));
        let shell = Self::new(config, Box::new(display.clone()), logs);
        (shell, display)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::for_tests_with_display().0
    }

    /// Headless test shell with a private data directory
    #[cfg(test)]
    pub(crate) fn for_tests_with_display() -> (Self, HeadlessDisplay) {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let config = Config {
            data_dir: std::env::temp_dir().join(format!(
                "pocket-shell-test-{}-{}",
                std::process::id(),
                NEXT.fetch_add(1, Ordering::Relaxed)
            )),
            ..Config::default()
        };
        Self::headless(config, LogBuffer::new())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn apps(&self) -> &AppManager {
        &self.apps
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_scheme(&mut self, scheme: Scheme) {
        self.palette.set_scheme(scheme);
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    /// Area left for applications above the function bar
    pub fn app_area(&self) -> Size {
        Size::new(self.screen.width, (self.screen.height - self.bar.height()).max(0))
    }

    pub fn function_bar(&self) -> &FunctionBar {
        &self.bar
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// Last composed frame
    pub fn framebuffer(&self) -> &Surface {
        &self.framebuffer
    }

    pub fn frame_clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn request_exit(&mut self) {
        tracing::info!("Exit requested");
        self.should_exit = true;
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failures
    // ─────────────────────────────────────────────────────────────────────────

    pub fn report_failure(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub(crate) fn report_task_failure(&mut self, failure: TaskFailure) {
        let TaskFailure { task, owner, error } = failure;
        self.report_failure(Failure::new(format!("Task '{task}' failed"), error).with_app(owner));
    }

    /// Failures not yet handed to recovery
    pub fn take_failures(&mut self) -> Vec<Failure> {
        std::mem::take(&mut self.failures)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Overlays
    // ─────────────────────────────────────────────────────────────────────────

    /// Push an overlay onto `app`'s stack
    pub fn push_overlay(&mut self, app: &str, mut overlay: Overlay) -> Result<ComponentId> {
        overlay.attach(app);
        let id = self.ui(app)?.push_overlay(overlay);
        self.update_title();
        Ok(id)
    }

    /// Close the overlay `id` without a response, if it is still on top
    pub fn dismiss_overlay(&mut self, app: &str, id: ComponentId) -> Result<()> {
        let container = self.ui(app)?;
        if container.top_overlay().map(|(top, _)| top) != Some(id) {
            tracing::debug!(app, overlay = %id, "Ignoring dismissal of an overlay that is not on top");
            return Ok(());
        }
        container.pop_overlay();
        self.update_title();
        Ok(())
    }

    /// Close the dialog `id` and hand `response` to its callback. Later
    /// presses on the same dialog find it gone and do nothing.
    pub fn record_dialog_response(&mut self, app: &str, id: ComponentId, response: &str) -> Result<()> {
        let container = self.ui(app)?;
        if container.top_overlay().map(|(top, _)| top) != Some(id) {
            return Ok(());
        }
        let closed = container.pop_overlay();
        self.update_title();
        tracing::debug!(app, overlay = %id, response, "Dialog answered");
        match closed.and_then(|c| c.on_response) {
            Some(callback) => callback(self, response),
            None => Ok(()),
        }
    }

    /// Show the active application's title, or its top overlay's
    pub(crate) fn update_title(&mut self) {
        let title = self
            .apps
            .active()
            .and_then(|name| self.apps.get(name))
            .map(|app| match app.container().top_overlay() {
                Some((_, title)) => title.to_string(),
                None => app.manifest().title().to_string(),
            })
            .unwrap_or_default();
        self.bar.set_title(&title);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Startup
    // ─────────────────────────────────────────────────────────────────────────

    /// Install the builtin applications and bring up `first` (or home)
    pub fn boot(&mut self, first: Option<&str>) -> Result<()> {
        self.install_apps(builtin::manifests()?);
        if !self.apps.contains(crate::apps::HOME) {
            return Err(ShellError::UnknownApp(crate::apps::HOME.to_string()).into());
        }
        self.activate(crate::apps::HOME)?;
        if let Some(name) = first.filter(|name| *name != crate::apps::HOME) {
            self.open_by_name(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::HOME;
    use crate::ui::{Component, Declared, Dialog};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn booted() -> Shell {
        let mut shell = Shell::for_tests();
        shell.boot(None).unwrap();
        shell
    }

    #[test]
    fn test_boot_activates_home() {
        let shell = booted();
        assert_eq!(shell.apps().active(), Some(HOME));
        assert_eq!(shell.function_bar().title(), "Home");
        assert_eq!(shell.app_area(), Size::new(240, 280));
    }

    #[test]
    fn test_dialog_push_pop_restores_children() {
        let mut shell = booted();
        let ui = shell.ui(HOME).unwrap();
        ui.add(Component::panel(Declared::px(0, 0, 10, 10)));
        ui.add(Component::panel(Declared::px(10, 0, 10, 10)));
        let before: Vec<_> = ui.content().iter().map(|c| c.id()).collect();

        let id = Dialog::ok("Notice", "Hello").show(&mut shell, HOME).unwrap();
        assert_eq!(shell.function_bar().title(), "Notice");
        assert_eq!(shell.ui(HOME).unwrap().overlay_depth(), 1);

        shell.record_dialog_response(HOME, id, "OK").unwrap();
        let after: Vec<_> = shell.ui(HOME).unwrap().content().iter().map(|c| c.id()).collect();
        assert_eq!(before, after);
        assert_eq!(shell.function_bar().title(), "Home");
    }

    #[test]
    fn test_response_delivered_once() {
        let mut shell = booted();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = Dialog::yes_no("Q", "Sure?")
            .on_response(move |_, response| {
                sink.borrow_mut().push(response.to_string());
                Ok(())
            })
            .show(&mut shell, HOME)
            .unwrap();

        shell.record_dialog_response(HOME, id, "No").unwrap();
        shell.record_dialog_response(HOME, id, "Yes").unwrap();
        assert_eq!(*seen.borrow(), vec!["No".to_string()]);
        assert_eq!(shell.ui(HOME).unwrap().overlay_depth(), 0);
    }

    #[test]
    fn test_dismiss_ignores_covered_overlay() {
        let mut shell = booted();
        let lower = Overlay::new("Lower", Component::panel(Declared::px(0, 0, 50, 50)))
            .show(&mut shell, HOME)
            .unwrap();
        Overlay::new("Upper", Component::panel(Declared::px(0, 0, 50, 50)))
            .show(&mut shell, HOME)
            .unwrap();

        shell.dismiss_overlay(HOME, lower).unwrap();
        assert_eq!(shell.ui(HOME).unwrap().overlay_depth(), 2);
        assert_eq!(shell.function_bar().title(), "Upper");
    }

    #[test]
    fn test_task_failure_becomes_shell_failure() {
        let mut shell = Shell::for_tests();
        shell.report_task_failure(TaskFailure {
            task: "sync".to_string(),
            owner: Some("notes".to_string()),
            error: anyhow::anyhow!("disk full"),
        });
        let failures = shell.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].origin, "Task 'sync' failed");
        assert_eq!(failures[0].app.as_deref(), Some("notes"));
        assert!(shell.take_failures().is_empty());
    }
}
