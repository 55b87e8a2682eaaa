// Application lifecycle
//
// An application binds a manifest, a root container, a module instance, a
// data store and (while open) one repeating task that runs the module's main
// entry every tick.
//
//   inactive ──activate──▶ active ──activate other──▶ background (task paused)
//      ▲                     │                            │
//      └──── full close ─────┴──── full close / no persist┘
//
// The recency list is most-recent-first and holds every open application.
// `activate` pauses (or, for non-persistent apps, fully closes) whatever is at
// its front before taking its place.

pub mod builtin;
pub mod manifest;
pub mod store;

pub use manifest::{Lifecycle, Manifest};
pub use store::DataStore;

use crate::display::Display;
use crate::error::ShellError;
use crate::gfx::{Scheme, Size};
use crate::shell::Shell;
use crate::tasks::{Hook, Hooks, Task, TaskHandle, TaskState};
use crate::ui::{AppContainer, Dialog};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Name of the launcher application, which can never be fully closed
pub const HOME: &str = "home";

/// Behaviour behind an application
pub trait AppModule {
    /// Entry points `run` accepts
    fn entries(&self) -> &[&'static str];

    /// Run `entry` once; called every tick while the application is active
    fn run(&mut self, entry: &str, shell: &mut Shell, app: &str) -> Result<()>;

    /// A lifecycle event the manifest bound to `binding`
    fn lifecycle(&mut self, _event: Lifecycle, _binding: &str, _shell: &mut Shell, _app: &str) -> Result<()> {
        Ok(())
    }

    /// Take over the whole display until returning
    fn immersive(&mut self, entry: &str, _display: &mut dyn Display) -> Result<()> {
        tracing::warn!(entry, "Module has no immersive mode");
        Ok(())
    }
}

pub type ModuleFactory = Box<dyn Fn() -> Box<dyn AppModule>>;

/// Module implementations by name
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: impl Fn() -> Box<dyn AppModule> + 'static) {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the module a manifest names and check its entry points
    pub fn instantiate(&self, manifest: &Manifest) -> Result<Box<dyn AppModule>, ShellError> {
        let module_name = manifest.module_name();
        let factory = self
            .factories
            .get(module_name)
            .ok_or_else(|| ShellError::UnknownModule {
                app: manifest.name.clone(),
                module: module_name.to_string(),
            })?;
        let module = factory();

        let entries = module.entries();
        let required = std::iter::once(manifest.main.as_str()).chain(manifest.more.immersive.as_deref());
        for entry in required {
            if !entries.contains(&entry) {
                return Err(ShellError::UnknownEntry {
                    module: module_name.to_string(),
                    entry: entry.to_string(),
                });
            }
        }
        Ok(module)
    }
}

/// One installed application
pub struct App {
    manifest: Manifest,
    container: AppContainer,
    module: Rc<RefCell<Box<dyn AppModule>>>,
    store: DataStore,
    task: Option<TaskHandle>,
    offered_immersion: bool,
}

impl App {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn container(&self) -> &AppContainer {
        &self.container
    }

    pub fn task(&self) -> Option<TaskHandle> {
        self.task
    }
}

/// Installed applications plus the recency list
pub struct AppManager {
    apps: BTreeMap<String, App>,
    recency: Vec<String>,
    active: Option<String>,
    area: Size,
    data_dir: PathBuf,
}

impl AppManager {
    pub fn new(area: Size, data_dir: &Path) -> Self {
        Self {
            apps: BTreeMap::new(),
            recency: Vec::new(),
            active: None,
            area,
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn install(&mut self, manifest: Manifest, registry: &ModuleRegistry) -> Result<(), ShellError> {
        let module = registry.instantiate(&manifest)?;
        let name = manifest.name.clone();
        tracing::debug!(app = %name, module = manifest.module_name(), "Installing application");
        let app = App {
            container: AppContainer::new(self.area, manifest.logical_size()),
            store: DataStore::new(&name, &self.data_dir),
            module: Rc::new(RefCell::new(module)),
            manifest,
            task: None,
            offered_immersion: false,
        };
        self.apps.insert(name, app);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&App> {
        self.apps.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut App, ShellError> {
        self.apps
            .get_mut(name)
            .ok_or_else(|| ShellError::UnknownApp(name.to_string()))
    }

    /// Installed manifests in name order
    pub fn manifests(&self) -> impl Iterator<Item = &Manifest> {
        self.apps.values().map(|app| &app.manifest)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Open applications, most recent first
    pub fn recency(&self) -> &[String] {
        &self.recency
    }

    pub fn container(&self, name: &str) -> Option<&AppContainer> {
        self.apps.get(name).map(|app| &app.container)
    }

    pub fn container_mut(&mut self, name: &str) -> Option<&mut AppContainer> {
        self.apps.get_mut(name).map(|app| &mut app.container)
    }

    pub fn active_container_mut(&mut self) -> Option<&mut AppContainer> {
        let name = self.active.as_deref()?;
        self.apps.get_mut(name).map(|app| &mut app.container)
    }

    pub fn area(&self) -> Size {
        self.area
    }

    pub(crate) fn resize(&mut self, area: Size) {
        self.area = area;
        for app in self.apps.values_mut() {
            app.container.resize(area);
        }
    }

    fn promote(&mut self, name: &str) {
        self.recency.retain(|n| n != name);
        self.recency.insert(0, name.to_string());
        self.active = Some(name.to_string());
    }

    fn forget(&mut self, name: &str) {
        self.recency.retain(|n| n != name);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell operations
// ─────────────────────────────────────────────────────────────────────────────

impl Shell {
    /// Install every manifest; one that fails to initialise is logged and skipped
    pub fn install_apps(&mut self, manifests: impl IntoIterator<Item = Manifest>) {
        for manifest in manifests {
            let name = manifest.name.clone();
            if let Err(error) = self.apps.install(manifest, &self.registry) {
                tracing::warn!(app = %name, error = %error, "Skipping application that failed to initialise");
            }
        }
    }

    /// Bring `name` to the foreground
    pub fn activate(&mut self, name: &str) -> Result<()> {
        self.activate_with(name, false)
    }

    /// `from_full_close` skips deactivating the front of the recency list,
    /// which has just been closed
    pub fn activate_with(&mut self, name: &str, from_full_close: bool) -> Result<()> {
        if !self.apps.contains(name) {
            return Err(ShellError::UnknownApp(name.to_string()).into());
        }
        if self.apps.active() == Some(name) {
            return Ok(());
        }
        if !from_full_close {
            if let Some(current) = self.apps.recency().first().cloned() {
                if current != name {
                    self.deactivate(&current, true)?;
                }
            }
        }

        self.apps.promote(name);
        let app = self.apps.get_mut(name)?;
        let scheme = app.manifest.color_scheme();
        let title = app.manifest.title().to_string();
        let task = app.task;
        self.palette.set_scheme(scheme);
        self.update_title();

        match task {
            Some(handle) if self.scheduler.state(handle) != TaskState::Stopped => {
                self.resume_task(handle);
            }
            _ => {
                let task = self.app_task(name)?;
                let handle = self.spawn_task(task);
                self.apps.get_mut(name)?.task = Some(handle);
            }
        }
        tracing::info!(app = name, title = %title, "Activated application");

        self.offer_immersion(name, &title)
    }

    /// Send `name` to the background (`pause`) or close it completely.
    /// Applications that do not persist are always closed.
    pub fn deactivate(&mut self, name: &str, pause: bool) -> Result<()> {
        let app = self.apps.get_mut(name)?;
        let pause = pause && app.manifest.more.persist;
        let task = app.task;
        if pause {
            tracing::info!(app = name, "Pausing application");
            if let Some(handle) = task {
                self.pause_task(handle);
            }
        } else {
            tracing::info!(app = name, "Closing application");
            app.container.clear();
            app.task = None;
            if let Some(handle) = task {
                self.stop_task(handle);
            }
            self.apps.forget(name);
        }
        if self.apps.active() == Some(name) {
            self.apps.active = None;
        }
        self.palette.set_scheme(Scheme::Normal);
        Ok(())
    }

    /// Activate the second most recent application
    pub fn switch_to_previous(&mut self) -> Result<()> {
        match self.apps.recency().get(1).cloned() {
            Some(previous) => self.activate(&previous),
            None => Ok(()),
        }
    }

    /// Close `name` and bring back whatever is now most recent (or home)
    pub fn full_close(&mut self, name: &str) -> Result<()> {
        self.deactivate(name, false)?;
        let next = self
            .apps
            .recency()
            .first()
            .cloned()
            .or_else(|| self.apps.contains(HOME).then(|| HOME.to_string()));
        match next {
            Some(next) => self.activate_with(&next, true),
            None => {
                self.update_title();
                Ok(())
            }
        }
    }

    /// Close the foreground application, unless it is home
    pub fn full_close_current(&mut self) -> Result<()> {
        match self.apps.active().map(str::to_string) {
            Some(active) if active != HOME => self.full_close(&active),
            _ => Ok(()),
        }
    }

    /// Close every open application and return to home
    pub fn stop_all(&mut self) -> Result<()> {
        let open: Vec<String> = self.apps.recency().to_vec();
        for name in open.iter().filter(|n| n.as_str() != HOME) {
            if let Err(error) = self.deactivate(name, false) {
                tracing::warn!(app = %name, error = %error, "Failed to close application");
            }
        }
        if self.apps.contains(HOME) {
            self.activate(HOME)?;
        }
        Ok(())
    }

    /// Re-resolve every application's layout (resize or rotation)
    pub fn refresh_all(&mut self) {
        let area = self.app_area();
        self.apps.resize(area);
        for app in self.apps.apps.values_mut() {
            app.container.refresh(&self.palette, self.fonts.as_ref());
        }
    }

    /// Open an application by name, telling the user when there is none
    pub fn open_by_name(&mut self, name: &str) -> Result<()> {
        if self.apps.contains(name) {
            return self.activate(name);
        }
        tracing::warn!(app = name, "No such application");
        match self.apps.active().map(str::to_string) {
            Some(active) => {
                Dialog::error(format!("No application named '{name}' is installed."))
                    .show(self, &active)
                    .map(|_| ())
            }
            None => Err(ShellError::UnknownApp(name.to_string()).into()),
        }
    }

    /// Root container of `app`
    pub fn ui(&mut self, app: &str) -> Result<&mut AppContainer> {
        Ok(&mut self.apps.get_mut(app)?.container)
    }

    /// Persisted store of `app`
    pub fn store(&mut self, app: &str) -> Result<&mut DataStore> {
        Ok(&mut self.apps.get_mut(app)?.store)
    }

    fn module(&self, name: &str) -> Result<Rc<RefCell<Box<dyn AppModule>>>, ShellError> {
        self.apps
            .get(name)
            .map(|app| app.module.clone())
            .ok_or_else(|| ShellError::UnknownApp(name.to_string()))
    }

    /// Body of an application's task
    fn run_app(&mut self, name: &str) -> Result<()> {
        let module = self.module(name)?;
        let entry = self.apps.get_mut(name)?.manifest.main.clone();
        let mut module = module
            .try_borrow_mut()
            .map_err(|_| ShellError::ModuleBusy(name.to_string()))?;
        module.run(&entry, self, name)
    }

    /// Forward a bound lifecycle event to the module
    fn app_lifecycle(&mut self, name: &str, event: Lifecycle) -> Result<()> {
        let Some(binding) = self
            .apps
            .get(name)
            .and_then(|app| app.manifest.binding(event))
            .map(str::to_string)
        else {
            return Ok(());
        };
        let module = self.module(name)?;
        let Ok(mut module) = module.try_borrow_mut() else {
            tracing::warn!(app = name, event = event.as_str(), "Module busy, skipping lifecycle event");
            return Ok(());
        };
        tracing::debug!(app = name, event = event.as_str(), binding = %binding, "Lifecycle event");
        module.lifecycle(event, &binding, self, name)
    }

    fn app_task(&self, name: &str) -> Result<Task> {
        let manifest = &self
            .apps
            .get(name)
            .ok_or_else(|| ShellError::UnknownApp(name.to_string()))?
            .manifest;

        let mut hooks = Hooks::default();
        for event in Lifecycle::ALL {
            if manifest.binding(event).is_none() {
                continue;
            }
            let app = name.to_string();
            let hook: Hook = Rc::new(move |shell: &mut Shell| shell.app_lifecycle(&app, event));
            match event {
                Lifecycle::Start => hooks.on_start = Some(hook),
                Lifecycle::Stop => hooks.on_stop = Some(hook),
                Lifecycle::Pause => hooks.on_pause = Some(hook),
                Lifecycle::Resume => hooks.on_resume = Some(hook),
            }
        }

        let app = name.to_string();
        Ok(Task::repeating(format!("app:{name}"), move |shell: &mut Shell| shell.run_app(&app))
            .owned_by(name)
            .with_hooks(hooks))
    }

    /// First activation of an immersive application asks before handing over
    fn offer_immersion(&mut self, name: &str, title: &str) -> Result<()> {
        let app = self.apps.get_mut(name)?;
        let Some(entry) = app.manifest.more.immersive.clone() else {
            return Ok(());
        };
        if app.offered_immersion {
            return Ok(());
        }
        app.offered_immersion = true;

        let owner = name.to_string();
        Dialog::yes_no(
            "Fullscreen",
            format!("The application {title} is requesting total control of the UI. Launch?"),
        )
        .on_response(move |shell: &mut Shell, response: &str| {
            if response == "Yes" {
                shell.pending_immersion = Some((owner, entry));
            }
            Ok(())
        })
        .show(self, name)?;
        Ok(())
    }

    /// Hand the display to an application's immersive entry until it returns
    pub(crate) fn run_immersive(&mut self, name: &str, entry: &str) -> Result<()> {
        let module = self.module(name)?;
        let mut module = module
            .try_borrow_mut()
            .map_err(|_| ShellError::ModuleBusy(name.to_string()))?;
        tracing::info!(app = name, entry, "Entering immersive mode");
        let result = module.immersive(entry, self.display.as_mut());
        tracing::info!(app = name, "Left immersive mode");
        result
    }
}
