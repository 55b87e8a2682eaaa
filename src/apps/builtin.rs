//! Applications compiled into the shell
//!
//! - `home`  - launcher with one button per installed application
//! - `tasks` - exercises every kind of task unit, dialogs, notifications, the
//!   data store and the interactive widgets

use super::{AppModule, Lifecycle, Manifest, ModuleRegistry, HOME};
use crate::gfx::{Paint, Role, Scheme, Shade};
use crate::shell::{Notification, Shell};
use crate::tasks::{Task, TaskHandle, TaskState};
use crate::ui::{ChildOwning, Component, ComponentId, Declared, Dialog, Dim, DEFAULT_TEXT_SIZE};
use crate::util::truncate_utf8_safe;
use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

const HOME_MANIFEST: &str = r#"{
    "name": "home",
    "title": "Home",
    "version": 1.0,
    "author": "pocket-shell",
    "main": "main",
    "description": "Application launcher"
}"#;

const TASKS_MANIFEST: &str = r#"{
    "name": "tasks",
    "title": "Task Demo",
    "version": 1.0,
    "author": "pocket-shell",
    "main": "main",
    "more": {
        "onStart": "setup",
        "onStop": "cleanup",
        "persist": false
    },
    "description": "Background work, dialogs and persisted settings"
}"#;

/// Manifests of the builtin applications
pub fn manifests() -> Result<Vec<Manifest>> {
    [HOME_MANIFEST, TASKS_MANIFEST]
        .into_iter()
        .map(Manifest::from_json)
        .collect()
}

pub fn register(registry: &mut ModuleRegistry) {
    registry.register(HOME, || Box::new(Launcher::default()));
    registry.register(TasksDemo::APP, || Box::new(TasksDemo::default()));
}

const ROW_HEIGHT: i32 = 44;
/// Longest log line the demo keeps, in bytes
const MAX_LOG_LINE: usize = 48;

// ─────────────────────────────────────────────────────────────────────────────
// Launcher
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Launcher;

impl AppModule for Launcher {
    fn entries(&self) -> &[&'static str] {
        &["main"]
    }

    fn run(&mut self, _entry: &str, shell: &mut Shell, app: &str) -> Result<()> {
        if !shell.ui(app)?.is_empty() {
            return Ok(());
        }

        let targets: Vec<(String, String)> = shell
            .apps()
            .manifests()
            .filter(|m| m.name != HOME)
            .map(|m| (m.name.clone(), m.title().to_string()))
            .collect();
        tracing::debug!(count = targets.len(), "Building launcher");

        let mut list = Component::scrollable(Declared::new(0, 30, Dim::Percent(100), Dim::Percent(85)))
            .with_background(Role::Background);
        for (row, (name, title)) in targets.into_iter().enumerate() {
            let button = Component::button(
                Declared::new(10, row as i32 * ROW_HEIGHT, Dim::Percent(80), ROW_HEIGHT - 6),
                title,
            )
            .with_border(1, Role::Item)
            .on_click(move |shell| shell.activate(&name));
            list.add_child(button);
        }

        let ui = shell.ui(app)?;
        ui.add(Component::text(10, 6, "Applications", DEFAULT_TEXT_SIZE + 2));
        ui.add(list);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Task demo
// ─────────────────────────────────────────────────────────────────────────────

/// State shared between the module and its widget callbacks
#[derive(Default)]
struct DemoState {
    ticks: Cell<u64>,
    stage: Cell<Option<u32>>,
    reminder_fired: Cell<bool>,
    ticker: Cell<Option<TaskHandle>>,
    helpers: RefCell<Vec<TaskHandle>>,
    /// Written by the scan thread, read by the UI thread every tick
    scan: Arc<Mutex<Option<u64>>>,
}

struct Widgets {
    status: ComponentId,
    log: ComponentId,
}

#[derive(Default)]
struct TasksDemo {
    state: Rc<DemoState>,
    widgets: Option<Widgets>,
}

impl TasksDemo {
    const APP: &'static str = "tasks";

    fn build(&mut self, shell: &mut Shell) -> Result<()> {
        let state = self.state.clone();
        let level: u8 = shell.store(Self::APP)?.get_as("level")?.unwrap_or(50);
        let answer: Option<String> = shell.store(Self::APP)?.get_as("last_answer")?;

        let status = Component::text(6, 4, "", DEFAULT_TEXT_SIZE);
        let log = Component::scrollable(Declared::new(0, 170, Dim::Percent(100), 120))
            .with_border(1, Role::Item)
            .with_background(Paint::Role(Role::Background, Shade::Light));
        let widgets = Widgets {
            status: status.id(),
            log: log.id(),
        };

        let scan_state = state.clone();
        let scan = Component::button(Declared::new(6, 30, Dim::Percent(30), 34), "Scan")
            .on_click(move |shell| start_scan(shell, &scan_state));

        let ask = Component::button(Declared::new(Dim::Percent(35), 30, Dim::Percent(30), 34), "Ask")
            .on_click(|shell| {
                Dialog::yes_no("Question", "Remember this answer?")
                    .on_response(|shell, response| {
                        shell.store(TasksDemo::APP)?.set("last_answer", response)?;
                        tracing::info!(response, "Stored dialog answer");
                        Ok(())
                    })
                    .show(shell, TasksDemo::APP)
                    .map(|_| ())
            });

        let fail = Component::button(Declared::new(Dim::Percent(68), 30, Dim::Percent(30), 34), "Fail")
            .with_background(Role::Error)
            .on_click(|shell| {
                shell.spawn_task(
                    Task::one_shot("doomed", |_| bail!("Deliberate failure from the task demo"))
                        .owned_by(TasksDemo::APP),
                );
                Ok(())
            });

        let log_for_ticker = widgets.log;
        let ticker_state = state.clone();
        let pause = Component::checkbox(Declared::px(6, 76, 22, 22), false).on_toggle(move |shell, paused| {
            let Some(ticker) = ticker_state.ticker.get() else {
                return Ok(());
            };
            if paused {
                shell.pause_task(ticker);
            } else {
                shell.resume_task(ticker);
            }
            append_log(shell, log_for_ticker, if paused { "Ticker paused" } else { "Ticker resumed" })
        });

        let dark = Component::switch(Declared::px(6, 106, 44, 22), false).on_toggle(|shell, on| {
            let scheme = if on { Scheme::Dark } else { Scheme::Normal };
            shell.set_scheme(scheme);
            Ok(())
        });

        let slider = Component::slider(Declared::new(6, 136, Dim::Percent(70), 22), level).on_slide(|shell, value| {
            shell.store(TasksDemo::APP)?.set("level", value)?;
            Ok(())
        });

        let ui = shell.ui(Self::APP)?;
        ui.add(status);
        ui.add(scan);
        ui.add(ask);
        ui.add(fail);
        ui.add(pause);
        ui.add(Component::text(34, 78, "Pause ticker", DEFAULT_TEXT_SIZE));
        ui.add(dark);
        ui.add(Component::text(56, 108, "Dark mode", DEFAULT_TEXT_SIZE));
        ui.add(slider);
        ui.add(log);

        if let Some(answer) = answer {
            append_log(shell, widgets.log, &format!("Last answer: {answer}"))?;
        }
        self.widgets = Some(widgets);
        Ok(())
    }

    /// Spawn the ticker, a staged warm-up and a timed reminder
    fn setup(&mut self, shell: &mut Shell) -> Result<()> {
        let state = self.state.clone();
        let ticker = shell.spawn_task(
            Task::repeating("ticker", move |_| {
                state.ticks.set(state.ticks.get() + 1);
                Ok(())
            })
            .owned_by(Self::APP),
        );
        self.state.ticker.set(Some(ticker));

        let state = self.state.clone();
        let warmup = shell.spawn_task(
            Task::staged("warmup", 3, move |_, stage| {
                state.stage.set(Some(stage));
                Ok(())
            })
            .owned_by(Self::APP),
        );

        let state = self.state.clone();
        let reminder = shell.spawn_task(
            Task::timed(
                "reminder",
                Utc::now() + chrono::Duration::seconds(10),
                move |shell| {
                    state.reminder_fired.set(true);
                    shell.notify(Notification::new("Reminder", "Ten seconds have passed.").from_app(TasksDemo::APP));
                    Ok(())
                },
            )
            .owned_by(Self::APP),
        );

        self.state.helpers.borrow_mut().extend([ticker, warmup, reminder]);
        tracing::info!("Task demo started");
        Ok(())
    }

    fn cleanup(&mut self, shell: &mut Shell) -> Result<()> {
        let helpers: Vec<TaskHandle> = self.state.helpers.borrow_mut().drain(..).collect();
        for handle in helpers {
            shell.stop_task(handle);
        }
        self.state.ticker.set(None);
        self.widgets = None;
        tracing::info!("Task demo stopped");
        Ok(())
    }

    fn status_line(&self, shell: &Shell) -> String {
        let scan = match self.state.scan.lock() {
            Ok(guard) => guard.map_or("-".to_string(), |n| n.to_string()),
            Err(_) => "poisoned".to_string(),
        };
        let stage = self
            .state
            .stage
            .get()
            .map_or("-".to_string(), |s| s.to_string());
        let ticker = match self.state.ticker.get().map(|h| shell.task_state(h)) {
            Some(TaskState::Paused) => " (paused)",
            _ => "",
        };
        format!(
            "ticks {}{ticker}  stage {stage}  scan {scan}{}",
            self.state.ticks.get(),
            if self.state.reminder_fired.get() { "  !" } else { "" },
        )
    }
}

impl AppModule for TasksDemo {
    fn entries(&self) -> &[&'static str] {
        &["main"]
    }

    fn run(&mut self, _entry: &str, shell: &mut Shell, app: &str) -> Result<()> {
        if shell.ui(app)?.is_empty() || self.widgets.is_none() {
            shell.ui(app)?.clear();
            self.build(shell)?;
        }
        let line = self.status_line(shell);
        let Some(status) = self.widgets.as_ref().map(|w| w.status) else {
            return Ok(());
        };
        if let Some(node) = shell.ui(app)?.find_mut(status) {
            if node.text_content() != Some(line.as_str()) {
                node.set_text(line);
            }
        }
        Ok(())
    }

    fn lifecycle(&mut self, event: Lifecycle, binding: &str, shell: &mut Shell, _app: &str) -> Result<()> {
        match binding {
            "setup" => self.setup(shell),
            "cleanup" => self.cleanup(shell),
            other => bail!("Task demo has no handler '{other}' for {}", event.as_str()),
        }
    }
}

/// Sum the primes below a bound on a worker thread
fn start_scan(shell: &mut Shell, state: &Rc<DemoState>) -> Result<()> {
    let result = state.scan.clone();
    *result.lock().map_err(|_| anyhow!("Scan result lock poisoned"))? = None;
    shell.spawn_task(
        Task::parallel("prime-scan", move || {
            let sum = (2..50_000u64).filter(|n| is_prime(*n)).sum();
            *result.lock().map_err(|_| anyhow!("Scan result lock poisoned"))? = Some(sum);
            Ok(())
        })
        .owned_by(TasksDemo::APP),
    );
    Ok(())
}

fn is_prime(n: u64) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

fn append_log(shell: &mut Shell, log: ComponentId, line: &str) -> Result<()> {
    let Some(list) = shell.ui(TasksDemo::APP)?.find_mut(log) else {
        return Ok(());
    };
    let y = list.children().len() as i32 * (DEFAULT_TEXT_SIZE as i32 + 4);
    let line = truncate_utf8_safe(line, MAX_LOG_LINE);
    list.add_child(Component::text(4, y, line, DEFAULT_TEXT_SIZE));
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn shell_with_builtins() -> Shell {
        let mut shell = Shell::for_tests();
        register(&mut shell.registry);
        shell.install_apps(manifests().unwrap());
        shell
    }

    #[test]
    fn test_builtin_manifests_parse() {
        let manifests = manifests().unwrap();
        let names: Vec<_> = manifests.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["home", "tasks"]);
        assert!(!manifests[1].more.persist);
    }

    #[test]
    fn test_launcher_lists_other_apps() {
        let mut shell = shell_with_builtins();
        shell.activate(HOME).unwrap();
        shell.tick_tasks();

        let ui = shell.ui(HOME).unwrap();
        let list = &ui.content()[1];
        assert_eq!(list.children().len(), 1);
        assert_eq!(list.children()[0].text_content(), Some("Task Demo"));
    }

    #[test]
    fn test_tasks_demo_spawns_helpers_and_cleans_up() {
        let mut shell = shell_with_builtins();
        shell.activate(HOME).unwrap();
        shell.activate("tasks").unwrap();

        // First tick fires onStart, which spawns the helpers
        shell.tick_tasks();
        assert!(!shell.ui("tasks").unwrap().is_empty());
        shell.tick_tasks();
        assert!(shell.scheduler.active_count() >= 4);

        shell.switch_to_previous().unwrap();
        assert_eq!(shell.apps().active(), Some(HOME));
        assert!(shell.ui("tasks").unwrap().is_empty());
        shell.tick_tasks();
        assert_eq!(shell.scheduler.active_count(), 1);
    }

    #[test]
    fn test_is_prime() {
        let primes: Vec<u64> = (0..20).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, [2, 3, 5, 7, 11, 13, 17, 19]);
    }
}
