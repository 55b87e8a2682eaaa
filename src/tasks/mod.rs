// Cooperative task scheduler
//
// Background work is a bag of units ticked once per frame by the main loop.
// Units live in an arena addressed by generational handles, so a handle held
// by an application stays safe to use after its unit is gone (it simply
// reports Stopped).
//
// Per tick, for every handle in the active list:
//
//   begin   fresh|running → take the body out of its slot (start hook on first run)
//   run     body(shell) under a panic guard
//   finish  put the body back, or stop the unit:
//             error / panic       → force stop + stop hook + failure
//             one-shot, parallel  → stop
//             staged              → stage += 1, stop when stage reaches max
//             timed               → stop once the due time has passed and it ran
//   sweep   stopped units are dropped from the active list in the same tick
//
// Parallel units hand their body to an OS thread and stop immediately. The
// thread reports failures back over a channel the loop drains each frame.
// Anything it shares with the UI is the caller's `Arc<Mutex<_>>`; the shell
// adds no synchronisation of its own there and reads of it race the thread.

use crate::shell::Shell;
use crate::util::guarded;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

pub type Body = Box<dyn FnMut(&mut Shell) -> Result<()>>;
pub type StagedBody = Box<dyn FnMut(&mut Shell, u32) -> Result<()>>;
pub type ParallelBody = Box<dyn FnOnce() -> Result<()> + Send>;
pub type Hook = Rc<dyn Fn(&mut Shell) -> Result<()>>;

/// Lifecycle state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Spawned, never ticked
    Fresh,
    Running,
    Paused,
    Stopped,
}

/// Optional lifecycle hooks
#[derive(Clone, Default)]
pub struct Hooks {
    pub on_start: Option<Hook>,
    pub on_stop: Option<Hook>,
    pub on_pause: Option<Hook>,
    pub on_resume: Option<Hook>,
}

enum Work {
    Repeating(Body),
    OneShot(Body),
    Staged {
        body: StagedBody,
        stage: u32,
        max_stage: u32,
    },
    Timed {
        due: DateTime<Utc>,
        body: Body,
    },
    Parallel(Option<ParallelBody>),
}

impl Work {
    fn kind_name(&self) -> &'static str {
        match self {
            Work::Repeating(_) => "repeating",
            Work::OneShot(_) => "one-shot",
            Work::Staged { .. } => "staged",
            Work::Timed { .. } => "timed",
            Work::Parallel(_) => "parallel",
        }
    }
}

/// A unit of work waiting to be spawned
pub struct Task {
    name: String,
    owner: Option<String>,
    work: Work,
    hooks: Hooks,
    start_paused: bool,
}

impl Task {
    fn new(name: impl Into<String>, work: Work) -> Self {
        Self {
            name: name.into(),
            owner: None,
            work,
            hooks: Hooks::default(),
            start_paused: false,
        }
    }

    /// Runs every tick until stopped
    pub fn repeating(name: impl Into<String>, body: impl FnMut(&mut Shell) -> Result<()> + 'static) -> Self {
        Self::new(name, Work::Repeating(Box::new(body)))
    }

    /// Runs on its first tick, then stops itself
    pub fn one_shot(name: impl Into<String>, body: impl FnMut(&mut Shell) -> Result<()> + 'static) -> Self {
        Self::new(name, Work::OneShot(Box::new(body)))
    }

    /// Runs once per tick with stage 1, 2, ... and stops when the counter
    /// reaches `max_stage`, so the body sees `max_stage - 1` stages
    pub fn staged(
        name: impl Into<String>,
        max_stage: u32,
        body: impl FnMut(&mut Shell, u32) -> Result<()> + 'static,
    ) -> Self {
        Self::new(
            name,
            Work::Staged {
                body: Box::new(body),
                stage: 1,
                max_stage,
            },
        )
    }

    /// Waits until `due` has passed, runs once, then stops
    pub fn timed(
        name: impl Into<String>,
        due: DateTime<Utc>,
        body: impl FnMut(&mut Shell) -> Result<()> + 'static,
    ) -> Self {
        Self::new(
            name,
            Work::Timed {
                due,
                body: Box::new(body),
            },
        )
    }

    /// Spawns `body` on its own OS thread on the first tick
    pub fn parallel(name: impl Into<String>, body: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self::new(name, Work::Parallel(Some(Box::new(body))))
    }

    pub fn owned_by(mut self, app: impl Into<String>) -> Self {
        self.owner = Some(app.into());
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn on_start(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.hooks.on_start = Some(Rc::new(f));
        self
    }

    pub fn on_stop(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.hooks.on_stop = Some(Rc::new(f));
        self
    }

    pub fn on_pause(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.hooks.on_pause = Some(Rc::new(f));
        self
    }

    pub fn on_resume(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.hooks.on_resume = Some(Rc::new(f));
        self
    }

    /// Spawn in the paused state
    pub fn start_paused(mut self) -> Self {
        self.start_paused = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Generational handle into the scheduler arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A failure reported by a unit
#[derive(Debug)]
pub struct TaskFailure {
    pub task: String,
    pub owner: Option<String>,
    pub error: anyhow::Error,
}

struct Entry {
    name: String,
    owner: Option<String>,
    state: TaskState,
    started: bool,
    hooks: Hooks,
    /// None while the body is out running
    work: Option<Work>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Result of running one unit for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ran,
    /// Timed unit whose due time has not passed
    NotDue,
    /// Staged unit already at its last stage
    Exhausted,
}

/// A unit taken out of its slot for the duration of one run
pub(crate) struct Invocation {
    handle: TaskHandle,
    name: String,
    owner: Option<String>,
    on_start: Option<Hook>,
    work: Work,
    failures: Sender<TaskFailure>,
}

impl Invocation {
    pub(crate) fn handle(&self) -> TaskHandle {
        self.handle
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub(crate) fn take_start_hook(&mut self) -> Option<Hook> {
        self.on_start.take()
    }

    pub(crate) fn run(&mut self, shell: &mut Shell) -> Result<Outcome> {
        match &mut self.work {
            Work::Repeating(body) | Work::OneShot(body) => body(shell).map(|_| Outcome::Ran),
            Work::Staged {
                body,
                stage,
                max_stage,
            } => {
                if *stage >= *max_stage {
                    return Ok(Outcome::Exhausted);
                }
                body(shell, *stage).map(|_| Outcome::Ran)
            }
            Work::Timed { due, body } => {
                if Utc::now() < *due {
                    return Ok(Outcome::NotDue);
                }
                body(shell).map(|_| Outcome::Ran)
            }
            Work::Parallel(body) => {
                if let Some(body) = body.take() {
                    spawn_parallel(&self.name, self.owner.clone(), body, self.failures.clone())?;
                }
                Ok(Outcome::Ran)
            }
        }
    }
}

fn spawn_parallel(
    name: &str,
    owner: Option<String>,
    body: ParallelBody,
    failures: Sender<TaskFailure>,
) -> Result<()> {
    let task = name.to_string();
    std::thread::Builder::new()
        .name(format!("task:{name}"))
        .spawn(move || {
            if let Err(error) = guarded(body) {
                tracing::error!(task = %task, error = %error, "Parallel task failed");
                // The receiver only goes away with the scheduler at shutdown
                let _ = failures.send(TaskFailure { task, owner, error });
            }
        })
        .with_context(|| format!("Failed to spawn thread for parallel task '{name}'"))?;
    Ok(())
}

/// Arena of task units plus the active list
pub struct Scheduler {
    slots: Vec<Slot>,
    free: Vec<u32>,
    active: Vec<TaskHandle>,
    failure_tx: Sender<TaskFailure>,
    failure_rx: Receiver<TaskFailure>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (failure_tx, failure_rx) = mpsc::channel();
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
            failure_tx,
            failure_rx,
        }
    }

    fn entry(&self, handle: TaskHandle) -> Option<&Entry> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, handle: TaskHandle) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn spawn(&mut self, task: Task) -> TaskHandle {
        let Task {
            name,
            owner,
            work,
            hooks,
            start_paused,
        } = task;
        tracing::debug!(task = %name, kind = work.kind_name(), paused = start_paused, "Spawning task");

        let entry = Entry {
            name,
            owner,
            state: if start_paused {
                TaskState::Paused
            } else {
                TaskState::Fresh
            },
            started: false,
            hooks,
            work: Some(work),
        };

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.entry = Some(entry);
                TaskHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                TaskHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.active.push(handle);
        handle
    }

    /// State of a unit; stale handles report Stopped
    pub fn state(&self, handle: TaskHandle) -> TaskState {
        self.entry(handle)
            .map(|e| e.state)
            .unwrap_or(TaskState::Stopped)
    }

    pub fn name(&self, handle: TaskHandle) -> Option<&str> {
        self.entry(handle).map(|e| e.name.as_str())
    }

    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.active.contains(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Handles of every unit not yet swept
    pub fn active_handles(&self) -> Vec<TaskHandle> {
        self.active.clone()
    }

    /// Names of live units, for diagnostics
    pub fn describe(&self) -> Vec<String> {
        self.active
            .iter()
            .filter_map(|h| self.entry(*h))
            .map(|e| format!("{} ({:?})", e.name, e.state))
            .collect()
    }

    /// Mark paused and hand back the pause hook. No-op unless fresh or running.
    pub fn pause(&mut self, handle: TaskHandle) -> Option<Hook> {
        let entry = self.entry_mut(handle)?;
        if !matches!(entry.state, TaskState::Fresh | TaskState::Running) {
            return None;
        }
        tracing::debug!(task = %entry.name, "Pausing task");
        entry.state = TaskState::Paused;
        entry.hooks.on_pause.clone()
    }

    /// Mark runnable and hand back the resume hook. No-op unless paused.
    pub fn resume(&mut self, handle: TaskHandle) -> Option<Hook> {
        let entry = self.entry_mut(handle)?;
        if entry.state != TaskState::Paused {
            return None;
        }
        tracing::debug!(task = %entry.name, "Resuming task");
        entry.state = if entry.started {
            TaskState::Running
        } else {
            TaskState::Fresh
        };
        entry.hooks.on_resume.clone()
    }

    /// Mark stopped and hand back the stop hook. No-op if already stopped.
    pub fn stop(&mut self, handle: TaskHandle) -> Option<Hook> {
        let entry = self.entry_mut(handle)?;
        if entry.state == TaskState::Stopped {
            return None;
        }
        tracing::debug!(task = %entry.name, "Stopping task");
        entry.state = TaskState::Stopped;
        entry.hooks.on_stop.clone()
    }

    /// Take a runnable unit's body out for one run
    pub(crate) fn begin(&mut self, handle: TaskHandle) -> Option<Invocation> {
        let failures = self.failure_tx.clone();
        let entry = self.entry_mut(handle)?;
        if !matches!(entry.state, TaskState::Fresh | TaskState::Running) {
            return None;
        }
        let work = entry.work.take()?;
        let on_start = if entry.started {
            None
        } else {
            entry.started = true;
            entry.hooks.on_start.clone()
        };
        entry.state = TaskState::Running;
        Some(Invocation {
            handle,
            name: entry.name.clone(),
            owner: entry.owner.clone(),
            on_start,
            work,
            failures,
        })
    }

    /// Return the body after a run. `outcome` is None when the run failed.
    /// Hands back the stop hook when this run ended the unit.
    pub(crate) fn finish(&mut self, invocation: Invocation, outcome: Option<Outcome>) -> Option<Hook> {
        let Invocation {
            handle, mut work, ..
        } = invocation;
        let entry = self.entry_mut(handle)?;

        // Stopped from inside its own body: the hook already fired
        if entry.state == TaskState::Stopped {
            return None;
        }

        let Some(outcome) = outcome else {
            tracing::warn!(task = %entry.name, "Task failed, force-stopping");
            entry.state = TaskState::Stopped;
            return entry.hooks.on_stop.clone();
        };

        let done = match (&mut work, outcome) {
            (_, Outcome::Exhausted) => true,
            (Work::Repeating(_), _) => false,
            (Work::Staged { stage, max_stage, .. }, _) => {
                *stage += 1;
                *stage >= *max_stage
            }
            (Work::Timed { .. }, Outcome::NotDue) => false,
            _ => true,
        };

        if done {
            tracing::debug!(task = %entry.name, "Task finished");
            entry.state = TaskState::Stopped;
            return entry.hooks.on_stop.clone();
        }
        entry.work = Some(work);
        None
    }

    /// Drop stopped units from the active list and free their slots
    pub fn sweep(&mut self) {
        let mut freed = Vec::new();
        let slots = &mut self.slots;
        self.active.retain(|handle| {
            let Some(slot) = slots.get_mut(handle.index as usize) else {
                return false;
            };
            if slot.generation != handle.generation {
                return false;
            }
            let stopped = slot
                .entry
                .as_ref()
                .map_or(true, |e| e.state == TaskState::Stopped);
            if stopped {
                slot.entry = None;
                freed.push(handle.index);
            }
            !stopped
        });
        self.free.extend(freed);
    }

    /// Failures reported by parallel threads since the last call
    pub fn drain_failures(&self) -> Vec<TaskFailure> {
        self.failure_rx.try_iter().collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell integration
// ─────────────────────────────────────────────────────────────────────────────

impl Shell {
    pub fn spawn_task(&mut self, task: Task) -> TaskHandle {
        self.scheduler.spawn(task)
    }

    /// Run every runnable unit once, then sweep stopped ones
    pub fn tick_tasks(&mut self) {
        for handle in self.scheduler.active_handles() {
            let Some(mut invocation) = self.scheduler.begin(handle) else {
                continue;
            };
            let result = guarded(|| {
                if let Some(hook) = invocation.take_start_hook() {
                    hook(self)?;
                }
                invocation.run(self)
            });

            let failure = match result {
                Ok(outcome) => {
                    let hook = self.scheduler.finish(invocation, Some(outcome));
                    self.fire_hook(hook, handle, "stop");
                    None
                }
                Err(error) => {
                    let task = invocation.name().to_string();
                    let owner = invocation.owner().map(str::to_string);
                    tracing::error!(task = %task, handle = %invocation.handle(), error = %error, "Task body failed");
                    let hook = self.scheduler.finish(invocation, None);
                    self.fire_hook(hook, handle, "stop");
                    Some(TaskFailure { task, owner, error })
                }
            };
            if let Some(failure) = failure {
                self.report_task_failure(failure);
            }
        }
        self.scheduler.sweep();

        for failure in self.scheduler.drain_failures() {
            self.report_task_failure(failure);
        }
    }

    pub fn pause_task(&mut self, handle: TaskHandle) {
        let hook = self.scheduler.pause(handle);
        self.fire_hook(hook, handle, "pause");
    }

    pub fn resume_task(&mut self, handle: TaskHandle) {
        let hook = self.scheduler.resume(handle);
        self.fire_hook(hook, handle, "resume");
    }

    pub fn stop_task(&mut self, handle: TaskHandle) {
        let hook = self.scheduler.stop(handle);
        self.fire_hook(hook, handle, "stop");
    }

    /// Stop every unit at shutdown, firing their stop hooks
    pub fn stop_all_tasks(&mut self) {
        let handles = self.scheduler.active_handles();
        tracing::debug!(count = handles.len(), "Stopping all tasks");
        for handle in handles {
            self.stop_task(handle);
        }
        self.scheduler.sweep();
    }

    pub fn task_state(&self, handle: TaskHandle) -> TaskState {
        self.scheduler.state(handle)
    }

    /// Run a lifecycle hook; its failure is recorded, never propagated
    fn fire_hook(&mut self, hook: Option<Hook>, handle: TaskHandle, event: &str) {
        let Some(hook) = hook else {
            return;
        };
        if let Err(error) = guarded(|| hook(self)) {
            let task = self
                .scheduler
                .name(handle)
                .unwrap_or("<released>")
                .to_string();
            tracing::error!(task = %task, event, error = %error, "Task hook failed");
            self.report_task_failure(TaskFailure {
                task,
                owner: None,
                error: error.context(format!("{event} hook failed")),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::{Cell, RefCell};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn shell() -> Shell {
        Shell::for_tests()
    }

    #[test]
    fn test_one_shot_stops_and_is_swept_in_its_tick() {
        let mut shell = shell();
        let ran = Rc::new(Cell::new(0));
        let counter = ran.clone();
        let handle = shell.spawn_task(Task::one_shot("once", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        }));
        assert_eq!(shell.task_state(handle), TaskState::Fresh);

        shell.tick_tasks();
        assert_eq!(ran.get(), 1);
        assert_eq!(shell.task_state(handle), TaskState::Stopped);
        assert!(!shell.scheduler.is_active(handle));

        shell.tick_tasks();
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn test_staged_max_three_runs_two_stages() {
        let mut shell = shell();
        let stages = Rc::new(RefCell::new(Vec::new()));
        let seen = stages.clone();
        let handle = shell.spawn_task(Task::staged("stages", 3, move |_, stage| {
            seen.borrow_mut().push(stage);
            Ok(())
        }));

        for _ in 0..3 {
            shell.tick_tasks();
        }
        assert_eq!(*stages.borrow(), vec![1, 2]);
        assert_eq!(shell.task_state(handle), TaskState::Stopped);
    }

    #[test]
    fn test_repeating_pause_resume_and_hooks() {
        let mut shell = shell();
        let log = Rc::new(RefCell::new(Vec::<&'static str>::new()));
        let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
        let handle = shell.spawn_task(
            Task::repeating("loop", move |_| {
                a.borrow_mut().push("run");
                Ok(())
            })
            .on_start(move |_| {
                b.borrow_mut().push("start");
                Ok(())
            })
            .on_pause(move |_| {
                c.borrow_mut().push("pause");
                Ok(())
            })
            .on_resume(move |_| {
                d.borrow_mut().push("resume");
                Ok(())
            })
            .on_stop(move |_| {
                e.borrow_mut().push("stop");
                Ok(())
            }),
        );

        shell.tick_tasks();
        shell.tick_tasks();
        shell.pause_task(handle);
        shell.pause_task(handle);
        shell.tick_tasks();
        shell.resume_task(handle);
        shell.resume_task(handle);
        shell.tick_tasks();
        shell.stop_task(handle);
        shell.stop_task(handle);
        shell.tick_tasks();

        assert_eq!(
            *log.borrow(),
            vec!["start", "run", "run", "pause", "resume", "run", "stop"]
        );
        assert!(!shell.scheduler.is_active(handle));
    }

    #[test]
    fn test_failing_body_is_stopped_and_reported() {
        let mut shell = shell();
        let healthy = Rc::new(Cell::new(0));
        let counter = healthy.clone();

        let bad = shell.spawn_task(Task::repeating("bad", |_| bail!("broken")));
        let panicky = shell.spawn_task(Task::repeating("panicky", |_| panic!("kaboom")));
        shell.spawn_task(Task::repeating("good", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        }));

        shell.tick_tasks();
        shell.tick_tasks();

        assert_eq!(shell.task_state(bad), TaskState::Stopped);
        assert_eq!(shell.task_state(panicky), TaskState::Stopped);
        assert_eq!(healthy.get(), 2);

        let failures = shell.take_failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|f| f.error.to_string().contains("kaboom")));
    }

    #[test]
    fn test_timed_waits_for_due_time() {
        let mut shell = shell();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let future = shell.spawn_task(Task::timed(
            "later",
            Utc::now() + chrono::Duration::hours(1),
            |_| Ok(()),
        ));
        let past = shell.spawn_task(Task::timed(
            "now",
            Utc::now() - chrono::Duration::seconds(1),
            move |_| {
                flag.set(true);
                Ok(())
            },
        ));

        shell.tick_tasks();
        assert!(ran.get());
        assert_eq!(shell.task_state(past), TaskState::Stopped);
        assert_eq!(shell.task_state(future), TaskState::Running);
    }

    #[test]
    fn test_parallel_runs_on_thread_and_stops_immediately() {
        let mut shell = shell();
        let shared = Arc::new(Mutex::new(0));
        let writer = shared.clone();
        let (done_tx, done_rx) = mpsc::channel();
        let handle = shell.spawn_task(Task::parallel("scan", move || {
            *writer.lock().map_err(|_| anyhow::anyhow!("poisoned"))? = 42;
            let _ = done_tx.send(());
            Ok(())
        }));

        shell.tick_tasks();
        assert_eq!(shell.task_state(handle), TaskState::Stopped);
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*shared.lock().unwrap(), 42);
    }

    #[test]
    fn test_parallel_failure_is_drained() {
        let mut shell = shell();
        shell.spawn_task(Task::parallel("doomed", || bail!("thread failed")));

        // The thread reports asynchronously; later ticks drain the channel
        let mut failures = Vec::new();
        for _ in 0..200 {
            shell.tick_tasks();
            failures.extend(shell.take_failures());
            if !failures.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].app, None);
        assert!(failures[0].origin.contains("doomed"));
        assert!(failures[0].error.to_string().contains("thread failed"));
    }

    #[test]
    fn test_stale_handle_reports_stopped_after_reuse() {
        let mut scheduler = Scheduler::new();
        let old = scheduler.spawn(Task::one_shot("a", |_| Ok(())));
        scheduler.stop(old);
        scheduler.sweep();

        let new = scheduler.spawn(Task::one_shot("b", |_| Ok(())));
        assert_eq!(old.index, new.index);
        assert_ne!(old, new);
        assert_eq!(scheduler.state(old), TaskState::Stopped);
        assert_eq!(scheduler.state(new), TaskState::Fresh);
        assert!(scheduler.pause(old).is_none());
    }

    #[test]
    fn test_unit_stopping_itself_mid_tick() {
        let mut shell = shell();
        let slot: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
        let me = slot.clone();
        let handle = shell.spawn_task(Task::repeating("quitter", move |shell| {
            if let Some(handle) = me.get() {
                shell.stop_task(handle);
            }
            Ok(())
        }));
        slot.set(Some(handle));

        shell.tick_tasks();
        assert_eq!(shell.task_state(handle), TaskState::Stopped);
        assert!(!shell.scheduler.is_active(handle));
    }
}
