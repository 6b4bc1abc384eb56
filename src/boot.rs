// CLASSIFICATION: COMMUNITY
// Filename: boot.rs v0.5
// Author: Lukas Bower
// Date Modified: 2027-02-11

//! Native boot tasks and the phased orchestrator.
//!
//! Components register [`TaskDescriptor`]s before boot. The boot sequence
//! takes the frozen registry view, sorts a copy by `(phase, priority)` and
//! dispatches each phase to completion before the next begins, all on the
//! calling thread. After the final boot phase it launches the deferred
//! static threads. `OnExit` tasks are dispatched only by the explicit
//! shutdown call, never by the boot sequence.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use crate::registry::StaticRegistry;
use crate::thread;

/// Boot stages, in dispatch order.
///
/// `OnExit` is reserved for the externally triggered shutdown path; see
/// [`run_exit_tasks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootPhase {
    PreBoot1,
    PreBoot2,
    PreBoot3,
    FirstSleep,
    OnExit,
}

impl BootPhase {
    /// Phases the boot sequence dispatches, in order.
    pub const BOOT_SEQUENCE: [BootPhase; 4] = [
        BootPhase::PreBoot1,
        BootPhase::PreBoot2,
        BootPhase::PreBoot3,
        BootPhase::FirstSleep,
    ];
}

/// One boot callback.
///
/// Runs synchronously in its phase; within a phase, lower priority runs
/// first and equal priorities keep declaration order.
#[derive(Clone, Copy, Debug)]
pub struct TaskDescriptor {
    pub name: &'static str,
    pub entry: fn(),
    pub phase: BootPhase,
    pub priority: i32,
}

impl TaskDescriptor {
    pub const fn new(name: &'static str, entry: fn(), phase: BootPhase, priority: i32) -> Self {
        TaskDescriptor {
            name,
            entry,
            phase,
            priority,
        }
    }
}

static NATIVE_TASKS: StaticRegistry<TaskDescriptor> = StaticRegistry::new("native_task");

/// Register one boot task. Must happen before [`run_boot_sequence`].
pub fn register_task(task: TaskDescriptor) {
    NATIVE_TASKS.register(task);
}

/// Hook observing task dispatch.
///
/// Boot-order verification injects one of these instead of reading ambient
/// globals.
pub trait BootObserver {
    /// Called after `task`'s entry has returned.
    fn task_ran(&mut self, task: &TaskDescriptor);
}

struct NullObserver;

impl BootObserver for NullObserver {
    fn task_ran(&mut self, _task: &TaskDescriptor) {}
}

static BOOT_RAN: AtomicBool = AtomicBool::new(false);
static EXIT_RAN: AtomicBool = AtomicBool::new(false);

fn sorted_tasks() -> Vec<&'static TaskDescriptor> {
    let view = NATIVE_TASKS.view();
    let mut tasks: Vec<&'static TaskDescriptor> = view.iter().collect();
    // stable sort: equal (phase, priority) keeps declaration order
    tasks.sort_by_key(|task| (task.phase, task.priority));
    tasks
}

fn run_phase(tasks: &[&'static TaskDescriptor], phase: BootPhase, observer: &mut dyn BootObserver) {
    for task in tasks.iter().filter(|task| task.phase == phase) {
        debug!(
            "boot task {} (phase {:?}, prio {})",
            task.name, task.phase, task.priority
        );
        (task.entry)();
        observer.task_ran(task);
    }
}

/// Run the phased boot sequence, then launch the deferred static threads.
///
/// Every task in a phase returns before the next phase begins; no task runs
/// more than once. A task that never returns stalls boot, which is an
/// application bug this layer does not defend against. Calling this twice
/// in one process trips a fatal assertion.
pub fn run_boot_sequence() {
    run_boot_sequence_observed(&mut NullObserver);
}

/// [`run_boot_sequence`] with an injected observer.
pub fn run_boot_sequence_observed(observer: &mut dyn BootObserver) {
    assert!(
        !BOOT_RAN.swap(true, Ordering::SeqCst),
        "boot sequence already ran"
    );
    let tasks = sorted_tasks();
    info!("boot: {} native tasks registered", tasks.len());
    for phase in BootPhase::BOOT_SEQUENCE {
        run_phase(&tasks, phase, observer);
    }
    thread::launch_static_threads();
    info!("boot: sequence complete");
}

/// Dispatch the `OnExit` tasks, in the same `(phase, priority)` order.
///
/// Triggered by the embedding process at shutdown; the boot sequence never
/// runs these. At most once per process.
pub fn run_exit_tasks() {
    run_exit_tasks_observed(&mut NullObserver);
}

/// [`run_exit_tasks`] with an injected observer.
pub fn run_exit_tasks_observed(observer: &mut dyn BootObserver) {
    assert!(
        !EXIT_RAN.swap(true, Ordering::SeqCst),
        "exit tasks already ran"
    );
    let tasks = sorted_tasks();
    run_phase(&tasks, BootPhase::OnExit, observer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered() {
        assert!(BootPhase::PreBoot1 < BootPhase::PreBoot2);
        assert!(BootPhase::PreBoot2 < BootPhase::PreBoot3);
        assert!(BootPhase::PreBoot3 < BootPhase::FirstSleep);
        assert!(BootPhase::FirstSleep < BootPhase::OnExit);
    }

    #[test]
    fn boot_sequence_excludes_on_exit() {
        assert!(!BootPhase::BOOT_SEQUENCE.contains(&BootPhase::OnExit));
        assert_eq!(BootPhase::BOOT_SEQUENCE.len(), 4);
    }
}
