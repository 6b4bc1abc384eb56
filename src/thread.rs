// CLASSIFICATION: COMMUNITY
// Filename: thread.rs v0.6
// Author: Lukas Bower
// Date Modified: 2027-02-11

//! Static thread declarations and the deferred launcher.
//!
//! Threads are declared before boot as immutable [`ThreadDescriptor`]s.
//! Once the boot phases finish, the launcher brings up every declaration
//! not marked manual-start: the spawned host thread takes its own copy of
//! the descriptor and fires a one-shot handoff event before anything else,
//! so the launcher returns only once the caller's descriptor storage is no
//! longer needed. Each declaration moves `Declared → Launching → Running`
//! exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use bitflags::bitflags;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::registry::StaticRegistry;
use crate::shim;

bitflags! {
    /// Option bits carried by a thread declaration.
    ///
    /// Recorded for fidelity with the emulated API; the host scheduler
    /// ignores them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ThreadOptions: u32 {
        /// Thread is essential to the application.
        const ESSENTIAL = 0b0001;
        /// Thread uses the floating-point register set.
        const FP_REGS   = 0b0010;
    }
}

/// Auto-start behaviour of a declared thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartDelay {
    /// Launched by the boot sequence; the entry runs after this many ms.
    Ms(u64),
    /// Never auto-started; application code launches it via
    /// [`launch_thread`].
    Manual,
}

/// Entry signature for emulated kernel threads.
pub type ThreadEntry = fn(usize, usize, usize);

/// Immutable description of one thread, declared before boot.
#[derive(Clone, Copy, Debug)]
pub struct ThreadDescriptor {
    pub name: &'static str,
    pub entry: ThreadEntry,
    pub args: (usize, usize, usize),
    /// Recorded only; host scheduling is used as-is.
    pub priority: i32,
    /// Recorded only; host scheduling is used as-is.
    pub options: ThreadOptions,
    /// Stack-size hint for the spawned host thread; 0 takes the host
    /// default.
    pub stack_size: usize,
    pub start_delay: StartDelay,
}

const DECLARED: u8 = 0;
const LAUNCHING: u8 = 1;
const RUNNING: u8 = 2;

/// A registered declaration together with its launch state.
pub struct StaticThread {
    desc: ThreadDescriptor,
    state: AtomicU8,
}

impl StaticThread {
    fn new(desc: ThreadDescriptor) -> Self {
        StaticThread {
            desc,
            state: AtomicU8::new(DECLARED),
        }
    }

    /// The declaration this record was registered with.
    pub fn descriptor(&self) -> &ThreadDescriptor {
        &self.desc
    }
}

static STATIC_THREADS: StaticRegistry<StaticThread> = StaticRegistry::new("static_thread");

/// Handles of launched static threads, keyed by declaration name.
static LAUNCHED: Lazy<Mutex<HashMap<&'static str, JoinHandle<()>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Register one thread declaration. Must happen before boot.
pub fn register_thread(desc: ThreadDescriptor) {
    STATIC_THREADS.register(StaticThread::new(desc));
}

/// Errors surfaced while bringing a thread up.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The host refused to create the thread.
    #[error("host thread spawn failed: {0}")]
    Os(#[from] std::io::Error),
    /// The spawned thread went away before confirming descriptor handoff.
    #[error("spawned thread never confirmed descriptor handoff")]
    Handshake,
    /// A manual-start descriptor was handed to an auto-start path.
    #[error("thread {0} is declared manual-start")]
    NoAutoStart(&'static str),
    /// No declaration with the given name exists.
    #[error("no static thread named {0}")]
    Unknown(String),
    /// The declaration was already launched.
    #[error("thread {0} launched twice")]
    AlreadyLaunched(&'static str),
}

/// Spawn a host thread for `desc`, delaying its entry by `delay_ms`.
///
/// Returns only after the spawned thread has taken its own copy of the
/// descriptor and fired the one-shot handoff event; the caller's storage
/// for `desc` may be reused freely afterwards. The event is written once
/// by the child and read once here, nothing else touches it.
pub(crate) fn spawn_with_handshake(
    desc: ThreadDescriptor,
    delay_ms: u64,
) -> Result<JoinHandle<()>, SpawnError> {
    let (consumed_tx, consumed_rx) = mpsc::channel::<()>();
    let mut builder = thread::Builder::new().name(desc.name.to_string());
    if desc.stack_size > 0 {
        builder = builder.stack_size(desc.stack_size);
    }
    let handle = builder.spawn(move || {
        // this thread's own copy; the handoff event must not fire before it
        let local = desc;
        let _ = consumed_tx.send(());
        if delay_ms > 0 {
            let rc = shim::sleep_ms(delay_ms as i64);
            if rc < 0 {
                warn!("thread {}: start delay failed ({rc})", local.name);
            }
        }
        (local.entry)(local.args.0, local.args.1, local.args.2);
    })?;
    consumed_rx.recv().map_err(|_| SpawnError::Handshake)?;
    Ok(handle)
}

fn launch(record: &'static StaticThread, delay_ms: u64) -> Result<(), SpawnError> {
    if record
        .state
        .compare_exchange(DECLARED, LAUNCHING, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(SpawnError::AlreadyLaunched(record.desc.name));
    }
    let handle = spawn_with_handshake(record.desc, delay_ms)?;
    record.state.store(RUNNING, Ordering::SeqCst);
    LAUNCHED.lock().unwrap().insert(record.desc.name, handle);
    info!("static thread {} running", record.desc.name);
    Ok(())
}

/// Launch every declaration not marked manual-start.
///
/// Called by the boot sequence after the final boot phase. A failed spawn
/// is fatal here: deferred threads are assumed essential to the program.
pub(crate) fn launch_static_threads() {
    let view = STATIC_THREADS.view();
    for record in view.iter() {
        match record.desc.start_delay {
            StartDelay::Ms(delay) => {
                if let Err(err) = launch(record, delay) {
                    panic!("launching static thread {}: {err}", record.desc.name);
                }
            }
            StartDelay::Manual => {
                debug!("static thread {} is manual-start; skipped", record.desc.name);
            }
        }
    }
}

/// Explicitly launch a declaration by name. The entry runs immediately,
/// with no start delay.
///
/// Intended for manual-start declarations, though any not-yet-launched
/// declaration is accepted.
pub fn launch_thread(name: &str) -> Result<(), SpawnError> {
    let view = STATIC_THREADS.view();
    let record = view
        .iter()
        .find(|record| record.desc.name == name)
        .ok_or_else(|| SpawnError::Unknown(name.to_string()))?;
    launch(record, 0)
}

/// Join a launched static thread by name.
///
/// Blocks until the thread's entry has returned. Returns `0` on success,
/// `-ESRCH` for a name that was never launched, `-ECANCELED` if the entry
/// panicked.
pub fn join_static(name: &str) -> i32 {
    let handle = LAUNCHED.lock().unwrap().remove(name);
    match handle {
        Some(handle) => shim::join_host(name, handle),
        None => -libc::ESRCH,
    }
}
