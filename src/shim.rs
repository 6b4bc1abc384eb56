// CLASSIFICATION: COMMUNITY
// Filename: shim.rs v0.2
// Author: Lukas Bower
// Date Modified: 2027-01-18

//! Thin wrappers over the host's threading primitives.
//!
//! Each call maps onto one host facility; failures come back as negated OS
//! error codes, the way the emulated kernel API reports them. Nothing here
//! retries.

use std::thread::JoinHandle;

use log::warn;

use crate::thread::{spawn_with_handshake, SpawnError, StartDelay, ThreadDescriptor};

/// Sleep for `ms` milliseconds.
///
/// Returns `0`, or the negated OS error code if the underlying sleep was
/// rejected or interrupted. A negative `ms` is `-EINVAL`.
pub fn sleep_ms(ms: i64) -> i32 {
    if ms < 0 {
        return -libc::EINVAL;
    }
    let us = (ms as u64).saturating_mul(1000);
    if us > libc::useconds_t::MAX as u64 {
        return -libc::EINVAL;
    }
    let rc = unsafe { libc::usleep(us as libc::useconds_t) };
    if rc == -1 {
        let errno = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(libc::EIO);
        warn!("usleep({us}) failed: {errno}");
        return -errno;
    }
    0
}

/// Owned handle to a running emulated thread.
pub struct ThreadHandle {
    name: String,
    inner: JoinHandle<()>,
}

impl ThreadHandle {
    /// Name the thread was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the thread's entry has returned.
    ///
    /// Returns `0` on success, `-ECANCELED` if the entry panicked. There is
    /// no timeout variant; callers wanting a bounded wait layer it outside.
    pub fn join(self) -> i32 {
        join_host(&self.name, self.inner)
    }
}

pub(crate) fn join_host(name: &str, handle: JoinHandle<()>) -> i32 {
    match handle.join() {
        Ok(()) => 0,
        Err(_) => {
            warn!("thread {name} panicked before completing");
            -libc::ECANCELED
        }
    }
}

/// Create and start a thread that was not statically declared.
///
/// Same descriptor-handoff protocol as the static launcher: this returns
/// only after the spawned thread holds its own copy of `desc`. A
/// manual-start delay makes no sense here and is rejected.
pub fn spawn_thread(desc: ThreadDescriptor) -> Result<ThreadHandle, SpawnError> {
    let delay_ms = match desc.start_delay {
        StartDelay::Ms(ms) => ms,
        StartDelay::Manual => return Err(SpawnError::NoAutoStart(desc.name)),
    };
    let name = desc.name.to_string();
    let inner = spawn_with_handshake(desc, delay_ms)?;
    Ok(ThreadHandle { name, inner })
}
