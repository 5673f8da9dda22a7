//! Resource-usage sampling: peak resident memory via `getrusage`, and a
//! wall-clock/RSS/exit-code wrapper for timing child commands.
//!
//! The kernel reports `ru_maxrss` in kilobytes on Linux and in bytes on
//! macOS; both are normalized to megabytes here. On non-Unix targets the
//! samplers return `None` and timing still works.

use anyhow::{Context, Result};
use serde::Serialize;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

/// Measured outcome of one timed child command.
///
/// Serialized as the JSON payload the harness prints on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct CommandTiming {
    pub wall_time_s: f64,
    pub peak_rss_mb: Option<f64>,
    pub exit_code: i32,
}

/// Peak resident memory of the current process, in MB.
#[must_use]
pub fn peak_rss_self_mb() -> Option<f64> {
    #[cfg(unix)]
    {
        max_rss(libc::RUSAGE_SELF).map(rss_to_mb)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Run `cmd`, reporting wall time, the peak RSS of reaped children, and
/// the child's exit code.
///
/// The child's stdout is redirected to stderr so the caller's stdout stays
/// reserved for the timing payload. A signal-terminated child reports the
/// conventional `128 + signal` exit code.
///
/// # Errors
/// Returns an error when `cmd` is empty or the child cannot be spawned.
/// A child that runs and fails is not an error here; its exit code is the
/// signal.
pub fn time_command(cmd: &[String]) -> Result<CommandTiming> {
    let (program, args) = cmd.split_first().context("no command provided")?;

    let start = Instant::now();
    let status = Command::new(program)
        .args(args)
        .stdout(child_stdout())
        .status()
        .with_context(|| format!("spawn {program}"))?;
    let wall_time_s = start.elapsed().as_secs_f64();

    Ok(CommandTiming {
        wall_time_s,
        peak_rss_mb: children_peak_rss_mb(),
        exit_code: exit_code(status),
    })
}

/// Peak RSS across reaped child processes, in MB. `None` until a child has
/// been waited on (the kernel reports 0).
fn children_peak_rss_mb() -> Option<f64> {
    #[cfg(unix)]
    {
        match max_rss(libc::RUSAGE_CHILDREN) {
            Some(0) | None => None,
            Some(v) => Some(rss_to_mb(v)),
        }
    }
    #[cfg(not(unix))]
    {
        None
    }
}

#[cfg(unix)]
fn max_rss(who: libc::c_int) -> Option<i64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    let rc = unsafe { libc::getrusage(who, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let usage = unsafe { usage.assume_init() };
    Some(usage.ru_maxrss as i64)
}

#[cfg(unix)]
fn rss_to_mb(value: i64) -> f64 {
    if cfg!(target_os = "macos") {
        value as f64 / (1024.0 * 1024.0)
    } else {
        value as f64 / 1024.0
    }
}

/// stdout handle for the child: a dup of our stderr on Unix, inherited
/// elsewhere.
fn child_stdout() -> Stdio {
    #[cfg(unix)]
    {
        use std::os::fd::FromRawFd;
        let fd = unsafe { libc::dup(libc::STDERR_FILENO) };
        if fd >= 0 {
            return unsafe { Stdio::from_raw_fd(fd) };
        }
        Stdio::inherit()
    }
    #[cfg(not(unix))]
    {
        Stdio::inherit()
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
