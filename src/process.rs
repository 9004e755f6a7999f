use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::fmt::{self, Display};

use anyhow::{anyhow, Context};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, execvp, fork, ForkResult, Pid};

use crate::argv::Argv;

/// Retries `f` while it fails with `EINTR`.
#[inline]
pub fn syscall<F, T>(f: F) -> nix::Result::<T>
where
    F: Fn() -> nix::Result::<T>
{
    loop {
        match f() {
            Err(Errno::EINTR) => continue,
            result => return result
        }
    }
}

/// Anonymous unidirectional byte channel. Both ends are close-on-exec so only
/// the children that `dup2` them onto a standard stream keep them past exec.
#[derive(Debug)]
pub struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

impl Pipe {
    pub fn new() -> nix::Result::<Self> {
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
        Ok(Self { read, write })
    }

    #[inline(always)]
    fn raw_fds(&self) -> [RawFd; 2] {
        [self.read.as_raw_fd(), self.write.as_raw_fd()]
    }
}

/// Standard stream wiring applied inside the child before exec.
#[derive(Clone, Copy, Debug)]
pub enum Redirect<'a> {
    Inherit,
    StdoutTo(&'a Pipe),
    StdinFrom(&'a Pipe),
}

impl Redirect<'_> {
    // Runs in the child only. The pipe's `OwnedFd`s are never dropped there
    // because the child either execs or `_exit`s.
    fn apply(self) -> nix::Result::<()> {
        let (pipe, fd, target) = match self {
            Self::Inherit => return Ok(()),
            Self::StdoutTo(pipe) => (pipe, pipe.write.as_raw_fd(), libc::STDOUT_FILENO),
            Self::StdinFrom(pipe) => (pipe, pipe.read.as_raw_fd(), libc::STDIN_FILENO),
        };
        _ = syscall(|| unistd::dup2(fd, target))?;
        for fd in pipe.raw_fds() {
            _ = syscall(|| unistd::close(fd))?;
        } Ok(())
    }
}

#[derive(Debug)]
pub struct Child {
    pid: Pid,
    program: Box::<str>,
}

impl Child {
    #[inline(always)]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline(always)]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Non-blocking wait. `None` while the child is still running.
    pub fn try_reap(&self) -> nix::Result::<Option::<ExitOutcome>> {
        match syscall(|| waitpid(self.pid, Some(WaitPidFlag::WNOHANG)))? {
            WaitStatus::StillAlive => Ok(None),
            status => Ok(Some(status.into()))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(Signal),
    Other,
}

impl ExitOutcome {
    /// Normal termination with status zero.
    #[inline(always)]
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From::<WaitStatus> for ExitOutcome {
    fn from(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Exited(_, code) => Self::Exited(code),
            WaitStatus::Signaled(_, signal, _) => Self::Signaled(signal),
            _ => Self::Other
        }
    }
}

impl Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter::<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "killed by {signal}"),
            Self::Other => f.write_str("stopped")
        }
    }
}

/// Forks a child that runs `argv` with its streams wired per `redirect`.
///
/// Lookup follows `PATH` the way `execvp` does. If the exec fails the child
/// prints `<label>: <reason>` and exits with status 1, so callers only ever
/// see fork failures and unusable argument vectors here.
pub fn spawn(argv: &Argv, redirect: Redirect, label: &str) -> anyhow::Result::<Child> {
    let Some(program) = argv.program() else {
        return Err(anyhow!("{label}: empty command"))
    };
    let args = argv.to_cstrings().context(label.to_owned())?;

    // anything buffered now would be written twice, once per process image
    _ = io::stdout().flush();

    match unsafe { fork() }.context("fork failed")? {
        ForkResult::Parent { child } => {
            log::debug!("spawned {program} as {child}");
            Ok(Child { pid: child, program: program.into() })
        }
        ForkResult::Child => exec_child(&args, redirect, label)
    }
}

fn exec_child(args: &[CString], redirect: Redirect, label: &str) -> ! {
    // the Rust runtime ignores SIGPIPE and exec would keep it ignored
    _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
    if let Err(e) = redirect.apply() {
        eprintln!("{label}: {e}");
        unsafe { libc::_exit(libc::EXIT_FAILURE) }
    }
    match execvp(&args[0], args) {
        Err(e) => eprintln!("{label}: {e}"),
        Ok(never) => match never {}
    }
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}

/// Blocks until `child` terminates.
pub fn wait(child: Child) -> nix::Result::<ExitOutcome> {
    let status = syscall(|| waitpid(child.pid, None))?;
    let outcome = ExitOutcome::from(status);
    log::debug!("{program} ({pid}) {outcome}", program = child.program, pid = child.pid);
    Ok(outcome)
}
