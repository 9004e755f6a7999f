use std::io::{self, Write};

use crate::argv::Argv;
use crate::process::{self, Child, Redirect};

/// Runs a single external program.
///
/// In the foreground this blocks until the child terminates and drops its
/// status. In the background it prints the child's pid and hands the child
/// back without waiting. `argv` must not be empty, the dispatcher filters
/// blank commands before they get here.
pub fn launch(argv: &Argv, background: bool) -> Option::<Child> {
    let child = match process::spawn(argv, Redirect::Inherit, "exec error") {
        Ok(ok) => ok,
        Err(e) => {
            log::warn!("could not launch {argv:?}: {e:#}");
            eprintln!("{e:#}");
            return None
        }
    };

    if background {
        // stdout may be gone, the child is tracked either way
        let mut stdout = io::stdout().lock();
        _ = writeln!(stdout, "[BG] Process ID: {pid}", pid = child.pid());
        _ = stdout.flush();
        return Some(child)
    }

    if let Err(e) = process::wait(child) {
        eprintln!("wait failed: {e}")
    } None
}
