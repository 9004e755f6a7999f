use crate::launch::launch;
use crate::tokenize::tokenize;
use crate::process::{self, Redirect};

/// Runs `left && right`. The right command starts only when the left one
/// exited normally with status zero.
pub fn run_and(left: &str, right: &str, max_args: usize) {
    let argv = tokenize(left, max_args);
    let child = match process::spawn(&argv, Redirect::Inherit, "exec") {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("{e:#}");
            return
        }
    };

    let outcome = match process::wait(child) {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("wait failed: {e}");
            return
        }
    };

    if !outcome.success() {
        log::debug!("skipping {right:?}, left side {outcome}");
        return
    }

    let argv = tokenize(right, max_args);
    if argv.is_empty() {
        return
    }
    _ = launch(&argv, false);
}
