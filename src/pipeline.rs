use crate::tokenize::tokenize;
use crate::process::{self, Pipe, Redirect};

/// Runs `left | right`: the left program's stdout feeds the right program's
/// stdin through one anonymous pipe.
///
/// The pipe ends are closed here as soon as both children exist, otherwise
/// the reader would never see end of stream. Returns only after every child
/// that was spawned has terminated.
pub fn run_pipe(left: &str, right: &str, max_args: usize) {
    let pipe = match Pipe::new() {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("pipe failed: {e}");
            return
        }
    };

    let left = tokenize(left, max_args);
    let right = tokenize(right, max_args);

    let producer = process::spawn(&left, Redirect::StdoutTo(&pipe), "exec left");
    let consumer = process::spawn(&right, Redirect::StdinFrom(&pipe), "exec right");

    drop(pipe);

    for child in [producer, consumer] {
        match child.and_then(|child| process::wait(child).map_err(Into::into)) {
            Ok(outcome) => log::debug!("pipe stage {outcome}"),
            Err(e) => eprintln!("{e:#}")
        }
    }
}
