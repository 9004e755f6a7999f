//! A small line-oriented command interpreter.
//!
//! Each input line holds at most one operator: `left && right`,
//! `left | right`, or a trailing `&` to run in the background. The built-ins
//! `cd`, `pwd`, `history` and `exit` run in-process; anything else is forked
//! and exec'd through `PATH`.

pub mod argv;
pub mod builtin;
pub mod conditional;
pub mod config;
pub mod history;
pub mod launch;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod shell;
pub mod tokenize;

pub use config::Config;
pub use shell::Shell;
