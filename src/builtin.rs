use std::env;
use std::path::PathBuf;
use std::io::{self, Write};

use anyhow::{anyhow, Context};

use crate::argv::Argv;
use crate::history::History;

/// What the line dispatcher does after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Commands run inside the interpreter's own process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Builtin<'a> {
    Cd(Option::<&'a str>),
    Pwd,
    History,
    Exit,
}

impl<'a> Builtin<'a> {
    pub fn try_from_argv(argv: &Argv<'a>) -> Option::<Self> {
        let builtin = match argv.program()? {
            "cd" => Self::Cd(argv.args().first().copied()),
            "pwd" => Self::Pwd,
            "history" => Self::History,
            "exit" => Self::Exit,
            _ => return None
        };
        Some(builtin)
    }

    /// Errors are reported on stderr and never stop the interpreter.
    pub fn run(&self, history: &History) -> Control {
        let result = match self {
            Self::Exit => return Control::Stop,
            Self::Cd(dir) => cd(*dir).context("cd error"),
            Self::Pwd => pwd().context("pwd error"),
            Self::History => {
                let mut stdout = io::stdout().lock();
                history.display(&mut stdout).context("history error")
            }
        };
        if let Err(e) = result {
            eprintln!("{e:#}")
        }
        Control::Continue
    }
}

fn cd(dir: Option::<&str>) -> anyhow::Result::<()> {
    let target = match dir {
        Some(dir) => PathBuf::from(dir),
        None => env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME not set"))?
    };

    // a failed chdir leaves the working directory untouched
    env::set_current_dir(&target)
        .with_context(|| format!("{}", target.display()))?;

    match env::current_dir() {
        Ok(cwd) => env::set_var("PWD", cwd),
        Err(e) => log::warn!("PWD not refreshed: {e}")
    }
    Ok(())
}

fn pwd() -> anyhow::Result::<()> {
    let cwd = env::current_dir()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{cwd}", cwd = cwd.display())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    use crate::tokenize::tokenize;

    fn builtin(line: &str) -> Option::<Builtin<'_>> {
        Builtin::try_from_argv(&tokenize(line, 10))
    }

    #[test]
    fn recognizes_builtins() {
        assert_eq!(builtin("cd /tmp"), Some(Builtin::Cd(Some("/tmp"))));
        assert_eq!(builtin("cd"), Some(Builtin::Cd(None)));
        assert_eq!(builtin("pwd"), Some(Builtin::Pwd));
        assert_eq!(builtin("history\n"), Some(Builtin::History));
        assert_eq!(builtin("exit now"), Some(Builtin::Exit));
    }

    #[test]
    fn everything_else_is_external() {
        assert_eq!(builtin("ls -la"), None);
        assert_eq!(builtin("cdx"), None);
        assert_eq!(builtin(""), None);
    }

    #[test]
    fn exit_stops() {
        let history = History::new(NonZeroUsize::MIN);
        assert_eq!(Builtin::Exit.run(&history), Control::Stop);
        assert_eq!(Builtin::History.run(&history), Control::Continue);
    }

    #[test]
    fn failed_cd_keeps_cwd() {
        let before = env::current_dir().unwrap();
        let err = cd(Some("/nonexistent-path-xyz")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent-path-xyz"));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
