use std::io::{self, BufRead, ErrorKind, Read, Write};

use crate::config::Config;
use crate::history::History;
use crate::launch::launch;
use crate::pipeline::run_pipe;
use crate::process::Child;
use crate::tokenize::tokenize;
use crate::conditional::run_and;
use crate::builtin::{Builtin, Control};

/// A line split at its operator. Only the first operator found counts,
/// `&&` before `|` before `&`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    And(&'a str, &'a str),
    Pipe(&'a str, &'a str),
    Simple { command: &'a str, background: bool },
}

pub fn parse_line(line: &str) -> Line<'_> {
    // a truncated line can come back empty
    if line.is_empty() || line == "\n" {
        return Line::Blank
    }
    if let Some((left, right)) = line.split_once("&&") {
        return Line::And(left, right)
    }
    if let Some((left, right)) = line.split_once('|') {
        return Line::Pipe(left, right)
    }
    // everything from the first `&` on is dropped
    match line.split_once('&') {
        Some((command, _)) => Line::Simple { command, background: true },
        None => Line::Simple { command: line, background: false }
    }
}

/// The interpreter loop and the state it carries between lines.
pub struct Shell {
    config: Config,
    history: History,
    background: Vec::<Child>,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        let history = History::new(config.history_capacity);
        Self { config, history, background: Vec::new() }
    }

    #[inline(always)]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[cfg(test)]
    fn background(&self) -> &[Child] {
        &self.background
    }

    /// Records and dispatches one raw line, trailing newline included.
    pub fn execute(&mut self, line: &str) -> Control {
        let parsed = parse_line(line);
        if parsed == Line::Blank {
            return Control::Continue
        }

        self.history.record(line);

        let max_args = self.config.max_args;
        match parsed {
            Line::Blank => Control::Continue,
            Line::And(left, right) => {
                run_and(left, right, max_args);
                Control::Continue
            }
            Line::Pipe(left, right) => {
                run_pipe(left, right, max_args);
                Control::Continue
            }
            Line::Simple { command, background } => {
                let argv = tokenize(command, max_args);
                if argv.is_empty() {
                    return Control::Continue
                }
                if let Some(builtin) = Builtin::try_from_argv(&argv) {
                    return builtin.run(&self.history)
                }
                if let Some(child) = launch(&argv, background) {
                    self.background.push(child)
                }
                Control::Continue
            }
        }
    }

    /// Reads, records and dispatches lines until end of input, a read error
    /// or `exit`. A prompt that cannot be written does not stop the loop.
    pub fn run<R: BufRead>(&mut self, mut reader: R) {
        let mut buf = Vec::with_capacity(self.config.max_line);
        loop {
            self.reap_background();

            if let Err(e) = self.prompt() {
                log::warn!("could not write prompt: {e}")
            }

            let line = match read_line(&mut reader, &mut buf, self.config.max_line) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("could not read input: {e}");
                    break
                }
            };

            if self.execute(&line) == Control::Stop {
                break
            }
        }

        log::info!("shutting down, {n} background process(es) left running", n = self.background.len());
        self.history.clear()
    }

    fn prompt(&self) -> io::Result::<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(self.config.prompt.as_bytes())?;
        stdout.flush()
    }

    fn reap_background(&mut self) {
        self.background.retain(|child| match child.try_reap() {
            Ok(None) => true,
            Ok(Some(outcome)) => {
                log::debug!("background {program} ({pid}) {outcome}", program = child.program(), pid = child.pid());
                false
            }
            Err(e) => {
                log::debug!("dropping background {pid}: {e}", pid = child.pid());
                false
            }
        })
    }
}

/// Reads one line of at most `max_line` bytes into `buf`. Longer lines are
/// cut at a character boundary and the rest of the line is skipped without
/// being stored, so the next read starts on a fresh line. `None` at end of
/// input.
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec::<u8>, max_line: usize) -> io::Result::<Option::<String>> {
    buf.clear();
    let n = reader.by_ref().take(max_line as u64).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(None)
    }

    if n == max_line && buf.last() != Some(&b'\n') {
        let skipped = skip_line(reader)?;
        if skipped > 0 {
            log::warn!("line truncated to {max_line} bytes, {skipped} bytes skipped");
        }
        // drop a multi-byte character cut in half
        if let Err(e) = std::str::from_utf8(buf) {
            if e.error_len().is_none() {
                buf.truncate(e.valid_up_to())
            }
        }
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Consumes input up to and including the next newline. Returns how many
/// bytes were thrown away.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result::<usize> {
    let mut skipped = 0;
    loop {
        let available = match reader.fill_buf() {
            Ok(ok) => ok,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e)
        };
        if available.is_empty() {
            return Ok(skipped)
        }
        match available.iter().position(|b| *b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(skipped + i + 1)
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn operator_priority() {
        assert_eq!(parse_line("a | b && c\n"), Line::And("a | b ", " c\n"));
        assert_eq!(parse_line("echo hi | wc -c\n"), Line::Pipe("echo hi ", " wc -c\n"));
        assert_eq!(parse_line("a & | b\n"), Line::Pipe("a & ", " b\n"));
        assert_eq!(parse_line("sleep 1 &\n"), Line::Simple { command: "sleep 1 ", background: true });
        assert_eq!(parse_line("ls\n"), Line::Simple { command: "ls\n", background: false });
    }

    #[test]
    fn splits_at_first_occurrence() {
        assert_eq!(parse_line("a && b && c"), Line::And("a ", " b && c"));
        assert_eq!(parse_line("a | b | c"), Line::Pipe("a ", " b | c"));
    }

    #[test]
    fn text_after_ampersand_is_discarded() {
        assert_eq!(parse_line("sleep 1 & echo x\n"), Line::Simple { command: "sleep 1 ", background: true });
    }

    #[test]
    fn only_a_bare_newline_is_blank() {
        assert_eq!(parse_line("\n"), Line::Blank);
        assert_eq!(parse_line(""), Line::Blank);
        assert_eq!(parse_line("  \n"), Line::Simple { command: "  \n", background: false });
    }

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut shell = Shell::new(Config::default());
        assert_eq!(shell.execute("\n"), Control::Continue);
        assert_eq!(shell.execute(""), Control::Continue);
        assert_eq!(shell.execute("   \n"), Control::Continue);
        assert_eq!(shell.execute(" &\n"), Control::Continue);
        let recorded = shell.history().iter().map(|(_, l)| l).collect::<Vec::<_>>();
        assert_eq!(recorded, ["   \n", " &\n"]);
    }

    #[test]
    fn exit_stops_and_is_recorded() {
        let mut shell = Shell::new(Config::default());
        assert_eq!(shell.execute("true\n"), Control::Continue);
        assert_eq!(shell.execute("exit\n"), Control::Stop);
        assert_eq!(shell.history().len(), 2);
    }

    #[test]
    fn background_children_are_tracked() {
        let mut shell = Shell::new(Config::default());
        shell.execute("true &\n");
        assert_eq!(shell.background().len(), 1);
    }

    #[test]
    fn run_stops_at_exit() {
        let mut shell = Shell::new(Config { prompt: String::new(), ..Config::default() });
        shell.run(Cursor::new("true\nexit\nfalse\n"));
        assert!(shell.history().is_empty());
    }

    #[test]
    fn long_lines_are_truncated_without_bleeding() {
        let mut reader = Cursor::new("abcdefgh\nnext\n");
        let mut buf = Vec::new();
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap().as_deref(), Some("abcd"));
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap().as_deref(), Some("next"));
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap(), None);
    }

    #[test]
    fn huge_lines_never_fill_the_buffer() {
        let mut input = vec![b'a'; 8 << 20];
        input.extend_from_slice(b"\npwd\n");
        let mut reader = Cursor::new(input);
        let mut buf = Vec::new();

        let line = read_line(&mut reader, &mut buf, 100).unwrap().unwrap();
        assert_eq!(line.len(), 100);
        assert!(buf.len() <= 100);
        assert!(buf.capacity() < 4096, "capacity {}", buf.capacity());

        assert_eq!(read_line(&mut reader, &mut buf, 100).unwrap().as_deref(), Some("pwd\n"));
    }

    #[test]
    fn line_of_exactly_max_bytes_is_kept_whole() {
        let mut reader = Cursor::new("abc\nnext\n");
        let mut buf = Vec::new();
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap().as_deref(), Some("abc\n"));
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap().as_deref(), Some("next"));
        assert_eq!(read_line(&mut reader, &mut buf, 4).unwrap(), None);
    }

    #[test]
    fn truncated_to_nothing_is_not_recorded() {
        let mut reader = Cursor::new("é\n");
        let mut buf = Vec::new();
        let line = read_line(&mut reader, &mut buf, 1).unwrap().unwrap();

        let mut shell = Shell::new(Config::default());
        assert_eq!(shell.execute(&line), Control::Continue);
        assert!(shell.history().is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut reader = Cursor::new("é\n");
        let mut buf = Vec::new();
        assert_eq!(read_line(&mut reader, &mut buf, 1).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn last_line_without_newline() {
        let mut reader = Cursor::new("pwd");
        let mut buf = Vec::new();
        assert_eq!(read_line(&mut reader, &mut buf, 100).unwrap().as_deref(), Some("pwd"));
    }
}
