use crate::argv::Argv;

const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// Splits `line` on runs of spaces, tabs and newlines.
///
/// At most `max_args - 1` tokens are kept, the last slot being reserved for
/// the terminator. Anything past that is dropped without an error.
pub fn tokenize(line: &str, max_args: usize) -> Argv<'_> {
    let args = line.split(DELIMITERS)
        .filter(|token| !token.is_empty())
        .take(max_args.saturating_sub(1))
        .collect();
    Argv::new(args)
}
