use std::ffi::CString;

use anyhow::Context;

/// Whitespace-split argument vector borrowed from a single input line.
///
/// The `NULL` terminator `execvp` expects is not stored, it is appended by
/// whoever hands the vector to the kernel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Argv<'a> {
    args: Vec::<&'a str>
}

impl<'a> Argv<'a> {
    #[inline(always)]
    pub fn new(args: Vec::<&'a str>) -> Self {
        Self { args }
    }

    #[inline(always)]
    pub fn program(&self) -> Option::<&'a str> {
        self.args.first().copied()
    }

    /// Everything after the program name.
    #[inline(always)]
    pub fn args(&self) -> &[&'a str] {
        self.args.get(1..).unwrap_or_default()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[&'a str] {
        &self.args
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn to_cstrings(&self) -> anyhow::Result::<Vec::<CString>> {
        self.args.iter()
            .map(|arg| {
                CString::new(*arg).with_context(|| format!("{arg:?} contains a nul byte"))
            })
            .collect()
    }
}
