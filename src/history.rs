use std::io::{self, Write};
use std::num::NonZeroUsize;

/// Fixed-capacity ring of raw input lines. Once full, recording overwrites
/// the oldest entry.
#[derive(Debug)]
pub struct History {
    slots: Box::<[Option::<Box::<str>>]>,
    // next write slot, which is also the oldest entry once the ring is full
    index: usize,
}

impl History {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let slots = (0..capacity.get()).map(|_| None).collect();
        Self { slots, index: 0 }
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn record(&mut self, line: &str) {
        self.slots[self.index] = Some(line.into());
        self.index = (self.index + 1) % self.slots.len();
    }

    /// Oldest first, numbered from 1.
    #[inline(always)]
    pub fn iter(&self) -> Iter<'_> {
        Iter { history: self, step: 0, number: 0 }
    }

    pub fn display<W: Write>(&self, w: &mut W) -> io::Result::<()> {
        for (number, line) in self.iter() {
            let line = line.strip_suffix('\n').unwrap_or(line);
            writeln!(w, "[{number}] {line}")?;
        }
        w.flush()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.index = 0;
    }
}

pub struct Iter<'a> {
    history: &'a History,
    step: usize,
    number: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option::<Self::Item> {
        let History { slots, index } = self.history;
        while self.step < slots.len() {
            let idx = (index + self.step) % slots.len();
            self.step += 1;
            if let Some(line) = &slots[idx] {
                self.number += 1;
                return Some((self.number, &**line))
            }
        } None
    }
}
