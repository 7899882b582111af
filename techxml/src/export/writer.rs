//! Line-indenting output.

use std::fmt::Write;
use std::ops::{AddAssign, SubAssign};

/// Indentation helper, counted in spaces.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Indent {
    level: usize,
}

impl Indent {
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }
}

impl AddAssign<usize> for Indent {
    fn add_assign(&mut self, rhs: usize) {
        self.level += rhs;
    }
}

impl SubAssign<usize> for Indent {
    /// Indentation saturates at zero.
    fn sub_assign(&mut self, rhs: usize) {
        self.level = self.level.saturating_sub(rhs);
    }
}

/// A writer that re-indents every line it is given.
///
/// Leading spaces of each line are discarded and replaced by the current
/// [`Indent`]. Lines that are empty or contain only spaces are written as
/// empty lines.
#[derive(Debug)]
pub struct IndentWriter<W> {
    dest: W,
    pub indent: Indent,
    /// Whether a non-space character has been written on the current line.
    in_line: bool,
}

impl<W: Write> IndentWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            dest,
            indent: Indent::default(),
            in_line: false,
        }
    }

    /// Consumes the writer, returning its destination.
    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W: Write> Write for IndentWriter<W> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        for c in s.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    fn write_char(&mut self, c: char) -> std::fmt::Result {
        match c {
            '\n' => {
                self.in_line = false;
                self.dest.write_char(c)
            }
            _ if self.in_line => self.dest.write_char(c),
            ' ' => Ok(()),
            _ => {
                self.in_line = true;
                for _ in 0..self.indent.level() {
                    self.dest.write_char(' ')?;
                }
                self.dest.write_char(c)
            }
        }
    }
}
