//! 16x16 monochrome fill patterns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The side length of a fill pattern.
pub const PATTERN_SIZE: usize = 16;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum PatternError {
    #[error("patterns must have 16 rows, got {0}")]
    Rows(usize),
    #[error("patterns must have 16 columns, row {row} has {len}")]
    Columns { row: usize, len: usize },
}

/// A 16x16 monochrome bitmap used to fill layer geometry.
///
/// Bit 15 of each row is the leftmost column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    bits: [u16; PATTERN_SIZE],
}

impl Pattern {
    /// Builds a pattern from 16 rows of 16 characters; any non-space character sets a bit.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, PatternError> {
        if rows.len() != PATTERN_SIZE {
            return Err(PatternError::Rows(rows.len()));
        }
        let mut bits = [0u16; PATTERN_SIZE];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let len = row.chars().count();
            if len != PATTERN_SIZE {
                return Err(PatternError::Columns { row: i, len });
            }
            for (j, c) in row.chars().enumerate() {
                if c != ' ' {
                    bits[i] |= 1 << (PATTERN_SIZE - 1 - j);
                }
            }
        }
        Ok(Self { bits })
    }

    /// Compile-time version of [`Pattern::from_rows`] for the built-in patterns.
    const fn from_static(rows: [&'static str; PATTERN_SIZE]) -> Self {
        let mut bits = [0u16; PATTERN_SIZE];
        let mut i = 0;
        while i < PATTERN_SIZE {
            let row = rows[i].as_bytes();
            assert!(row.len() == PATTERN_SIZE, "patterns must have 16 columns");
            let mut j = 0;
            while j < PATTERN_SIZE {
                if row[j] != b' ' {
                    bits[i] |= 1 << (PATTERN_SIZE - 1 - j);
                }
                j += 1;
            }
            i += 1;
        }
        Self { bits }
    }

    /// Returns `true` if the bit at (`row`, `col`) is set.
    #[inline]
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.bits[row] & (1 << (PATTERN_SIZE - 1 - col)) != 0
    }

    /// Renders row `row` as 16 characters of `X` and space.
    pub fn row(&self, row: usize) -> String {
        (0..PATTERN_SIZE)
            .map(|col| if self.is_set(row, col) { 'X' } else { ' ' })
            .collect()
    }

    /// Renders every row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..PATTERN_SIZE).map(|row| self.row(row))
    }
}

pub const EMPTY: Pattern = Pattern::from_static([
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
    "                ",
]);

pub const SOLID: Pattern = Pattern::from_static([
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXX",
]);

pub const DENSE: Pattern = Pattern::from_static([
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
    "X X X X X X X X ",
    " X X X X X X X X",
]);

pub const SPARSE: Pattern = Pattern::from_static([
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
    "X   X   X   X   ",
    "                ",
]);

pub const VERY_SPARSE: Pattern = Pattern::from_static([
    "X       X       ",
    "                ",
    "    X       X   ",
    "                ",
    "X       X       ",
    "                ",
    "    X       X   ",
    "                ",
    "X       X       ",
    "                ",
    "    X       X   ",
    "                ",
    "X       X       ",
    "                ",
    "    X       X   ",
    "                ",
]);

pub const SLASH: Pattern = Pattern::from_static([
    "  X       X     ",
    "                ",
    "X       X       ",
    "                ",
    "      X       X ",
    "                ",
    "    X       X   ",
    "                ",
    "  X       X     ",
    "                ",
    "X       X       ",
    "                ",
    "      X       X ",
    "                ",
    "    X       X   ",
    "                ",
]);

pub const BACKSLASH: Pattern = Pattern::from_static([
    "   X       X    ",
    "                ",
    "     X       X  ",
    "                ",
    "       X       X",
    "                ",
    " X       X      ",
    "                ",
    "   X       X    ",
    "                ",
    "     X       X  ",
    "                ",
    "       X       X",
    "                ",
    " X       X      ",
    "                ",
]);

/// The built-in patterns, selectable by name in process configuration files.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternName {
    Empty,
    Solid,
    Dense,
    Sparse,
    VerySparse,
    Slash,
    Backslash,
}

impl PatternName {
    pub fn pattern(self) -> Pattern {
        match self {
            Self::Empty => EMPTY,
            Self::Solid => SOLID,
            Self::Dense => DENSE,
            Self::Sparse => SPARSE,
            Self::VerySparse => VERY_SPARSE,
            Self::Slash => SLASH,
            Self::Backslash => BACKSLASH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_render_back_to_input() {
        let rows: Vec<String> = SPARSE.rows().collect();
        assert_eq!(rows.len(), PATTERN_SIZE);
        assert_eq!(rows[0], "X   X   X   X   ");
        assert_eq!(rows[1], "                ");
        assert_eq!(Pattern::from_rows(&rows).unwrap(), SPARSE);
    }

    #[test]
    fn any_non_space_sets_a_bit() {
        let mut rows = vec!["                "; 16];
        rows[3] = "   .            ";
        let p = Pattern::from_rows(&rows).unwrap();
        assert!(p.is_set(3, 3));
        assert!(!p.is_set(3, 4));
        assert_eq!(p.row(3), "   X            ");
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let rows = vec!["XXXXXXXXXXXXXXXX"; 15];
        assert_eq!(Pattern::from_rows(&rows), Err(PatternError::Rows(15)));

        let mut rows = vec!["XXXXXXXXXXXXXXXX"; 16];
        rows[7] = "XXXX";
        assert_eq!(
            Pattern::from_rows(&rows),
            Err(PatternError::Columns { row: 7, len: 4 })
        );
    }

    #[test]
    fn named_patterns_resolve() {
        assert_eq!(PatternName::Solid.pattern(), SOLID);
        assert!(EMPTY.rows().all(|r| r.trim().is_empty()));
        assert!(SOLID.rows().all(|r| r == "XXXXXXXXXXXXXXXX"));
    }
}
