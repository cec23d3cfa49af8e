//! Block addressing for an N×N grid.
//!
//! Internally blocks are zero-based, counted row by row. Everything a player
//! sees or types is one-based.

use std::fmt::{self, Display};

use thiserror::Error;

use crate::random::RandomSource;

/// Widest grid ever played. Larger sizes are clamped to it.
pub const MAX_GRID_SIZE: u32 = 1_000;

/// Zero-based (row, col) of a block.
pub fn block_to_row_col(n: u32, index0: u32) -> (u32, u32) {
    (index0 / n, index0 % n)
}

pub fn row_col_to_block(n: u32, row: u32, col: u32) -> u32 {
    row.saturating_mul(n).saturating_add(col)
}

/// Saturates instead of wrapping for sizes past [MAX_GRID_SIZE].
pub fn block_count(n: u32) -> u32 {
    n.saturating_mul(n)
}

/// Uniform zero-based block index in `[0, n² - 1]`.
pub fn pick_differing_block(n: u32, rng: &mut dyn RandomSource) -> u32 {
    rng.below(block_count(n).max(1))
}

/// Where a block sits, as shown to players.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reveal {
    pub block: u32,
    pub row: u32,
    pub col: u32,
}

impl Reveal {
    pub fn of(n: u32, index0: u32) -> Self {
        let (row, col) = block_to_row_col(n, index0);
        Reveal {
            block: index0 + 1,
            row: row + 1,
            col: col + 1,
        }
    }
}

impl Display for Reveal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {} ({} {})", self.block, self.row, self.col)
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FormatError {
    #[error("no block given")]
    Empty,
    #[error("[{0}] is neither a block number nor a 'row col' pair")]
    Unparseable(String),
    #[error("block {value} is outside 1..={max}")]
    BlockOutOfRange { value: u64, max: u32 },
    #[error("row {row}, column {col} is outside a {size}×{size} grid")]
    CellOutOfRange { row: u64, col: u64, size: u32 },
}

/// A player's guess, already checked against the grid it targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selector {
    /// One-based block number.
    Block(u32),
    /// One-based row and column.
    Cell { row: u32, col: u32 },
}

fn parse_number(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl Selector {
    /// Accepts either `"<block>"` or `"<row> <col>"` for an `n`×`n` grid.
    pub fn parse(raw: &str, n: u32) -> Result<Self, FormatError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FormatError::Empty);
        }
        let unparseable = || FormatError::Unparseable(raw.to_string());
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [block] => {
                let value = parse_number(block).ok_or_else(unparseable)?;
                let max = block_count(n);
                if value < 1 || value > max as u64 {
                    return Err(FormatError::BlockOutOfRange { value, max });
                }
                Ok(Selector::Block(value as u32))
            },
            [row, col] => {
                let row = parse_number(row).ok_or_else(unparseable)?;
                let col = parse_number(col).ok_or_else(unparseable)?;
                let in_range = |v: u64| (1..=n as u64).contains(&v);
                if !in_range(row) || !in_range(col) {
                    return Err(FormatError::CellOutOfRange { row, col, size: n });
                }
                Ok(Selector::Cell {
                    row: row as u32,
                    col: col as u32,
                })
            },
            _ => Err(unparseable()),
        }
    }

    /// Zero-based block index this selector points at.
    pub fn index0(&self, n: u32) -> u32 {
        match *self {
            Selector::Block(block) => block - 1,
            Selector::Cell { row, col } => row_col_to_block(n, row - 1, col - 1),
        }
    }

    pub fn hits(&self, n: u32, target_index0: u32) -> bool {
        self.index0(n) == target_index0
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;
    use crate::random::RngSource;

    #[test]
    fn row_col_round_trip() {
        for n in 1..=12 {
            for row in 0..n {
                for col in 0..n {
                    assert_eq!(block_to_row_col(n, row_col_to_block(n, row, col)), (row, col));
                }
            }
        }
        assert_eq!(block_to_row_col(3, 5), (1, 2));
        assert_eq!(Reveal::of(3, 8), Reveal { block: 9, row: 3, col: 3 });
    }

    #[test]
    fn oversized_grids_saturate() {
        assert_eq!(block_count(MAX_GRID_SIZE), 1_000_000);
        assert_eq!(block_count(70_000), u32::MAX);
        assert_eq!(row_col_to_block(70_000, 69_999, 5), u32::MAX);
        assert_eq!(
            Selector::parse("4294967295", 70_000),
            Ok(Selector::Block(u32::MAX))
        );
    }

    #[test]
    fn differing_block_is_uniform() {
        let n = 4;
        let cells = block_count(n) as usize;
        let trials = 32_000;
        let mut counts = vec![0u32; cells];
        let mut rng = RngSource::new(StdRng::seed_from_u64(0x5eec0102));
        for _ in 0..trials {
            counts[pick_differing_block(n, &mut rng) as usize] += 1;
        }
        let expected = trials as f64 / cells as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&count| (count as f64 - expected).powi(2) / expected)
            .sum();
        // 15 degrees of freedom, p = 0.001
        assert!(chi_square < 37.7, "chi square {chi_square} for {counts:?}");
    }

    #[test]
    fn parses_block_numbers() {
        assert_eq!(Selector::parse("4", 2), Ok(Selector::Block(4)));
        assert_eq!(Selector::parse("  7 ", 3), Ok(Selector::Block(7)));
        assert_eq!(
            Selector::parse("5", 2),
            Err(FormatError::BlockOutOfRange { value: 5, max: 4 })
        );
        assert_eq!(
            Selector::parse("0", 2),
            Err(FormatError::BlockOutOfRange { value: 0, max: 4 })
        );
        assert!(matches!(Selector::parse("2.5", 3), Err(FormatError::Unparseable(_))));
        assert!(matches!(Selector::parse("-1", 3), Err(FormatError::Unparseable(_))));
        assert_eq!(Selector::parse("", 3), Err(FormatError::Empty));
    }

    #[test]
    fn parses_row_col_pairs() {
        assert_eq!(Selector::parse("3 3", 3), Ok(Selector::Cell { row: 3, col: 3 }));
        assert_eq!(
            Selector::parse("9 9", 3),
            Err(FormatError::CellOutOfRange { row: 9, col: 9, size: 3 })
        );
        assert!(matches!(Selector::parse("1 2 3", 3), Err(FormatError::Unparseable(_))));
        assert!(matches!(Selector::parse("a 2", 3), Err(FormatError::Unparseable(_))));
    }

    #[test]
    fn both_forms_resolve_to_the_same_block() {
        let n = 3;
        let by_cell = Selector::parse("2 3", n).unwrap();
        let by_block = Selector::parse("6", n).unwrap();
        assert_eq!(by_cell.index0(n), 5);
        assert_eq!(by_block.index0(n), 5);
        assert!(by_cell.hits(n, 5));
        assert!(!by_cell.hits(n, 4));
    }
}
