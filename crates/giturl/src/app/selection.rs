//! Converting editor selections into line ranges.

use std::str::FromStr;

use crate::domain::model::{LineRange, Position, Selection};

/// Convert a selection's begin and end positions into a 1-based inclusive line range.
///
/// A multi-line selection that ends at column 0 does not touch its last row, so that row is
/// excluded. Dragging from the start of line 1 to the start of line 3 selects lines 1-2.
pub fn normalize(start: Position, end: Position) -> LineRange {
    let line_start = start.row.saturating_add(1);
    let mut line_end = end.row.saturating_add(1);
    if line_end > line_start && end.column == 0 {
        line_end -= 1;
    }
    LineRange::new(line_start, line_end)
}

impl Selection {
    /// Line range covered by this selection, independent of drag direction.
    pub fn line_range(&self) -> LineRange {
        normalize(self.begin(), self.finish())
    }
}

/// Line range of the first selection; additional cursors are ignored.
pub fn first_line_range(selections: &[Selection]) -> Option<LineRange> {
    selections.first().map(Selection::line_range)
}

/// Error returned when parsing a [`Selection`] or [`LineRange`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SelectionParseError {
    #[error("invalid position '{0}', expected ROW:COL")]
    InvalidPosition(String),
    #[error("invalid line '{0}', expected a positive number")]
    InvalidLine(String),
}

impl FromStr for Position {
    type Err = SelectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectionParseError::InvalidPosition(value.trim().to_string());
        let (row, column) = value.trim().split_once(':').ok_or_else(invalid)?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        let column = column.trim().parse().map_err(|_| invalid())?;
        Ok(Position::new(row, column))
    }
}

/// Parses `ROW:COL` (a caret) or `ROW:COL-ROW:COL`, all 0-based.
impl FromStr for Selection {
    type Err = SelectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('-') {
            Some((start, end)) => Ok(Selection::new(start.parse()?, end.parse()?)),
            None => value.parse().map(Selection::caret),
        }
    }
}

/// Parses `N` or `N-M`, 1-based. Reversed bounds are swapped and zero is clamped to 1.
impl FromStr for LineRange {
    type Err = SelectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value.split_once('-').unwrap_or((value, value));
        let start = parse_line(start)?;
        let end = parse_line(end)?;
        Ok(LineRange::new(start.min(end).max(1), start.max(end).max(1)))
    }
}

fn parse_line(value: &str) -> Result<usize, SelectionParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| SelectionParseError::InvalidLine(value.trim().to_string()))
}
