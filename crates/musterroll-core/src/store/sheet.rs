use serde::{Deserialize, Serialize};

use super::Cell;

pub type Row = Vec<Cell>;

static EMPTY: Cell = Cell::Empty;

/// A sheet's full data range. The first row is the header; everything after
/// it is a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn with_header(header: &[&str]) -> Self {
        Self {
            rows: vec![header.iter().map(|&h| Cell::from(h)).collect()],
        }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn records(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn records_mut(&mut self) -> &mut [Row] {
        self.rows.get_mut(1..).unwrap_or(&mut [])
    }

    pub fn record_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Replace every record, keeping the header row.
    pub fn replace_records(&mut self, records: Vec<Row>) {
        if self.rows.is_empty() {
            self.rows.push(Row::new());
        }
        self.rows.truncate(1);
        self.rows.extend(records);
    }

    pub fn push(&mut self, row: Row) {
        if self.rows.is_empty() {
            self.rows.push(Row::new());
        }
        self.rows.push(row);
    }

    /// Widest row in the sheet
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Cell at `idx`, or an empty cell when the row is short.
pub fn cell(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// Extend a short row with empty cells up to `width`.
pub fn pad(row: &mut Row, width: usize) {
    if row.len() < width {
        row.resize(width, Cell::Empty);
    }
}
