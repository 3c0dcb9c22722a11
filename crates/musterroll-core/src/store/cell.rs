use serde::{Deserialize, Serialize};

/// A single spreadsheet cell as stored in the workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Cell content rendered as the sheet would display it
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    pub fn trimmed(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            other => other.text(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text, or `None` for a blank cell
    pub fn non_blank(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.trimmed())
        }
    }

    /// Read a count column. Blank and non-numeric cells count as zero, the
    /// same as an untouched spreadsheet cell.
    pub fn as_count(&self) -> u32 {
        match self {
            Cell::Int(n) if *n >= 0 => u32::try_from(*n).unwrap_or(u32::MAX),
            Cell::Float(f) if f.is_finite() && *f >= 0.0 => *f as u32,
            Cell::Text(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Int(i64::from(n))
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}
