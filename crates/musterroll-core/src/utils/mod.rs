//! Utility functions for date parsing and display formatting.

pub mod format;

pub use format::{
    age_display, calendar_date, format_timestamp, parse_date, parse_time, parse_timestamp,
    DATE_FORMAT,
};
