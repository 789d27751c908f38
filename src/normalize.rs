//! Input normalization for spreadsheet-sourced award rows.
//!
//! `date` resolves the many shapes a deadline arrives in (month names, month
//! indices, `M/D/YYYY` strings, spreadsheet serial numbers) to a calendar
//! date. `list` turns delimiter-separated category cells into the canonical
//! comma-joined form stored in the collection.

pub mod date;
pub mod list;
