//! Serves a fixed-format spreadsheet over HTTP: the sheet is loaded and
//! segmented into named tables once at startup, then queried for table
//! listings, table structure, and per-row sums.

pub mod extract;
pub mod query;
pub mod serve;
pub mod workbook;
