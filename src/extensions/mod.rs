//! Input extensions
//!
//! Readers that turn external data into row sources.

pub mod csv_reader;

pub use csv_reader::CsvReader;
