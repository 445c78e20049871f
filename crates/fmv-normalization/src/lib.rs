#![deny(unsafe_code)]

//! Cell coercion for canonical fields.
//!
//! Every parser is lenient about formatting and strict about content: a non-empty cell
//! that cannot be read as its field kind is reported, never guessed.

pub mod coerce;
pub mod datetime;
pub mod error;
pub mod numeric;
pub mod text;

pub use coerce::coerce_cell;
pub use datetime::{excel_serial_to_date, parse_date};
pub use error::CoercionError;
pub use numeric::parse_amount;
pub use text::{clean_text, normalize_email, normalize_institution};
