pub mod cursor;
pub mod error;
