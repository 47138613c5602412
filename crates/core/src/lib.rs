//! Core types, snapshot records, and validation for the usage statistics engine.

pub mod dimension;
pub mod error;
pub mod instance;
pub mod jvm;
pub mod limits;
pub mod month;
pub mod snapshot;

pub use dimension::*;
pub use error::{DbErrorCode, Error, InputErrorCode, Result};
pub use instance::*;
pub use month::YearMonth;
pub use snapshot::*;
