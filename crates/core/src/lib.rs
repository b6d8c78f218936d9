#![forbid(unsafe_code)]

pub mod chunking;
pub mod error;
pub mod model;
pub mod reveal;
pub mod table;
pub mod time;

pub use error::ValidationError;
pub use time::Clock;
