#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod time;

pub use error::{ConfigError, Error};
pub use time::Clock;
