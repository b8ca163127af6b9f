//! V1 API handlers.

mod songs;


pub use songs::*;
