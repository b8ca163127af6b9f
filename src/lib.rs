pub mod api;
pub mod db;
pub mod enrichment;
mod serde_utils;
