pub mod cache;
pub mod fallback;
pub mod types;
pub mod weather;
