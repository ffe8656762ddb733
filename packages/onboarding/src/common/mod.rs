// Common types and utilities shared across the application

pub mod id;
pub mod utils;

pub use id::{TempId, TempIdAllocator};
pub use utils::*;
