pub mod models;
pub mod search_index;

pub use models::*;
pub use search_index::*;
