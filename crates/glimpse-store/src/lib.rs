pub mod backend;
pub mod file_log;
pub mod queries;
pub mod schema;
pub mod store_impl;

pub use backend::DuckDbStore;
pub use file_log::FileEventLog;
