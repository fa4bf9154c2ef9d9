pub mod log_entry;
pub mod session_config;
pub mod session_recorder;
pub mod session_store;
pub mod session_summary;
