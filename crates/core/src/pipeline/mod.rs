pub mod infrastructure;
pub mod session_controller;
pub mod session_logger;
