pub mod log_display_sink;
pub mod snapshot_display_sink;
