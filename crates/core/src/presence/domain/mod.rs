pub mod presence_state;
pub mod presence_tracker;
