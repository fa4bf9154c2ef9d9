pub mod detection;
pub mod display;
pub mod evidence;
pub mod pipeline;
pub mod presence;
pub mod session;
pub mod shared;
pub mod video;
