pub mod clock;
pub mod constants;
pub mod frame;
pub mod paths;
pub mod region;
pub mod storage_error;
pub mod video_metadata;
