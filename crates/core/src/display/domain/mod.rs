pub mod display_sink;
pub mod frame_annotator;
