pub mod evidence_capturer;
pub mod evidence_store;
