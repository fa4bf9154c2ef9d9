pub mod fs_session_store;
