//! Text acquisition for the CLI: resumes and job descriptions from files

pub mod file_detector;
pub mod text_extractor;
pub mod manager;

pub use manager::InputManager;
