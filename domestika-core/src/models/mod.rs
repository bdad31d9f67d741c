pub mod course;
pub mod settings;
