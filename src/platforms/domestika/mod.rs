pub mod api;
pub mod auth;
pub mod browser;
pub mod downloader;
pub mod enumerator;
pub mod parser;
