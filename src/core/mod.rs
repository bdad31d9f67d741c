pub mod debug_log;
pub mod dependencies;
pub mod filename;
pub mod logging;
pub mod m3u8dl;
pub mod process;
pub mod queue;
