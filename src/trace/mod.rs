pub mod event;
pub mod logger;
pub mod recorder;
