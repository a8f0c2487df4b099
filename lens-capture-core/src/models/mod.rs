pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod session_models;
pub mod state;
