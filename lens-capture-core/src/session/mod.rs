pub mod completion;
mod worker;
pub mod manager;
mod queue;
mod transaction;

pub use completion::Completion;
pub use manager::CaptureSessionManager;
