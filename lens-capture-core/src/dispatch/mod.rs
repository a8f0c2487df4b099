pub mod classifier_slot;
pub mod frame_dispatcher;

pub use classifier_slot::{BoundDevice, ClassifierBinding, ClassifierSlot};
pub use frame_dispatcher::FrameDispatcher;
