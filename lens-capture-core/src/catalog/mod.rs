pub mod device_catalog;
pub mod lens_selector;

pub use device_catalog::DeviceCatalog;
pub use lens_selector::LensSelector;
