pub mod filter;
pub mod resource;

pub use filter::DeviceFilter;
pub use resource::{ApiPath, ResourceId, ResourcePath, NO_RESOURCE};
