//! Data access: generic table CRUD, view reads, and the composite write.

mod composite;
pub mod payload;
mod resource;
mod view;
pub use composite::{CompositeSpec, CompositeWriteCoordinator, CompositeWritePlan, READING_WITH_SENSORDATA};
pub use payload::CreateRequest;
pub use resource::ResourceModel;
pub use view::{ViewReader, ViewResult, FILTER_COLUMN, INVALID_VIEW};
