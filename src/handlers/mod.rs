//! HTTP handlers for table CRUD, view reads, and the composite write.

pub mod composite;
pub mod resource;
pub mod view;
