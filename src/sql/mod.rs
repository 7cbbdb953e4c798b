//! Safe SQL builder: identifiers from the catalog only, values as parameters.

mod builder;
pub mod params;
pub mod row;
pub use builder::*;
pub use params::*;
pub use row::*;
