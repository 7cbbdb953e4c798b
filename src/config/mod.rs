pub mod catalog;
pub mod env;
pub mod validator;

pub use catalog::*;
pub use env::*;
pub use validator::*;
