mod instance;
mod signature;
mod value;

pub use instance::{isinstance_generic, Instance};
pub use signature::*;
pub use value::Value;
