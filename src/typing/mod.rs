mod ancestry;
mod reify;
mod resolve;
mod subst;
mod subtype;
mod universe;

pub mod class;
pub mod expr;
pub mod prelude;
pub mod ty;
pub mod variance;

pub use class::*;
pub use expr::*;
pub use prelude::Builtins;
pub use reify::*;
pub use resolve::*;
pub use subst::*;
pub use subtype::*;
pub use ty::*;
pub use universe::*;
pub use variance::*;
