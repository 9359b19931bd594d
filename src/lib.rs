#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod macros;

pub mod dispatch;
pub mod errors;
pub mod logger;
pub mod runtime;
pub mod typing;
pub mod utils;

pub use dispatch::{DispatchLevel, DispatchRegistry, RegistryConfig, ResolutionTrace};
pub use errors::{GenusError, GenusErrorKind, GenusResult};
pub use runtime::{isinstance_generic, Callability, Instance, OpaqueKind, Signature, SignatureView, Value};
pub use typing::{
    concretize, concretize_typevars, constraint_type, is_subtype, reconstruct, reify,
    resolve_forward_refs, resolve_lazy_refs, ClassId, ClassRef, ClassSpec, Namespace, Params,
    RecordTy, Subst, SubclassHook, SubtypeRelation, Ty, TyVar, TypeExpr, TypeLoader, Universe,
    Variance,
};
