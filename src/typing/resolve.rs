use fnv::FnvHashMap;

use crate::errors::{GenusError, GenusResult};

use super::ty::{Ty, TyVar};

/// Looks up descriptors by dotted name.
pub trait TypeLoader {
    fn load(&self, path: &str) -> GenusResult<Option<Ty>>;
}

/// A caller-supplied name → descriptor environment for forward references.
#[derive(Clone, Debug, Default)]
pub struct Namespace(FnvHashMap<String, Ty>);

impl Namespace {
    pub fn new() -> Namespace {
        Namespace::default()
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, ty: Ty) -> Option<Ty> {
        self.0.insert(name.into(), ty)
    }

    pub fn with<S: Into<String>>(mut self, name: S, ty: Ty) -> Namespace {
        self.insert(name, ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Ty> {
        self.0.get(name)
    }
}

impl<S: Into<String>> std::iter::FromIterator<(S, Ty)> for Namespace {
    fn from_iter<T: IntoIterator<Item = (S, Ty)>>(iter: T) -> Self {
        Namespace(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl TypeLoader for Namespace {
    fn load(&self, path: &str) -> GenusResult<Option<Ty>> {
        Ok(self.0.get(path).cloned())
    }
}

/// Replaces every `ForwardRef` in `ty` with the descriptor `loader` has for its name.
///
/// Records are inserted as their back-pointer so that resolving twice is a no-op.
pub fn resolve_forward_refs<L: TypeLoader + ?Sized>(ty: &Ty, loader: &L) -> GenusResult<Ty> {
    resolve(ty.clone(), loader, &forward_name)
}

/// Replaces every `LazyRef` in `ty` with the descriptor `loader` has for its path.
pub fn resolve_lazy_refs<L: TypeLoader + ?Sized>(ty: &Ty, loader: &L) -> GenusResult<Ty> {
    resolve(ty.clone(), loader, &lazy_path)
}

fn forward_name(ty: &Ty) -> Option<&str> {
    match ty {
        Ty::ForwardRef(name) => Some(name.as_str()),
        _ => None,
    }
}

fn lazy_path(ty: &Ty) -> Option<&str> {
    match ty {
        Ty::LazyRef(path) => Some(path.as_str()),
        _ => None,
    }
}

fn resolve<L, F>(ty: Ty, loader: &L, select: &F) -> GenusResult<Ty>
where
    L: TypeLoader + ?Sized,
    F: Fn(&Ty) -> Option<&str>,
{
    if let Some(name) = select(&ty) {
        let resolved = match loader.load(name)? {
            Some(Ty::Record(rec)) => Ty::Atomic(rec.class),
            Some(resolved) => resolved,
            None => return Err(GenusError::unresolved_name(name)),
        };
        log::trace!("resolved {} to {}", ty, resolved);
        return Ok(resolved);
    }

    if let Ty::Var(var) = ty {
        return resolve_var(var, loader, select).map(Ty::Var);
    }

    ty.try_map_children(|t| resolve(t, loader, select))
}

/// Type variables carry descriptors in their constraints and bound.
fn resolve_var<L, F>(mut var: TyVar, loader: &L, select: &F) -> GenusResult<TyVar>
where
    L: TypeLoader + ?Sized,
    F: Fn(&Ty) -> Option<&str>,
{
    var.constraints = var
        .constraints
        .into_iter()
        .map(|t| resolve(t, loader, select))
        .collect::<GenusResult<_>>()?;
    var.bound = match var.bound.take() {
        Some(bound) => Some(Box::new(resolve(*bound, loader, select)?)),
        None => None,
    };
    Ok(var)
}
