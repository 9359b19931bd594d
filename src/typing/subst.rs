use std::{
    collections::HashMap,
    iter::FromIterator,
    ops::{Deref, DerefMut},
};

use itertools::Itertools;

use crate::{runtime::Signature, utils::map_join};

use super::ty::{Params, Ty, TyVar};

/// A mapping from type variables to the descriptors that replace them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Subst(HashMap<TyVar, Ty>);

impl Deref for Subst {
    type Target = HashMap<TyVar, Ty>;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Subst {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Subst {
    type Item = (TyVar, Ty);

    type IntoIter = std::collections::hash_map::IntoIter<TyVar, Ty>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(TyVar, Ty)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TyVar, Ty)>>(iter: T) -> Self {
        Subst(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for Subst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| (k.to_string(), v.to_string())))
            .finish()
    }
}

impl std::fmt::Display for Subst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.0.iter().sorted();
        write!(
            f,
            "{{{}}}",
            map_join(entries, ", ", |(k, v)| format!("{:#} := {}", k, v))
        )
    }
}

impl Subst {
    pub fn new() -> Subst {
        Subst(HashMap::new())
    }

    /// Pairs each parameter with the argument at the same position. Extra entries on either side
    /// are ignored.
    pub fn from_types<P, A>(params: P, args: A) -> Subst
    where
        P: IntoIterator<Item = TyVar>,
        A: IntoIterator<Item = Ty>,
    {
        params.into_iter().zip(args.into_iter()).collect()
    }
}

pub trait ApplySubst {
    fn apply_subst(self, subst: &Subst) -> Self;
}

impl ApplySubst for Ty {
    fn apply_subst(self, subst: &Subst) -> Ty {
        match self {
            Ty::Var(v) => match subst.get(&v) {
                Some(t) => t.clone(),
                None => Ty::Var(v),
            },
            ty => ty.map_children(|t| t.apply_subst(subst)),
        }
    }
}

impl ApplySubst for Params {
    fn apply_subst(self, subst: &Subst) -> Params {
        match self.try_map::<std::convert::Infallible, _>(|t| Ok(t.apply_subst(subst))) {
            Ok(params) => params,
            Err(never) => match never {},
        }
    }
}

impl ApplySubst for Signature {
    fn apply_subst(self, subst: &Subst) -> Signature {
        Signature {
            params: self.params.apply_subst(subst),
            required: self.required,
            variadic: self.variadic.apply_subst(subst),
            ret: self.ret.apply_subst(subst),
        }
    }
}

impl<T: ApplySubst> ApplySubst for Box<T> {
    fn apply_subst(self, subst: &Subst) -> Box<T> {
        Box::new((*self).apply_subst(subst))
    }
}

impl<T: ApplySubst> ApplySubst for Option<T> {
    fn apply_subst(self, subst: &Subst) -> Option<T> {
        self.map(|t| t.apply_subst(subst))
    }
}

impl<T: ApplySubst> ApplySubst for Vec<T> {
    fn apply_subst(self, subst: &Subst) -> Vec<T> {
        self.into_iter().map(|t| t.apply_subst(subst)).collect()
    }
}

/// The descriptor a type variable stands for when nothing else is known: the union of its
/// constraints, else its bound, else the top type.
pub fn constraint_type(var: &TyVar) -> Ty {
    if !var.constraints.is_empty() {
        Ty::union(var.constraints.iter().cloned())
    } else if let Some(bound) = &var.bound {
        bound.as_ref().clone()
    } else {
        Ty::top()
    }
}

/// Replaces each variable bound in `subst` everywhere in `ty`. Unbound variables are kept.
pub fn concretize(ty: &Ty, subst: &Subst) -> Ty {
    ty.clone().apply_subst(subst)
}

/// Replaces every type variable in `ty` with its constraint type.
pub fn concretize_typevars(ty: &Ty) -> Ty {
    let subst = ty
        .free_vars()
        .into_iter()
        .map(|v| (v.clone(), constraint_type(v)))
        .collect::<Subst>();
    concretize(ty, &subst)
}
