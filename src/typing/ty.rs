use std::{collections::BTreeSet, convert::Infallible, ops::BitOr};

use serde::{Deserialize, Serialize};

use crate::utils::{join, map_join};

use super::{class::ClassRef, variance::Variance};

/// A type variable: a named placeholder with optional constraints or bound.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TyVar {
    pub name: String,
    pub constraints: BTreeSet<Ty>,
    pub bound: Option<Box<Ty>>,
    pub variance: Variance,
}

impl std::fmt::Display for TyVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}", self.variance.sigil(), self.name)
        }
    }
}

impl TyVar {
    pub fn new<S: Into<String>>(name: S) -> TyVar {
        TyVar {
            name: name.into(),
            constraints: BTreeSet::new(),
            bound: None,
            variance: Variance::Invariant,
        }
    }

    pub fn covariant<S: Into<String>>(name: S) -> TyVar {
        TyVar::new(name).with_variance(Variance::Covariant)
    }

    pub fn contravariant<S: Into<String>>(name: S) -> TyVar {
        TyVar::new(name).with_variance(Variance::Contravariant)
    }

    pub fn with_variance(mut self, variance: Variance) -> TyVar {
        self.variance = variance;
        self
    }

    pub fn with_bound(mut self, bound: Ty) -> TyVar {
        self.bound = Some(Box::new(bound));
        self
    }

    pub fn with_constraints<I: IntoIterator<Item = Ty>>(mut self, constraints: I) -> TyVar {
        self.constraints = constraints.into_iter().collect();
        self
    }
}

/// Parameter list of a callable descriptor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Params {
    /// `...`: accepts anything.
    Any,
    Positional(Vec<Ty>),
    /// Positional parameters followed by a tail absorbing any number of extra arguments.
    Variadic(Vec<Ty>, Box<Ty>),
}

impl std::fmt::Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Params::Any => write!(f, "..."),
            Params::Positional(tys) => write!(f, "[{}]", join(tys, ", ")),
            Params::Variadic(tys, tail) if tys.is_empty() => write!(f, "[*{}]", tail),
            Params::Variadic(tys, tail) => write!(f, "[{}, *{}]", join(tys, ", "), tail),
        }
    }
}

impl Params {
    pub fn tys(&self) -> Vec<&Ty> {
        match self {
            Params::Any => vec![],
            Params::Positional(tys) => tys.iter().collect(),
            Params::Variadic(tys, tail) => tys.iter().chain(std::iter::once(tail.as_ref())).collect(),
        }
    }

    pub fn try_map<E, F>(self, mut f: F) -> Result<Params, E>
    where
        F: FnMut(Ty) -> Result<Ty, E>,
    {
        Ok(match self {
            Params::Any => Params::Any,
            Params::Positional(tys) => {
                Params::Positional(tys.into_iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            Params::Variadic(tys, tail) => {
                let tys = tys.into_iter().map(&mut f).collect::<Result<_, E>>()?;
                Params::Variadic(tys, Box::new(f(*tail)?))
            }
        })
    }
}

/// A named record: ordered, fixed-arity fields accessible by name and position.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordTy {
    pub class: ClassRef,
    pub fields: Vec<(String, Ty)>,
}

impl RecordTy {
    pub fn get_field(&self, f: &str) -> Option<(usize, &Ty)> {
        self.fields
            .iter()
            .enumerate()
            .find_map(|(idx, (g, t))| if f == g { Some((idx, t)) } else { None })
    }

    pub fn field_at(&self, idx: usize) -> Option<&Ty> {
        self.fields.get(idx).map(|(_, t)| t)
    }

    pub fn field_tys(&self) -> Vec<Ty> {
        self.fields.iter().map(|(_, t)| t.clone()).collect()
    }
}

/// The type descriptor: a structural, value-equal model of a (possibly parameterized) type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ty {
    Atomic(ClassRef),
    Generic(ClassRef, Vec<Ty>),
    Tuple(Vec<Ty>, bool),
    Mapping(Box<Ty>, Box<Ty>),
    Callable(Params, Box<Ty>),
    Union(BTreeSet<Ty>),
    Record(RecordTy),
    Var(TyVar),
    NewType(String, Box<Ty>),
    ForwardRef(String),
    LazyRef(String),
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Atomic(c) => write!(f, "{}", c),
            Ty::Generic(c, args) => write!(f, "{}[{}]", c, join(args, ", ")),
            Ty::Tuple(tys, false) if tys.is_empty() => write!(f, "Tuple[()]"),
            Ty::Tuple(tys, false) => write!(f, "Tuple[{}]", join(tys, ", ")),
            Ty::Tuple(tys, true) => write!(f, "Tuple[{}, ...]", join(tys, ", ")),
            Ty::Mapping(k, v) => write!(f, "Mapping[{}, {}]", k, v),
            Ty::Callable(params, ret) => write!(f, "Callable[{}, {}]", params, ret),
            Ty::Union(tys) => write!(f, "Union[{}]", join(tys, ", ")),
            Ty::Record(rec) => {
                if f.alternate() {
                    write!(
                        f,
                        "{}({})",
                        rec.class,
                        map_join(&rec.fields, ", ", |(n, t)| format!("{}: {}", n, t))
                    )
                } else {
                    write!(f, "{}", rec.class)
                }
            }
            Ty::Var(v) => write!(f, "{}", v),
            Ty::NewType(name, _) => write!(f, "{}", name),
            Ty::ForwardRef(name) => write!(f, "'{}'", name),
            Ty::LazyRef(path) => write!(f, "Lazy['{}']", path),
        }
    }
}

impl BitOr for Ty {
    type Output = Ty;

    fn bitor(self, rhs: Ty) -> Ty {
        Ty::union(vec![self, rhs])
    }
}

impl Ty {
    /// The universal top type, `Any`.
    pub fn top() -> Ty {
        Ty::Atomic(ClassRef::top())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Ty::Atomic(c) if c.is_top())
    }

    /// Builds a normalized union: nested unions are flattened, duplicates removed, a single member
    /// stands for itself and any top member absorbs the rest.
    pub fn union<I: IntoIterator<Item = Ty>>(tys: I) -> Ty {
        let mut members = BTreeSet::new();
        for ty in tys {
            match ty {
                Ty::Union(inner) => members.extend(inner),
                ty => {
                    members.insert(ty);
                }
            }
        }

        if members.iter().any(Ty::is_top) {
            return Ty::top();
        }

        if members.len() == 1 {
            if let Some(ty) = members.iter().next().cloned() {
                return ty;
            }
        }

        Ty::Union(members)
    }

    pub fn tuple(tys: Vec<Ty>) -> Ty {
        Ty::Tuple(tys, false)
    }

    /// `Tuple[ty, ...]`
    pub fn homogeneous_tuple(ty: Ty) -> Ty {
        Ty::Tuple(vec![ty], true)
    }

    pub fn mapping(key: Ty, value: Ty) -> Ty {
        Ty::Mapping(Box::new(key), Box::new(value))
    }

    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Callable(Params::Positional(params), Box::new(ret))
    }

    pub fn any_func(ret: Ty) -> Ty {
        Ty::Callable(Params::Any, Box::new(ret))
    }

    pub fn var(var: TyVar) -> Ty {
        Ty::Var(var)
    }

    pub fn newtype<S: Into<String>>(name: S, base: Ty) -> Ty {
        Ty::NewType(name.into(), Box::new(base))
    }

    pub fn forward<S: Into<String>>(name: S) -> Ty {
        Ty::ForwardRef(name.into())
    }

    pub fn lazy<S: Into<String>>(path: S) -> Ty {
        Ty::LazyRef(path.into())
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Ty::Union(_))
    }

    pub fn is_unresolved_ref(&self) -> bool {
        matches!(self, Ty::ForwardRef(_) | Ty::LazyRef(_))
    }

    /// The positional type arguments of this descriptor, in the order a reducing handler would
    /// visit them: generic arguments, tuple elements, mapping key and value, callable parameters
    /// followed by the return type, union members.
    pub fn type_args(&self) -> Vec<Ty> {
        match self {
            Ty::Generic(_, args) => args.clone(),
            Ty::Tuple(tys, _) => tys.clone(),
            Ty::Mapping(k, v) => vec![k.as_ref().clone(), v.as_ref().clone()],
            Ty::Callable(params, ret) => {
                let mut tys = params.tys().into_iter().cloned().collect::<Vec<_>>();
                tys.push(ret.as_ref().clone());
                tys
            }
            Ty::Union(tys) => tys.iter().cloned().collect(),
            Ty::Record(rec) => rec.field_tys(),
            Ty::NewType(_, base) => vec![base.as_ref().clone()],
            Ty::Atomic(_) | Ty::Var(_) | Ty::ForwardRef(_) | Ty::LazyRef(_) => vec![],
        }
    }

    /// Strips every `NewType` layer, returning the innermost base.
    pub fn newtype_root(&self) -> &Ty {
        let mut ty = self;
        while let Ty::NewType(_, base) = ty {
            ty = base;
        }
        ty
    }

    pub fn free_vars(&self) -> Vec<&TyVar> {
        match self {
            Ty::Var(v) => vec![v],
            Ty::Atomic(_) | Ty::ForwardRef(_) | Ty::LazyRef(_) => vec![],
            Ty::Generic(_, tys) | Ty::Tuple(tys, _) => tys.iter().flat_map(Ty::free_vars).collect(),
            Ty::Union(tys) => tys.iter().flat_map(Ty::free_vars).collect(),
            Ty::Mapping(k, v) => {
                let mut vars = k.free_vars();
                vars.extend(v.free_vars());
                vars
            }
            Ty::Callable(params, ret) => {
                let mut vars = params
                    .tys()
                    .into_iter()
                    .flat_map(Ty::free_vars)
                    .collect::<Vec<_>>();
                vars.extend(ret.free_vars());
                vars
            }
            Ty::Record(rec) => rec.fields.iter().flat_map(|(_, t)| t.free_vars()).collect(),
            Ty::NewType(_, base) => base.free_vars(),
        }
    }

    /// The name of the first `ForwardRef` or `LazyRef` found anywhere in this descriptor.
    pub fn first_unresolved(&self) -> Option<&str> {
        match self {
            Ty::ForwardRef(name) | Ty::LazyRef(name) => Some(name),
            Ty::Atomic(_) => None,
            Ty::Var(v) => v
                .constraints
                .iter()
                .find_map(Ty::first_unresolved)
                .or_else(|| v.bound.as_ref().and_then(|b| b.first_unresolved())),
            Ty::Generic(_, tys) | Ty::Tuple(tys, _) => tys.iter().find_map(Ty::first_unresolved),
            Ty::Union(tys) => tys.iter().find_map(Ty::first_unresolved),
            Ty::Mapping(k, v) => k.first_unresolved().or_else(|| v.first_unresolved()),
            Ty::Callable(params, ret) => params
                .tys()
                .into_iter()
                .find_map(Ty::first_unresolved)
                .or_else(|| ret.first_unresolved()),
            Ty::Record(rec) => rec.fields.iter().find_map(|(_, t)| t.first_unresolved()),
            Ty::NewType(_, base) => base.first_unresolved(),
        }
    }

    /// The first class reference anywhere in this descriptor for which `f` holds.
    pub fn find_class<F: Fn(&ClassRef) -> bool>(&self, f: &F) -> Option<&ClassRef> {
        match self {
            Ty::Atomic(c) => Some(c).filter(|c| f(c)),
            Ty::Generic(c, tys) => Some(c)
                .filter(|c| f(c))
                .or_else(|| tys.iter().find_map(|t| t.find_class(f))),
            Ty::Tuple(tys, _) => tys.iter().find_map(|t| t.find_class(f)),
            Ty::Union(tys) => tys.iter().find_map(|t| t.find_class(f)),
            Ty::Mapping(k, v) => k.find_class(f).or_else(|| v.find_class(f)),
            Ty::Callable(params, ret) => params
                .tys()
                .into_iter()
                .find_map(|t| t.find_class(f))
                .or_else(|| ret.find_class(f)),
            Ty::Record(rec) => Some(&rec.class)
                .filter(|c| f(c))
                .or_else(|| rec.fields.iter().find_map(|(_, t)| t.find_class(f))),
            Ty::NewType(_, base) => base.find_class(f),
            Ty::Var(v) => v
                .constraints
                .iter()
                .find_map(|t| t.find_class(f))
                .or_else(|| v.bound.as_ref().and_then(|b| b.find_class(f))),
            Ty::ForwardRef(_) | Ty::LazyRef(_) => None,
        }
    }

    /// Rebuilds this descriptor with `f` applied to each direct child. Unions are renormalized.
    pub fn try_map_children<E, F>(self, mut f: F) -> Result<Ty, E>
    where
        F: FnMut(Ty) -> Result<Ty, E>,
    {
        Ok(match self {
            Ty::Atomic(_) | Ty::Var(_) | Ty::ForwardRef(_) | Ty::LazyRef(_) => self,
            Ty::Generic(c, args) => {
                Ty::Generic(c, args.into_iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            Ty::Tuple(tys, variadic) => {
                Ty::Tuple(tys.into_iter().map(&mut f).collect::<Result<_, E>>()?, variadic)
            }
            Ty::Mapping(k, v) => Ty::Mapping(Box::new(f(*k)?), Box::new(f(*v)?)),
            Ty::Callable(params, ret) => {
                let params = params.try_map(&mut f)?;
                Ty::Callable(params, Box::new(f(*ret)?))
            }
            Ty::Union(tys) => Ty::union(tys.into_iter().map(&mut f).collect::<Result<Vec<_>, E>>()?),
            Ty::Record(RecordTy { class, fields }) => Ty::Record(RecordTy {
                class,
                fields: fields
                    .into_iter()
                    .map(|(n, t)| -> Result<_, E> { Ok((n, f(t)?)) })
                    .collect::<Result<_, E>>()?,
            }),
            Ty::NewType(name, base) => Ty::NewType(name, Box::new(f(*base)?)),
        })
    }

    pub fn map_children<F>(self, mut f: F) -> Ty
    where
        F: FnMut(Ty) -> Ty,
    {
        match self.try_map_children::<Infallible, _>(|t| Ok(f(t))) {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}
