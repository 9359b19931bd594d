use serde::{Deserialize, Serialize};

use crate::utils::join;

use super::{class::ClassId, ty::TyVar, universe::Universe};

/// A host-side type expression: the form a caller writes types in before they are reified.
///
/// `Params`, `Ellipsis` and `Unpack` are only meaningful as arguments of `Callable` and `Tuple`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    Class(ClassId),
    Apply(ClassId, Vec<TypeExpr>),
    Params(Vec<TypeExpr>),
    Ellipsis,
    Unpack(Box<TypeExpr>),
    Var(TyVar),
    NewType(String, Box<TypeExpr>),
    Str(String),
    Lazy(String),
}

impl TypeExpr {
    pub fn apply<I: IntoIterator<Item = TypeExpr>>(class: ClassId, args: I) -> TypeExpr {
        TypeExpr::Apply(class, args.into_iter().collect())
    }

    pub fn params<I: IntoIterator<Item = TypeExpr>>(args: I) -> TypeExpr {
        TypeExpr::Params(args.into_iter().collect())
    }

    pub fn unpack(inner: TypeExpr) -> TypeExpr {
        TypeExpr::Unpack(Box::new(inner))
    }

    pub fn newtype<S: Into<String>>(name: S, base: TypeExpr) -> TypeExpr {
        TypeExpr::NewType(name.into(), Box::new(base))
    }

    pub fn forward<S: Into<String>>(name: S) -> TypeExpr {
        TypeExpr::Str(name.into())
    }

    pub fn lazy<S: Into<String>>(path: S) -> TypeExpr {
        TypeExpr::Lazy(path.into())
    }

    /// Renders the expression with class names looked up in `universe`.
    pub fn display<'a>(&'a self, universe: &'a Universe) -> ExprDisplay<'a> {
        ExprDisplay {
            expr: self,
            universe,
        }
    }
}

impl From<ClassId> for TypeExpr {
    fn from(id: ClassId) -> TypeExpr {
        TypeExpr::Class(id)
    }
}

impl From<TyVar> for TypeExpr {
    fn from(var: TyVar) -> TypeExpr {
        TypeExpr::Var(var)
    }
}

pub struct ExprDisplay<'a> {
    expr: &'a TypeExpr,
    universe: &'a Universe,
}

impl ExprDisplay<'_> {
    fn nested<'b>(&'b self, expr: &'b TypeExpr) -> ExprDisplay<'b> {
        ExprDisplay {
            expr,
            universe: self.universe,
        }
    }

    fn name(&self, id: ClassId) -> String {
        match self.universe.get(id) {
            Some(c) => c.class_ref().to_string(),
            None => id.to_string(),
        }
    }
}

impl std::fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.expr {
            TypeExpr::Class(id) => write!(f, "{}", self.name(*id)),
            TypeExpr::Apply(id, args) => write!(
                f,
                "{}[{}]",
                self.name(*id),
                join(args.iter().map(|a| self.nested(a)), ", ")
            ),
            TypeExpr::Params(args) => {
                write!(f, "[{}]", join(args.iter().map(|a| self.nested(a)), ", "))
            }
            TypeExpr::Ellipsis => write!(f, "..."),
            TypeExpr::Unpack(inner) => write!(f, "*{}", self.nested(inner)),
            TypeExpr::Var(v) => write!(f, "{:#}", v),
            TypeExpr::NewType(name, _) => write!(f, "{}", name),
            TypeExpr::Str(name) => write!(f, "'{}'", name),
            TypeExpr::Lazy(path) => write!(f, "Lazy['{}']", path),
        }
    }
}
