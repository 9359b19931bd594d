use serde::{Deserialize, Serialize};

use crate::{runtime::Signature, utils::short_name};

use super::{expr::TypeExpr, ty::Ty, ty::TyVar};

/// Index of a class definition in a [`Universe`](super::Universe).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClassId(pub u32);

impl ClassId {
    /// The universal top class, `Any` (also known as `object`).
    pub const TOP: ClassId = ClassId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Nominal identity of a class: its id plus its qualified name.
///
/// Two refs are equal only if they name the same class of the same universe.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: ClassId,
    pub name: String,
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}", short_name(&self.name))
        }
    }
}

impl ClassRef {
    pub fn new<S: Into<String>>(id: ClassId, name: S) -> ClassRef {
        ClassRef {
            id,
            name: name.into(),
        }
    }

    pub fn top() -> ClassRef {
        ClassRef::new(ClassId::TOP, "typing.Any")
    }

    pub fn is_top(&self) -> bool {
        self.id == ClassId::TOP
    }
}

/// How a class reifies when it is used bare or subscripted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Plain,
    Top,
    Tuple,
    Union,
    Callable,
    Mapping,
    Type,
    /// A named record with ordered fields. Field types may refer back to the record itself.
    Record(Vec<(String, TypeExpr)>),
}

impl Default for ClassKind {
    fn default() -> ClassKind {
        ClassKind::Plain
    }
}

/// A rule deciding which classes count as subclasses of an abstract class, in addition to the
/// ones that inherit from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubclassHook {
    /// Subclasses of `of` that subclass none of `excluding`.
    Narrowed { of: ClassId, excluding: Vec<ClassId> },
    /// Classes that do not subclass `of`, plus those that also subclass one of `unless`.
    Complement { of: ClassId, unless: Vec<ClassId> },
    /// Classes whose top-level package is one of these.
    InPackages(Vec<String>),
    NotInPackages(Vec<String>),
    All(Vec<SubclassHook>),
}

impl SubclassHook {
    pub fn packages<I, S>(packages: I) -> SubclassHook
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SubclassHook::InPackages(packages.into_iter().map(Into::into).collect())
    }

    pub fn outside_packages<I, S>(packages: I) -> SubclassHook
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SubclassHook::NotInPackages(packages.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub kind: ClassKind,
    pub params: Vec<TyVar>,
    /// Declared bases, parameterized by `params`.
    pub bases: Vec<Ty>,
    /// C3 linearization, starting with the class itself.
    pub mro: Vec<ClassId>,
    pub virtual_bases: Vec<ClassId>,
    pub call: Option<Signature>,
    pub constructor: Option<Signature>,
    pub constructs: Option<ClassId>,
    pub hook: Option<SubclassHook>,
    pub(super) defined: bool,
}

impl ClassDef {
    pub(super) fn declared(id: ClassId, name: String) -> ClassDef {
        ClassDef {
            id,
            name,
            kind: ClassKind::Plain,
            params: vec![],
            bases: vec![],
            mro: vec![id],
            virtual_bases: vec![],
            call: None,
            constructor: None,
            constructs: None,
            hook: None,
            defined: false,
        }
    }

    pub fn class_ref(&self) -> ClassRef {
        ClassRef::new(self.id, self.name.clone())
    }

    pub fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, ClassKind::Record(_))
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }
}

/// Builder for a class definition, consumed by [`Universe::define`](super::Universe::define).
#[derive(Clone, Debug, Default)]
pub struct ClassSpec {
    pub name: String,
    pub kind: ClassKind,
    pub params: Vec<TyVar>,
    pub bases: Vec<TypeExpr>,
    pub call: Option<Signature>,
    pub constructor: Option<Signature>,
    pub constructs: Option<ClassId>,
    pub hook: Option<SubclassHook>,
}

impl ClassSpec {
    pub fn new<S: Into<String>>(name: S) -> ClassSpec {
        ClassSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: ClassKind) -> ClassSpec {
        self.kind = kind;
        self
    }

    pub fn param(mut self, var: TyVar) -> ClassSpec {
        self.params.push(var);
        self
    }

    pub fn params<I: IntoIterator<Item = TyVar>>(mut self, vars: I) -> ClassSpec {
        self.params.extend(vars);
        self
    }

    pub fn base(mut self, base: TypeExpr) -> ClassSpec {
        self.bases.push(base);
        self
    }

    pub fn bases<I: IntoIterator<Item = TypeExpr>>(mut self, bases: I) -> ClassSpec {
        self.bases.extend(bases);
        self
    }

    /// Declares a record class with the given fields.
    pub fn record<S, I>(mut self, fields: I) -> ClassSpec
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, TypeExpr)>,
    {
        self.kind = ClassKind::Record(fields.into_iter().map(|(n, t)| (n.into(), t)).collect());
        self
    }

    /// Instances of this class are callable with `sig`.
    pub fn call(mut self, sig: Signature) -> ClassSpec {
        self.call = Some(sig);
        self
    }

    pub fn constructor(mut self, sig: Signature) -> ClassSpec {
        self.constructor = Some(sig);
        self
    }

    /// The concrete class used to build values of this (abstract) class.
    pub fn constructs(mut self, class: ClassId) -> ClassSpec {
        self.constructs = Some(class);
        self
    }

    /// Classes admitted by `hook` are subclasses of this one.
    pub fn subclass_hook(mut self, hook: SubclassHook) -> ClassSpec {
        self.hook = Some(hook);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_ref_display() {
        let c = ClassRef::new(ClassId(3), "collections.abc.Mapping");
        assert_eq!(c.to_string(), "Mapping");
        assert_eq!(format!("{:#}", c), "collections.abc.Mapping");
        assert!(ClassRef::top().is_top());
        assert!(!c.is_top());
    }

    #[test]
    fn test_class_spec_builder() {
        let spec = ClassSpec::new("app.Point")
            .record(vec![("x", TypeExpr::Class(ClassId(7))), ("y", TypeExpr::Class(ClassId(7)))]);
        assert!(matches!(spec.kind, ClassKind::Record(ref fields) if fields.len() == 2));
        assert!(spec.bases.is_empty());
    }
}
