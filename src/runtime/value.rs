use crate::{
    errors::GenusResult,
    typing::{ClassRef, Ty, Universe},
    utils::join,
};

use super::{
    instance::{type_callability, Instance},
    signature::{Callability, SignatureView},
};

/// A dynamically typed runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    /// An instance of a record class, with its field values in declaration order.
    Record(ClassRef, Vec<Value>),
    /// An instance of some other class, identified by its runtime class descriptor.
    Object(Ty),
    /// A type used as a value.
    Type(Ty),
    Function {
        name: String,
        callability: Callability,
    },
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Complex(re, im) => write!(f, "({}+{}j)", re, im),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Value::List(items) => write!(f, "[{}]", join(items, ", ")),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Value::Tuple(items) => write!(f, "({})", join(items, ", ")),
            Value::Set(items) => write!(f, "{{{}}}", join(items, ", ")),
            Value::Dict(items) => write!(
                f,
                "{{{}}}",
                join(items.iter().map(|(k, v)| format!("{}: {}", k, v)), ", ")
            ),
            Value::Record(class, fields) => write!(f, "{}({})", class, join(fields, ", ")),
            Value::Object(ty) => write!(f, "<{} object>", ty),
            Value::Type(ty) => write!(f, "<class '{}'>", ty),
            Value::Function { name, .. } => write!(f, "<function {}>", name),
        }
    }
}

impl Value {
    pub fn str<S: Into<String>>(s: S) -> Value {
        Value::Str(s.into())
    }

    pub fn func<S: Into<String>>(name: S, callability: Callability) -> Value {
        Value::Function {
            name: name.into(),
            callability,
        }
    }

    /// The short name of the value's runtime class, e.g. `int` or `NoneType`.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => str!("NoneType"),
            Value::Bool(_) => str!("bool"),
            Value::Int(_) => str!("int"),
            Value::Float(_) => str!("float"),
            Value::Complex(..) => str!("complex"),
            Value::Str(_) => str!("str"),
            Value::Bytes(_) => str!("bytes"),
            Value::List(_) => str!("list"),
            Value::Tuple(_) => str!("tuple"),
            Value::Set(_) => str!("set"),
            Value::Dict(_) => str!("dict"),
            Value::Record(class, _) => class.to_string(),
            Value::Object(ty) => ty.to_string(),
            Value::Type(_) => str!("type"),
            Value::Function {
                callability: Callability::Opaque(_),
                ..
            } => str!("builtin_function_or_method"),
            Value::Function { .. } => str!("function"),
        }
    }
}

impl SignatureView for Value {
    fn callability(&self, universe: &Universe) -> Callability {
        match self {
            Value::Function { callability, .. } => callability.clone(),
            Value::Type(ty) => type_callability(universe, ty),
            Value::Object(ty) => match universe.call_signature_of(ty) {
                Some(sig) => Callability::Signature(sig),
                None => Callability::NotCallable,
            },
            _ => Callability::NotCallable,
        }
    }
}

impl Instance for Value {
    fn runtime_type(&self, universe: &Universe) -> GenusResult<Ty> {
        let b = universe.builtins();
        let class = match self {
            Value::None => b.none,
            Value::Bool(_) => b.bool,
            Value::Int(_) => b.int,
            Value::Float(_) => b.float,
            Value::Complex(..) => b.complex,
            Value::Str(_) => b.str,
            Value::Bytes(_) => b.bytes,
            Value::List(_) => b.list,
            Value::Tuple(_) => b.tuple,
            Value::Set(_) => b.set,
            Value::Dict(_) => b.dict,
            Value::Record(class, _) => return Ok(Ty::Atomic(class.clone())),
            Value::Object(ty) => return Ok(ty.clone()),
            Value::Type(ty) => return ty.runtime_type(universe),
            Value::Function {
                callability: Callability::Opaque(_),
                ..
            } => b.builtin_function,
            Value::Function { .. } => b.function,
        };
        Ok(universe.atom(class))
    }

    fn as_type(&self, _: &Universe) -> Option<Ty> {
        match self {
            Value::Type(ty) => Some(ty.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        runtime::{OpaqueKind, Signature},
        typing::prelude,
    };

    #[test]
    fn test_runtime_types() {
        let u = prelude();
        let b = u.builtins();
        assert_eq!(Value::Int(3).runtime_type(&u).unwrap(), u.atom(b.int));
        assert_eq!(Value::Bool(true).runtime_type(&u).unwrap(), u.atom(b.bool));
        assert_eq!(Value::None.runtime_type(&u).unwrap(), u.atom(b.none));
        assert_eq!(
            Value::func("len", Callability::Opaque(OpaqueKind::BuiltinFunction))
                .runtime_type(&u)
                .unwrap(),
            u.atom(b.builtin_function)
        );
        assert_eq!(
            Value::Type(u.atom(b.int)).runtime_type(&u).unwrap(),
            Ty::Generic(u.class_ref(b.type_), vec![u.atom(b.int)])
        );
    }

    #[test]
    fn test_type_names_and_display() {
        let sig = Signature::new(vec![], Ty::top());
        assert_eq!(Value::Bool(false).type_name(), "bool");
        assert_eq!(Value::func("f", Callability::Signature(sig)).type_name(), "function");
        assert_eq!(
            Value::Dict(vec![(Value::str("a"), Value::Int(1))]).to_string(),
            "{\"a\": 1}"
        );
        assert_eq!(Value::Tuple(vec![Value::None]).to_string(), "(None,)");
    }
}
