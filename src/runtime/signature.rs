use serde::{Deserialize, Serialize};

use crate::{
    typing::{Params, Ty, Universe},
    utils::join,
};

/// The inspectable signature of a callable: parameter descriptors in declaration order, how many
/// of them are required, an optional variadic tail and the return descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Ty>,
    pub required: usize,
    pub variadic: Option<Ty>,
    pub ret: Ty,
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i < self.required {
                    p.to_string()
                } else {
                    format!("{}=...", p)
                }
            })
            .collect::<Vec<_>>();
        if let Some(tail) = &self.variadic {
            parts.push(format!("*{}", tail));
        }
        write!(f, "({}) -> {}", join(parts, ", "), self.ret)
    }
}

impl Signature {
    /// A signature whose parameters are all required.
    pub fn new(params: Vec<Ty>, ret: Ty) -> Signature {
        Signature {
            required: params.len(),
            params,
            variadic: None,
            ret,
        }
    }

    /// Marks the last `count` parameters as optional.
    pub fn optional(mut self, count: usize) -> Signature {
        self.required = self.params.len().saturating_sub(count);
        self
    }

    pub fn variadic(mut self, tail: Ty) -> Signature {
        self.variadic = Some(tail);
        self
    }

    /// The callable descriptor of this signature. Optional parameters count as positional.
    pub fn as_callable(&self) -> Ty {
        let params = match &self.variadic {
            Some(tail) => Params::Variadic(self.params.clone(), Box::new(tail.clone())),
            None => Params::Positional(self.params.clone()),
        };
        Ty::Callable(params, Box::new(self.ret.clone()))
    }
}

/// Categories of native callables whose signatures cannot be inspected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpaqueKind {
    BuiltinFunction,
    BuiltinMethod,
    MethodDescriptor,
    MethodWrapper,
    SlotWrapper,
    Unknown,
}

impl OpaqueKind {
    /// Opaque callables of these kinds are accepted by any callable pattern.
    pub fn is_recognized(self) -> bool {
        matches!(
            self,
            OpaqueKind::BuiltinFunction
                | OpaqueKind::BuiltinMethod
                | OpaqueKind::MethodDescriptor
                | OpaqueKind::MethodWrapper
        )
    }
}

/// What is known about calling a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callability {
    Signature(Signature),
    Opaque(OpaqueKind),
    NotCallable,
}

/// Produces the signature of a callable value or type.
pub trait SignatureView {
    fn callability(&self, universe: &Universe) -> Callability;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::prelude;

    #[test]
    fn test_signature_display_and_callable() {
        let u = prelude();
        let b = u.builtins();
        let sig = Signature::new(vec![u.atom(b.str), u.atom(b.int)], u.atom(b.bool))
            .optional(1)
            .variadic(u.atom(b.bytes));
        assert_eq!(sig.required, 1);
        assert_eq!(sig.to_string(), "(str, int=..., *bytes) -> bool");
        assert_eq!(
            sig.as_callable(),
            Ty::Callable(
                Params::Variadic(vec![u.atom(b.str), u.atom(b.int)], Box::new(u.atom(b.bytes))),
                Box::new(u.atom(b.bool))
            )
        );
        assert!(OpaqueKind::MethodWrapper.is_recognized());
        assert!(!OpaqueKind::SlotWrapper.is_recognized());
    }
}
