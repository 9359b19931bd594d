use crate::{
    errors::GenusResult,
    typing::{is_subtype, SubtypeRelation, Ty, Universe},
};

use super::signature::{Callability, Signature, SignatureView};

/// A runtime value that can be checked against descriptors.
pub trait Instance: SignatureView {
    /// The descriptor of the value's runtime class.
    fn runtime_type(&self, universe: &Universe) -> GenusResult<Ty>;

    /// The type this value denotes, if it is itself a type.
    fn as_type(&self, universe: &Universe) -> Option<Ty>;
}

/// Descriptors are values too: a descriptor is an instance of `Type[descriptor]`.
impl Instance for Ty {
    fn runtime_type(&self, universe: &Universe) -> GenusResult<Ty> {
        Ok(Ty::Generic(
            universe.class_ref(universe.builtins().type_),
            vec![self.clone()],
        ))
    }

    fn as_type(&self, _: &Universe) -> Option<Ty> {
        Some(self.clone())
    }
}

impl SignatureView for Ty {
    fn callability(&self, universe: &Universe) -> Callability {
        type_callability(universe, self)
    }
}

/// Calling a type constructs an instance: its signature is the nearest declared constructor
/// signature, specialized to the arguments the type passes to the declaring class. Records are
/// constructed from their fields.
pub(crate) fn type_callability(universe: &Universe, ty: &Ty) -> Callability {
    if let Ty::Record(rec) = ty {
        return Callability::Signature(Signature::new(rec.field_tys(), ty.clone()));
    }

    let origin = match universe.origin_of(ty) {
        Some(origin) => origin,
        None => return Callability::NotCallable,
    };

    if universe.is_record_class(origin) {
        return match universe.by_name(&universe.class(origin).name) {
            Ok(rec @ Ty::Record(_)) => type_callability(universe, &rec),
            _ => Callability::NotCallable,
        };
    }

    match universe.constructor_signature_of(ty) {
        Some(sig) => Callability::Signature(sig),
        None => Callability::NotCallable,
    }
}

/// Whether `value` is an instance of `ty`.
///
/// Callable patterns consult the value's signature, `Type[...]` patterns the type the value
/// denotes and everything else the value's runtime class.
pub fn isinstance_generic<V: Instance + ?Sized>(
    universe: &Universe,
    value: &V,
    ty: &Ty,
) -> GenusResult<bool> {
    universe.check_owned(ty)?;
    universe.check_owned(&value.runtime_type(universe)?)?;
    instance_of(universe, value, ty)
}

fn instance_of<V: Instance + ?Sized>(universe: &Universe, value: &V, ty: &Ty) -> GenusResult<bool> {
    let b = universe.builtins();
    let result = match ty {
        Ty::Union(members) => {
            for m in members {
                if instance_of(universe, value, m)? {
                    return Ok(true);
                }
            }
            false
        }
        Ty::Callable(..) => callable_instance(universe, value, ty)?,
        Ty::Atomic(c) if c.id == b.callable => callable_instance(universe, value, ty)?,
        Ty::Generic(c, args) if c.id == b.type_ => match value.as_type(universe) {
            Some(denoted) => {
                let inner = args.first().cloned().unwrap_or_else(Ty::top);
                is_subtype(universe, &denoted, &inner)?
            }
            None => false,
        },
        _ => is_subtype(universe, &value.runtime_type(universe)?, ty)?,
    };

    log::trace!("isinstance(_, {}) is {}", ty, result);
    Ok(result)
}

fn callable_instance<V: Instance + ?Sized>(
    universe: &Universe,
    value: &V,
    ty: &Ty,
) -> GenusResult<bool> {
    match value.callability(universe) {
        Callability::Signature(sig) => SubtypeRelation::new(universe).signature_conforms(&sig, ty),
        Callability::Opaque(kind) => Ok(kind.is_recognized()),
        Callability::NotCallable => is_subtype(universe, &value.runtime_type(universe)?, ty),
    }
}
