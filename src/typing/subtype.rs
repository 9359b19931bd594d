use fnv::FnvHashSet;

use crate::{
    errors::{GenusError, GenusResult},
    runtime::Signature,
};

use super::{
    class::{ClassId, ClassRef},
    expr::TypeExpr,
    reify::reify,
    subst::constraint_type,
    ty::{Params, Ty},
    universe::Universe,
    variance::Variance,
};

/// Decides `A <: B` for `A` and `B` in `universe`.
pub fn is_subtype(universe: &Universe, a: &Ty, b: &Ty) -> GenusResult<bool> {
    SubtypeRelation::new(universe).check(a, b)
}

/// The structural subtyping relation over descriptors.
///
/// Records and record back-pointers are expanded lazily; a `(A, B)` pair met again while it is
/// still being decided is assumed to hold, which makes comparisons of self-referential records
/// terminate.
pub struct SubtypeRelation<'u> {
    universe: &'u Universe,
    seen: FnvHashSet<(Ty, Ty)>,
}

impl<'u> SubtypeRelation<'u> {
    pub fn new(universe: &'u Universe) -> SubtypeRelation<'u> {
        SubtypeRelation {
            universe,
            seen: FnvHashSet::default(),
        }
    }

    pub fn universe(&self) -> &'u Universe {
        self.universe
    }

    pub fn check(&mut self, a: &Ty, b: &Ty) -> GenusResult<bool> {
        ensure_resolved(a)?;
        ensure_resolved(b)?;
        self.universe.check_owned(a)?;
        self.universe.check_owned(b)?;

        let result = self.sub(a, b);
        self.seen.clear();
        let result = result?;
        log::trace!("{} <: {} is {}", a, b, result);
        Ok(result)
    }

    /// Whether a callable with signature `sig` can be used where `b` is expected.
    pub fn signature_conforms(&mut self, sig: &Signature, b: &Ty) -> GenusResult<bool> {
        ensure_resolved(b)?;
        self.universe.check_owned(&sig.as_callable())?;
        self.universe.check_owned(b)?;
        let result = self.sig_conforms(sig, b);
        self.seen.clear();
        let result = result?;
        log::trace!("{} conforms to {} is {}", sig, b, result);
        Ok(result)
    }

    fn sig_conforms(&mut self, sig: &Signature, b: &Ty) -> GenusResult<bool> {
        let (params_b, ret_b) = match b {
            Ty::Atomic(c) => return Ok(c.is_top() || c.id == self.callable()),
            Ty::Callable(params, ret) => (params, ret),
            Ty::Union(members) => {
                for m in members {
                    if self.sig_conforms(sig, m)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
            _ => return Ok(false),
        };

        if !self.sub(&sig.ret, ret_b)? {
            return Ok(false);
        }

        let declared = |i: usize| sig.params.get(i).or_else(|| sig.variadic.as_ref());
        match params_b {
            Params::Any => Ok(true),
            Params::Positional(bs) => {
                if bs.len() < sig.required || (bs.len() > sig.params.len() && sig.variadic.is_none()) {
                    return Ok(false);
                }
                for (i, b_param) in bs.iter().enumerate() {
                    match declared(i) {
                        Some(p) if self.sub(b_param, p)? => continue,
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            Params::Variadic(bs, b_tail) => {
                let tail = match &sig.variadic {
                    Some(tail) => tail,
                    None => return Ok(false),
                };
                if bs.len() < sig.required {
                    return Ok(false);
                }
                for (i, b_param) in bs.iter().enumerate() {
                    match declared(i) {
                        Some(p) if self.sub(b_param, p)? => continue,
                        _ => return Ok(false),
                    }
                }
                for p in sig.params.iter().skip(bs.len()) {
                    if !self.sub(b_tail, p)? {
                        return Ok(false);
                    }
                }
                self.sub(b_tail, tail)
            }
        }
    }

    fn callable(&self) -> ClassId {
        self.universe.builtins().callable
    }

    fn sub(&mut self, a: &Ty, b: &Ty) -> GenusResult<bool> {
        if a == b || b.is_top() {
            return Ok(true);
        }

        match a {
            Ty::Var(v) => return self.sub(&constraint_type(v), b),
            Ty::Union(members) => {
                for m in members {
                    if !self.sub(m, b)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
            Ty::ForwardRef(name) | Ty::LazyRef(name) => {
                return Err(GenusError::UnresolvedReference(name.clone()))
            }
            _ => {}
        }

        match b {
            Ty::Union(members) => {
                for m in members {
                    if self.sub(a, m)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
            Ty::Var(v) => return self.sub(a, &constraint_type(v)),
            Ty::NewType(..) => return Ok(newtype_reaches(a, b)),
            Ty::ForwardRef(name) | Ty::LazyRef(name) => {
                return Err(GenusError::UnresolvedReference(name.clone()))
            }
            _ => {}
        }

        if let Ty::NewType(_, base) = a {
            return self.sub(base, b);
        }

        if let Ty::Atomic(c) = b {
            return Ok(self.sub_atomic(a, c));
        }

        if let Ty::Record(rec) = b {
            let u = self.universe;
            return Ok(u
                .origin_of(a)
                .map_or(false, |o| u.is_subclass(o, rec.class.id)));
        }

        if !self.is_record_like(a) {
            return self.sub_structural(a, b);
        }

        let key = (a.clone(), b.clone());
        if !self.seen.insert(key.clone()) {
            log::trace!("assuming {} <: {} while it is being decided", a, b);
            return Ok(true);
        }
        let expanded = self.expand(a)?;
        let result = self.sub_structural(&expanded, b);
        self.seen.remove(&key);
        result
    }

    fn sub_structural(&mut self, a: &Ty, b: &Ty) -> GenusResult<bool> {
        match b {
            Ty::Generic(c, args) => self.sub_generic(a, c, args),
            Ty::Tuple(elems, variadic) => self.sub_tuple(a, elems, *variadic),
            Ty::Mapping(k, v) => self.sub_mapping(a, k, v),
            Ty::Callable(params, ret) => self.sub_callable(a, params, ret),
            _ => Ok(false),
        }
    }

    fn is_record_like(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Record(_) => true,
            Ty::Atomic(c) => self.universe.is_record_class(c.id),
            _ => false,
        }
    }

    /// Turns a record back-pointer into the record it points to.
    fn expand(&self, ty: &Ty) -> GenusResult<Ty> {
        match ty {
            Ty::Atomic(c) if self.universe.is_record_class(c.id) => {
                let rec = reify(self.universe, &TypeExpr::Class(c.id))?;
                ensure_resolved(&rec)?;
                Ok(rec)
            }
            _ => Ok(ty.clone()),
        }
    }

    fn sub_atomic(&self, a: &Ty, c: &ClassRef) -> bool {
        let u = self.universe;
        let origin = match u.origin_of(a) {
            Some(origin) => origin,
            None => return false,
        };

        if c.id == self.callable() && u.call_signature(origin).is_some() {
            return true;
        }

        u.is_subclass(origin, c.id)
    }

    fn sub_generic(&mut self, a: &Ty, c: &ClassRef, b_args: &[Ty]) -> GenusResult<bool> {
        let u = self.universe;
        let a_args = match u.generic_ancestor(a, c.id) {
            Some(args) => args,
            None => return Ok(false),
        };

        // the element type of `Tuple[()]` is vacuous
        if matches!(a, Ty::Tuple(elems, false) if elems.is_empty()) {
            return Ok(true);
        }

        let params = &u.class(c.id).params;
        for (i, b_arg) in b_args.iter().enumerate() {
            if b_arg.is_top() {
                continue;
            }

            let a_arg = a_args.get(i).cloned().unwrap_or_else(Ty::top);
            let variance = params
                .get(i)
                .map(|p| p.variance)
                .unwrap_or(Variance::Covariant);
            if !self.compare_arg(variance, &a_arg, b_arg)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn compare_arg(&mut self, variance: Variance, a: &Ty, b: &Ty) -> GenusResult<bool> {
        match variance {
            Variance::Covariant => self.sub(a, b),
            Variance::Contravariant => self.compare_arg(variance.invert(), b, a),
            // a variable in an invariant position of the pattern only constrains
            Variance::Invariant if matches!(b, Ty::Var(_)) => self.sub(a, b),
            Variance::Invariant => Ok(a == b || (self.sub(a, b)? && self.sub(b, a)?)),
        }
    }

    fn sub_tuple(&mut self, a: &Ty, elems_b: &[Ty], variadic_b: bool) -> GenusResult<bool> {
        let u = self.universe;
        let tuple = u.builtins().tuple;
        let (elems_a, variadic_a) = match a {
            Ty::Tuple(elems, variadic) => (elems.clone(), *variadic),
            Ty::Record(rec) => (rec.field_tys(), false),
            Ty::Atomic(c) | Ty::Generic(c, _) if u.is_subclass(c.id, tuple) => {
                let elem = u
                    .generic_ancestor(a, tuple)
                    .and_then(|args| args.into_iter().next())
                    .unwrap_or_else(Ty::top);
                (vec![elem], true)
            }
            _ => return Ok(false),
        };

        if !variadic_b {
            if variadic_a || elems_a.len() != elems_b.len() {
                return Ok(false);
            }
            return self.all_sub(elems_a.iter().zip(elems_b.iter()));
        }

        let (tail_b, prefix_b) = match elems_b.split_last() {
            Some(parts) => parts,
            None => return Ok(!variadic_a && elems_a.is_empty()),
        };

        if !variadic_a {
            if elems_a.len() < prefix_b.len() {
                return Ok(false);
            }
            let (head, rest) = elems_a.split_at(prefix_b.len());
            return Ok(self.all_sub(head.iter().zip(prefix_b.iter()))?
                && self.all_sub(rest.iter().map(|a| (a, tail_b)))?);
        }

        let (tail_a, prefix_a) = match elems_a.split_last() {
            Some(parts) => parts,
            None => return Ok(false),
        };
        if prefix_a.len() < prefix_b.len() {
            return Ok(false);
        }
        let (head, rest) = prefix_a.split_at(prefix_b.len());
        Ok(self.all_sub(head.iter().zip(prefix_b.iter()))?
            && self.all_sub(rest.iter().map(|a| (a, tail_b)))?
            && self.sub(tail_a, tail_b)?)
    }

    fn all_sub<'a, I>(&mut self, pairs: I) -> GenusResult<bool>
    where
        I: IntoIterator<Item = (&'a Ty, &'a Ty)>,
    {
        for (a, b) in pairs {
            if !self.sub(a, b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn sub_mapping(&mut self, a: &Ty, key_b: &Ty, val_b: &Ty) -> GenusResult<bool> {
        match self.universe.mapping_args(a) {
            Some((key_a, val_a)) => Ok(self.sub(&key_a, key_b)? && self.sub(&val_a, val_b)?),
            None => Ok(false),
        }
    }

    fn sub_callable(&mut self, a: &Ty, params_b: &Params, ret_b: &Ty) -> GenusResult<bool> {
        let (params_a, ret_a) = match self.callable_view(a) {
            Some(view) => view,
            None => return Ok(false),
        };

        Ok(self.sub(&ret_a, ret_b)? && self.params_conform(&params_a, params_b)?)
    }

    /// Parameters and return type of a callable-shaped descriptor.
    fn callable_view(&self, a: &Ty) -> Option<(Params, Ty)> {
        let u = self.universe;
        if let Ty::Callable(params, ret) = a {
            return Some((params.clone(), ret.as_ref().clone()));
        }

        let origin = u.origin_of(a)?;
        if origin == self.callable() {
            return Some((Params::Any, Ty::top()));
        }

        match u.call_signature_of(a)?.as_callable() {
            Ty::Callable(params, ret) => Some((params, *ret)),
            _ => None,
        }
    }

    /// Parameters are contravariant: every argument `B` may pass must be accepted by `A`.
    fn params_conform(&mut self, params_a: &Params, params_b: &Params) -> GenusResult<bool> {
        match (params_a, params_b) {
            (_, Params::Any) => Ok(true),
            // nothing is known about what an unspecified parameter list accepts
            (Params::Any, _) => Ok(false),
            (Params::Positional(as_), Params::Positional(bs)) => {
                if as_.len() != bs.len() {
                    return Ok(false);
                }
                self.all_sub(bs.iter().zip(as_.iter()))
            }
            (Params::Variadic(as_, tail_a), Params::Positional(bs)) => {
                if bs.len() < as_.len() {
                    return Ok(false);
                }
                let (head, rest) = bs.split_at(as_.len());
                Ok(self.all_sub(head.iter().zip(as_.iter()))?
                    && self.all_sub(rest.iter().map(|b| (b, tail_a.as_ref())))?)
            }
            (Params::Positional(_), Params::Variadic(..)) => Ok(false),
            (Params::Variadic(as_, tail_a), Params::Variadic(bs, tail_b)) => {
                for (i, b) in bs.iter().enumerate() {
                    let a = as_.get(i).unwrap_or(tail_a);
                    if !self.sub(b, a)? {
                        return Ok(false);
                    }
                }
                for a in as_.iter().skip(bs.len()) {
                    if !self.sub(tail_b, a)? {
                        return Ok(false);
                    }
                }
                self.sub(tail_b, tail_a)
            }
        }
    }
}

fn ensure_resolved(ty: &Ty) -> GenusResult<()> {
    match ty.first_unresolved() {
        Some(name) => Err(GenusError::UnresolvedReference(name.to_string())),
        None => Ok(()),
    }
}

/// `a` is `b` itself or a NewType whose chain of bases passes through `b`.
fn newtype_reaches(a: &Ty, b: &Ty) -> bool {
    let mut ty = a;
    loop {
        if ty == b {
            return true;
        }
        match ty {
            Ty::NewType(_, base) => ty = base,
            _ => return false,
        }
    }
}
