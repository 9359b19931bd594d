use super::{
    class::ClassId,
    subst::{ApplySubst, Subst},
    ty::Ty,
    universe::Universe,
};

impl Universe {
    /// C3 linearization of a class with the given direct bases.
    pub(super) fn linearize(&self, id: ClassId, bases: &[ClassId]) -> Option<Vec<ClassId>> {
        if id == ClassId::TOP {
            return Some(vec![id]);
        }

        let bases = if bases.is_empty() {
            vec![ClassId::TOP]
        } else {
            bases.to_vec()
        };

        let mut seqs = bases
            .iter()
            .map(|b| self.mro(*b).to_vec())
            .collect::<Vec<_>>();
        seqs.push(bases);

        let mut mro = vec![id];
        loop {
            seqs.retain(|s| !s.is_empty());
            if seqs.is_empty() {
                return Some(mro);
            }

            let head = seqs
                .iter()
                .map(|s| s[0])
                .find(|c| !seqs.iter().any(|s| s[1..].contains(c)))?;

            mro.push(head);
            for seq in seqs.iter_mut() {
                if seq[0] == head {
                    seq.remove(0);
                }
            }
        }
    }

    /// The nominal class a descriptor is an instance of, if it has one.
    pub fn origin_of(&self, ty: &Ty) -> Option<ClassId> {
        let b = self.builtins();
        match ty {
            Ty::Atomic(c) | Ty::Generic(c, _) => Some(c.id),
            Ty::Tuple(..) => Some(b.tuple),
            Ty::Mapping(..) => Some(b.mapping),
            Ty::Callable(..) => Some(b.callable),
            Ty::Record(rec) => Some(rec.class.id),
            Ty::NewType(_, base) => self.origin_of(base),
            Ty::Union(_) | Ty::Var(_) | Ty::ForwardRef(_) | Ty::LazyRef(_) => None,
        }
    }

    /// Splits a descriptor into its origin class and its arguments for that class's parameters.
    /// Tuples are seen as `Tuple[Union[elements]]`, records as the tuple of their fields.
    fn origin_and_args(&self, ty: &Ty) -> Option<(ClassId, Vec<Ty>)> {
        let b = self.builtins();
        match ty {
            Ty::Atomic(c) => Some((c.id, vec![])),
            Ty::Generic(c, args) => Some((c.id, args.clone())),
            Ty::Tuple(tys, _) if tys.is_empty() => Some((b.tuple, vec![])),
            Ty::Tuple(tys, _) => Some((b.tuple, vec![Ty::union(tys.iter().cloned())])),
            Ty::Mapping(k, v) => Some((b.mapping, vec![k.as_ref().clone(), v.as_ref().clone()])),
            Ty::Callable(..) => Some((b.callable, vec![])),
            Ty::Record(rec) => Some((rec.class.id, vec![])),
            Ty::NewType(_, base) => self.origin_and_args(base),
            Ty::Union(_) | Ty::Var(_) | Ty::ForwardRef(_) | Ty::LazyRef(_) => None,
        }
    }

    /// Arguments padded with the top type up to the arity of `class`.
    fn padded_args(&self, class: ClassId, mut args: Vec<Ty>) -> Vec<Ty> {
        let arity = self.get(class).map_or(0, |c| c.params.len());
        if args.len() < arity {
            args.resize(arity, Ty::top());
        }
        args
    }

    /// The declared bases of `ty`'s origin with `ty`'s arguments substituted for the origin's
    /// parameters. Missing arguments are the top type.
    pub fn reparameterized_bases(&self, ty: &Ty) -> Vec<Ty> {
        let (origin, args) = match self.origin_and_args(ty) {
            Some(parts) => parts,
            None => return vec![],
        };

        let class = match self.get(origin) {
            Some(class) => class,
            None => return vec![],
        };
        let args = self.padded_args(origin, args);
        let subst = Subst::from_types(class.params.iter().cloned(), args);
        class.bases.clone().apply_subst(&subst)
    }

    /// The arguments of `target` as seen from `ty`, following the whole ancestor chain and
    /// reparameterizing through every intermediate base. `None` if `target` is not an ancestor.
    pub fn generic_ancestor(&self, ty: &Ty, target: ClassId) -> Option<Vec<Ty>> {
        if let Ty::Record(rec) = ty {
            if !self.is_subclass(rec.class.id, target) {
                return None;
            }
            if target != rec.class.id && !self.is_record_class(target) {
                return self.generic_ancestor(&Ty::Tuple(rec.field_tys(), false), target);
            }
        }

        let (origin, args) = self.origin_and_args(ty)?;
        if origin == target {
            return Some(self.padded_args(target, args));
        }

        if !self.is_subclass(origin, target) {
            return None;
        }

        self.reparameterized_bases(ty)
            .iter()
            .find_map(|base| self.generic_ancestor(base, target))
            .or_else(|| {
                // reached through a virtual base only: nothing is known about the arguments
                Some(self.padded_args(target, vec![]))
            })
    }

    /// The key and value types of a mapping-shaped descriptor.
    pub fn mapping_args(&self, ty: &Ty) -> Option<(Ty, Ty)> {
        let mapping = self.builtins().mapping;
        let mut args = self.generic_ancestor(ty, mapping)?.into_iter();
        let key = args.next().unwrap_or_else(Ty::top);
        let value = args.next().unwrap_or_else(Ty::top);
        Some((key, value))
    }
}

#[cfg(test)]
mod tests {
    use crate::typing::{ClassSpec, Ty, TyVar, TypeExpr, Universe};

    #[test]
    fn test_linearization_is_c3() {
        let u = Universe::new();
        let b = u.builtins();
        let names = u
            .mro(b.list)
            .iter()
            .map(|c| u.class_ref(*c).to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "list",
                "MutableSequence",
                "Sequence",
                "Reversible",
                "Collection",
                "Sized",
                "Iterable",
                "Container",
                "Any"
            ]
        );
    }

    #[test]
    fn test_generic_ancestor_reparameterizes_through_bases() {
        let mut u = Universe::new();
        let b = u.builtins().clone();
        let k = TyVar::new("K");
        let v = TyVar::covariant("V");

        let foo = u
            .define(
                ClassSpec::new("app.Foo")
                    .params(vec![k.clone(), v.clone()])
                    .base(TypeExpr::apply(b.mapping, vec![k.clone().into(), v.clone().into()])),
            )
            .unwrap();
        let bar = u
            .define(
                ClassSpec::new("app.Bar")
                    .param(v.clone())
                    .base(TypeExpr::apply(foo, vec![b.int.into(), v.clone().into()])),
            )
            .unwrap();

        let bar_str = u.ty(&TypeExpr::apply(bar, vec![b.str.into()])).unwrap();
        assert_eq!(
            u.generic_ancestor(&bar_str, b.mapping),
            Some(vec![u.atom(b.int), u.atom(b.str)])
        );
        assert_eq!(
            u.generic_ancestor(&u.atom(bar), foo),
            Some(vec![u.atom(b.int), Ty::top()])
        );
        assert_eq!(u.generic_ancestor(&u.atom(b.int), b.mapping), None);

        let counter = u.ty(&TypeExpr::apply(b.counter, vec![b.str.into()])).unwrap();
        assert_eq!(u.mapping_args(&counter), Some((u.atom(b.str), u.atom(b.int))));
    }

    #[test]
    fn test_reparameterized_bases() {
        let u = Universe::new();
        let b = u.builtins();
        let list_int = u.ty(&TypeExpr::apply(b.list, vec![b.int.into()])).unwrap();
        assert_eq!(
            u.reparameterized_bases(&list_int),
            vec![u.ty(&TypeExpr::apply(b.mutable_sequence, vec![b.int.into()])).unwrap()]
        );
        assert_eq!(u.origin_of(&list_int), Some(b.list));
        assert_eq!(u.origin_of(&Ty::top()), Some(crate::typing::ClassId::TOP));
    }
}
