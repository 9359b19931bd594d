use fnv::{FnvHashMap, FnvHashSet};

use crate::errors::{GenusError, GenusResult};

use super::{
    class::{ClassId, ClassKind},
    expr::TypeExpr,
    ty::{Params, RecordTy, Ty},
    universe::Universe,
};

/// Reifies a host type expression into its descriptor.
///
/// Records reached again while they are being reified become a back-pointer, `Atomic` of the
/// record class.
pub fn reify(universe: &Universe, expr: &TypeExpr) -> GenusResult<Ty> {
    let ty = Reifier::new(universe).reify(expr)?;
    log::trace!("reified {} as {:#}", expr.display(universe), ty);
    Ok(ty)
}

/// Rebuilds the host expression a descriptor was reified from.
pub fn reconstruct(universe: &Universe, ty: &Ty) -> GenusResult<TypeExpr> {
    let b = universe.builtins();
    Ok(match ty {
        Ty::Atomic(c) => {
            universe
                .get(c.id)
                .ok_or_else(|| GenusError::unreifiable(ty, "unknown class"))?;
            TypeExpr::Class(c.id)
        }
        Ty::Generic(c, args) => {
            let class = universe
                .get(c.id)
                .ok_or_else(|| GenusError::unreifiable(ty, "unknown class"))?;
            if class.params.len() != args.len() {
                return Err(GenusError::unreifiable(
                    ty,
                    format!(
                        "{} takes {} type arguments, found {}",
                        c,
                        class.params.len(),
                        args.len()
                    ),
                ));
            }
            TypeExpr::Apply(c.id, reconstruct_all(universe, args)?)
        }
        Ty::Tuple(tys, false) => TypeExpr::Apply(b.tuple, reconstruct_all(universe, tys)?),
        Ty::Tuple(tys, true) => match tys.as_slice() {
            [elem] => TypeExpr::Apply(b.tuple, vec![reconstruct(universe, elem)?, TypeExpr::Ellipsis]),
            _ => {
                return Err(GenusError::unreifiable(
                    ty,
                    "a variadic tuple has exactly one repeated element type",
                ))
            }
        },
        Ty::Mapping(k, v) => TypeExpr::Apply(
            b.mapping,
            vec![reconstruct(universe, k)?, reconstruct(universe, v)?],
        ),
        Ty::Callable(params, ret) => {
            let params = match params {
                Params::Any => TypeExpr::Ellipsis,
                Params::Positional(tys) => TypeExpr::Params(reconstruct_all(universe, tys)?),
                Params::Variadic(tys, tail) => {
                    let mut exprs = reconstruct_all(universe, tys)?;
                    exprs.push(TypeExpr::unpack(reconstruct(universe, tail)?));
                    TypeExpr::Params(exprs)
                }
            };
            TypeExpr::Apply(b.callable, vec![params, reconstruct(universe, ret)?])
        }
        Ty::Union(tys) => {
            let members = tys.iter().cloned().collect::<Vec<_>>();
            TypeExpr::Apply(b.union, reconstruct_all(universe, &members)?)
        }
        Ty::Record(rec) => TypeExpr::Class(rec.class.id),
        Ty::Var(v) => TypeExpr::Var(v.clone()),
        Ty::NewType(name, base) => TypeExpr::newtype(name.clone(), reconstruct(universe, base)?),
        Ty::ForwardRef(name) => TypeExpr::Str(name.clone()),
        Ty::LazyRef(path) => TypeExpr::Lazy(path.clone()),
    })
}

fn reconstruct_all(universe: &Universe, tys: &[Ty]) -> GenusResult<Vec<TypeExpr>> {
    tys.iter().map(|t| reconstruct(universe, t)).collect()
}

struct Reifier<'a> {
    universe: &'a Universe,
    records: FnvHashMap<ClassId, Ty>,
    in_progress: FnvHashSet<ClassId>,
}

impl<'a> Reifier<'a> {
    fn new(universe: &'a Universe) -> Reifier<'a> {
        Reifier {
            universe,
            records: FnvHashMap::default(),
            in_progress: FnvHashSet::default(),
        }
    }

    fn err<R: Into<String>>(&self, expr: &TypeExpr, reason: R) -> GenusError {
        GenusError::unreifiable(expr.display(self.universe), reason)
    }

    fn reify(&mut self, expr: &TypeExpr) -> GenusResult<Ty> {
        match expr {
            TypeExpr::Class(id) => self.reify_class(expr, *id),
            TypeExpr::Apply(id, args) => self.reify_apply(expr, *id, args),
            TypeExpr::Params(_) => Err(self.err(expr, "a parameter list is not a type")),
            TypeExpr::Ellipsis => Err(self.err(expr, "`...` is not a type")),
            TypeExpr::Unpack(_) => {
                Err(self.err(expr, "an unpacked tail may only end a callable's parameter list"))
            }
            TypeExpr::Var(v) => Ok(Ty::Var(v.clone())),
            TypeExpr::NewType(name, base) => Ok(Ty::newtype(name.clone(), self.reify(base)?)),
            TypeExpr::Str(name) => Ok(Ty::ForwardRef(name.clone())),
            TypeExpr::Lazy(path) => Ok(Ty::LazyRef(path.clone())),
        }
    }

    fn reify_all(&mut self, args: &[TypeExpr]) -> GenusResult<Vec<Ty>> {
        args.iter().map(|a| self.reify(a)).collect()
    }

    fn reify_class(&mut self, expr: &TypeExpr, id: ClassId) -> GenusResult<Ty> {
        let universe = self.universe;
        let class = match universe.get(id) {
            Some(class) => class,
            None => return Err(self.err(expr, "unknown class")),
        };

        let fields = match &class.kind {
            ClassKind::Record(fields) => fields,
            _ => return Ok(Ty::Atomic(class.class_ref())),
        };

        if self.in_progress.contains(&id) {
            return Ok(Ty::Atomic(class.class_ref()));
        }

        if let Some(ty) = self.records.get(&id) {
            return Ok(ty.clone());
        }

        self.in_progress.insert(id);
        let fields = fields
            .iter()
            .map(|(name, f)| -> GenusResult<_> { Ok((name.clone(), self.reify(f)?)) })
            .collect::<GenusResult<Vec<_>>>();
        self.in_progress.remove(&id);

        let ty = Ty::Record(RecordTy {
            class: class.class_ref(),
            fields: fields?,
        });
        self.records.insert(id, ty.clone());
        Ok(ty)
    }

    fn reify_apply(&mut self, expr: &TypeExpr, id: ClassId, args: &[TypeExpr]) -> GenusResult<Ty> {
        let universe = self.universe;
        let class = match universe.get(id) {
            Some(class) => class,
            None => return Err(self.err(expr, "unknown class")),
        };

        match &class.kind {
            ClassKind::Top => Err(self.err(expr, "`Any` cannot be parameterized")),
            ClassKind::Record(_) => Err(self.err(expr, "a record cannot be parameterized")),
            ClassKind::Tuple => match args {
                [elem, TypeExpr::Ellipsis] => Ok(Ty::Tuple(vec![self.reify(elem)?], true)),
                _ if args.iter().any(|a| matches!(a, TypeExpr::Ellipsis)) => {
                    Err(self.err(expr, "`...` may only follow a single element type"))
                }
                _ => Ok(Ty::Tuple(self.reify_all(args)?, false)),
            },
            ClassKind::Union if args.is_empty() => {
                Err(self.err(expr, "a union needs at least one member"))
            }
            ClassKind::Union => Ok(Ty::union(self.reify_all(args)?)),
            ClassKind::Callable => match args {
                [params, ret] => {
                    let params = self.reify_params(params)?;
                    Ok(Ty::Callable(params, Box::new(self.reify(ret)?)))
                }
                [_] => Err(self.err(expr, "a callable needs a return type")),
                _ => Err(self.err(expr, "expected a parameter list and a return type")),
            },
            ClassKind::Mapping | ClassKind::Type | ClassKind::Plain => {
                if class.params.is_empty() {
                    return Err(self.err(expr, format!("{} is not generic", class.class_ref())));
                }
                if class.params.len() != args.len() {
                    return Err(self.err(
                        expr,
                        format!(
                            "expected {} type arguments, found {}",
                            class.params.len(),
                            args.len()
                        ),
                    ));
                }

                let mut tys = self.reify_all(args)?;
                if class.kind == ClassKind::Mapping {
                    let v = tys.pop();
                    let k = tys.pop();
                    if let (Some(k), Some(v)) = (k, v) {
                        return Ok(Ty::mapping(k, v));
                    }
                    return Err(self.err(expr, "a mapping takes a key and a value type"));
                }
                Ok(Ty::Generic(class.class_ref(), tys))
            }
        }
    }

    fn reify_params(&mut self, params: &TypeExpr) -> GenusResult<Params> {
        match params {
            TypeExpr::Ellipsis => Ok(Params::Any),
            TypeExpr::Params(exprs) => match exprs.split_last() {
                Some((TypeExpr::Unpack(tail), init)) => {
                    let init = self.reify_all(init)?;
                    Ok(Params::Variadic(init, Box::new(self.reify(tail)?)))
                }
                _ => Ok(Params::Positional(self.reify_all(exprs)?)),
            },
            _ => Err(self.err(params, "expected a parameter list or `...`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::GenusErrorKind, typing::{ClassSpec, TyVar}};

    #[test]
    fn test_reify_shapes() {
        let u = Universe::new();
        let b = u.builtins();
        let int = u.atom(b.int);
        let s = u.atom(b.str);

        let tuple = reify(&u, &TypeExpr::apply(b.tuple, vec![b.int.into(), b.str.into()])).unwrap();
        assert_eq!(tuple, Ty::tuple(vec![int.clone(), s.clone()]));

        let var_tuple =
            reify(&u, &TypeExpr::apply(b.tuple, vec![b.int.into(), TypeExpr::Ellipsis])).unwrap();
        assert_eq!(var_tuple, Ty::homogeneous_tuple(int.clone()));

        let func = reify(
            &u,
            &TypeExpr::apply(b.callable, vec![TypeExpr::params(vec![b.int.into()]), b.str.into()]),
        )
        .unwrap();
        assert_eq!(func, Ty::func(vec![int.clone()], s.clone()));

        let variadic = reify(
            &u,
            &TypeExpr::apply(
                b.callable,
                vec![
                    TypeExpr::params(vec![b.str.into(), TypeExpr::unpack(b.int.into())]),
                    b.bool.into(),
                ],
            ),
        )
        .unwrap();
        assert_eq!(
            variadic,
            Ty::Callable(
                Params::Variadic(vec![s.clone()], Box::new(int.clone())),
                Box::new(u.atom(b.bool))
            )
        );

        let mapping = reify(&u, &TypeExpr::apply(b.mapping, vec![b.str.into(), b.int.into()])).unwrap();
        assert_eq!(mapping, Ty::mapping(s.clone(), int.clone()));

        let union = reify(
            &u,
            &TypeExpr::apply(b.union, vec![b.int.into(), b.str.into(), b.int.into()]),
        )
        .unwrap();
        assert_eq!(union, int.clone() | s.clone());
    }

    #[test]
    fn test_reify_rejects_malformed_expressions() {
        let u = Universe::new();
        let b = u.builtins();
        let cases = vec![
            TypeExpr::apply(b.list, vec![b.int.into(), b.str.into()]),
            TypeExpr::apply(ClassId::TOP, vec![b.int.into()]),
            TypeExpr::apply(b.int, vec![b.int.into()]),
            TypeExpr::apply(b.callable, vec![TypeExpr::params(vec![])]),
            TypeExpr::apply(b.tuple, vec![TypeExpr::Ellipsis, b.int.into()]),
            TypeExpr::params(vec![b.int.into()]),
            TypeExpr::Ellipsis,
        ];

        for expr in cases {
            let err = reify(&u, &expr).unwrap_err();
            assert_eq!(err.kind(), GenusErrorKind::Unreifiable, "{}", expr.display(&u));
        }
    }

    #[test]
    fn test_self_referential_record() {
        let mut u = Universe::new();
        let b = u.builtins().clone();
        let node = u.declare("app.Node").unwrap();
        u.define(ClassSpec::new("app.Node").record(vec![
            ("value", TypeExpr::Class(b.int)),
            ("children", TypeExpr::apply(b.list, vec![TypeExpr::Class(node)])),
        ]))
        .unwrap();

        let ty = reify(&u, &TypeExpr::Class(node)).unwrap();
        let rec = match &ty {
            Ty::Record(rec) => rec,
            other => panic!("expected a record, found {}", other),
        };
        assert_eq!(rec.get_field("value"), Some((0, &u.atom(b.int))));
        assert_eq!(
            rec.field_at(1),
            Some(&Ty::Generic(u.class_ref(b.list), vec![u.atom(node)]))
        );

        assert_eq!(reconstruct(&u, &ty).unwrap(), TypeExpr::Class(node));
    }

    #[test]
    fn test_reconstruct_round_trip() {
        let u = Universe::new();
        let b = u.builtins();
        let t = TyVar::covariant("T");
        let exprs = vec![
            TypeExpr::apply(b.dict, vec![b.str.into(), TypeExpr::apply(b.list, vec![t.into()])]),
            TypeExpr::apply(b.callable, vec![TypeExpr::Ellipsis, b.int.into()]),
            TypeExpr::apply(
                b.callable,
                vec![TypeExpr::params(vec![TypeExpr::unpack(b.int.into())]), b.int.into()],
            ),
            TypeExpr::apply(b.tuple, vec![]),
            TypeExpr::newtype("UserId", b.int.into()),
            TypeExpr::forward("app.Thing"),
        ];

        for expr in exprs {
            let ty = reify(&u, &expr).unwrap();
            let back = reconstruct(&u, &ty).unwrap();
            assert_eq!(reify(&u, &back).unwrap(), ty);
        }

        let bad = Ty::Generic(u.class_ref(b.list), vec![]);
        assert_eq!(
            reconstruct(&u, &bad).unwrap_err().kind(),
            GenusErrorKind::Unreifiable
        );
    }
}
