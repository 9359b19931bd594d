#![cfg(test)]
#![allow(dead_code)]

use std::sync::Arc;

use genus::{is_subtype, ClassId, ClassSpec, Ty, TyVar, TypeExpr, Universe};

pub fn enable_debug_logs() {
    fern::Dispatch::new()
        .level(log::LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()
        .unwrap();
}

/// A universe with a small user hierarchy on top of the prelude:
///
/// ```text
/// Foo[K, T_co](Mapping[K, T_co])
/// Bar[T_co](Foo[int, T_co])
/// MyStr(str)  MySpecialStr(MyStr)
/// Baz(Bar[MySpecialStr])  Boom(Baz)
/// FooTuple(foo: int, bar: bool, baz: MyStr)
/// Node(value: int, next: Union[Node, None])
/// ```
pub struct Fixture {
    pub u: Arc<Universe>,
    pub foo: ClassId,
    pub bar: ClassId,
    pub my_str: ClassId,
    pub my_special_str: ClassId,
    pub baz: ClassId,
    pub boom: ClassId,
    pub foo_tuple: ClassId,
    pub node: ClassId,
}

impl Fixture {
    pub fn new() -> Fixture {
        let mut u = Universe::new();
        let b = u.builtins().clone();
        let k = TyVar::new("K");
        let t_co = TyVar::covariant("T_co");

        let foo = u
            .define(
                ClassSpec::new("tests.Foo")
                    .params(vec![k.clone(), t_co.clone()])
                    .base(TypeExpr::apply(b.mapping, vec![k.into(), t_co.clone().into()])),
            )
            .unwrap();
        let bar = u
            .define(
                ClassSpec::new("tests.Bar")
                    .param(t_co.clone())
                    .base(TypeExpr::apply(foo, vec![b.int.into(), t_co.into()])),
            )
            .unwrap();
        let my_str = u
            .define(ClassSpec::new("tests.MyStr").base(b.str.into()))
            .unwrap();
        let my_special_str = u
            .define(ClassSpec::new("tests.MySpecialStr").base(my_str.into()))
            .unwrap();
        let baz = u
            .define(
                ClassSpec::new("tests.Baz")
                    .base(TypeExpr::apply(bar, vec![my_special_str.into()])),
            )
            .unwrap();
        let boom = u
            .define(ClassSpec::new("tests.Boom").base(baz.into()))
            .unwrap();
        let foo_tuple = u
            .define(ClassSpec::new("tests.FooTuple").record(vec![
                ("foo", TypeExpr::from(b.int)),
                ("bar", b.bool.into()),
                ("baz", my_str.into()),
            ]))
            .unwrap();

        let node = u.declare("tests.Node").unwrap();
        u.define(ClassSpec::new("tests.Node").record(vec![
            ("value", TypeExpr::from(b.int)),
            ("next", TypeExpr::apply(b.union, vec![node.into(), b.none.into()])),
        ]))
        .unwrap();

        u.register_virtual(b.number, b.hashable);

        Fixture {
            u: u.freeze(),
            foo,
            bar,
            my_str,
            my_special_str,
            baz,
            boom,
            foo_tuple,
            node,
        }
    }

    pub fn id(&self, name: &str) -> ClassId {
        self.u.named(name).unwrap()
    }

    pub fn named(&self, name: &str) -> Ty {
        self.u.by_name(name).unwrap()
    }

    pub fn ty(&self, expr: TypeExpr) -> Ty {
        self.u.ty(&expr).unwrap()
    }

    /// `origin[args...]` with every argument a bare class name.
    pub fn apply(&self, origin: &str, args: &[&str]) -> Ty {
        self.ty(TypeExpr::apply(
            self.id(origin),
            args.iter().map(|a| TypeExpr::Class(self.id(a))),
        ))
    }

    /// `origin[arg]` for a single-parameter origin with an arbitrary argument.
    pub fn generic(&self, origin: &str, arg: Ty) -> Ty {
        Ty::Generic(self.u.class_ref(self.id(origin)), vec![arg])
    }

    pub fn sub(&self, a: &Ty, b: &Ty) -> bool {
        is_subtype(&self.u, a, b).unwrap()
    }
}
