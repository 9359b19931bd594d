mod utils;

use genus::{is_subtype, GenusErrorKind, Ty, TyVar, TypeExpr};
use utils::Fixture;

/// Every earlier element of `chain` is a subtype of every later one, and no later element is a
/// subtype of an earlier one.
fn assert_chain(f: &Fixture, chain: &[Ty]) {
    for (i, a) in chain.iter().enumerate() {
        for b in chain.iter().skip(i + 1) {
            assert!(f.sub(a, b), "expected {} <: {}", a, b);
            assert!(!f.sub(b, a), "expected {} </: {}", b, a);
        }
    }
}

fn atomic_chains(f: &Fixture) -> Vec<Vec<Ty>> {
    let u = |names: &[&str]| Ty::union(names.iter().map(|n| f.named(n)));
    let newtype1 = Ty::newtype("newtype1", f.apply("List", &["int"]));
    let newtype2 = Ty::newtype("newtype2", newtype1.clone());
    vec![
        vec![
            f.named("bool"),
            f.named("int"),
            f.named("Integral"),
            f.named("Number"),
            u(&["Number", "str"]),
            f.named("Hashable"),
        ],
        vec![
            f.named("float"),
            f.named("Real"),
            f.named("Number"),
            f.named("Hashable"),
            Ty::top(),
        ],
        vec![f.named("complex"), f.named("Number"), Ty::top()],
        vec![f.named("str"), u(&["str", "bytes"]), Ty::top()],
        vec![f.named("bytes"), u(&["str", "bytes"]), f.named("Hashable")],
        vec![f.apply("Pattern", &["str"]), f.named("Pattern"), Ty::top()],
        vec![f.apply("Match", &["bytes"]), f.named("Match"), Ty::top()],
        vec![newtype2, newtype1, f.apply("Collection", &["Number"])],
    ]
}

type Generic<'a> = Box<dyn Fn(&Ty) -> Ty + 'a>;

fn generic<'a>(g: impl Fn(&Ty) -> Ty + 'a) -> Generic<'a> {
    Box::new(g)
}

fn origin<'a>(f: &'a Fixture, name: &'static str) -> Generic<'a> {
    generic(move |t| f.generic(name, t.clone()))
}

/// Chains of generics that stay ordered whatever argument they are all given.
fn generic_chains(f: &Fixture) -> Vec<Vec<Generic<'_>>> {
    vec![
        vec![
            origin(f, "List"),
            origin(f, "Sequence"),
            origin(f, "Collection"),
            origin(f, "Iterable"),
        ],
        vec![
            origin(f, "Set"),
            origin(f, "AbstractSet"),
            origin(f, "Collection"),
            origin(f, "Iterable"),
        ],
        vec![
            generic(|t| Ty::homogeneous_tuple(t.clone())),
            origin(f, "Sequence"),
            origin(f, "Collection"),
            generic(move |t| f.named("Sized") | f.generic("Iterable", t.clone())),
        ],
        vec![
            generic(move |t| f.generic("List", t.clone()) | Ty::tuple(vec![t.clone()])),
            origin(f, "Sequence"),
            origin(f, "Collection"),
        ],
        vec![
            generic(move |t| {
                Ty::union(vec![
                    f.generic("List", t.clone()),
                    Ty::homogeneous_tuple(t.clone()),
                    f.generic("Set", t.clone()),
                ])
            }),
            origin(f, "Collection"),
        ],
    ]
}

#[test]
fn test_atomic_chains() {
    let f = Fixture::new();
    for chain in atomic_chains(&f) {
        assert_chain(&f, &chain);
    }
}

#[test]
fn test_generic_chains_over_atomic_chains() {
    let f = Fixture::new();
    let atomics = atomic_chains(&f);

    // g1 <: g2 and t1 <: t2 give g1[t1] <: g2[t2]
    for generics in generic_chains(&f) {
        for args in atomics.iter() {
            for (i, g1) in generics.iter().enumerate() {
                for g2 in generics.iter().skip(i + 1) {
                    for (j, t1) in args.iter().enumerate() {
                        for t2 in args.iter().skip(j + 1) {
                            let (a, b) = (g1(t1), g2(t2));
                            assert!(f.sub(&a, &b), "expected {} <: {}", a, b);
                            assert!(!f.sub(&b, &a), "expected {} </: {}", b, a);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_invariant_parameters() {
    let f = Fixture::new();
    assert!(f.sub(&f.apply("List", &["int"]), &f.apply("List", &["int"])));
    assert!(!f.sub(&f.apply("List", &["bool"]), &f.apply("List", &["int"])));
    assert!(!f.sub(&f.apply("List", &["int"]), &f.apply("List", &["bool"])));
    assert!(f.sub(&f.apply("List", &["bool"]), &f.apply("MutableSequence", &["bool"])));
    assert!(!f.sub(&f.apply("List", &["bool"]), &f.apply("MutableSequence", &["int"])));
}

#[test]
fn test_mapping_chains() {
    let f = Fixture::new();
    for key in &["str", "int", "Hashable"] {
        let chain_map = f.apply("ChainMap", &[key, "bool"]);
        let mapping = f.apply("Mapping", &[key, "Integral"]);
        let collection = f.apply("Collection", &[key]);
        assert_chain(&f, &[chain_map, mapping, collection]);
    }
}

#[test]
fn test_user_generic_hierarchy() {
    let f = Fixture::new();
    let baz = f.u.atom(f.baz);
    let boom = f.u.atom(f.boom);

    let foo = |k: &str, v: &str| f.apply("Foo", &[k, v]);
    let bar = |v: &str| f.apply("Bar", &[v]);
    let mapping = |k: &str, v: &str| Ty::mapping(f.named(k), f.named(v));

    assert_chain(
        &f,
        &[
            boom.clone(),
            baz.clone(),
            bar("MySpecialStr"),
            bar("MyStr"),
            foo("int", "str"),
            mapping("int", "str"),
            mapping("int", "Hashable"),
        ],
    );

    for target in &[
        mapping("int", "MyStr"),
        mapping("Number", "str"),
        f.apply("Container", &["int"]),
        f.apply("Collection", &["Integral"]),
        f.named("Sized"),
    ] {
        assert!(f.sub(&baz, target), "expected Baz <: {}", target);
        assert!(f.sub(&boom, target), "expected Boom <: {}", target);
    }

    // `Foo`'s key parameter is invariant
    assert!(!f.sub(&baz, &foo("Number", "str")));
    assert!(!f.sub(&baz, &foo("bool", "str")));
    assert!(!f.sub(&baz, &f.apply("Iterable", &["str"])));
    assert!(!f.sub(&baz, &mapping("int", "bytes")));
}

#[test]
fn test_tuple_chains() {
    let f = Fixture::new();
    let u = |names: &[&str]| Ty::union(names.iter().map(|n| f.named(n)));

    assert_chain(
        &f,
        &[
            f.named("FooTuple"),
            Ty::tuple(vec![u(&["int", "complex"]), f.named("int"), f.named("str")]),
            Ty::tuple(vec![f.named("Number"), u(&["int", "Number"]), f.named("Hashable")]),
            Ty::tuple(vec![u(&["Number", "Hashable"]), Ty::top(), f.named("Hashable")]),
        ],
    );

    let counter = f.apply("Counter", &["str"]);
    assert_chain(
        &f,
        &[
            Ty::tuple(vec![counter, Ty::mapping(f.named("str"), f.named("int"))]),
            Ty::tuple(vec![
                Ty::mapping(f.named("str"), f.named("Number")),
                Ty::mapping(f.named("str"), Ty::top()),
            ]),
            Ty::homogeneous_tuple(f.apply("Collection", &["Hashable"])),
        ],
    );
}

#[test]
fn test_records_are_tuples() {
    let f = Fixture::new();
    let foo_tuple = f.named("FooTuple");
    assert!(f.sub(&foo_tuple, &f.named("Tuple")));
    assert!(f.sub(&foo_tuple, &f.apply("Sequence", &["Hashable"])));
    assert!(f.sub(
        &foo_tuple,
        &Ty::tuple(vec![f.named("int"), f.named("bool"), f.named("MyStr")])
    ));
    assert!(f.sub(&foo_tuple, &Ty::homogeneous_tuple(f.named("int") | f.named("str"))));
    assert!(!f.sub(&foo_tuple, &Ty::homogeneous_tuple(f.named("int"))));
    assert!(!f.sub(&foo_tuple, &Ty::tuple(vec![f.named("int"), f.named("bool")])));
}

#[test]
fn test_self_referential_records() {
    let f = Fixture::new();
    let node = f.named("Node");
    let (int, none) = (f.named("int"), f.named("None"));
    assert!(f.sub(&node, &node));
    assert!(f.sub(
        &node,
        &Ty::tuple(vec![int.clone(), Ty::tuple(vec![int.clone(), Ty::top()]) | none.clone()])
    ));
    assert!(!f.sub(
        &node,
        &Ty::tuple(vec![int.clone(), Ty::tuple(vec![f.named("str"), Ty::top()]) | none])
    ));
    assert!(f.sub(&node, &f.apply("Sequence", &["Hashable"])));
}

#[test]
fn test_callable_chains() {
    let f = Fixture::new();
    let func = |params: &[Ty], ret: Ty| Ty::func(params.to_vec(), ret);
    let (number, hashable, int, float) = (
        f.named("Number"),
        f.named("Hashable"),
        f.named("int"),
        f.named("float"),
    );

    assert_chain(
        &f,
        &[
            func(&[Ty::top(), Ty::top()], number.clone() | f.named("str")),
            func(&[number.clone(), number.clone()], hashable.clone()),
            func(&[int.clone(), float], Ty::top()),
            f.named("Callable"),
        ],
    );

    let str_mapping = |v: Ty| Ty::mapping(f.named("str"), v);
    assert_chain(
        &f,
        &[
            func(&[str_mapping(hashable.clone())], number.clone()),
            func(&[str_mapping(number.clone())], hashable.clone()),
            func(&[f.apply("Counter", &["str"])], Ty::top()),
        ],
    );

    assert_chain(
        &f,
        &[
            func(&[Ty::top(), number.clone()], f.named("bool")),
            Ty::any_func(int),
            Ty::any_func(number),
        ],
    );

    assert!(f.sub(&func(&[], hashable), &f.named("Callable")));
}

#[test]
fn test_type_variables_widen_to_their_constraints() {
    let f = Fixture::new();
    let t_co = TyVar::covariant("T_co");
    let var = Ty::var(t_co.clone());
    let list_of_var = f.ty(TypeExpr::apply(f.id("List"), vec![t_co.into()]));

    assert!(f.sub(&list_of_var, &f.named("Sequence")));
    assert!(f.sub(&list_of_var, &f.apply("Iterable", &["Any"])));
    assert!(f.sub(&Ty::homogeneous_tuple(var.clone()), &f.named("Collection")));
    assert!(!f.sub(&var, &f.named("int")));

    let bounded = TyVar::new("N").with_bound(f.named("Number"));
    let seq_of_n = f.ty(TypeExpr::apply(f.id("Sequence"), vec![bounded.clone().into()]));
    let list_of_n = f.ty(TypeExpr::apply(f.id("List"), vec![bounded.into()]));
    assert!(f.sub(&f.apply("List", &["bool"]), &seq_of_n));
    assert!(f.sub(&f.apply("List", &["bool"]), &list_of_n));
    assert!(!f.sub(&f.apply("List", &["str"]), &seq_of_n));
    assert!(!f.sub(&f.apply("List", &["str"]), &list_of_n));
}

#[test]
fn test_unresolved_references_are_errors() {
    let f = Fixture::new();
    let lazy = Ty::lazy("collections.abc.Iterable");
    let err = is_subtype(&f.u, &f.named("list"), &lazy).unwrap_err();
    assert_eq!(err.kind(), GenusErrorKind::UnresolvedReference);

    let nested = Ty::mapping(f.named("str"), Ty::forward("Dummy"));
    let err = is_subtype(&f.u, &nested, &f.named("Mapping")).unwrap_err();
    assert_eq!(err.kind(), GenusErrorKind::UnresolvedReference);
}

#[test]
fn test_constructors_for_abstract_classes() {
    let f = Fixture::new();
    let table = [
        ("List", "list"),
        ("Tuple", "tuple"),
        ("Dict", "dict"),
        ("MutableMapping", "dict"),
        ("Counter", "Counter"),
        ("ChainMap", "ChainMap"),
        ("FrozenSet", "frozenset"),
        ("Iterable", "list"),
        ("AbstractSet", "set"),
        ("MutableSet", "set"),
    ];
    for (abstract_class, concrete) in table.iter() {
        let id = f.u.constructor_for(f.id(abstract_class));
        assert_eq!(id, Some(f.id(concrete)), "constructor for {}", abstract_class);
    }
    assert_eq!(f.u.constructor_for(f.id("Number")), None);
    assert_eq!(f.u.constructor_for(f.baz), None);
}

#[test]
fn test_abstract_classes_admit_by_rule() {
    let f = Fixture::new();
    let admitted = [
        ("Builtin", vec!["int", "str", "list", "tuple", "bytes", "set", "frozenset", "complex"]),
        (
            "NonStrCollection",
            vec![
                "list", "tuple", "set", "frozenset", "bytes", "Tuple", "List", "Collection", "Mapping",
                "Set", "ByteString",
            ],
        ),
        (
            "NonAnyStrCollection",
            vec!["list", "tuple", "set", "frozenset", "Tuple", "List", "Collection", "Mapping", "Set"],
        ),
        ("NonStrSequence", vec!["list", "tuple", "bytes", "Tuple", "List", "ByteString"]),
        ("NonAnyStrSequence", vec!["list", "tuple", "Tuple", "List"]),
    ];
    let rejected = [
        ("Builtin", vec!["Collection", "Number", "Any"]),
        ("NonStrCollection", vec!["str", "MyStr"]),
        ("NonAnyStrCollection", vec!["str", "MyStr", "bytes", "ByteString"]),
        ("NonStrSequence", vec!["str", "MyStr"]),
        ("NonAnyStrSequence", vec!["str", "MyStr", "bytes", "ByteString"]),
    ];

    for (base, subs) in admitted.iter() {
        for sub in subs {
            assert!(f.u.is_subclass(f.id(sub), f.id(base)), "expected {} <: {}", sub, base);
            assert!(f.sub(&f.named(sub), &f.named(base)), "expected {} <: {}", sub, base);
        }
    }
    for (base, subs) in rejected.iter() {
        for sub in subs {
            assert!(!f.u.is_subclass(f.id(sub), f.id(base)), "expected {} </: {}", sub, base);
            assert!(!f.sub(&f.named(sub), &f.named(base)), "expected {} </: {}", sub, base);
        }
    }

    assert!(f.sub(&f.apply("List", &["str"]), &f.named("NonStrSequence")));
    assert!(f.sub(&Ty::mapping(f.named("str"), f.named("int")), &f.named("NonAnyStrCollection")));
    assert!(!f.sub(&f.named("Number"), &f.named("NonStrCollection")));
    assert!(f.sub(&f.named("Foo"), &f.named("NonStdLib")));
}
