use crate::{errors::GenusResult, runtime::Signature};

use super::{
    class::{ClassId, ClassKind, ClassSpec, SubclassHook},
    expr::TypeExpr,
    ty::{Ty, TyVar},
    universe::Universe,
};

/// Ids of the prelude classes.
#[derive(Clone, Debug, Default)]
pub struct Builtins {
    pub any: ClassId,
    pub hashable: ClassId,
    pub sized: ClassId,
    pub iterable: ClassId,
    pub container: ClassId,
    pub collection: ClassId,
    pub reversible: ClassId,
    pub sequence: ClassId,
    pub mutable_sequence: ClassId,
    pub list: ClassId,
    pub abstract_set: ClassId,
    pub mutable_set: ClassId,
    pub set: ClassId,
    pub frozenset: ClassId,
    pub mapping: ClassId,
    pub mutable_mapping: ClassId,
    pub dict: ClassId,
    pub counter: ClassId,
    pub chain_map: ClassId,
    pub tuple: ClassId,
    pub union: ClassId,
    pub callable: ClassId,
    pub type_: ClassId,
    pub number: ClassId,
    pub complex_number: ClassId,
    pub real: ClassId,
    pub rational: ClassId,
    pub integral: ClassId,
    pub int: ClassId,
    pub bool: ClassId,
    pub float: ClassId,
    pub complex: ClassId,
    pub str: ClassId,
    pub bytes: ClassId,
    pub byte_string: ClassId,
    pub none: ClassId,
    pub enum_: ClassId,
    pub pattern: ClassId,
    pub match_: ClassId,
    pub function: ClassId,
    pub builtin_function: ClassId,
    pub builtin: ClassId,
    pub builtin_atomic: ClassId,
    pub non_collection: ClassId,
    pub non_str_collection: ClassId,
    pub non_any_str_collection: ClassId,
    pub non_str_sequence: ClassId,
    pub non_any_str_sequence: ClassId,
    pub non_std_lib: ClassId,
}

/// Packages whose classes `NonStdLib` rejects.
const STDLIB_PACKAGES: &[&str] = &[
    "builtins", "collections", "typing", "abc", "numbers", "decimal", "re", "_sre", "os", "enum",
    "datetime", "time", "pathlib", "ipaddress", "urllib", "uuid",
];

fn c(id: ClassId) -> TypeExpr {
    TypeExpr::Class(id)
}

fn app(id: ClassId, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Apply(id, args)
}

fn v(var: &TyVar) -> TypeExpr {
    TypeExpr::Var(var.clone())
}

pub(super) fn install(u: &mut Universe) -> GenusResult<Builtins> {
    let mut b = Builtins::default();

    // referenced before they are defined
    b.list = u.declare("builtins.list")?;
    b.dict = u.declare("builtins.dict")?;
    b.set = u.declare("builtins.set")?;
    b.frozenset = u.declare("builtins.frozenset")?;
    b.tuple = u.declare("builtins.tuple")?;
    b.int = u.declare("builtins.int")?;
    b.str = u.declare("builtins.str")?;
    b.bytes = u.declare("builtins.bytes")?;
    b.bool = u.declare("builtins.bool")?;
    b.float = u.declare("builtins.float")?;
    b.complex = u.declare("builtins.complex")?;
    b.counter = u.declare("collections.Counter")?;
    b.chain_map = u.declare("collections.ChainMap")?;

    let t_co = TyVar::covariant("T_co");
    let t = TyVar::new("T");
    let kt = TyVar::new("KT");
    let vt = TyVar::new("VT");
    let vt_co = TyVar::covariant("VT_co");
    let ct_co = TyVar::covariant("CT_co");
    let any_str =
        TyVar::new("AnyStr").with_constraints(vec![u.atom(b.str), u.atom(b.bytes)]);

    b.any = ClassId::TOP;
    b.hashable = u.define(ClassSpec::new("collections.abc.Hashable"))?;
    b.sized = u.define(ClassSpec::new("collections.abc.Sized"))?;
    b.iterable = u.define(
        ClassSpec::new("collections.abc.Iterable")
            .param(t_co.clone())
            .constructs(b.list),
    )?;
    b.container =
        u.define(ClassSpec::new("collections.abc.Container").param(t_co.clone()))?;
    b.collection = u.define(
        ClassSpec::new("collections.abc.Collection")
            .param(t_co.clone())
            .base(c(b.sized))
            .base(app(b.iterable, vec![v(&t_co)]))
            .base(app(b.container, vec![v(&t_co)]))
            .constructs(b.list),
    )?;
    b.reversible = u.define(
        ClassSpec::new("collections.abc.Reversible")
            .param(t_co.clone())
            .base(app(b.iterable, vec![v(&t_co)])),
    )?;
    b.sequence = u.define(
        ClassSpec::new("collections.abc.Sequence")
            .param(t_co.clone())
            .base(app(b.reversible, vec![v(&t_co)]))
            .base(app(b.collection, vec![v(&t_co)]))
            .constructs(b.list),
    )?;
    b.mutable_sequence = u.define(
        ClassSpec::new("collections.abc.MutableSequence")
            .param(t.clone())
            .base(app(b.sequence, vec![v(&t)]))
            .constructs(b.list),
    )?;

    u.define(
        ClassSpec::new("builtins.list")
            .param(t.clone())
            .base(app(b.mutable_sequence, vec![v(&t)]))
            .constructs(b.list),
    )?;

    b.abstract_set = u.define(
        ClassSpec::new("typing.AbstractSet")
            .param(t_co.clone())
            .base(app(b.collection, vec![v(&t_co)]))
            .constructs(b.set),
    )?;
    b.mutable_set = u.define(
        ClassSpec::new("collections.abc.MutableSet")
            .param(t.clone())
            .base(app(b.abstract_set, vec![v(&t)]))
            .constructs(b.set),
    )?;
    u.define(
        ClassSpec::new("builtins.set")
            .param(t.clone())
            .base(app(b.mutable_set, vec![v(&t)]))
            .constructs(b.set),
    )?;
    u.define(
        ClassSpec::new("builtins.frozenset")
            .param(t_co.clone())
            .base(app(b.abstract_set, vec![v(&t_co)]))
            .base(c(b.hashable))
            .constructs(b.frozenset),
    )?;

    b.mapping = u.define(
        ClassSpec::new("collections.abc.Mapping")
            .kind(ClassKind::Mapping)
            .params(vec![kt.clone(), vt_co.clone()])
            .base(app(b.collection, vec![v(&kt)]))
            .constructs(b.dict),
    )?;
    b.mutable_mapping = u.define(
        ClassSpec::new("collections.abc.MutableMapping")
            .params(vec![kt.clone(), vt.clone()])
            .base(app(b.mapping, vec![v(&kt), v(&vt)]))
            .constructs(b.dict),
    )?;
    u.define(
        ClassSpec::new("builtins.dict")
            .params(vec![kt.clone(), vt.clone()])
            .base(app(b.mutable_mapping, vec![v(&kt), v(&vt)]))
            .constructs(b.dict),
    )?;
    u.define(
        ClassSpec::new("collections.Counter")
            .param(t.clone())
            .base(app(b.dict, vec![v(&t), c(b.int)]))
            .constructs(b.counter),
    )?;
    u.define(
        ClassSpec::new("collections.ChainMap")
            .params(vec![kt.clone(), vt.clone()])
            .base(app(b.mutable_mapping, vec![v(&kt), v(&vt)]))
            .constructs(b.chain_map),
    )?;

    u.define(
        ClassSpec::new("builtins.tuple")
            .kind(ClassKind::Tuple)
            .param(t_co.clone())
            .base(app(b.sequence, vec![v(&t_co)]))
            .base(c(b.hashable))
            .constructs(b.tuple),
    )?;
    b.union = u.define(ClassSpec::new("typing.Union").kind(ClassKind::Union))?;
    b.callable = u.define(ClassSpec::new("collections.abc.Callable").kind(ClassKind::Callable))?;
    b.type_ = u.define(
        ClassSpec::new("builtins.type")
            .kind(ClassKind::Type)
            .param(ct_co.clone()),
    )?;

    b.number = u.define(ClassSpec::new("numbers.Number"))?;
    b.complex_number = u.define(ClassSpec::new("numbers.Complex").base(c(b.number)))?;
    b.real = u.define(ClassSpec::new("numbers.Real").base(c(b.complex_number)))?;
    b.rational = u.define(ClassSpec::new("numbers.Rational").base(c(b.real)))?;
    b.integral = u.define(ClassSpec::new("numbers.Integral").base(c(b.rational)))?;

    let number_like = Ty::union(vec![u.atom(b.number), u.atom(b.str), u.atom(b.bytes)]);
    u.define(
        ClassSpec::new("builtins.int")
            .base(c(b.integral))
            .base(c(b.hashable))
            .constructor(
                Signature::new(vec![number_like, u.atom(b.int)], u.atom(b.int)).optional(2),
            ),
    )?;
    u.define(
        ClassSpec::new("builtins.bool")
            .base(c(b.int))
            .constructor(Signature::new(vec![Ty::top()], u.atom(b.bool)).optional(1)),
    )?;

    let real_like = Ty::union(vec![u.atom(b.real), u.atom(b.str)]);
    u.define(
        ClassSpec::new("builtins.float")
            .base(c(b.real))
            .base(c(b.hashable))
            .constructor(Signature::new(vec![real_like], u.atom(b.float)).optional(1)),
    )?;

    let complex_like = Ty::union(vec![u.atom(b.complex_number), u.atom(b.str)]);
    u.define(
        ClassSpec::new("builtins.complex")
            .base(c(b.complex_number))
            .base(c(b.hashable))
            .constructor(
                Signature::new(vec![complex_like, u.atom(b.real)], u.atom(b.complex)).optional(2),
            ),
    )?;

    u.define(
        ClassSpec::new("builtins.str")
            .base(app(b.sequence, vec![c(b.str)]))
            .base(c(b.hashable))
            .constructor(Signature::new(vec![Ty::top()], u.atom(b.str)).optional(1)),
    )?;
    b.byte_string = u.define(
        ClassSpec::new("collections.abc.ByteString").base(app(b.sequence, vec![c(b.int)])),
    )?;
    u.define(
        ClassSpec::new("builtins.bytes")
            .base(c(b.byte_string))
            .base(c(b.hashable))
            .constructor(
                Signature::new(
                    vec![Ty::union(vec![
                        u.ty(&app(b.iterable, vec![c(b.int)]))?,
                        u.atom(b.str),
                    ])],
                    u.atom(b.bytes),
                )
                .optional(1),
            ),
    )?;
    b.none = u.define(ClassSpec::new("builtins.NoneType").base(c(b.hashable)))?;

    b.pattern = u.define(ClassSpec::new("re.Pattern").param(any_str.clone()))?;
    b.match_ = u.define(ClassSpec::new("re.Match").param(any_str))?;

    b.function = u.define(ClassSpec::new("builtins.function").base(c(b.callable)))?;
    b.builtin_function = u.define(
        ClassSpec::new("builtins.builtin_function_or_method").base(c(b.callable)),
    )?;

    b.enum_ = u.define(ClassSpec::new("enum.Enum"))?;

    install_constructors(u, &b, &t, &t_co, &kt, &vt)?;
    install_abstract_classes(u, &mut b)?;
    install_aliases(u, &b);
    Ok(b)
}

/// Abstract classes whose subclasses are decided by a rule, meant as dispatch targets.
fn install_abstract_classes(u: &mut Universe, b: &mut Builtins) -> GenusResult<()> {
    let any_str = vec![b.str, b.bytes, b.byte_string];
    let atomic = SubclassHook::Complement {
        of: b.collection,
        unless: vec![b.str],
    };
    let mut abstract_class = |name: &str, hook: SubclassHook| {
        u.define(ClassSpec::new(format!("genus.abcs.{}", name)).subclass_hook(hook))
    };

    b.builtin = abstract_class("Builtin", SubclassHook::packages(vec!["builtins"]))?;
    b.builtin_atomic = abstract_class(
        "BuiltinAtomic",
        SubclassHook::All(vec![SubclassHook::packages(vec!["builtins"]), atomic.clone()]),
    )?;
    b.non_collection = abstract_class("NonCollection", atomic)?;
    b.non_str_collection = abstract_class(
        "NonStrCollection",
        SubclassHook::Narrowed {
            of: b.collection,
            excluding: vec![b.str],
        },
    )?;
    b.non_any_str_collection = abstract_class(
        "NonAnyStrCollection",
        SubclassHook::Narrowed {
            of: b.collection,
            excluding: any_str.clone(),
        },
    )?;
    b.non_str_sequence = abstract_class(
        "NonStrSequence",
        SubclassHook::Narrowed {
            of: b.sequence,
            excluding: vec![b.str],
        },
    )?;
    b.non_any_str_sequence = abstract_class(
        "NonAnyStrSequence",
        SubclassHook::Narrowed {
            of: b.sequence,
            excluding: any_str,
        },
    )?;
    // `enum.Enum` subclasses are rejected wherever they are defined
    b.non_std_lib = abstract_class(
        "NonStdLib",
        SubclassHook::All(vec![
            SubclassHook::outside_packages(STDLIB_PACKAGES.iter().copied()),
            SubclassHook::Complement {
                of: b.enum_,
                unless: vec![],
            },
        ]),
    )?;
    Ok(())
}

fn iterable_of(u: &Universe, b: &Builtins, var: &TyVar) -> GenusResult<Ty> {
    u.ty(&app(b.iterable, vec![v(var)]))
}

/// Constructor signatures of the generic builtins refer to the classes themselves, so they are
/// attached once every class is defined.
fn install_constructors(
    u: &mut Universe,
    b: &Builtins,
    t: &TyVar,
    t_co: &TyVar,
    kt: &TyVar,
    vt: &TyVar,
) -> GenusResult<()> {
    let list_sig = Signature::new(
        vec![iterable_of(u, b, t)?],
        u.ty(&app(b.list, vec![v(t)]))?,
    )
    .optional(1);
    let set_sig = Signature::new(vec![iterable_of(u, b, t)?], u.ty(&app(b.set, vec![v(t)]))?)
        .optional(1);
    let frozenset_sig = Signature::new(
        vec![iterable_of(u, b, t_co)?],
        u.ty(&app(b.frozenset, vec![v(t_co)]))?,
    )
    .optional(1);
    let tuple_sig = Signature::new(
        vec![iterable_of(u, b, t_co)?],
        Ty::homogeneous_tuple(Ty::Var(t_co.clone())),
    )
    .optional(1);
    let dict_sig = Signature::new(
        vec![u.ty(&app(b.mapping, vec![v(kt), v(vt)]))?],
        u.ty(&app(b.dict, vec![v(kt), v(vt)]))?,
    )
    .optional(1);
    let counter_sig = Signature::new(
        vec![iterable_of(u, b, t)?],
        u.ty(&app(b.counter, vec![v(t)]))?,
    )
    .optional(1);
    let chain_map_sig = Signature::new(vec![], u.ty(&app(b.chain_map, vec![v(kt), v(vt)]))?)
        .variadic(u.ty(&app(b.mutable_mapping, vec![v(kt), v(vt)]))?);

    for (id, sig) in vec![
        (b.list, list_sig),
        (b.set, set_sig),
        (b.frozenset, frozenset_sig),
        (b.tuple, tuple_sig),
        (b.dict, dict_sig),
        (b.counter, counter_sig),
        (b.chain_map, chain_map_sig),
    ] {
        u.class_mut(id).constructor = Some(sig);
    }
    Ok(())
}

fn install_aliases(u: &mut Universe, b: &Builtins) {
    let aliases = vec![
        ("typing.Hashable", b.hashable),
        ("typing.Sized", b.sized),
        ("typing.Iterable", b.iterable),
        ("typing.Container", b.container),
        ("typing.Collection", b.collection),
        ("typing.Reversible", b.reversible),
        ("typing.Sequence", b.sequence),
        ("typing.MutableSequence", b.mutable_sequence),
        ("typing.List", b.list),
        ("collections.abc.Set", b.abstract_set),
        ("typing.MutableSet", b.mutable_set),
        ("typing.Set", b.set),
        ("typing.FrozenSet", b.frozenset),
        ("typing.Mapping", b.mapping),
        ("typing.MutableMapping", b.mutable_mapping),
        ("typing.Dict", b.dict),
        ("typing.Counter", b.counter),
        ("typing.ChainMap", b.chain_map),
        ("typing.Tuple", b.tuple),
        ("typing.Callable", b.callable),
        ("typing.Type", b.type_),
        ("typing.ByteString", b.byte_string),
        ("typing.Pattern", b.pattern),
        ("typing.Match", b.match_),
        ("None", b.none),
        ("object", ClassId::TOP),
    ];
    for (alias, id) in aliases {
        u.alias(alias, id);
    }

    // the builtin `set` wins over `collections.abc.Set` for the bare name
    u.alias("Set", b.set);
}
