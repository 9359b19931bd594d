use std::sync::{Arc, RwLock};

use fnv::{FnvHashMap, FnvHashSet};

use crate::{
    errors::{GenusError, GenusResult},
    runtime::Signature,
    utils::{join, root_package, short_name},
};

use super::{
    class::{ClassDef, ClassId, ClassKind, ClassRef, ClassSpec, SubclassHook},
    expr::TypeExpr,
    prelude::{self, Builtins},
    reify::reify,
    resolve::TypeLoader,
    subst::{ApplySubst, Subst},
    ty::Ty,
};

lazy_static! {
    static ref PRELUDE: Arc<Universe> = Arc::new(Universe::new());
}

/// The shared default universe: the prelude classes and nothing else.
pub fn prelude() -> Arc<Universe> {
    Arc::clone(&PRELUDE)
}

/// The class table.
///
/// A universe is built with `&mut self` (prelude first, then user definitions) and then shared
/// read-only, typically behind an `Arc`. Subclass queries are memoized.
pub struct Universe {
    classes: Vec<ClassDef>,
    by_name: FnvHashMap<String, ClassId>,
    builtins: Builtins,
    subclass_cache: RwLock<FnvHashMap<(ClassId, ClassId), bool>>,
}

impl Clone for Universe {
    fn clone(&self) -> Universe {
        Universe {
            classes: self.classes.clone(),
            by_name: self.by_name.clone(),
            builtins: self.builtins.clone(),
            subclass_cache: RwLock::new(FnvHashMap::default()),
        }
    }
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("classes", &self.classes.len())
            .finish()
    }
}

impl Default for Universe {
    fn default() -> Universe {
        Universe::new()
    }
}

impl Universe {
    /// A fresh universe holding the prelude classes.
    pub fn new() -> Universe {
        let mut universe = Universe {
            classes: vec![ClassDef::declared(ClassId::TOP, str!("typing.Any"))],
            by_name: FnvHashMap::default(),
            builtins: Builtins::default(),
            subclass_cache: RwLock::new(FnvHashMap::default()),
        };

        let top = &mut universe.classes[ClassId::TOP.index()];
        top.kind = ClassKind::Top;
        top.defined = true;
        universe.alias("typing.Any", ClassId::TOP);
        universe.alias("builtins.object", ClassId::TOP);

        universe.builtins = prelude::install(&mut universe).expect("prelude classes are well-formed");
        universe
    }

    pub fn freeze(self) -> Arc<Universe> {
        Arc::new(self)
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Reserves `name` so that definitions may refer to the class before it is defined.
    pub fn declare<S: AsRef<str>>(&mut self, name: S) -> GenusResult<ClassId> {
        let name = name.as_ref();
        if let Some(&id) = self.by_name.get(name) {
            return if self.classes[id.index()].defined {
                Err(GenusError::definition(name, "class is already defined"))
            } else {
                Ok(id)
            };
        }

        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::declared(id, name.to_string()));
        self.alias(name, id);
        log::trace!("declared class {} as {}", name, id);
        Ok(id)
    }

    pub fn define(&mut self, spec: ClassSpec) -> GenusResult<ClassId> {
        let id = self.declare(&spec.name)?;
        let name = spec.name;

        let mut bases = spec
            .bases
            .iter()
            .map(|b| reify(self, b))
            .collect::<GenusResult<Vec<_>>>()?;
        if bases.is_empty() && matches!(spec.kind, ClassKind::Record(_)) {
            bases.push(self.atom(self.builtins.tuple));
        }

        let mut base_ids = vec![];
        for base in bases.iter() {
            let base_id = match self.origin_of(base) {
                Some(base_id) => base_id,
                None => return Err(GenusError::definition(&name, format!("`{}` is not a class", base))),
            };
            if base_id == id {
                return Err(GenusError::definition(&name, "a class cannot inherit from itself"));
            }
            if !self.classes[base_id.index()].defined {
                return Err(GenusError::definition(&name, format!("base `{}` is not defined", base)));
            }
            base_ids.push(base_id);
        }

        let mro = match self.linearize(id, &base_ids) {
            Some(mro) => mro,
            None => {
                return Err(GenusError::definition(
                    &name,
                    "cannot create a consistent method resolution order",
                ))
            }
        };

        log::debug!(
            "defined class {} [{}] (mro: {})",
            name,
            join(&spec.params, ", "),
            join(mro.iter().map(|c| self.classes[c.index()].class_ref()), " -> ")
        );

        let def = &mut self.classes[id.index()];
        def.kind = spec.kind;
        def.params = spec.params;
        def.bases = bases;
        def.mro = mro;
        def.call = spec.call;
        def.constructor = spec.constructor;
        def.constructs = spec.constructs;
        def.hook = spec.hook;
        def.defined = true;
        self.clear_cache();
        Ok(id)
    }

    /// Makes `base` a virtual base of `sub`: `sub` is treated as a subclass of `base` without
    /// `base` appearing among its declared bases.
    pub fn register_virtual(&mut self, sub: ClassId, base: ClassId) {
        let def = &mut self.classes[sub.index()];
        if !def.virtual_bases.contains(&base) {
            def.virtual_bases.push(base);
        }
        log::debug!(
            "registered {} as a virtual subclass of {}",
            self.class_ref(sub),
            self.class_ref(base)
        );
        self.clear_cache();
    }

    /// Makes `alias` another name for `id` in lookups.
    pub fn alias<S: AsRef<str>>(&mut self, alias: S, id: ClassId) {
        let alias = alias.as_ref();
        self.by_name.insert(alias.to_string(), id);
        let short = short_name(alias);
        if short != alias {
            self.by_name.entry(short.to_string()).or_insert(id);
        }
    }

    fn clear_cache(&mut self) {
        if let Ok(cache) = self.subclass_cache.get_mut() {
            cache.clear();
        }
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    /// Panics if `id` was not issued by this universe.
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub(super) fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.index()]
    }

    pub fn class_ref(&self, id: ClassId) -> ClassRef {
        self.class(id).class_ref()
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn named(&self, name: &str) -> GenusResult<ClassId> {
        self.lookup(name).ok_or_else(|| GenusError::unresolved_name(name))
    }

    pub fn atom(&self, id: ClassId) -> Ty {
        Ty::Atomic(self.class_ref(id))
    }

    pub fn top(&self) -> Ty {
        Ty::top()
    }

    /// Reifies `expr` against this universe.
    pub fn ty(&self, expr: &TypeExpr) -> GenusResult<Ty> {
        reify(self, expr)
    }

    /// The descriptor of the bare class called `name`.
    pub fn by_name(&self, name: &str) -> GenusResult<Ty> {
        reify(self, &TypeExpr::Class(self.named(name)?))
    }

    /// Empty for ids this universe did not issue.
    pub fn mro(&self, id: ClassId) -> &[ClassId] {
        self.get(id).map(|c| c.mro.as_slice()).unwrap_or(&[])
    }

    /// Whether `class` was issued by this universe.
    pub fn owns(&self, class: &ClassRef) -> bool {
        self.get(class.id).map_or(false, |c| c.name == class.name)
    }

    /// Fails if `ty` mentions a class that does not belong to this universe.
    pub fn check_owned(&self, ty: &Ty) -> GenusResult<()> {
        match ty.find_class(&|c: &ClassRef| !self.owns(c)) {
            Some(foreign) => Err(GenusError::unreifiable(
                ty,
                format!("class `{:#}` does not belong to this universe", foreign),
            )),
            None => Ok(()),
        }
    }

    pub fn is_record_class(&self, id: ClassId) -> bool {
        self.get(id).map(ClassDef::is_record).unwrap_or(false)
    }

    /// The concrete class used to build values of `id`, if it has one.
    pub fn constructor_for(&self, id: ClassId) -> Option<ClassId> {
        self.get(id).and_then(|c| c.constructs)
    }

    /// The first class along `id`'s mro for which `pick` finds a signature.
    fn declared_signature<F>(&self, id: ClassId, pick: F) -> Option<(ClassId, &Signature)>
    where
        F: Fn(&ClassDef) -> Option<&Signature>,
    {
        self.mro(id)
            .iter()
            .find_map(|c| pick(self.class(*c)).map(|sig| (*c, sig)))
    }

    /// The signature instances of `id` are called with, inherited along the mro.
    pub fn call_signature(&self, id: ClassId) -> Option<&Signature> {
        self.declared_signature(id, |c| c.call.as_ref())
            .map(|(_, sig)| sig)
    }

    /// The call signature of instances of `ty`, specialized to the arguments `ty` passes to the
    /// class that declares it.
    pub fn call_signature_of(&self, ty: &Ty) -> Option<Signature> {
        let origin = self.origin_of(ty)?;
        let (declaring, sig) = self.declared_signature(origin, |c| c.call.as_ref())?;
        Some(self.specialize(ty, declaring, sig))
    }

    /// The signature `ty` is constructed with, specialized like [`call_signature_of`].
    ///
    /// [`call_signature_of`]: Universe::call_signature_of
    pub fn constructor_signature_of(&self, ty: &Ty) -> Option<Signature> {
        let origin = self.origin_of(ty)?;
        let (declaring, sig) = self.declared_signature(origin, |c| c.constructor.as_ref())?;
        Some(self.specialize(ty, declaring, sig))
    }

    fn specialize(&self, ty: &Ty, declaring: ClassId, sig: &Signature) -> Signature {
        match self.generic_ancestor(ty, declaring) {
            Some(args) => {
                let subst = Subst::from_types(self.class(declaring).params.iter().cloned(), args);
                sig.clone().apply_subst(&subst)
            }
            None => sig.clone(),
        }
    }

    /// Nominal subclass check along the mro, honoring virtual bases.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sup == ClassId::TOP || sub == sup {
            return true;
        }

        if let Ok(cache) = self.subclass_cache.read() {
            if let Some(&hit) = cache.get(&(sub, sup)) {
                return hit;
            }
        }

        let admitted = match self.get(sup).and_then(|c| c.hook.as_ref()) {
            Some(hook) => self.admits(hook, sub),
            None => false,
        };
        let result = admitted || self.is_subclass_uncached(sub, sup, &mut FnvHashSet::default());
        if let Ok(mut cache) = self.subclass_cache.write() {
            cache.insert((sub, sup), result);
        }
        result
    }

    fn admits(&self, hook: &SubclassHook, sub: ClassId) -> bool {
        let package = || self.get(sub).map(|c| root_package(&c.name));
        match hook {
            SubclassHook::Narrowed { of, excluding } => {
                self.is_subclass(sub, *of) && !excluding.iter().any(|e| self.is_subclass(sub, *e))
            }
            SubclassHook::Complement { of, unless } => {
                !self.is_subclass(sub, *of) || unless.iter().any(|u| self.is_subclass(sub, *u))
            }
            SubclassHook::InPackages(packages) => {
                sub != ClassId::TOP && package().map_or(false, |p| packages.iter().any(|q| q == p))
            }
            SubclassHook::NotInPackages(packages) => {
                package().map_or(false, |p| !packages.iter().any(|q| q == p))
            }
            SubclassHook::All(hooks) => hooks.iter().all(|h| self.admits(h, sub)),
        }
    }

    fn is_subclass_uncached(
        &self,
        sub: ClassId,
        sup: ClassId,
        visited: &mut FnvHashSet<ClassId>,
    ) -> bool {
        if !visited.insert(sub) {
            return false;
        }

        let mro = self.mro(sub);
        if mro.contains(&sup) {
            return true;
        }

        mro.iter().any(|c| {
            self.class(*c)
                .virtual_bases
                .iter()
                .any(|v| *v == sup || self.is_subclass_uncached(*v, sup, visited))
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeLoader for Universe {
    fn load(&self, path: &str) -> GenusResult<Option<Ty>> {
        match self.lookup(path) {
            Some(id) => reify(self, &TypeExpr::Class(id)).map(Some),
            None => Ok(None),
        }
    }
}
