use std::sync::{Arc, RwLock};

use crate::{
    errors::{GenusError, GenusResult},
    runtime::{isinstance_generic, Instance},
    typing::{is_subtype, prelude, Ty, Universe},
};

mod config;
mod pattern;
mod trace;

pub use config::{DispatchLevel, RegistryConfig};
pub use pattern::{Discriminator, Handler, Predicate};
pub use trace::{ResolutionTrace, TraceEdge, TraceNode};

use pattern::{Entry, Pattern};

/// A registry of handlers keyed by type patterns, predicates and forks.
///
/// Resolution keeps every matching pattern that no other matching structural pattern is strictly
/// more specific than, then picks the most recently registered of those. Predicates and forks
/// have no specificity, so among them recency alone decides.
pub struct DispatchRegistry<V, R> {
    config: RegistryConfig,
    universe: Arc<Universe>,
    entries: RwLock<Vec<Arc<Entry<V, R>>>>,
}

type Selection<V, R> = Option<(Arc<Entry<V, R>>, Handler<V, R>)>;

impl<V, R> DispatchRegistry<V, R>
where
    V: Instance,
{
    pub fn new(universe: Arc<Universe>, config: RegistryConfig) -> DispatchRegistry<V, R> {
        DispatchRegistry {
            config,
            universe,
            entries: RwLock::new(vec![]),
        }
    }

    /// A registry over the shared prelude universe.
    pub fn with_prelude(config: RegistryConfig) -> DispatchRegistry<V, R> {
        DispatchRegistry::new(prelude(), config)
    }

    /// Wraps a closure as a handler, e.g. for [`register_fork`](Self::register_fork).
    pub fn handler<F>(f: F) -> Handler<V, R>
    where
        F: Fn(&DispatchRegistry<V, R>, &V) -> GenusResult<R> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, pattern: Pattern<V, R>, handler: Option<Handler<V, R>>, label: String) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let order = entries.len();
        log::debug!(
            "{}: registered {} pattern #{} {}",
            self.config.name,
            pattern.kind(),
            order,
            label
        );
        entries.push(Arc::new(Entry {
            pattern,
            handler,
            order,
            label,
        }));
    }

    /// Registers `handler` for queries matching `ty`.
    pub fn register<F>(&self, ty: Ty, handler: F)
    where
        F: Fn(&DispatchRegistry<V, R>, &V) -> GenusResult<R> + Send + Sync + 'static,
    {
        let ty = self.isolate(ty);
        let label = ty.to_string();
        self.push(Pattern::structural(ty), Some(Arc::new(handler)), label);
    }

    /// Registers `handler` for queries accepted by `predicate`.
    pub fn register_predicate<S, P, F>(&self, label: S, predicate: P, handler: F)
    where
        S: Into<String>,
        P: Fn(&V) -> bool + Send + Sync + 'static,
        F: Fn(&DispatchRegistry<V, R>, &V) -> GenusResult<R> + Send + Sync + 'static,
    {
        self.push(
            Pattern::Predicate(Arc::new(predicate)),
            Some(Arc::new(handler)),
            label.into(),
        );
    }

    /// Registers a handler that returns a clone of `value` for queries matching `ty`.
    pub fn register_as_const(&self, ty: Ty, value: R)
    where
        R: Clone + Send + Sync + 'static,
    {
        self.register(ty, move |_, _| Ok(value.clone()));
    }

    /// Registers a fork: a query matches when `discriminator` maps it to one of the keys of
    /// `handlers`, and is then handled by the handler under that key.
    pub fn register_fork<S, D, I, K>(&self, label: S, discriminator: D, handlers: I)
    where
        S: Into<String>,
        D: Fn(&V) -> Option<String> + Send + Sync + 'static,
        I: IntoIterator<Item = (K, Handler<V, R>)>,
        K: Into<String>,
    {
        let handlers = handlers.into_iter().map(|(k, h)| (k.into(), h)).collect();
        self.push(
            Pattern::Fork {
                discriminator: Arc::new(discriminator),
                handlers,
            },
            None,
            label.into(),
        );
    }

    /// Reduces descriptors with an isolated origin to the bare origin.
    fn isolate(&self, ty: Ty) -> Ty {
        if self.config.isolated.is_empty() {
            return ty;
        }

        let origin = match &ty {
            Ty::Union(_) => Some(self.universe.builtins().union),
            other => self.universe.origin_of(other),
        };
        match origin {
            Some(origin) if self.config.is_isolated(origin) => self.universe.atom(origin),
            _ => ty,
        }
    }

    fn query_type(&self, query: &V) -> GenusResult<Ty> {
        let ty = match self.config.level {
            DispatchLevel::Type => match query.as_type(&self.universe) {
                Some(ty) => ty,
                None => query.runtime_type(&self.universe)?,
            },
            DispatchLevel::Value => query.runtime_type(&self.universe)?,
        };
        Ok(self.isolate(ty))
    }

    fn matches(&self, entry: &Entry<V, R>, query: &V, query_ty: &Ty) -> GenusResult<bool> {
        match &entry.pattern {
            Pattern::Structural { .. } => {
                let pattern = match entry.pattern.descriptor(&self.universe)? {
                    Some(pattern) => pattern,
                    None => return Ok(false),
                };
                match self.config.level {
                    DispatchLevel::Type => is_subtype(&self.universe, query_ty, &pattern),
                    DispatchLevel::Value => isinstance_generic(&self.universe, query, &pattern),
                }
            }
            Pattern::Predicate(predicate) => Ok(predicate(query)),
            Pattern::Fork { .. } => Ok(entry.pattern.fork_handler(query).is_some()),
        }
    }

    fn select(
        &self,
        query: &V,
        query_ty: &Ty,
        mut trace: Option<&mut ResolutionTrace>,
    ) -> GenusResult<Selection<V, R>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut matched = vec![];
        for entry in entries {
            let ok = self.matches(&entry, query, query_ty)?;
            if let Some(trace) = trace.as_deref_mut() {
                trace.tested(entry.order, &entry.label, ok);
            }
            if ok {
                let descriptor = entry.pattern.descriptor(&self.universe)?;
                matched.push((entry, descriptor));
            }
        }

        let mut survivors = vec![];
        for (entry, descriptor) in matched.iter() {
            let p = match descriptor {
                Some(p) => p,
                None => {
                    survivors.push(entry);
                    continue;
                }
            };

            let mut dominated = false;
            for (other, other_descriptor) in matched.iter() {
                let q = match other_descriptor {
                    Some(q) if other.order != entry.order => q,
                    _ => continue,
                };
                if is_subtype(&self.universe, q, p)? && !is_subtype(&self.universe, p, q)? {
                    dominated = true;
                    if let Some(trace) = trace.as_deref_mut() {
                        trace.shadows(other.order, entry.order);
                    }
                }
            }

            if !dominated {
                survivors.push(entry);
            }
        }

        let winner = match survivors.into_iter().max_by_key(|e| e.order) {
            Some(winner) => Arc::clone(winner),
            None => return Ok(None),
        };

        let handler = match &winner.pattern {
            Pattern::Fork { .. } => winner.pattern.fork_handler(query),
            _ => winner.handler.clone(),
        };

        if let Some(trace) = trace {
            trace.selected(winner.order);
        }

        Ok(handler.map(|h| (winner, h)))
    }

    /// The handler for `query`.
    pub fn resolve(&self, query: &V) -> GenusResult<Handler<V, R>> {
        let query_ty = self.query_type(query)?;
        match self.select(query, &query_ty, None)? {
            Some((entry, handler)) => {
                log::debug!(
                    "{}: {} resolved to #{} {}",
                    self.config.name,
                    query_ty,
                    entry.order,
                    entry.label
                );
                Ok(handler)
            }
            None => Err(GenusError::NoMatchingHandler {
                registry: self.config.name.clone(),
                query: query_ty,
            }),
        }
    }

    /// Resolves and calls the handler for `query`.
    pub fn invoke(&self, query: &V) -> GenusResult<R> {
        let handler = self.resolve(query)?;
        handler(self, query)
    }

    /// Records how `query` is resolved, without invoking anything.
    pub fn visualize(&self, query: &V) -> GenusResult<ResolutionTrace> {
        let query_ty = self.query_type(query)?;
        let mut trace = ResolutionTrace::new(query_ty.to_string());
        self.select(query, &query_ty, Some(&mut trace))?;
        Ok(trace)
    }
}

impl<R> DispatchRegistry<Ty, R> {
    /// Invokes the registry on each type argument of `ty`, in order.
    pub fn invoke_args(&self, ty: &Ty) -> GenusResult<Vec<R>> {
        ty.type_args().iter().map(|arg| self.invoke(arg)).collect()
    }
}
