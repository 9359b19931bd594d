use std::sync::{Arc, OnceLock};

use fnv::FnvHashMap;

use crate::{
    errors::GenusResult,
    typing::{resolve_lazy_refs, Ty, Universe},
};

use super::DispatchRegistry;

pub type Handler<V, R> = Arc<dyn Fn(&DispatchRegistry<V, R>, &V) -> GenusResult<R> + Send + Sync>;

pub type Predicate<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// Maps a query to the key of the fork handler that should receive it.
pub type Discriminator<V> = Arc<dyn Fn(&V) -> Option<String> + Send + Sync>;

pub(super) enum Pattern<V, R> {
    Structural {
        ty: Ty,
        resolved: OnceLock<Ty>,
    },
    Predicate(Predicate<V>),
    Fork {
        discriminator: Discriminator<V>,
        handlers: FnvHashMap<String, Handler<V, R>>,
    },
}

impl<V, R> Pattern<V, R> {
    pub fn structural(ty: Ty) -> Pattern<V, R> {
        Pattern::Structural {
            ty,
            resolved: OnceLock::new(),
        }
    }

    /// The pattern descriptor with lazy references loaded. Resolution happens once per entry.
    pub fn descriptor(&self, universe: &Universe) -> GenusResult<Option<Ty>> {
        let (ty, resolved) = match self {
            Pattern::Structural { ty, resolved } => (ty, resolved),
            _ => return Ok(None),
        };

        if let Some(ty) = resolved.get() {
            return Ok(Some(ty.clone()));
        }

        let ty = resolve_lazy_refs(ty, universe)?;
        log::debug!("resolved dispatch pattern to {}", ty);
        Ok(Some(resolved.get_or_init(|| ty).clone()))
    }

    /// The handler a fork selects for `query`, if it has one.
    pub fn fork_handler(&self, query: &V) -> Option<Handler<V, R>> {
        match self {
            Pattern::Fork {
                discriminator,
                handlers,
            } => discriminator(query).and_then(|key| handlers.get(&key).cloned()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Pattern::Structural { .. } => "structural",
            Pattern::Predicate(_) => "predicate",
            Pattern::Fork { .. } => "fork",
        }
    }
}

pub(super) struct Entry<V, R> {
    pub pattern: Pattern<V, R>,
    pub handler: Option<Handler<V, R>>,
    pub order: usize,
    pub label: String,
}

impl<V, R> std::fmt::Debug for Entry<V, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.pattern.kind())
            .field("label", &self.label)
            .field("order", &self.order)
            .finish()
    }
}
