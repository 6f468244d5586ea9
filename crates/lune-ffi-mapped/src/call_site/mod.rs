//! Single-slot memoization of dynamic method lookups.
//!
//! A call site remembers which callable implemented its method for the last
//! receiver type it saw. As long as the next receiver has the same [`TypeTag`]
//! the lookup is skipped entirely, otherwise the method is resolved again and
//! the slot is replaced.

mod lua;
mod tag;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

pub use self::{
    lua::{lookup_member, lookup_method, LuaBinding, LuaCallSite},
    tag::TypeTag,
};

/**
    A resolved callable together with the receiver type it was resolved for.
*/
#[derive(Debug)]
pub struct Binding<C> {
    tag: TypeTag,
    callable: C,
}

impl<C> Binding<C> {
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    #[must_use]
    pub fn callable(&self) -> &C {
        &self.callable
    }
}

/**
    A call site caching the resolution of one method name.

    The slot is only ever replaced as a whole and the tag is checked on every
    read, so concurrent callers with different receiver types can at worst
    cause a redundant lookup, never a call through the wrong binding.
*/
#[derive(Debug)]
pub struct CallSite<C> {
    method: String,
    caching: bool,
    slot: RwLock<Option<Arc<Binding<C>>>>,
}

impl<C> CallSite<C> {
    pub fn new(method: impl Into<String>) -> Self {
        Self::with_caching(method, true)
    }

    /**
        Creates a call site that resolves its method on every dispatch.
    */
    pub fn uncached(method: impl Into<String>) -> Self {
        Self::with_caching(method, false)
    }

    pub fn with_caching(method: impl Into<String>, caching: bool) -> Self {
        Self {
            method: method.into(),
            caching,
            slot: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.caching
    }

    /**
        The receiver type the current binding was resolved for, if any.
    */
    #[must_use]
    pub fn cached_tag(&self) -> Option<TypeTag> {
        self.slot.read().as_ref().map(|binding| binding.tag)
    }

    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    /**
        Returns the binding for a receiver of type `tag`, running `lookup` with
        the method name only when the cached binding belongs to another type.

        # Errors

        Errors returned by `lookup` are passed through and leave the cache as it was.
    */
    pub fn resolve<E, F>(&self, tag: TypeTag, lookup: F) -> Result<Arc<Binding<C>>, E>
    where
        F: FnOnce(&str) -> Result<C, E>,
    {
        if self.caching {
            let cached = self.slot.read().clone();
            if let Some(binding) = cached {
                if binding.tag == tag {
                    return Ok(binding);
                }
            }
        }

        trace!(method = %self.method, ?tag, "resolving call site");
        let binding = Arc::new(Binding {
            tag,
            callable: lookup(&self.method)?,
        });
        if self.caching {
            *self.slot.write() = Some(Arc::clone(&binding));
        }
        Ok(binding)
    }

    /**
        Resolves the method for `tag` and calls it through `call`.

        # Errors

        Errors from either the lookup or the call itself, unchanged.
    */
    pub fn invoke<R, E, F, G>(&self, tag: TypeTag, lookup: F, call: G) -> Result<R, E>
    where
        F: FnOnce(&str) -> Result<C, E>,
        G: FnOnce(&C) -> Result<R, E>,
    {
        let binding = self.resolve(tag, lookup)?;
        call(binding.callable())
    }
}
