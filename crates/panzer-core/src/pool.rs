//! Content-addressed intern pools, one per value kind.
//!
//! A pool maps an [`InternKey`] to the [`Handle`] of the declaration emitted
//! for it. Pools are append-only for the duration of a run, so memory grows
//! with the number of distinct values rather than the number of nodes.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::emitter::DeclarationEmitter;
use crate::value::Handle;

/// Canonical signature of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum InternKey {
    Null,
    Bool(bool),
    /// `"<double>|<int>"` projection text.
    Number(String),
    /// Raw string content.
    String(String),
    /// Element handles in document order.
    Array(Vec<Handle>),
    /// `(key text, value handle)` for each member, sorted by key bytes.
    Object(Vec<(String, Handle)>),
}

/// A single pool. `K = ()` gives a singleton slot.
#[derive(Debug)]
pub(crate) struct Pool<K> {
    entries: FxHashMap<K, Handle>,
    hits: usize,
}

impl<K> Default for Pool<K> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            hits: 0,
        }
    }
}

impl<K: Hash + Eq> Pool<K> {
    /// Return the handle for `key`, emitting its declaration on first sight.
    ///
    /// `emit` runs at most once per key and receives the freshly allocated
    /// handle. An existing key returns its handle with no side effects
    /// besides the hit counter.
    pub(crate) fn get_or_create<F>(
        &mut self,
        key: K,
        emitter: &mut DeclarationEmitter,
        emit: F,
    ) -> Handle
    where
        F: FnOnce(&mut DeclarationEmitter, Handle),
    {
        if let Some(&handle) = self.entries.get(&key) {
            self.hits += 1;
            return handle;
        }
        let handle = emitter.fresh_handle();
        self.entries.insert(key, handle);
        emit(emitter, handle);
        handle
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits
    }
}

/// The five pools of a run plus the three singletons.
#[derive(Debug, Default)]
pub(crate) struct InternPoolSet {
    objects: Pool<Vec<(String, Handle)>>,
    arrays: Pool<Vec<Handle>>,
    strings: Pool<String>,
    numbers: Pool<String>,
    null: Pool<()>,
    true_: Pool<()>,
    false_: Pool<()>,
}

impl InternPoolSet {
    /// Dispatch `key` to the pool of its kind.
    pub(crate) fn get_or_create<F>(
        &mut self,
        key: InternKey,
        emitter: &mut DeclarationEmitter,
        emit: F,
    ) -> Handle
    where
        F: FnOnce(&mut DeclarationEmitter, Handle),
    {
        match key {
            InternKey::Null => self.null.get_or_create((), emitter, emit),
            InternKey::Bool(true) => self.true_.get_or_create((), emitter, emit),
            InternKey::Bool(false) => self.false_.get_or_create((), emitter, emit),
            InternKey::Number(k) => self.numbers.get_or_create(k, emitter, emit),
            InternKey::String(k) => self.strings.get_or_create(k, emitter, emit),
            InternKey::Array(k) => self.arrays.get_or_create(k, emitter, emit),
            InternKey::Object(k) => self.objects.get_or_create(k, emitter, emit),
        }
    }

    /// Lookups answered from an existing entry, across all pools.
    pub(crate) fn dedup_hits(&self) -> usize {
        self.objects.hits()
            + self.arrays.hits()
            + self.strings.hits()
            + self.numbers.hits()
            + self.null.hits()
            + self.true_.hits()
            + self.false_.hits()
    }

    /// Distinct entries across all pools.
    pub(crate) fn len(&self) -> usize {
        self.objects.len()
            + self.arrays.len()
            + self.strings.len()
            + self.numbers.len()
            + self.null.len()
            + self.true_.len()
            + self.false_.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;
    use crate::value::Value;

    #[test]
    fn emits_once_per_key() {
        let options = CompileOptions::default();
        let mut emitter = DeclarationEmitter::new(&options);
        let mut pool: Pool<String> = Pool::default();
        let mut calls = 0;

        let a = pool.get_or_create("x".into(), &mut emitter, |e, h| {
            calls += 1;
            e.declare(h, Value::Null);
        });
        let b = pool.get_or_create("x".into(), &mut emitter, |_, _| calls += 1);

        assert_eq!(a, b);
        assert_eq!(calls, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.hits(), 1);
    }

    #[test]
    fn singletons_are_independent() {
        let options = CompileOptions::default();
        let mut emitter = DeclarationEmitter::new(&options);
        let mut pools = InternPoolSet::default();

        let t = pools.get_or_create(InternKey::Bool(true), &mut emitter, |e, h| {
            e.declare(h, Value::Bool(true))
        });
        let f = pools.get_or_create(InternKey::Bool(false), &mut emitter, |e, h| {
            e.declare(h, Value::Bool(false))
        });
        let t2 = pools.get_or_create(InternKey::Bool(true), &mut emitter, |_, _| {
            unreachable!("true is already interned")
        });

        assert_ne!(t, f);
        assert_eq!(t, t2);
        assert_eq!(pools.len(), 2);
        assert_eq!(pools.dedup_hits(), 1);
    }
}
