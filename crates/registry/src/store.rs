//! Key → factory store with lock-free reads.
//!
//! # Role
//!
//! The store is the single source of truth for "is a factory already known
//! for this key". It holds no policy: synthesis and locking live in
//! [`crate::FactoryRegistry`].
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free (atomic load of the current map snapshot).
//! - **Writes:** Lock-free read-copy-update; each write publishes a new map,
//!   so every operation is atomic for its key.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::factory::FactoryRef;

type FactoryMap = FxHashMap<Box<str>, FactoryRef>;

/// Concurrent mapping from key to factory.
pub struct FactoryStore {
	map: ArcSwap<FactoryMap>,
	initial_capacity: usize,
}

impl FactoryStore {
	pub fn new() -> Self {
		Self::with_capacity(0)
	}

	pub fn with_capacity(initial_capacity: usize) -> Self {
		Self {
			map: ArcSwap::from_pointee(empty_map(initial_capacity)),
			initial_capacity,
		}
	}

	/// Returns the factory stored under `key`.
	#[inline]
	pub fn lookup(&self, key: &str) -> Option<FactoryRef> {
		self.map.load().get(key).cloned()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.map.load().contains_key(key)
	}

	/// Stores `factory` under `key`, returning the previous factory.
	///
	/// `None` removes the entry.
	pub fn put(&self, key: &str, factory: Option<FactoryRef>) -> Option<FactoryRef> {
		let previous = self.map.rcu(|current| {
			let mut next = FactoryMap::clone(current);
			match &factory {
				Some(factory) => {
					next.insert(key.into(), Arc::clone(factory));
				}
				None => {
					next.remove(key);
				}
			}
			next
		});
		previous.get(key).cloned()
	}

	/// Stores `factory` under `key` unless an entry already exists.
	///
	/// Returns the factory left in the store.
	pub fn insert_if_absent(&self, key: &str, factory: FactoryRef) -> FactoryRef {
		let previous = self.map.rcu(|current| {
			if current.contains_key(key) {
				return Arc::clone(current);
			}
			let mut next = FactoryMap::clone(current);
			next.insert(key.into(), Arc::clone(&factory));
			Arc::new(next)
		});
		previous.get(key).cloned().unwrap_or(factory)
	}

	pub fn remove(&self, key: &str) -> Option<FactoryRef> {
		self.put(key, None)
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.map.store(Arc::new(empty_map(self.initial_capacity)));
	}

	pub fn len(&self) -> usize {
		self.map.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the stored keys, sorted.
	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.map.load().keys().map(|k| k.to_string()).collect();
		keys.sort_unstable();
		keys
	}
}

impl Default for FactoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for FactoryStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FactoryStore").field("keys", &self.keys()).finish()
	}
}

fn empty_map(capacity: usize) -> FactoryMap {
	FactoryMap::with_capacity_and_hasher(capacity, Default::default())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory::FnFactory;

	#[test]
	fn put_returns_previous_and_overwrites() {
		let store = FactoryStore::new();
		let first = FnFactory::shared(|| 1u8);
		let second = FnFactory::shared(|| 2u8);

		assert!(store.put("k", Some(Arc::clone(&first))).is_none());
		let previous = store.put("k", Some(Arc::clone(&second))).expect("previous");
		assert!(Arc::ptr_eq(&previous, &first));
		assert!(Arc::ptr_eq(&store.lookup("k").expect("current"), &second));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn insert_if_absent_keeps_existing_entry() {
		let store = FactoryStore::new();
		let first = FnFactory::shared(|| 1u8);
		let kept = store.insert_if_absent("k", Arc::clone(&first));
		assert!(Arc::ptr_eq(&kept, &first));

		let kept = store.insert_if_absent("k", FnFactory::shared(|| 2u8));
		assert!(Arc::ptr_eq(&kept, &first));
		assert!(Arc::ptr_eq(&store.lookup("k").expect("current"), &first));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn put_none_removes() {
		let store = FactoryStore::new();
		let factory = FnFactory::shared(|| ());
		store.put("k", Some(Arc::clone(&factory)));

		let removed = store.put("k", None).expect("removed");
		assert!(Arc::ptr_eq(&removed, &factory));
		assert!(store.lookup("k").is_none());
		assert!(store.remove("k").is_none());
		assert!(store.is_empty());
	}

	#[test]
	fn clear_empties_every_key() {
		let store = FactoryStore::with_capacity(4);
		store.put("b", Some(FnFactory::shared(|| ())));
		store.put("a", Some(FnFactory::shared(|| ())));
		assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

		store.clear();
		assert!(store.is_empty());
		assert!(!store.contains("a"));
	}

	#[test]
	fn readers_keep_their_factory_across_overwrite() {
		let store = FactoryStore::new();
		store.put("k", Some(FnFactory::shared(|| 1u32)));
		let held = store.lookup("k").expect("held");
		store.put("k", Some(FnFactory::shared(|| 2u32)));

		assert_eq!(*held.create().downcast::<u32>().expect("u32"), 1);
	}

	#[test]
	fn concurrent_writers_do_not_lose_updates() {
		let store = Arc::new(FactoryStore::new());
		let handles: Vec<_> = (0..8)
			.map(|t| {
				let store = Arc::clone(&store);
				std::thread::spawn(move || {
					for i in 0..32 {
						store.put(&format!("{t}-{i}"), Some(FnFactory::shared(|| ())));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().expect("writer thread");
		}
		assert_eq!(store.len(), 8 * 32);
	}
}
