//! Get-or-create coordination over the factory store.
//!
//! # Role
//!
//! [`FactoryRegistry`] is the public entrypoint. Lookups hit the store first
//! and return without locking. A miss with auto-generate enabled enters a
//! single registry-wide synthesis section, re-checks the store, resolves the
//! key through the type catalog, and caches the synthesized factory.
//!
//! # Invariants
//!
//! - At most one cached factory per key; concurrent misses for one key
//!   observe a single synthesis (see `invariants::test_single_synthesis_under_contention`).
//! - Cached factories keep their identity until re-registration or `clear`
//!   (see `invariants::test_cached_identity_is_stable`).
//! - `generate_runtime_factory` never caches.
//! - Disabling auto-generate blocks new synthesis only; cached factories and
//!   explicit registration are unaffected (see `invariants::test_policy_does_not_evict`).
//!
//! # Concurrency
//!
//! Misses for different keys are serialized with respect to each other. The
//! section is never entered on a hit.

use std::any::type_name;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::catalog::{LinkedCatalog, TypeCatalog, TypeInfo};
use crate::config::RegistryConfig;
use crate::error::{ConstructionCause, FactoryError, Result};
use crate::factory::{FactoryRef, Instance, TypedFactory, downcast_instance};
use crate::resolve::{resolve_declared, resolve_type};
use crate::store::FactoryStore;
use crate::synth::Synthesizer;


static GLOBAL: LazyLock<FactoryRegistry> = LazyLock::new(FactoryRegistry::new);

/// Thread-safe cache of factories keyed by string.
pub struct FactoryRegistry {
	store: FactoryStore,
	catalog: Arc<dyn TypeCatalog>,
	synthesizer: Synthesizer,
	synthesis: Mutex<()>,
	auto_generate: AtomicBool,
}

impl FactoryRegistry {
	/// Creates a registry over [`LinkedCatalog`] with default settings.
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	/// Creates a registry over [`LinkedCatalog`] with `config`.
	pub fn with_config(config: RegistryConfig) -> Self {
		Self::with_catalog(config, Arc::new(LinkedCatalog))
	}

	/// Creates a registry resolving keys against `catalog`.
	pub fn with_catalog(config: RegistryConfig, catalog: Arc<dyn TypeCatalog>) -> Self {
		Self {
			store: FactoryStore::with_capacity(config.initial_capacity),
			catalog,
			synthesizer: Synthesizer::new(),
			synthesis: Mutex::new(()),
			auto_generate: AtomicBool::new(config.auto_generate),
		}
	}

	/// The process-wide default registry.
	pub fn global() -> &'static FactoryRegistry {
		&GLOBAL
	}

	/// Returns whether missing factories may be synthesized.
	pub fn auto_generate(&self) -> bool {
		self.auto_generate.load(Ordering::Acquire)
	}

	/// Enables or disables synthesis of missing factories.
	///
	/// Only future misses are affected.
	pub fn set_auto_generate(&self, auto_generate: bool) {
		self.auto_generate.store(auto_generate, Ordering::Release);
		tracing::debug!(auto_generate, "factory.policy");
	}

	/// Returns the factory for `key`, synthesizing and caching one if allowed.
	///
	/// `Ok(None)` means no factory is registered and none could be
	/// synthesized: auto-generate is off, the key does not look like a type
	/// name, or the catalog does not know it.
	pub fn get_factory(&self, key: &str) -> Result<Option<FactoryRef>> {
		self.get_or_create(key, true)
	}

	/// Typed [`get_factory`](Self::get_factory) keyed by `T`'s canonical name.
	///
	/// The key is `T`'s own name, so it bypasses the type-name gate and goes
	/// straight to the catalog. The stored factory is not checked against
	/// `T`; a mismatch surfaces from [`TypedFactory::create`].
	pub fn get_factory_of<T: 'static>(&self) -> Result<Option<TypedFactory<T>>> {
		let key = type_name::<T>();
		Ok(self.get_or_create(key, false)?.map(|factory| TypedFactory::wrap_keyed(key, factory)))
	}

	/// Double-checked get-or-create. `gated` applies [`resolve_type`]'s key
	/// gate before consulting the catalog.
	fn get_or_create(&self, key: &str, gated: bool) -> Result<Option<FactoryRef>> {
		if let Some(factory) = self.store.lookup(key) {
			return Ok(Some(factory));
		}
		if !self.auto_generate() {
			return Ok(None);
		}

		let _section = self.synthesis.lock();
		if let Some(factory) = self.store.lookup(key) {
			return Ok(Some(factory));
		}
		let catalog = self.catalog.as_ref();
		let resolved = if gated {
			resolve_type(catalog, key)
		} else {
			resolve_declared(catalog, key)
		};
		let Some(ty) = resolved else {
			return Ok(None);
		};
		let factory = self.synthesizer.synthesize(&ty)?;
		Ok(Some(self.store.insert_if_absent(key, factory)))
	}

	/// Returns the stored factory for `key` without synthesizing.
	pub fn peek_factory(&self, key: &str) -> Option<FactoryRef> {
		self.store.lookup(key)
	}

	/// Typed [`peek_factory`](Self::peek_factory).
	pub fn peek_factory_of<T: 'static>(&self) -> Option<TypedFactory<T>> {
		let key = type_name::<T>();
		self.peek_factory(key).map(|factory| TypedFactory::wrap_keyed(key, factory))
	}

	/// Creates an instance through the factory for `key`.
	pub fn new_instance(&self, key: &str) -> Result<Option<Instance>> {
		Ok(self.get_factory(key)?.map(|factory| factory.create()))
	}

	/// Creates a `T` through the factory registered under `T`'s name.
	///
	/// Like [`get_factory_of`](Self::get_factory_of), the key skips the gate.
	pub fn new_instance_of<T: 'static>(&self) -> Result<Option<T>> {
		let key = type_name::<T>();
		match self.get_or_create(key, false)? {
			Some(factory) => downcast_instance(key, factory.create()).map(Some),
			None => Ok(None),
		}
	}

	/// Registers `factory` under `key`, returning the previous factory.
	///
	/// `None` removes the entry. Registration ignores the auto-generate flag.
	pub fn set_factory(&self, key: &str, factory: Option<FactoryRef>) -> Option<FactoryRef> {
		tracing::trace!(key, remove = factory.is_none(), "factory.register");
		self.store.put(key, factory)
	}

	/// Typed [`set_factory`](Self::set_factory) keyed by `T`'s canonical name.
	pub fn set_factory_of<T: 'static>(&self, factory: Option<TypedFactory<T>>) -> Option<TypedFactory<T>> {
		let key = type_name::<T>();
		self.set_factory(key, factory.map(TypedFactory::into_erased))
			.map(|previous| TypedFactory::wrap_keyed(key, previous))
	}

	/// Removes the factory for `key`, returning it.
	pub fn remove_factory(&self, key: &str) -> Option<FactoryRef> {
		self.set_factory(key, None)
	}

	/// Builds a fresh factory for `ty`. The result is not cached.
	pub fn generate_runtime_factory(&self, ty: &TypeInfo) -> Result<FactoryRef> {
		let _section = self.synthesis.lock();
		self.synthesizer.synthesize(ty)
	}

	/// Builds a fresh factory for `T`, resolved through the type catalog.
	pub fn generate_runtime_factory_of<T: 'static>(&self) -> Result<TypedFactory<T>> {
		let key = type_name::<T>();
		let ty = self
			.catalog
			.resolve(key)
			.ok_or_else(|| FactoryError::construction(key, ConstructionCause::NotDeclared))?;
		if !ty.is::<T>() {
			return Err(FactoryError::construction(key, ConstructionCause::TypeIdMismatch));
		}
		Ok(TypedFactory::wrap_keyed(key, self.generate_runtime_factory(&ty)?))
	}

	/// Removes every registered and cached factory.
	///
	/// The synthesis serial keeps counting.
	pub fn clear(&self) {
		tracing::debug!(entries = self.store.len(), "factory.clear");
		self.store.clear();
	}

	/// Number of registered and cached factories.
	pub fn len(&self) -> usize {
		self.store.len()
	}

	/// Returns `true` if no factory is stored.
	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	/// Registered keys, sorted.
	pub fn keys(&self) -> Vec<String> {
		self.store.keys()
	}

	/// Number of synthesis calls made by this registry, cached or explicit.
	pub fn synthesis_count(&self) -> u64 {
		self.synthesizer.synthesized()
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for FactoryRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FactoryRegistry")
			.field("store", &self.store)
			.field("auto_generate", &self.auto_generate())
			.field("synthesized", &self.synthesis_count())
			.finish_non_exhaustive()
	}
}
