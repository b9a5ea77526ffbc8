//! Concurrency invariants of the get-or-create path.
#![allow(dead_code)]

use std::any::type_name;
use std::sync::{Arc, Barrier};
use std::thread;

use crate::catalog::StaticCatalog;
use crate::config::RegistryConfig;
use crate::factory::{FactoryRef, FnFactory};
use crate::registry::FactoryRegistry;

const THREADS: usize = 16;

#[derive(Debug, Default, PartialEq)]
struct Contended {
	id: u64,
}

#[derive(Debug, Default)]
struct Other;

fn shared_registry() -> Arc<FactoryRegistry> {
	let catalog = StaticCatalog::new().with::<Contended>().with::<Other>();
	Arc::new(FactoryRegistry::with_catalog(RegistryConfig::default(), Arc::new(catalog)))
}

/// Runs `f` on [`THREADS`] threads released together and collects results.
fn race<R, F>(registry: &Arc<FactoryRegistry>, f: F) -> Vec<R>
where
	R: Send + 'static,
	F: Fn(&FactoryRegistry) -> R + Send + Sync + 'static,
{
	let barrier = Arc::new(Barrier::new(THREADS));
	let f = Arc::new(f);
	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let registry = Arc::clone(registry);
			let barrier = Arc::clone(&barrier);
			let f = Arc::clone(&f);
			thread::spawn(move || {
				barrier.wait();
				f(&registry)
			})
		})
		.collect();
	handles.into_iter().map(|h| h.join().expect("racing thread panicked")).collect()
}

/// Invariant: concurrent misses for one key MUST observe exactly one synthesis.
pub(crate) fn inv_single_synthesis_under_contention() {
	let registry = shared_registry();
	let instances = race(&registry, |registry| registry.new_instance_of::<Contended>());

	assert_eq!(instances.len(), THREADS);
	for instance in instances {
		assert_eq!(instance.expect("lookup"), Some(Contended::default()));
	}
	assert_eq!(registry.synthesis_count(), 1, "exactly one synthesis for one key");
	assert_eq!(registry.len(), 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_single_synthesis_under_contention() {
	inv_single_synthesis_under_contention()
}

/// Invariant: every racer MUST receive the same cached factory.
pub(crate) fn inv_cached_identity_is_stable() {
	let registry = shared_registry();
	let key = type_name::<Contended>();
	let factories: Vec<FactoryRef> = race(&registry, move |registry| {
		registry.get_factory(key).expect("lookup").expect("synthesized")
	});

	let first = &factories[0];
	assert!(factories.iter().all(|f| Arc::ptr_eq(f, first)));
	let later = registry.get_factory(key).expect("lookup").expect("cached");
	assert!(Arc::ptr_eq(&later, first));
}

#[cfg_attr(test, test)]
pub(crate) fn test_cached_identity_is_stable() {
	inv_cached_identity_is_stable()
}

/// Invariant: misses for distinct keys MUST each synthesize once.
pub(crate) fn inv_distinct_keys_synthesize_independently() {
	let registry = shared_registry();
	race(&registry, |registry| {
		assert!(registry.get_factory_of::<Contended>().expect("lookup").is_some());
		assert!(registry.get_factory_of::<Other>().expect("lookup").is_some());
	});
	assert_eq!(registry.synthesis_count(), 2);
	assert_eq!(registry.keys().len(), 2);
}

#[cfg_attr(test, test)]
pub(crate) fn test_distinct_keys_synthesize_independently() {
	inv_distinct_keys_synthesize_independently()
}

/// Invariant: disabling the policy MUST NOT evict or disable cached factories.
pub(crate) fn inv_policy_does_not_evict() {
	let registry = shared_registry();
	let cached = registry.get_factory_of::<Contended>().expect("lookup").expect("synthesized");

	registry.set_auto_generate(false);
	let results = race(&registry, |registry| {
		let contended = registry.get_factory_of::<Contended>().expect("lookup");
		let other = registry.get_factory_of::<Other>().expect("lookup");
		(contended, other.is_some())
	});
	for (contended, other_found) in results {
		assert!(contended.expect("still cached").ptr_eq(&cached));
		assert!(!other_found, "no synthesis while disabled");
	}

	registry.set_factory("explicit", Some(FnFactory::shared(|| 1u8)));
	assert!(registry.get_factory("explicit").expect("lookup").is_some());
	assert_eq!(registry.synthesis_count(), 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_policy_does_not_evict() {
	inv_policy_does_not_evict()
}

/// Invariant: registrations racing with lookups MUST leave one entry per key.
pub(crate) fn inv_registration_race_keeps_one_entry() {
	let registry = shared_registry();
	let key = type_name::<Contended>();
	race(&registry, move |registry| {
		registry.set_factory(key, Some(FnFactory::shared(|| Contended { id: 7 })));
		let factory = registry.get_factory(key).expect("lookup").expect("present");
		let value = factory.create().downcast::<Contended>().expect("contended");
		assert_eq!(value.id, 7, "a registered key never falls back to synthesis");
	});
	assert_eq!(registry.len(), 1);
	assert_eq!(registry.synthesis_count(), 0);
}

#[cfg_attr(test, test)]
pub(crate) fn test_registration_race_keeps_one_entry() {
	inv_registration_race_keeps_one_entry()
}
