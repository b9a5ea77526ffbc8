//! Key gate and type resolution.

use crate::catalog::{TypeCatalog, TypeInfo};

/// Cheap test for whether `key` could be a canonical type name.
///
/// The key must be non-empty and start with an ASCII letter (`a..=z` or
/// `A..=Z`, both bounds inclusive). Keys that fail are plain cache keys and
/// are never resolved.
#[inline]
pub fn looks_like_type_name(key: &str) -> bool {
	key.as_bytes().first().is_some_and(u8::is_ascii_alphabetic)
}

/// Resolves `key` to a declared type, or `None` if it is not one.
pub fn resolve_type(catalog: &dyn TypeCatalog, key: &str) -> Option<TypeInfo> {
	if !looks_like_type_name(key) {
		tracing::trace!(key, "factory.gate_rejected");
		return None;
	}
	resolve_declared(catalog, key)
}

/// Resolves a key known to be a canonical type name, skipping the gate.
///
/// Names of tuples, arrays, slices and references start with punctuation
/// and only reach the catalog this way.
pub fn resolve_declared(catalog: &dyn TypeCatalog, key: &str) -> Option<TypeInfo> {
	let resolved = catalog.resolve(key);
	if resolved.is_none() {
		tracing::trace!(key, "factory.resolve_miss");
	}
	resolved
}
