//! Type catalogs: the name → type lookup the registry resolves keys against.
//!
//! Rust cannot load types by name at runtime, so constructible types are
//! declared ahead of time. [`declare_type!`](crate::declare_type) submits a
//! [`TypeDecl`] via `inventory`; at first use [`LinkedCatalog`] collects every
//! declaration linked into the binary and indexes them by canonical name.
//! [`StaticCatalog`] is the explicit alternative for isolated registries.
//!
//! Canonical names are [`std::any::type_name`] strings, the same keys the
//! typed registry accessors derive.

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::factory::Instance;

/// Default constructor of a declared type.
pub type DefaultCtor = fn() -> Instance;

/// A resolved type: its canonical name, identity, and default constructor.
#[derive(Clone, Copy)]
pub struct TypeInfo {
	name: &'static str,
	type_id: TypeId,
	ctor: Option<DefaultCtor>,
}

impl TypeInfo {
	/// Describes `T`, constructible through [`Default`].
	pub fn of<T: Default + Send + 'static>() -> Self {
		TypeDecl::with_default::<T>().info()
	}

	/// Describes `T` as a type without a default constructor.
	pub fn without_default<T: 'static>() -> Self {
		TypeDecl::without_default::<T>().info()
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub fn default_ctor(&self) -> Option<DefaultCtor> {
		self.ctor
	}

	/// Returns true if this entry describes `T`.
	pub fn is<T: 'static>(&self) -> bool {
		self.type_id == TypeId::of::<T>()
	}

	/// Same type under another name.
	#[cfg(test)]
	pub(crate) fn renamed(self, name: &'static str) -> Self {
		Self { name, ..self }
	}
}

impl fmt::Debug for TypeInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeInfo")
			.field("name", &self.name)
			.field("default_ctor", &self.ctor.is_some())
			.finish()
	}
}

/// Static declaration of a constructible type, collected via `inventory`.
///
/// Fields are function pointers so a declaration can be built in a `static`.
pub struct TypeDecl {
	name: fn() -> &'static str,
	type_id: fn() -> TypeId,
	ctor: Option<DefaultCtor>,
}

impl TypeDecl {
	pub const fn with_default<T: Default + Send + 'static>() -> Self {
		Self {
			name: type_name::<T> as fn() -> &'static str,
			type_id: TypeId::of::<T> as fn() -> TypeId,
			ctor: Some(default_instance::<T> as DefaultCtor),
		}
	}

	pub const fn without_default<T: 'static>() -> Self {
		Self {
			name: type_name::<T> as fn() -> &'static str,
			type_id: TypeId::of::<T> as fn() -> TypeId,
			ctor: None,
		}
	}

	pub fn info(&self) -> TypeInfo {
		TypeInfo {
			name: (self.name)(),
			type_id: (self.type_id)(),
			ctor: self.ctor,
		}
	}
}

inventory::collect!(TypeDecl);

fn default_instance<T: Default + Send + 'static>() -> Instance {
	Box::new(T::default())
}

/// Declares a type so registries using [`LinkedCatalog`] can resolve it by name.
///
/// ```ignore
/// #[derive(Default)]
/// pub struct Widget;
/// factotum_registry::declare_type!(Widget);
///
/// pub struct Handle(u64);
/// factotum_registry::declare_type!(Handle, no_default);
/// ```
#[macro_export]
macro_rules! declare_type {
	($ty:ty) => {
		$crate::inventory::submit! { $crate::TypeDecl::with_default::<$ty>() }
	};
	($ty:ty, no_default) => {
		$crate::inventory::submit! { $crate::TypeDecl::without_default::<$ty>() }
	};
}

/// Name-based type lookup used by the registry's resolver.
pub trait TypeCatalog: Send + Sync {
	/// Resolves a canonical type name. `None` means the name is unknown.
	fn resolve(&self, name: &str) -> Option<TypeInfo>;
}

/// Catalog of every [`declare_type!`](crate::declare_type) in the linked binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedCatalog;

static LINKED_TYPES: LazyLock<FxHashMap<&'static str, TypeInfo>> = LazyLock::new(|| {
	let mut map: FxHashMap<&'static str, TypeInfo> = FxHashMap::default();
	for decl in inventory::iter::<TypeDecl> {
		let info = decl.info();
		if let Some(existing) = map.get(info.name) {
			// First declaration wins.
			let same_type = existing.type_id == info.type_id;
			tracing::warn!(type_name = info.name, same_type, "catalog.duplicate_type");
			continue;
		}
		map.insert(info.name, info);
	}
	tracing::debug!(count = map.len(), "catalog.linked");
	map
});

impl LinkedCatalog {
	/// Number of distinct declared types.
	pub fn len(&self) -> usize {
		LINKED_TYPES.len()
	}

	pub fn is_empty(&self) -> bool {
		LINKED_TYPES.is_empty()
	}
}

impl TypeCatalog for LinkedCatalog {
	fn resolve(&self, name: &str) -> Option<TypeInfo> {
		LINKED_TYPES.get(name).copied()
	}
}

/// Explicitly populated catalog.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
	types: FxHashMap<&'static str, TypeInfo>,
}

impl StaticCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `T`, constructible through [`Default`].
	#[must_use]
	pub fn with<T: Default + Send + 'static>(mut self) -> Self {
		self.insert(TypeInfo::of::<T>());
		self
	}

	/// Adds `T` without a default constructor.
	#[must_use]
	pub fn without_default<T: 'static>(mut self) -> Self {
		self.insert(TypeInfo::without_default::<T>());
		self
	}

	/// Inserts an entry, replacing any entry with the same name.
	pub fn insert(&mut self, info: TypeInfo) -> Option<TypeInfo> {
		self.types.insert(info.name, info)
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

impl TypeCatalog for StaticCatalog {
	fn resolve(&self, name: &str) -> Option<TypeInfo> {
		self.types.get(name).copied()
	}
}
