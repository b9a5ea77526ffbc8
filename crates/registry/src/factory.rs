//! Factory capability objects.
//!
//! A [`Factory`] produces a new, dynamically typed [`Instance`] on every call
//! to [`Factory::create`]. The registry stores factories type-erased as
//! `Arc<dyn Factory>`; [`TypedFactory`] is the typed view handed out by the
//! `*_of::<T>()` accessors.

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{FactoryError, Result};

/// A value produced by a factory.
pub type Instance = Box<dyn Any + Send>;

/// Shared handle to a type-erased factory.
pub type FactoryRef = Arc<dyn Factory>;

/// Produces new instances of some associated type.
pub trait Factory: Send + Sync + 'static {
	/// Creates a new instance.
	fn create(&self) -> Instance;

	/// Diagnostic name of this factory, if it has one.
	fn name(&self) -> Option<&str> {
		None
	}
}

impl fmt::Debug for dyn Factory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory").field("name", &self.name()).finish_non_exhaustive()
	}
}

/// Adapts a closure into a [`Factory`].
pub struct FnFactory<F, T> {
	f: F,
	_marker: PhantomData<fn() -> T>,
}

impl<F, T> FnFactory<F, T>
where
	F: Fn() -> T + Send + Sync + 'static,
	T: Send + 'static,
{
	pub fn new(f: F) -> Self {
		Self { f, _marker: PhantomData }
	}

	/// Wraps the closure and erases it into a shareable [`FactoryRef`].
	pub fn shared(f: F) -> FactoryRef {
		Arc::new(Self::new(f))
	}
}

impl<F, T> Factory for FnFactory<F, T>
where
	F: Fn() -> T + Send + Sync + 'static,
	T: Send + 'static,
{
	fn create(&self) -> Instance {
		Box::new((self.f)())
	}
}

/// Typed view over a type-erased factory.
///
/// Wrapping is unchecked: the registry does not know what a factory produces
/// until it runs. [`TypedFactory::create`] checks the produced value and
/// reports [`FactoryError::TypeMismatch`] when it is not a `T`.
pub struct TypedFactory<T> {
	key: Box<str>,
	inner: FactoryRef,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> TypedFactory<T> {
	/// Builds a typed factory from a closure, keyed by `T`'s canonical name.
	pub fn from_fn<F>(f: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
	{
		Self::wrap(FnFactory::shared(f))
	}
}

impl<T: 'static> TypedFactory<T> {
	/// Wraps an erased factory as a producer of `T` without checking.
	pub fn wrap(inner: FactoryRef) -> Self {
		Self::wrap_keyed(type_name::<T>(), inner)
	}

	pub(crate) fn wrap_keyed(key: &str, inner: FactoryRef) -> Self {
		Self {
			key: key.into(),
			inner,
			_marker: PhantomData,
		}
	}

	/// Creates a new `T`.
	pub fn create(&self) -> Result<T> {
		downcast_instance(&self.key, self.inner.create())
	}

	/// The key this factory was fetched under.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// The underlying erased factory.
	pub fn as_erased(&self) -> &FactoryRef {
		&self.inner
	}

	pub fn into_erased(self) -> FactoryRef {
		self.inner
	}

	/// Returns true if both handles point at the same factory object.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<T> Clone for TypedFactory<T> {
	fn clone(&self) -> Self {
		Self {
			key: self.key.clone(),
			inner: Arc::clone(&self.inner),
			_marker: PhantomData,
		}
	}
}

impl<T> fmt::Debug for TypedFactory<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypedFactory")
			.field("key", &self.key)
			.field("expected", &type_name::<T>())
			.field("inner", &self.inner)
			.finish()
	}
}

pub(crate) fn downcast_instance<T: 'static>(key: &str, instance: Instance) -> Result<T> {
	instance.downcast::<T>().map(|boxed| *boxed).map_err(|_| FactoryError::TypeMismatch {
		key: key.to_owned(),
		expected: type_name::<T>(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, PartialEq)]
	struct Gadget(u32);

	#[test]
	fn fn_factory_produces_fresh_values() {
		let factory = FnFactory::shared(|| Gadget(7));
		let a = factory.create().downcast::<Gadget>().expect("gadget");
		let b = factory.create().downcast::<Gadget>().expect("gadget");
		assert_eq!(*a, Gadget(7));
		assert_eq!(*b, Gadget(7));
		assert!(factory.name().is_none());
	}

	#[test]
	fn typed_factory_checks_the_produced_type() {
		let typed = TypedFactory::<Gadget>::from_fn(|| Gadget(1));
		assert_eq!(typed.create().expect("gadget"), Gadget(1));
		assert_eq!(typed.key(), type_name::<Gadget>());

		let wrong = TypedFactory::<Gadget>::wrap(FnFactory::shared(|| String::from("nope")));
		match wrong.create() {
			Err(FactoryError::TypeMismatch { key, expected }) => {
				assert_eq!(key, type_name::<Gadget>());
				assert_eq!(expected, type_name::<Gadget>());
			}
			other => panic!("expected TypeMismatch, got {other:?}"),
		}
	}

	#[test]
	fn typed_clones_share_the_erased_factory() {
		let typed = TypedFactory::<Gadget>::from_fn(|| Gadget(2));
		let clone = typed.clone();
		assert!(typed.ptr_eq(&clone));
		assert!(Arc::ptr_eq(typed.as_erased(), &clone.into_erased()));
	}
}
