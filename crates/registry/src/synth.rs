//! Runtime factory synthesis.
//!
//! A synthesized factory wraps a declared type's default constructor. Every
//! synthesis draws a new serial from a process-wide counter, so factory names
//! never repeat, even for the same type and across registry clears.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::{DefaultCtor, TypeInfo};
use crate::error::{ConstructionCause, FactoryError, Result};
use crate::factory::{Factory, FactoryRef, Instance};

static RUNTIME_FACTORY_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Factory produced by synthesis.
pub struct RuntimeFactory {
	name: String,
	type_name: &'static str,
	ctor: DefaultCtor,
}

impl RuntimeFactory {
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}
}

impl Factory for RuntimeFactory {
	fn create(&self) -> Instance {
		(self.ctor)()
	}

	fn name(&self) -> Option<&str> {
		Some(&self.name)
	}
}

/// Builds fresh runtime factories and counts synthesis events.
///
/// Callers are expected to serialize calls; see [`crate::FactoryRegistry`].
#[derive(Debug, Default)]
pub struct Synthesizer {
	synthesized: AtomicU64,
}

impl Synthesizer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a new factory for `ty`. Never caches.
	pub fn synthesize(&self, ty: &TypeInfo) -> Result<FactoryRef> {
		let serial = RUNTIME_FACTORY_SERIAL.fetch_add(1, Ordering::Relaxed) + 1;
		self.synthesized.fetch_add(1, Ordering::Relaxed);

		let Some(ctor) = ty.default_ctor() else {
			tracing::debug!(type_name = ty.name(), serial, "factory.construction_failed");
			return Err(FactoryError::construction(ty.name(), ConstructionCause::MissingDefaultConstructor));
		};

		let name = runtime_factory_name(ty.name(), serial);
		tracing::debug!(type_name = ty.name(), factory = %name, "factory.synthesize");
		Ok(Arc::new(RuntimeFactory {
			name,
			type_name: ty.name(),
			ctor,
		}))
	}

	/// Number of synthesis calls made through this synthesizer.
	pub fn synthesized(&self) -> u64 {
		self.synthesized.load(Ordering::Relaxed)
	}
}

/// Current value of the process-wide synthesis serial.
pub fn runtime_factory_serial() -> u64 {
	RUNTIME_FACTORY_SERIAL.load(Ordering::Relaxed)
}

fn runtime_factory_name(type_name: &str, serial: u64) -> String {
	format!("{type_name}__RuntimeFactory{serial}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Default, PartialEq)]
	struct Widget {
		size: u16,
	}

	struct Sealed;

	#[test]
	fn synthesized_factory_builds_defaults() {
		let synth = Synthesizer::new();
		let factory = synth.synthesize(&TypeInfo::of::<Widget>()).expect("synthesize");
		let widget = factory.create().downcast::<Widget>().expect("widget");
		assert_eq!(*widget, Widget::default());
		assert_eq!(widget.size, 0);
		assert_eq!(synth.synthesized(), 1);
	}

	#[test]
	fn every_synthesis_is_fresh_and_uniquely_named() {
		let synth = Synthesizer::new();
		let info = TypeInfo::of::<Widget>();
		let a = synth.synthesize(&info).expect("first");
		let b = synth.synthesize(&info).expect("second");

		assert!(!Arc::ptr_eq(&a, &b));
		let (a_name, b_name) = (a.name().expect("named"), b.name().expect("named"));
		assert_ne!(a_name, b_name);
		assert!(a_name.starts_with(&format!("{}__RuntimeFactory", info.name())));
		assert_eq!(synth.synthesized(), 2);
	}

	#[test]
	fn missing_default_constructor_is_a_construction_failure() {
		let synth = Synthesizer::new();
		let before = runtime_factory_serial();
		let err = synth.synthesize(&TypeInfo::without_default::<Sealed>()).expect_err("no default ctor");

		match &err {
			FactoryError::Construction { type_name, source } => {
				assert_eq!(type_name, std::any::type_name::<Sealed>());
				assert_eq!(source, &ConstructionCause::MissingDefaultConstructor);
			}
			other => panic!("unexpected error: {other}"),
		}
		assert!(std::error::Error::source(&err).is_some());
		assert!(runtime_factory_serial() > before);
		assert_eq!(synth.synthesized(), 1);
	}

	#[test]
	fn names_embed_the_serial() {
		assert_eq!(runtime_factory_name("app::Widget", 7), "app::Widget__RuntimeFactory7");
	}
}
