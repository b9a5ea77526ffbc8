//! Concurrent factory registry.
//!
//! A [`FactoryRegistry`] maps string keys, conventionally canonical type
//! names, to [`Factory`] objects that produce new instances. When a lookup
//! misses and auto-generate is enabled, the registry resolves the key through
//! its [`TypeCatalog`] and synthesizes a factory around the type's default
//! constructor, caching it so every later lookup returns the same factory.
//!
//! # Mental Model
//!
//! 1. **Declare:** types opt in to synthesis with [`declare_type!`], which
//!    registers them with the linked [`LinkedCatalog`] at startup.
//! 2. **Register:** callers may install explicit factories with
//!    [`FactoryRegistry::set_factory`]; these always win.
//! 3. **Lookup:** [`FactoryRegistry::get_factory`] returns the cached factory
//!    without locking, or synthesizes one on first use.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`FactoryRegistry`] | Get-or-create coordinator and public API. |
//! | [`FactoryStore`] | Lock-free-read key → factory map. |
//! | [`TypeCatalog`] | Name → type resolution ([`LinkedCatalog`], [`StaticCatalog`]). |
//! | [`Synthesizer`] | Builds fresh [`RuntimeFactory`] values. |
//! | [`TypedFactory`] | Typed view that reports type mismatches on use. |
//!
//! # Example
//!
//! ```ignore
//! use factotum_registry::{FactoryRegistry, declare_type};
//!
//! #[derive(Default)]
//! struct Widget;
//! declare_type!(Widget);
//!
//! let registry = FactoryRegistry::new();
//! let widget: Option<Widget> = registry.new_instance_of::<Widget>()?;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod factory;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod synth;

#[cfg(any(test, doc))]
pub(crate) mod invariants;

pub use catalog::{DefaultCtor, LinkedCatalog, StaticCatalog, TypeCatalog, TypeDecl, TypeInfo};
pub use config::{ConfigError, RegistryConfig};
pub use error::{ConstructionCause, FactoryError, Result};
pub use factory::{Factory, FactoryRef, FnFactory, Instance, TypedFactory};
#[doc(hidden)]
pub use inventory;
pub use registry::FactoryRegistry;
pub use resolve::{looks_like_type_name, resolve_declared, resolve_type};
pub use store::FactoryStore;
pub use synth::{RuntimeFactory, Synthesizer, runtime_factory_serial};
