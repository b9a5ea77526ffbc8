//! Error types for factory lookup and synthesis.
//!
//! Resolution failures (a key that does not name a declared type) are not
//! errors: they surface as `None` from every lookup. Only the two conditions
//! below reach callers.

/// Result alias used throughout the crate.
pub type Result<T, E = FactoryError> = std::result::Result<T, E>;

/// Errors raised by [`crate::FactoryRegistry`] operations.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
	/// A type was resolved but no factory could be built for it.
	#[error("error creating runtime factory for type `{type_name}`")]
	Construction {
		type_name: String,
		#[source]
		source: ConstructionCause,
	},

	/// A factory produced a value of a different type than the caller expected.
	#[error("factory registered under `{key}` did not produce a `{expected}`")]
	TypeMismatch { key: String, expected: &'static str },
}

impl FactoryError {
	pub(crate) fn construction(type_name: impl Into<String>, source: ConstructionCause) -> Self {
		Self::Construction {
			type_name: type_name.into(),
			source,
		}
	}

	/// Returns the underlying cause if this is a construction failure.
	pub fn construction_cause(&self) -> Option<&ConstructionCause> {
		match self {
			Self::Construction { source, .. } => Some(source),
			Self::TypeMismatch { .. } => None,
		}
	}
}

/// Why a runtime factory could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionCause {
	/// The type was declared without a default constructor.
	#[error("type has no default constructor")]
	MissingDefaultConstructor,

	/// The type catalog has no declaration for the requested type.
	#[error("type is not declared in the type catalog")]
	NotDeclared,

	/// The catalog entry carrying the type's name describes a different type.
	#[error("catalog entry with this name describes a different type")]
	TypeIdMismatch,
}
