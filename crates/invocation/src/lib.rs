//! Canonical types for deferred method calls.
//!
//! Producers build a [`CallEnvelope`] naming a method and its positional
//! [`Value`] arguments. The envelope travels through the broker in the JSON
//! form produced by [`wire::encode`] and is restored by [`wire::decode`], which
//! reconciles untyped numeric literals back into [`Value::Int`] or
//! [`Value::Float`].

mod envelope;
mod value;
pub mod wire;

pub use envelope::CallEnvelope;
pub use value::{Value, ValueKind};
pub use wire::{DEFAULT_LIMITS, DecodeLimits, WireError};

/// Builds a `Vec<Value>` from scalar expressions.
///
/// ```
/// use crush_invocation::{Value, args};
///
/// let args = args![1.5, "two", true, 3_i64];
/// assert_eq!(args[1], Value::String("two".into()));
/// ```
#[macro_export]
macro_rules! args {
	() => {
		::std::vec::Vec::<$crate::Value>::new()
	};
	($($arg:expr),+ $(,)?) => {
		::std::vec![$($crate::Value::from($arg)),+]
	};
}
