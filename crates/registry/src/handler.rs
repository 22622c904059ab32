use crush_invocation::{Value, ValueKind};
use thiserror::Error;

/// Error returned by a handler, or attached to a handler panic.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Decoding failure while binding arguments to handler parameters.
///
/// Validation normally rejects these calls before a handler is reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
	/// Argument count differs from the handler's parameter count.
	#[error("expected {expected} arguments, got {got}")]
	Count { expected: usize, got: usize },
	/// Argument kind differs from the parameter kind.
	#[error("argument {index}: expected {expected}, got {got}")]
	Kind { index: usize, expected: ValueKind, got: ValueKind },
}

/// A Rust type that can be bound from exactly one [`ValueKind`].
pub trait FromValue: Sized {
	/// Declared parameter kind.
	const KIND: ValueKind;

	/// Extracts the value, or `None` if the kind differs.
	fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
	const KIND: ValueKind = ValueKind::String;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_str().map(str::to_owned)
	}
}

impl FromValue for bool {
	const KIND: ValueKind = ValueKind::Bool;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_bool()
	}
}

impl FromValue for i64 {
	const KIND: ValueKind = ValueKind::Int;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_int()
	}
}

impl FromValue for f64 {
	const KIND: ValueKind = ValueKind::Float;

	fn from_value(value: &Value) -> Option<Self> {
		value.as_float()
	}
}

/// Converts a handler's return value into the dispatcher's outcome.
///
/// Successful values are discarded.
pub trait IntoHandlerResult {
	fn into_handler_result(self) -> Result<(), HandlerError>;
}

impl IntoHandlerResult for () {
	fn into_handler_result(self) -> Result<(), HandlerError> {
		Ok(())
	}
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
	E: Into<HandlerError>,
{
	fn into_handler_result(self) -> Result<(), HandlerError> {
		self.map(drop).map_err(Into::into)
	}
}

/// A function callable with positional [`Value`] arguments.
///
/// Implemented for `Fn` closures of up to eight [`FromValue`] parameters
/// returning `()` or `Result<T, E>`. `Args` is the parameter tuple and only
/// serves to keep the implementations apart.
pub trait Handler<Args>: Send + Sync + 'static {
	/// Declared parameter kinds, in order.
	fn param_kinds(&self) -> Vec<ValueKind>;

	/// Binds `args` positionally and calls the handler.
	fn call(&self, args: &[Value]) -> Result<(), HandlerError>;
}

macro_rules! impl_handler {
	($($ty:ident),*) => {
		impl<F, R, $($ty,)*> Handler<($($ty,)*)> for F
		where
			F: Fn($($ty),*) -> R + Send + Sync + 'static,
			R: IntoHandlerResult,
			$($ty: FromValue,)*
		{
			fn param_kinds(&self) -> Vec<ValueKind> {
				vec![$($ty::KIND),*]
			}

			#[allow(non_snake_case, unused_mut, unused_variables)]
			fn call(&self, args: &[Value]) -> Result<(), HandlerError> {
				let expected = self.param_kinds().len();
				let got = args.len();
				if got != expected {
					return Err(ArgumentError::Count { expected, got }.into());
				}
				let mut args = args.iter().enumerate();
				$(
					let $ty = {
						let Some((index, value)) = args.next() else {
							return Err(ArgumentError::Count { expected, got }.into());
						};
						$ty::from_value(value).ok_or(ArgumentError::Kind {
							index,
							expected: $ty::KIND,
							got: value.kind(),
						})?
					};
				)*
				(self)($($ty),*).into_handler_result()
			}
		}
	};
}

impl_handler!();
impl_handler!(A);
impl_handler!(A, B);
impl_handler!(A, B, C);
impl_handler!(A, B, C, D);
impl_handler!(A, B, C, D, E);
impl_handler!(A, B, C, D, E, G);
impl_handler!(A, B, C, D, E, G, H);
impl_handler!(A, B, C, D, E, G, H, I);
