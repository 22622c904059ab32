use pretty_assertions::assert_eq;

use super::*;
use crate::{ValueKind, args};

fn decode_args(args_json: &str) -> Result<Vec<Value>, WireError> {
	decode(&format!(r#"{{"MethodName":"Sample","Args":{args_json},"Enqueued":0,"Executed":0}}"#)).map(|e| e.args)
}

#[test]
fn encodes_readable_record() {
	let envelope = CallEnvelope::new("Multiply", args![1.1, 2.5]).enqueued(1_700_000_000);
	let payload = encode(&envelope).unwrap();
	assert_eq!(payload, r#"{"MethodName":"Multiply","Args":[1.1,2.5],"Enqueued":1700000000,"Executed":0}"#);
}

#[test]
fn decode_restores_envelope_and_timestamps_verbatim() {
	let envelope = CallEnvelope::new("Concat", args!["hello, ", "world", true, -4_i64, 2.0])
		.enqueued(1_700_000_000)
		.executed(1_700_000_009);
	let decoded = decode(&encode(&envelope).unwrap()).unwrap();
	assert_eq!(decoded, envelope);
}

#[test]
fn integer_literal_reconciles_to_int() {
	assert_eq!(decode_args("[10]").unwrap(), vec![Value::Int(10)]);
	assert_eq!(decode_args("[-3]").unwrap(), vec![Value::Int(-3)]);
}

#[test]
fn fractional_or_exponent_literal_reconciles_to_float() {
	assert_eq!(decode_args("[10.5]").unwrap(), vec![Value::Float(10.5)]);
	assert_eq!(decode_args("[10.0]").unwrap(), vec![Value::Float(10.0)]);
	assert_eq!(decode_args("[1e3]").unwrap(), vec![Value::Float(1000.0)]);
}

#[test]
fn whole_floats_keep_their_kind_across_the_wire() {
	let envelope = CallEnvelope::new("Multiply", args![2.0, 3.0]);
	let decoded = decode(&encode(&envelope).unwrap()).unwrap();
	assert!(decoded.args.iter().all(|a| a.kind() == ValueKind::Float));
}

#[test]
fn strings_and_booleans_pass_through() {
	assert_eq!(
		decode_args(r#"["10", false]"#).unwrap(),
		vec![Value::String("10".into()), Value::Bool(false)]
	);
}

#[test]
fn zero_timestamps_mean_unset() {
	let decoded = decode(r#"{"MethodName":"Explode","Args":[],"Enqueued":0,"Executed":0}"#).unwrap();
	assert_eq!(decoded.enqueued_at, None);
	assert_eq!(decoded.executed_at, None);

	let legacy = decode(r#"{"MethodName":"Explode","Args":[]}"#).unwrap();
	assert_eq!(legacy, CallEnvelope::new("Explode", Vec::new()));
}

#[test]
fn rejects_non_scalar_arguments() {
	assert!(matches!(decode_args("[null]"), Err(WireError::Malformed(_))));
	assert!(matches!(decode_args("[[1, 2]]"), Err(WireError::Malformed(_))));
	assert!(matches!(decode_args(r#"[{"re": 1}]"#), Err(WireError::Malformed(_))));
}

#[test]
fn rejects_integers_outside_i64() {
	assert!(matches!(decode_args("[18446744073709551615]"), Err(WireError::IntegerOutOfRange { index: 0 })));
	assert!(matches!(decode_args("[9223372036854775808]"), Err(WireError::IntegerOutOfRange { index: 0 })));
	assert!(matches!(decode_args("[1, -9223372036854775809]"), Err(WireError::IntegerOutOfRange { index: 1 })));
	assert_eq!(
		decode_args("[-9223372036854775808, 9223372036854775807]").unwrap(),
		vec![Value::Int(i64::MIN), Value::Int(i64::MAX)]
	);
	assert_eq!(decode_args("[-1e3, -0.5]").unwrap(), vec![Value::Float(-1000.0), Value::Float(-0.5)]);
}

#[test]
fn floats_survive_the_wire_bit_for_bit() {
	let mut samples = vec![251.127_488_257_369_98, 0.1, 1.1, 2.5, f64::MIN_POSITIVE, f64::MAX, -f64::MAX, 5e-324, -0.0];

	// Fixed-seed xorshift over raw bit patterns, keeping finite values.
	let mut state = 0x9e37_79b9_7f4a_7c15_u64;
	while samples.len() < 20_000 {
		state ^= state << 13;
		state ^= state >> 7;
		state ^= state << 17;
		let bits = f64::from_bits(state);
		if bits.is_finite() {
			samples.push(bits);
		}
		samples.push((state >> 11) as f64 / (1_u64 << 53) as f64 * 1000.0);
	}

	for chunk in samples.chunks(32) {
		let envelope = CallEnvelope::new("Sample", chunk.iter().copied().map(Value::Float).collect());
		let decoded = decode(&encode(&envelope).unwrap()).unwrap();
		for (sent, got) in chunk.iter().zip(&decoded.args) {
			let got = got.as_float().expect("float stays float");
			assert_eq!(sent.to_bits(), got.to_bits(), "{sent:?} came back as {got:?}");
		}
	}
}

#[test]
fn rejects_missing_fields_and_garbage() {
	assert!(matches!(decode(r#"{"Args":[]}"#), Err(WireError::Malformed(_))));
	assert!(matches!(decode(r#"{"MethodName":"Explode"}"#), Err(WireError::Malformed(_))));
	assert!(matches!(decode("not json"), Err(WireError::Malformed(_))));
	assert!(matches!(decode(r#"{"MethodName":"","Args":[]}"#), Err(WireError::EmptyMethodName)));
}

#[test]
fn encode_refuses_non_finite_floats() {
	let envelope = CallEnvelope::new("Multiply", args![1.0, f64::NAN]);
	assert!(matches!(encode(&envelope), Err(WireError::NonFiniteFloat { index: 1 })));
}

#[test]
fn limits_apply_on_both_sides() {
	let limits = DecodeLimits {
		max_payload_len: 256,
		max_args: 2,
		max_string_len: 8,
	};

	let too_many = CallEnvelope::new("Sum", args![1_i64, 2_i64, 3_i64]);
	assert!(matches!(encode_with_limits(&too_many, &limits), Err(WireError::TooManyArgs { limit: 2 })));

	let long_arg = r#"{"MethodName":"Concat","Args":["short","far too long"]}"#;
	match decode_with_limits(long_arg, &limits) {
		Err(WireError::StringTooLong { field, limit }) => {
			assert_eq!(field, "Args[1]");
			assert_eq!(limit, 8);
		}
		other => panic!("expected StringTooLong, got {other:?}"),
	}

	let oversized = format!(r#"{{"MethodName":"Concat","Args":["{}"]}}"#, "x".repeat(300));
	assert!(matches!(decode_with_limits(&oversized, &limits), Err(WireError::PayloadTooLarge { limit: 256 })));
}
