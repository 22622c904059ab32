use crush_registry::HandlerError;

use crate::fault::PanicPayload;

#[tokio::test]
async fn extracts_static_str_payload() {
	let handle = tokio::spawn(async { panic!("boom-str") });
	let err = handle.await.unwrap_err();
	let payload = PanicPayload::from_join_error(err).expect("should be a panic");
	assert!(matches!(&payload, PanicPayload::Message(msg) if msg == "boom-str"), "got: {payload:?}");
}

#[tokio::test]
async fn extracts_string_payload() {
	let handle = tokio::spawn(async { panic!("{}", String::from("boom-string")) });
	let err = handle.await.unwrap_err();
	let payload = PanicPayload::from_join_error(err).expect("should be a panic");
	assert_eq!(payload.to_string(), "boom-string");
}

#[tokio::test]
async fn prefers_attached_error() {
	let handle = tokio::spawn(async { std::panic::panic_any(HandlerError::from("disk full")) });
	let err = handle.await.unwrap_err();
	let payload = PanicPayload::from_join_error(err).expect("should be a panic");
	assert!(matches!(payload, PanicPayload::Error(_)), "got: {payload:?}");
	assert_eq!(payload.to_string(), "disk full");
}

#[tokio::test]
async fn unknown_payload_has_fixed_message() {
	let handle = tokio::spawn(async { std::panic::panic_any(42_u8) });
	let err = handle.await.unwrap_err();
	let payload = PanicPayload::from_join_error(err).expect("should be a panic");
	assert_eq!(payload.to_string(), "unknown failure");
}

#[tokio::test]
async fn returns_none_for_cancellation() {
	let handle = tokio::spawn(async {
		tokio::time::sleep(std::time::Duration::from_secs(60)).await;
	});
	handle.abort();
	let err = handle.await.unwrap_err();
	assert!(PanicPayload::from_join_error(err).is_none(), "cancelled task should return None");
}
