use web_time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, on native and wasm targets alike.
pub fn now_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default()
}

/// RFC 3339 rendering of a millisecond timestamp.
pub fn rfc3339(millis: u64) -> String {
	chrono::DateTime::from_timestamp_millis(millis as i64)
		.map(|t| t.to_rfc3339())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_epoch_millis() {
		assert_eq!(rfc3339(0), "1970-01-01T00:00:00+00:00");
		assert_eq!(rfc3339(1_500), "1970-01-01T00:00:01.500+00:00");
	}
}
