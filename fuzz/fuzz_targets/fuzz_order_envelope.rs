#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use warden_protocol::{is_base64_text, OrderEnvelope};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(body) = serde_json::from_str::<Value>(text) else {
        return;
    };

    match OrderEnvelope::from_value(&body, "1.0", "http://localhost") {
        Ok(envelope) => {
            // An accepted envelope holds only values the validator vouched for.
            assert!(!envelope.request_id.is_empty());
            assert!(!envelope.public_key.is_empty());
            assert!(is_base64_text(&envelope.signature));
            assert!(is_base64_text(&envelope.handshake_signature));
            assert!(!envelope.action_name.is_empty());
            assert!(!envelope.base_url.is_empty());
        }
        Err(error) => {
            // Every rejection maps to a stable wire code.
            let code = error.code();
            assert!((10000..=10051).contains(&code), "unexpected code {code}");
        }
    }
});
