#![no_main]

use libfuzzer_sys::fuzz_target;
use sand_service::crypto::{generate_signing_key, verify_token, SigningKey};
use std::sync::OnceLock;
use std::time::Duration;

fn key() -> &'static SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(|| generate_signing_key().expect("signing key"))
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bearer tokens must be rejected without panicking
    if let Ok(token) = std::str::from_utf8(data) {
        let _ = verify_token(token, key(), Duration::from_secs(300));
    }
});
