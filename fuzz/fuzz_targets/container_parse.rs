#![no_main]

use libfuzzer_sys::fuzz_target;
use localwallet_core::{decrypt_container, KdfId, VaultContainer};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(container) = VaultContainer::from_json(json) else {
        return;
    };

    // Re-encoding a parsed container must not panic
    let _ = container.to_json();

    // Parameter checks run on every container, whatever its KDF
    let params = container.kdf_params();
    if params.validate().is_err() {
        return;
    }

    // Keep the KDF cheap so each input finishes quickly
    if container.kdf_id == KdfId::Pbkdf2Sha256 && container.iterations <= 16 {
        let _ = decrypt_container("fuzz", &container);
    }
});
