#![no_main]

use libfuzzer_sys::fuzz_target;
use localwallet_core::mnemonic;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must come back as Ok or Err, never a panic.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(parsed) = mnemonic::validate(s) {
            // Anything accepted must survive seeding and derivation
            let seed = mnemonic::to_seed(&parsed, "");
            let _ = localwallet_core::derive(seed.as_slice());
        }
    }
});
