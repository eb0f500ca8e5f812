#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    credman_cbor_fuzz::roundtrip(data);
});
