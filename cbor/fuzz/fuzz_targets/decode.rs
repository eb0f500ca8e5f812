#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((value, _)) = credman_cbor::decode_prefix(data) {
        _ = format!("{value:?} {value}");
    }
});
