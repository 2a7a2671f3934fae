#![no_main]

use libfuzzer_sys::fuzz_target;
use smsbridge::fuzz_api::decode_request;

fuzz_target!(|data: &[u8]| {
    let _ = decode_request(data);
});
