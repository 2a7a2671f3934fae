#![no_main]

use libfuzzer_sys::fuzz_target;
use smsbridge::fuzz_api::extension_from_content_type;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(ext) = extension_from_content_type(s)
    {
        assert!(!ext.is_empty());
        assert!(!ext.contains('/'));
    }
});
