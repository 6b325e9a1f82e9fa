#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Key path parsing must never panic; a parsed path must render and re-parse
        if let Ok(key) = tessera::KeyPath::parse(text) {
            let rendered = key.to_string();
            let _ = tessera::KeyPath::parse(&rendered);
        }
    }
});
