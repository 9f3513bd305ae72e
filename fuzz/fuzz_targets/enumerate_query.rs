#![no_main]

use dpjoin_core::{enumerate_query, Dialect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let _ = enumerate_query(sql, Dialect::Generic, 20);
    }
});
