//! Fuzz target for search.json configuration parsing.
//!
//! Tests that parsing and semantic validation handle arbitrary input
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tb_config::{validate_search_config, SearchConfig};

fuzz_target!(|data: &[u8]| {
    // Parsing may fail; whatever parses must validate without panicking
    if let Ok(config) = serde_json::from_slice::<SearchConfig>(data) {
        let _ = validate_search_config(&config);
    }
});
