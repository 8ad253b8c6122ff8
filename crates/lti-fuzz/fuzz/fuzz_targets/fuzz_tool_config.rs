#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use lti_tool::lti::ToolConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        // Key paths resolve under a directory that never exists.
        let _ = ToolConfig::from_json(json, Path::new("/nonexistent/lti-fuzz"));
    }
});
