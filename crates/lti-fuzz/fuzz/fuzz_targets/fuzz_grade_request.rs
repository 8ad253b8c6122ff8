#![no_main]

use libfuzzer_sys::fuzz_target;
use lti_tool::models::GradeRequest;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = serde_json::from_slice::<GradeRequest>(data) {
        if let Some((score, max_score)) = request.validated_score() {
            assert!(max_score > 0.0 && (0.0..=max_score).contains(&score));
        }
        let _ = request.comment();
    }
});
