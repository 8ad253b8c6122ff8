#![no_main]

use libfuzzer_sys::fuzz_target;
use lti_tool::models::{LaunchClaims, LaunchSummary, parse_roles, primary_role};

fuzz_target!(|data: &[u8]| {
    if let Ok(claims) = serde_json::from_slice::<LaunchClaims>(data) {
        let _ = parse_roles(&claims.roles);
        let _ = primary_role(&claims.roles);
        let _ = LaunchSummary::from_claims(&claims);
    }
});
