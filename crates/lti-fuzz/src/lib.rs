//! Fuzzing library for lti-tool.
//!
//! Targets cover the inputs a platform or browser controls: launch token
//! claims, tool configuration files and grade submissions.
//!
//! # Usage
//!
//! ```bash
//! cd crates/lti-fuzz
//! cargo +nightly fuzz run fuzz_launch_claims -- -max_total_time=60
//! ```

pub use lti_tool::lti::ToolConfig;
pub use lti_tool::models;
