//! Data models for LTI messages and tool responses.

pub mod claims;
pub mod grade;
pub mod info;
pub mod roles;

pub use claims::{Audience, LaunchClaims};
pub use grade::{GradeRequest, GradeResponse, LineItem, Score};
pub use info::{CourseInfo, LaunchPresentation, LaunchSummary, PlatformInfo, ResourceInfo, UserInfo};
pub use roles::{PrimaryRole, parse_roles, primary_role};
