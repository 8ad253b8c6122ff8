//! Flattened views of launch claims for display and session bookkeeping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::claims::LaunchClaims;
use super::roles::{PrimaryRole, parse_roles, primary_role};

/// Learner identity and roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub user_id: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub locale: String,
    pub picture: String,
    pub roles: Vec<String>,
    pub raw_roles: Vec<String>,
    pub primary_role: PrimaryRole,
    pub is_instructor: bool,
}

impl UserInfo {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        let primary = primary_role(&claims.roles);
        Self {
            user_id: or_default(claims.sub.as_deref(), "Unknown"),
            name: or_default(claims.name.as_deref(), "Unknown User"),
            given_name: or_default(claims.given_name.as_deref(), ""),
            family_name: or_default(claims.family_name.as_deref(), ""),
            email: or_default(claims.email.as_deref(), "no-email@example.com"),
            locale: or_default(claims.locale.as_deref(), "en"),
            picture: or_default(claims.picture.as_deref(), ""),
            roles: parse_roles(&claims.roles),
            raw_roles: claims.roles.clone(),
            primary_role: primary,
            is_instructor: primary.is_instructor(),
        }
    }

    /// Whether the friendly role list names the user an instructor.
    #[must_use]
    pub fn has_instructor_role(&self) -> bool {
        self.roles.iter().any(|r| r == "Instructor")
    }
}

/// Course (context) information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseInfo {
    pub course_id: String,
    pub course_title: String,
    pub course_label: String,
    pub course_type: Vec<String>,
}

impl CourseInfo {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        let context = claims.context.clone().unwrap_or_default();
        Self {
            course_id: or_default(context.id.as_deref(), "Unknown"),
            course_title: or_default(context.title.as_deref(), "Unknown Course"),
            course_label: or_default(context.label.as_deref(), ""),
            course_type: context.context_type,
        }
    }
}

/// Resource link information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceInfo {
    pub resource_id: String,
    pub resource_title: String,
    pub resource_description: String,
}

impl ResourceInfo {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        let link = claims.resource_link.clone().unwrap_or_default();
        Self {
            resource_id: or_default(link.id.as_deref(), "Unknown"),
            resource_title: or_default(link.title.as_deref(), ""),
            resource_description: or_default(link.description.as_deref(), ""),
        }
    }
}

/// Platform information plus the issuer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformInfo {
    pub name: String,
    pub contact_email: String,
    pub description: String,
    pub url: String,
    pub product_family_code: String,
    pub version: String,
    pub guid: String,
    pub issuer: String,
}

impl PlatformInfo {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        let platform = claims.tool_platform.clone().unwrap_or_default();
        Self {
            name: or_default(platform.name.as_deref(), "Unknown Platform"),
            contact_email: platform.contact_email.unwrap_or_default(),
            description: platform.description.unwrap_or_default(),
            url: platform.url.unwrap_or_default(),
            product_family_code: platform.product_family_code.unwrap_or_default(),
            version: platform.version.unwrap_or_default(),
            guid: platform.guid.unwrap_or_default(),
            issuer: or_default(Some(claims.iss.as_str()), "Unknown"),
        }
    }
}

/// How the platform presents the tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchPresentation {
    pub document_target: String,
    pub return_url: String,
    pub locale: String,
    pub height: u32,
    pub width: u32,
}

impl LaunchPresentation {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        let presentation = claims.launch_presentation.clone().unwrap_or_default();
        Self {
            document_target: or_default(presentation.document_target.as_deref(), "window"),
            return_url: presentation.return_url.unwrap_or_default(),
            locale: or_default(presentation.locale.as_deref(), "en"),
            height: presentation.height.unwrap_or(600),
            width: presentation.width.unwrap_or(800),
        }
    }
}

/// Everything the launch page shows.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchSummary {
    pub user: UserInfo,
    pub course: CourseInfo,
    pub resource: ResourceInfo,
    pub platform: PlatformInfo,
    pub custom_params: serde_json::Map<String, serde_json::Value>,
    pub presentation: LaunchPresentation,
    pub timestamp: DateTime<Utc>,
}

impl LaunchSummary {
    #[must_use]
    pub fn from_claims(claims: &LaunchClaims) -> Self {
        Self {
            user: UserInfo::from_claims(claims),
            course: CourseInfo::from_claims(claims),
            resource: ResourceInfo::from_claims(claims),
            platform: PlatformInfo::from_claims(claims),
            custom_params: claims.custom.clone(),
            presentation: LaunchPresentation::from_claims(claims),
            timestamp: Utc::now(),
        }
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
