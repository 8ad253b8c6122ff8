//! LTI 1.3 launch token claims.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Claim names used by LTI 1.3, AGS, NRPS and Deep Linking.
pub mod claim {
    pub const MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
    pub const VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
    pub const DEPLOYMENT_ID: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
    pub const TARGET_LINK_URI: &str = "https://purl.imsglobal.org/spec/lti/claim/target_link_uri";
    pub const ROLES: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
    pub const CONTEXT: &str = "https://purl.imsglobal.org/spec/lti/claim/context";
    pub const RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
    pub const TOOL_PLATFORM: &str = "https://purl.imsglobal.org/spec/lti/claim/tool_platform";
    pub const LAUNCH_PRESENTATION: &str =
        "https://purl.imsglobal.org/spec/lti/claim/launch_presentation";
    pub const CUSTOM: &str = "https://purl.imsglobal.org/spec/lti/claim/custom";
    pub const AGS_ENDPOINT: &str = "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint";
    pub const NRPS: &str = "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice";
    pub const DEEP_LINKING_SETTINGS: &str =
        "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings";
    pub const CONTENT_ITEMS: &str = "https://purl.imsglobal.org/spec/lti-dl/claim/content_items";
    pub const DATA: &str = "https://purl.imsglobal.org/spec/lti-dl/claim/data";
}

/// Supported LTI message types.
pub mod message_type {
    pub const RESOURCE_LINK: &str = "LtiResourceLinkRequest";
    pub const DEEP_LINKING: &str = "LtiDeepLinkingRequest";
    pub const DEEP_LINKING_RESPONSE: &str = "LtiDeepLinkingResponse";
}

/// LTI version carried in every message.
pub const LTI_VERSION: &str = "1.3.0";

/// Audience can be a single string or array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether the audience includes `aud`.
    #[must_use]
    pub fn contains(&self, aud: &str) -> bool {
        match self {
            Self::None => false,
            Self::Single(s) => s == aud,
            Self::Multiple(v) => v.iter().any(|a| a == aud),
        }
    }

    /// First audience value.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Single(s) => Some(s),
            Self::Multiple(v) => v.first().map(String::as_str),
        }
    }

    /// Number of audience values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Multiple(v) => v.len(),
        }
    }

    /// Whether no audience is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Context (course) claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextClaim {
    pub id: Option<String>,
    pub label: Option<String>,
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub context_type: Vec<String>,
}

/// Resource link claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLinkClaim {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Tool platform claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPlatformClaim {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub product_family_code: Option<String>,
    pub version: Option<String>,
}

/// Launch presentation claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchPresentationClaim {
    pub document_target: Option<String>,
    pub return_url: Option<String>,
    pub locale: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// AGS endpoint claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgsClaim {
    #[serde(default)]
    pub scope: Vec<String>,
    pub lineitems: Option<String>,
    pub lineitem: Option<String>,
}

impl AgsClaim {
    /// Whether the platform granted `scope`.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

/// Names and Role Provisioning Services claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrpsClaim {
    pub context_memberships_url: Option<String>,
    #[serde(default)]
    pub service_versions: Vec<String>,
}

/// Deep linking settings claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLinkingSettings {
    pub deep_link_return_url: Option<String>,
    #[serde(default)]
    pub accept_types: Vec<String>,
    #[serde(default)]
    pub accept_presentation_document_targets: Vec<String>,
    pub accept_multiple: Option<bool>,
    pub auto_create: Option<bool>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub data: Option<String>,
}

/// The claim set of a validated launch token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchClaims {
    pub iss: String,
    pub sub: Option<String>,
    #[serde(default)]
    pub aud: Audience,
    pub azp: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub nonce: Option<String>,

    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub locale: Option<String>,
    pub picture: Option<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type", default)]
    pub message_type: String,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version", default)]
    pub version: String,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id", default)]
    pub deployment_id: String,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/target_link_uri")]
    pub target_link_uri: Option<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/roles", default)]
    pub roles: Vec<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/context")]
    pub context: Option<ContextClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/resource_link")]
    pub resource_link: Option<ResourceLinkClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/tool_platform")]
    pub tool_platform: Option<ToolPlatformClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/launch_presentation")]
    pub launch_presentation: Option<LaunchPresentationClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/custom", default)]
    pub custom: serde_json::Map<String, serde_json::Value>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint")]
    pub ags: Option<AgsClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice")]
    pub nrps: Option<NrpsClaim>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings")]
    pub deep_linking_settings: Option<DeepLinkingSettings>,

    /// Claims not modelled above.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
