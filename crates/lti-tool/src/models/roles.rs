//! LTI role vocabulary to friendly names.

use std::fmt;

use serde::{Serialize, Serializer};

/// The single role used to decide what a user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryRole {
    Instructor,
    Administrator,
    ContentDeveloper,
    Student,
    Guest,
}

impl PrimaryRole {
    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instructor => "Instructor",
            Self::Administrator => "Administrator",
            Self::ContentDeveloper => "Content Developer",
            Self::Student => "Student",
            Self::Guest => "Guest",
        }
    }

    /// Staff roles: Instructor or Administrator.
    #[must_use]
    pub const fn is_instructor(self) -> bool {
        matches!(self, Self::Instructor | Self::Administrator)
    }
}

impl fmt::Display for PrimaryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PrimaryRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolve the primary role.
///
/// Priority: Instructor, Administrator, ContentDeveloper, Learner (Student),
/// then Guest. Each step checks whether any role string contains the name.
#[must_use]
pub fn primary_role<S: AsRef<str>>(roles: &[S]) -> PrimaryRole {
    let any = |needle: &str| roles.iter().any(|r| r.as_ref().contains(needle));

    if any("Instructor") {
        PrimaryRole::Instructor
    } else if any("Administrator") {
        PrimaryRole::Administrator
    } else if any("ContentDeveloper") {
        PrimaryRole::ContentDeveloper
    } else if any("Learner") {
        PrimaryRole::Student
    } else {
        PrimaryRole::Guest
    }
}

/// Map LTI role URIs to friendly names, without duplicates.
///
/// Unrecognised roles fall back to the fragment after the last `#`; roles
/// without a fragment are dropped. First-occurrence order is kept.
#[must_use]
pub fn parse_roles<S: AsRef<str>>(roles: &[S]) -> Vec<String> {
    let mut friendly: Vec<String> = Vec::new();

    for role in roles {
        let role = role.as_ref();
        let name = if role.contains("Instructor") {
            Some("Instructor")
        } else if role.contains("Learner") {
            Some("Student")
        } else if role.contains("Administrator") {
            Some("Administrator")
        } else if role.contains("ContentDeveloper") {
            Some("Content Developer")
        } else if role.contains("Mentor") {
            Some("Mentor")
        } else if role.contains("TeachingAssistant") {
            Some("Teaching Assistant")
        } else {
            role.rsplit_once('#').map(|(_, fragment)| fragment)
        };

        if let Some(name) = name {
            if !friendly.iter().any(|f| f == name) {
                friendly.push(name.to_string());
            }
        }
    }

    friendly
}
