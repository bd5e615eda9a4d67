//! User directory record.
//!
//! Users live in the remote identity service. Warden receives them as
//! loosely-typed JSON, so every field except the identifier is optional
//! and the role field tolerates the scalar, list, and comma-separated
//! forms the service emits.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Normalized role memberships for a user.
///
/// The remote service stores roles either as a list or as a single
/// comma-separated string, and omits the field entirely for users that
/// were never assigned one. All three forms normalize to a list of
/// trimmed, non-empty role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roles(Vec<String>);

impl Roles {
    /// Role name granting access to the admin directory.
    pub const ADMIN: &'static str = "admin";

    /// Normalizes a list of role names, dropping blank entries.
    #[must_use]
    pub fn from_list<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            roles
                .into_iter()
                .map(|r| r.as_ref().trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        )
    }

    /// Normalizes a comma-separated role string.
    #[must_use]
    pub fn from_csv(value: &str) -> Self {
        Self::from_list(value.split(','))
    }

    /// Returns true when no role is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the normalized role names.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Checks membership of a single role.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == role)
    }

    /// Checks for the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.contains(Self::ADMIN)
    }

    /// Joins the roles back into the comma-separated wire form.
    #[must_use]
    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    /// The first assigned role, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Many(Vec<String>),
            One(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => Self::default(),
            Some(Raw::Many(list)) => Self::from_list(list),
            Some(Raw::One(csv)) => Self::from_csv(&csv),
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A user account as reported by the remote identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Opaque identifier assigned by the service.
    pub id: String,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Assigned roles (scalar, list, or absent on the wire).
    #[serde(default, skip_serializing_if = "Roles::is_empty")]
    pub role: Roles,

    /// Whether sign-in is currently blocked.
    #[serde(default, deserialize_with = "null_as_default")]
    pub banned: bool,

    /// Operator-supplied ban reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,

    /// When the ban lapses, if it is temporary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_expires: Option<DateTime<Utc>>,

    /// When the account was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Avatar URL or data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserRecord {
    /// Creates a record with the given identifier and no profile data.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            role: Roles::default(),
            banned: false,
            ban_reason: None,
            ban_expires: None,
            created_at: None,
            image: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the assigned roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.role = roles;
        self
    }

    /// Sets the avatar image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub const fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Checks for the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name shown in the directory: display name, then email, then a
    /// placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match (&self.name, &self.email) {
            (Some(name), _) if !name.trim().is_empty() => name,
            (_, Some(email)) if !email.trim().is_empty() => email,
            _ => "Unnamed",
        }
    }

    /// Avatar fallback: uppercased first letters of up to two words of
    /// the display name or email, or "?" when neither exists.
    #[must_use]
    pub fn initials(&self) -> String {
        let source = self
            .name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("")
            .trim();

        let initials: String = source
            .split_whitespace()
            .take(2)
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();

        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }
}
