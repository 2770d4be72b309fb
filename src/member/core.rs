//! Core member domain types and validation.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, date::parse_iso_date};

/// Database identifier for a member.
pub type MemberId = DatabaseId;

const MAX_FIELD_LENGTH: usize = 255;

/// A member of the organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Always lowercase, unique across members.
    pub email: String,
    pub phone: Option<String>,
    pub join_date: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A member's ID and name, for select inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberOption {
    pub id: MemberId,
    pub name: String,
}

/// Form data for member creation and editing.
///
/// Fields are kept as submitted so the form can be shown again with the
/// user's input when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub join_date: String,
}

impl From<&Member> for MemberFormData {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone().unwrap_or_default(),
            join_date: member.join_date.to_string(),
        }
    }
}

/// Validated member fields, ready to be written to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub join_date: Date,
}

impl NewMember {
    /// Validate submitted member fields.
    ///
    /// The name is required, the email is required, lowercased and must look
    /// like an address, the phone is optional and the join date must be a
    /// `YYYY-MM-DD` date. Text fields are trimmed and limited to 255
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidField] naming the first field that failed.
    pub fn new(form: &MemberFormData) -> Result<Self, Error> {
        let name = required_text("name", "Name", &form.name)?;

        let email = required_text("email", "Email", &form.email)?.to_lowercase();
        if !looks_like_email(&email) {
            return Err(Error::InvalidField {
                field: "email",
                reason: format!("\"{email}\" is not a valid email address"),
            });
        }

        let phone = form.phone.trim();
        let phone = if phone.is_empty() {
            None
        } else {
            Some(limit_length("phone", "Phone", phone)?)
        };

        let join_date = parse_iso_date(&form.join_date).ok_or_else(|| Error::InvalidField {
            field: "join_date",
            reason: "Join date must be a date in the format YYYY-MM-DD".to_owned(),
        })?;

        Ok(Self {
            name,
            email,
            phone,
            join_date,
        })
    }
}

fn required_text(field: &'static str, label: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: format!("{label} cannot be empty"),
        });
    }

    limit_length(field, label, value)
}

fn limit_length(field: &'static str, label: &str, value: &str) -> Result<String, Error> {
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(Error::InvalidField {
            field,
            reason: format!("{label} cannot be longer than {MAX_FIELD_LENGTH} characters"),
        });
    }

    Ok(value.to_owned())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let domain_labels: Vec<&str> = domain.split('.').collect();

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain_labels.len() > 1
        && domain_labels.iter().all(|label| !label.is_empty())
}
