//! Person records: the family members crops get tagged with

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Relationship of a person to the account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kinship {
    Child,
    Parent,
    Partner,
    Sibling,
}

impl Kinship {
    /// Stable lowercase form used in the database and form values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kinship::Child => "child",
            Kinship::Parent => "parent",
            Kinship::Partner => "partner",
            Kinship::Sibling => "sibling",
        }
    }

    /// All variants, in display order for selection UIs.
    pub fn all() -> [Kinship; 4] {
        [
            Kinship::Child,
            Kinship::Parent,
            Kinship::Partner,
            Kinship::Sibling,
        ]
    }
}

impl fmt::Display for Kinship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kinship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "child" => Ok(Kinship::Child),
            "parent" => Ok(Kinship::Parent),
            "partner" => Ok(Kinship::Partner),
            "sibling" => Ok(Kinship::Sibling),
            other => Err(format!("unknown kinship: {other}")),
        }
    }
}

/// A family member tracked for tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub given_name: String,
    pub family_name: Option<String>,
    pub kinship: Option<Kinship>,
    pub birth_date: Option<NaiveDate>,
    /// Free-text historical notes.
    pub biography: String,
    /// External identity tag reserved for automated recognition. Stored but
    /// not consulted by any current logic.
    pub recognition_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Person {
    /// Create a new person with only the required name; optional fields are
    /// filled in by the admin form handlers.
    pub fn new(given_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            given_name,
            family_name: None,
            kinship: None,
            birth_date: None,
            biography: String::new(),
            recognition_tag: None,
            created_at: Utc::now(),
        }
    }

    /// Full display name, e.g. "Luisa Herrera" or just "Luisa".
    pub fn display_name(&self) -> String {
        match &self.family_name {
            Some(family) => format!("{} {}", self.given_name, family),
            None => self.given_name.clone(),
        }
    }
}
