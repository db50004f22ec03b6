//! User models
//!
//! The `User` record and the three user kinds served from `/data`:
//! a plain user, a "mutant" user whose payload is wrapped in a `data`
//! envelope, and a user that refuses a blank first name.

use serde::{Deserialize, Serialize};

use crate::kind::{Envelope, Required, Resource};

/// Typed view of a user's attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl User {
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        Self {
            id: None,
            firstname: firstname.into(),
            lastname: lastname.into(),
            age: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

/// Plain user at `/data/user.json`
pub fn user() -> Resource {
    Resource::new("user", "/data/user.json")
}

/// User whose payload is `{"data": {...}}`, at `/data/mutant_user.json`
pub fn mutant_user() -> Envelope {
    Envelope::new("mutant_user", "/data/mutant_user.json", "data")
}

/// User that rejects a blank `firstname`, at `/data/invalid_user.json`
pub fn invalid_user() -> Required<Resource> {
    Required::new(
        Resource::new("invalid_user", "/data/invalid_user.json"),
        ["firstname"],
    )
}
