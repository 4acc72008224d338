//! Request bodies shared by the role and permission endpoints. Both are
//! named catalog entries with an optional description.

use serde::Deserialize;

use crate::db::StoreError;
use crate::error::AppError;
use crate::models::CatalogChanges;
use crate::validation::{self, nullable};

#[derive(Deserialize)]
pub struct CreateEntry {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

pub struct NewEntry {
    pub name: String,
    pub description: Option<String>,
}

impl CreateEntry {
    pub fn parse(self) -> Result<NewEntry, AppError> {
        Ok(NewEntry {
            name: validation::name("name", &self.name)?,
            description: validation::description(self.description.as_deref()),
        })
    }
}

#[derive(Deserialize, Default)]
pub struct UpdateEntry {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl UpdateEntry {
    pub fn parse(self) -> Result<CatalogChanges, AppError> {
        let name = match self.name.as_deref() {
            Some(name) => Some(validation::name("name", name)?),
            None => None,
        };
        let description = self
            .description
            .map(|d| validation::description(d.as_deref()));
        Ok(CatalogChanges { name, description })
    }
}

/// `kind` is the entity label used in the message, e.g. "Role".
pub fn name_conflict(kind: &'static str) -> impl Fn(StoreError) -> AppError {
    move |err| match err {
        StoreError::UniqueViolation(_) => {
            AppError::AlreadyExists(format!("{kind} with this name already exists"))
        }
        other => AppError::Store(other),
    }
}
