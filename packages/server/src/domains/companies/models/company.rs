use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::kernel::store::{OperationKind, StoreError};

/// Legal form of a company. Stored as its ordinal, exchanged as kebab-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum CompanyKind {
    Corporation = 0,
    NonProfit = 1,
    Cooperative = 2,
    SoleProprietorship = 3,
}

impl std::fmt::Display for CompanyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompanyKind::Corporation => write!(f, "corporation"),
            CompanyKind::NonProfit => write!(f, "non-profit"),
            CompanyKind::Cooperative => write!(f, "cooperative"),
            CompanyKind::SoleProprietorship => write!(f, "sole-proprietorship"),
        }
    }
}

/// A company row.
///
/// `id` is assigned by the service on insert and never changes afterwards. It
/// is also the key of every event published for this company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employee_count: i32,
    #[serde(default)]
    pub registered: bool,
    #[serde(rename = "type")]
    #[sqlx(rename = "company_type")]
    pub kind: CompanyKind,
}

impl Company {
    /// Parse a request body into a company.
    pub fn from_value(value: JsonValue) -> Result<Self, StoreError> {
        expect_object(&value, OperationKind::Insert)?;
        serde_json::from_value(value).map_err(|e| StoreError::InvalidInput {
            operation: OperationKind::Insert,
            reason: e.to_string(),
        })
    }
}

/// The updatable columns of a company, each one optional.
///
/// There is no `id` slot: the key travels next to the patch in
/// [`MutationRequest`] and can never be rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description, `None` leaves it alone.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CompanyKind>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.employee_count.is_none()
            && self.registered.is_none()
            && self.kind.is_none()
    }
}

// A field that is present in the body maps to `Some`, even when it is null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A partial update: the key of the row plus the columns to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRequest {
    pub id: Option<String>,
    pub patch: CompanyPatch,
}

impl MutationRequest {
    pub fn new(id: impl Into<String>, patch: CompanyPatch) -> Self {
        Self {
            id: Some(id.into()),
            patch,
        }
    }

    /// A request that rewrites every column of `company`, used to put a row
    /// back the way it was.
    pub fn restore(company: &Company) -> Self {
        Self::new(
            company.id.clone(),
            CompanyPatch {
                name: Some(company.name.clone()),
                description: Some(company.description.clone()),
                employee_count: Some(company.employee_count),
                registered: Some(company.registered),
                kind: Some(company.kind),
            },
        )
    }

    /// Parse a PATCH body. An `id` field is accepted as the key, any other
    /// unknown field is rejected.
    pub fn from_value(value: JsonValue) -> Result<Self, StoreError> {
        let operation = OperationKind::Update;
        let mut fields = match value {
            JsonValue::Object(fields) => fields,
            other => {
                return Err(StoreError::UnsupportedShape {
                    operation,
                    found: json_type_name(&other),
                })
            }
        };

        let id = match fields.remove("id") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(id)) => Some(id),
            Some(other) => {
                return Err(StoreError::InvalidInput {
                    operation,
                    reason: format!("id must be a string, got {}", json_type_name(&other)),
                })
            }
        };

        let patch = serde_json::from_value(JsonValue::Object(fields)).map_err(|e| {
            StoreError::InvalidInput {
                operation,
                reason: e.to_string(),
            }
        })?;

        Ok(Self { id, patch })
    }

    /// Pin the request to the identifier taken from the request path.
    ///
    /// A missing key is filled in; a different key is rejected.
    pub fn bind_key(&mut self, id: &str) -> Result<(), StoreError> {
        match &self.id {
            Some(existing) if existing != id => Err(StoreError::InvalidInput {
                operation: OperationKind::Update,
                reason: format!("body id {existing} does not match path id {id}"),
            }),
            Some(_) => Ok(()),
            None => {
                self.id = Some(id.to_string());
                Ok(())
            }
        }
    }
}

fn expect_object(value: &JsonValue, operation: OperationKind) -> Result<(), StoreError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(StoreError::UnsupportedShape {
            operation,
            found: json_type_name(value),
        })
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
