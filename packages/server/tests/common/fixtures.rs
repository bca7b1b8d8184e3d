use company_core::domains::companies::{Company, CompanyKind};
use uuid::Uuid;

/// A company with a fresh id.
pub fn company(name: &str) -> Company {
    Company {
        id: Uuid::now_v7().to_string(),
        name: name.to_string(),
        description: Some(format!("{name} description")),
        employee_count: 12,
        registered: true,
        kind: CompanyKind::Corporation,
    }
}

pub fn unknown_id() -> String {
    Uuid::now_v7().to_string()
}
