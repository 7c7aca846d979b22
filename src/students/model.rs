use serde::{Deserialize, Serialize};

/// Plain CRUD entity, no event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Cleared when the department service is unavailable at save time
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// Department as returned by the department service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(alias = "idDepartment")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl Department {
    pub const UNAVAILABLE_NAME: &'static str = "Service Unavailable";

    /// Stand-in returned when the department service cannot be reached
    pub fn unavailable(id: i64) -> Self {
        Self {
            id,
            name: Self::UNAVAILABLE_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_json_is_camel_case_with_optional_fields() {
        let student: Student = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com"}"#,
        )
        .unwrap();

        assert_eq!(student.id, None);
        assert_eq!(student.department_id, None);
        assert_eq!(student.first_name, "Ada");

        let json = serde_json::to_value(&student).unwrap();
        assert!(json.get("departmentId").is_some());
    }

    #[test]
    fn test_department_accepts_legacy_id_field() {
        let department: Department =
            serde_json::from_str(r#"{"idDepartment":7,"name":"Physics"}"#).unwrap();
        assert_eq!(department, Department { id: 7, name: "Physics".to_string() });
    }
}
