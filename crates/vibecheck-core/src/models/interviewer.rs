use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterviewerId(Uuid);

impl InterviewerId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for InterviewerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for InterviewerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl Display for InterviewerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: InterviewerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request body for `POST /interviewers`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateInterviewer {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Company must be between 1 and 255 characters"
    ))]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
}

impl CreateInterviewer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: None,
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_body_omits_unset_fields() {
        let body = serde_json::to_value(CreateInterviewer::named("Ada")).unwrap();
        assert_eq!(body, json!({ "name": "Ada" }));
    }

    #[test]
    fn create_validation() {
        assert!(CreateInterviewer::named("").validate().is_err());
        let bad_email = CreateInterviewer {
            name: "Ada".to_string(),
            company: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn interviewer_ignores_extra_fields() {
        let interviewer: Interviewer = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Grace",
            "company": "Navy",
            "profile_status": "hidden",
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(interviewer.name, "Grace");
        assert_eq!(interviewer.company.as_deref(), Some("Navy"));
    }
}
