use crate::api::{extract_conversation_id, HttpReply};

/// Whether a failed check aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    /// Logged as a warning, run continues
    Soft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Body contains the substring
    Contains(String),
    /// Body carries a string-valued `conversation_id`
    ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCheck {
    pub path: String,
    pub expectation: Expectation,
    pub severity: Severity,
}

impl EndpointCheck {
    pub fn fatal(path: &str, expectation: Expectation) -> Self {
        Self {
            path: path.to_string(),
            expectation,
            severity: Severity::Fatal,
        }
    }

    pub fn soft(path: &str, expectation: Expectation) -> Self {
        Self {
            path: path.to_string(),
            expectation,
            severity: Severity::Soft,
        }
    }

    /// `Err` carries a one-line reason.
    pub fn evaluate(&self, reply: &HttpReply) -> Result<(), String> {
        if !reply.is_success() {
            return Err(format!("GET {} returned {}", self.path, reply.status));
        }

        match &self.expectation {
            Expectation::Contains(needle) if !reply.contains(needle) => Err(format!(
                "GET {} body does not contain '{}': {}",
                self.path,
                needle,
                reply.excerpt()
            )),
            Expectation::ConversationId if extract_conversation_id(&reply.body).is_none() => {
                Err(format!("GET {} returned no conversation_id", self.path))
            }
            _ => Ok(()),
        }
    }
}

/// The fixed HTTP surface checked after bring-up.
///
/// No latest conversation is the normal cold-start state, hence soft.
pub fn surface_checks(default_user: &str) -> Vec<EndpointCheck> {
    vec![
        EndpointCheck::fatal("/health", Expectation::Contains("healthy".to_string())),
        EndpointCheck::fatal(
            "/api/current-user",
            Expectation::Contains(default_user.to_string()),
        ),
        EndpointCheck::soft("/api/latest-conversation", Expectation::ConversationId),
        EndpointCheck::fatal(
            "/api/conversations",
            Expectation::Contains("conversations".to_string()),
        ),
        EndpointCheck::soft("/api/stats", Expectation::Contains("conversations".to_string())),
    ]
}
