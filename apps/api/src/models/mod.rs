pub mod applicant;
pub mod application;
pub mod category;
pub mod job;

use serde::Serialize;

/// `{success, message}` body returned by operations with nothing else to report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        MessageResponse {
            success: true,
            message: message.into(),
        }
    }
}
