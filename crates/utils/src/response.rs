use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope used by every JSON route.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serializes_data() {
        let value = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], 3);
        assert!(value["message"].is_null());
    }

    #[test]
    fn test_error_has_no_data() {
        let response: ApiResponse<()> = ApiResponse::error("boom");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("boom"));
    }
}
