use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Uniform envelope returned by every API operation.
///
/// Successful calls carry `data`, failed calls carry a short human readable
/// `error`; `success` tells the two apart without inspecting either field.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("Todo not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "Todo not found" })
        );
    }
}
