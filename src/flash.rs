//! One-shot user-facing messages produced from operation results.

use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, message: message.into() }
    }

    /// Storage key used by the web layer.
    pub fn key(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "success",
            FlashLevel::Warning => "warning",
            FlashLevel::Error => "error",
        }
    }

    pub fn from_result<T, E: Display>(result: &Result<T, E>, success: impl Into<String>) -> Self {
        match result {
            Ok(_) => Self::success(success),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_actor::OrderError;

    #[test]
    fn errors_become_error_messages() {
        let failed: Result<(), OrderError> = Err(OrderError::MissingProofImage);
        let flash = Flash::from_result(&failed, "Đã giao hàng");
        assert_eq!(flash, Flash::error("Proof of delivery image is required"));
        assert_eq!(flash.key(), "error");

        let ok: Result<u8, OrderError> = Ok(1);
        let flash = Flash::from_result(&ok, "Đã giao hàng");
        assert_eq!(flash.level, FlashLevel::Success);
        assert_eq!(flash.key(), "success");
        assert_eq!(Flash::warning("Sắp hết hàng").key(), "warning");
        assert_eq!(serde_json::to_value(&flash).unwrap()["level"], "success");
    }
}
