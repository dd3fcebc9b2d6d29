//! Capability extraction
//!
//! Authorization is evaluated upstream (gateway / identity provider); this
//! subsystem consumes the result as a precomputed capability list in the
//! `x-capabilities` header (comma-separated). Handlers gate mutating
//! operations with [`Capabilities::require`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::collections::BTreeSet;

use crate::error::HttpAppError;
use backlot_core::AppError;

/// Header carrying the caller's precomputed capabilities.
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

/// The caller's capability set for this request. Absent header means no
/// capabilities; the request still reaches handlers that require none.
#[derive(Debug, Clone, Default)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    pub fn from_header_value(value: &str) -> Self {
        Self(
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn allows(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    /// Reject with 403 unless the caller holds `capability`.
    pub fn require(&self, capability: &str) -> Result<(), HttpAppError> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(HttpAppError(AppError::Forbidden(format!(
                "Missing capability: {}",
                capability
            ))))
        }
    }
}

impl<S> FromRequestParts<S> for Capabilities
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caps = parts
            .headers
            .get(CAPABILITIES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(Capabilities::from_header_value)
            .unwrap_or_default();
        Ok(caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_parse_and_allow() {
        let caps = Capabilities::from_header_value("batches:edit, batches:start");
        assert!(caps.allows("batches:edit"));
        assert!(caps.allows("batches:start"));
        assert!(!caps.allows("mmifs:download"));
    }

    #[test]
    fn test_require_missing_capability_is_forbidden() {
        let caps = Capabilities::from_header_value("");
        let err = caps.require("batches:start").unwrap_err();
        assert!(matches!(err.0, AppError::Forbidden(_)));
    }
}
