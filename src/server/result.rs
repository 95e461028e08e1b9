//! # Resultado Estructurado de `rpc_call`
//! src/server/result.rs
//!
//! Las dos únicas formas que ve el caller, byte a byte:
//!
//! ```text
//! {"status":"success","content":"<body>"}
//! {"status":"error","error":"path not found: <path>"}
//! ```

use crate::error::ServerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RpcResult {
    Success { content: String },
    Error { error: String },
}

impl RpcResult {
    pub fn success(content: impl Into<String>) -> Self {
        RpcResult::Success {
            content: content.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        RpcResult::Error {
            error: format!("path not found: {}", path),
        }
    }

    pub fn invalid_envelope(reason: &str) -> Self {
        RpcResult::Error {
            error: format!("invalid rpc envelope: {}", reason),
        }
    }

    pub fn to_json(&self) -> Result<String, ServerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Llamada RPC empaquetada como un solo JSON
/// (`{"method": "POST", "path": "/x", "body": "..."}`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcEnvelope {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub body: String,
}
