//! # Errores del Servidor RPC
//! src/error.rs
//!
//! Taxonomía de errores que la capa de dispatch puede devolver al caller.
//! El "path not found" NO es un error de Rust: se resuelve localmente
//! y se serializa como resultado estructurado (ver `server::RpcResult`).

use thiserror::Error;

/// Errores del router/servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// Verbo HTTP que el router no maneja (ej: "PUT")
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// El handler hizo panic y no había exception handler registrado
    #[error("handler for {method} {path} panicked: {message}")]
    HandlerPanicked {
        method: String,
        path: String,
        message: String,
    },

    /// Error serializando el resultado
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuración inválida
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No se pudo crear un thread del pool
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
