//! # Hooks del Servidor
//! src/server/hooks.rs
//!
//! Comportamiento enchufable como campos función (no jerarquía de tipos):
//! logger de accesos, error handler, exception handler y la factory de
//! colas de tareas.

use crate::error::ServerError;
use crate::http::{Request, Response};
use crate::task_queue::TaskQueue;
use std::any::Any;
use std::sync::Arc;

/// Se llama una vez por request despachado, con la respuesta final
pub type Logger = Arc<dyn Fn(&Request, &Response) + Send + Sync>;

/// Se llama cuando la respuesta terminó con status >= 400
pub type ErrorHandler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// Se llama cuando el handler hizo panic; puede reescribir la respuesta
pub type ExceptionHandler = Arc<dyn Fn(&Request, &mut Response, &HandlerFailure) + Send + Sync>;

/// Crea la cola donde la capa de transporte ejecuta handlers
pub type TaskQueueFactory = Arc<dyn Fn() -> Result<Box<dyn TaskQueue>, ServerError> + Send + Sync>;

/// Falla capturada dentro de un handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    message: String,
}

impl HandlerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extrae el mensaje del payload de un panic
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked with a non-string payload".to_string()
        };

        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
