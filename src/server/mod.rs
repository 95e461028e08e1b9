//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! El servidor no abre sockets: registra handlers por verbo, guarda la
//! configuración del transporte y despacha llamadas en proceso.
//!
//! - `rpc`: el `Server` y `rpc_call`
//! - `hooks`: logger, error/exception handlers y factory de colas
//! - `result`: el JSON que recibe el caller

pub mod hooks;
pub mod result;
pub mod rpc;

pub use hooks::HandlerFailure;
pub use result::{RpcEnvelope, RpcResult};
pub use rpc::{Dispatch, Server};
