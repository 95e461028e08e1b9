//! # RPC Server
//! src/lib.rs
//!
//! Router RPC en proceso: handlers registrados por (verbo, path),
//! despachados de forma síncrona con `rpc_call` o sobre un pool de
//! workers, con un sink para respuestas en streaming.
//!
//! ## Arquitectura
//!
//! - `task_queue`: trait `TaskQueue` y el `ThreadPool` de tamaño fijo
//! - `sink`: `DataSink` y el driver de content providers chunked
//! - `http`: Request, Response, verbos y status codes
//! - `router`: tablas de handlers por verbo
//! - `server`: el `Server`, sus hooks y el resultado JSON de `rpc_call`
//! - `engine`: superficie de un engine de inferencia montada como rutas
//! - `config` / `logging` / `error`: configuración CLI, tracing y errores
//!
//! ## Ejemplo de uso
//!
//! ```
//! use rpc_server::http::{Request, Response};
//! use rpc_server::server::Server;
//!
//! let mut server = Server::new();
//! server.get("/ping", |_: &Request, res: &mut Response| {
//!     res.set_content("pong", "text/plain");
//! });
//!
//! let result = server.rpc_call("GET", "/ping", "").unwrap();
//! assert_eq!(result, r#"{"status":"success","content":"pong"}"#);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod sink;
pub mod task_queue;

pub use error::ServerError;
