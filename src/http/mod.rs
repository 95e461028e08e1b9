//! # Módulo HTTP
//!
//! Portadores de datos del modelo request/response. No hay parsing del
//! wire ni serialización a bytes: eso vive en la capa de transporte, que
//! le entrega al router un `Request` ya armado.
//!
//! - `request`: `Request`, `Method` y el alias `Headers`
//! - `response`: `Response` (body completo o chunked provider)
//! - `status`: códigos de estado

pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Headers, Method, Request};
pub use response::Response;
pub use status::StatusCode;
