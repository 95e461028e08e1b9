//! # Response
//!
//! Acumulador mutable del resultado de un handler. El body sale de una
//! de dos fuentes:
//!
//! - `content`: body completo, seteado con `set_content`
//! - chunked provider: función que escribe el body de a pedazos en un
//!   `DataSink` (ver `crate::sink::chunked`)
//!
//! Si ambas están seteadas, manda el provider.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use rpc_server::http::{Response, StatusCode};
//!
//! let mut res = Response::new();
//! res.set_content(r#"{"tokens": [1, 2, 3]}"#, "application/json");
//! res.set_header("X-Engine", "echo");
//!
//! assert_eq!(res.status(), StatusCode::Ok);
//! assert_eq!(res.content_type(), "application/json");
//! ```

use super::{Headers, StatusCode};
use crate::sink::{ContentProvider, DataSink};

pub struct Response {
    status: StatusCode,

    /// Si el header ya existe, se sobrescribe
    headers: Headers,

    content: String,
    content_type: String,

    chunked_content_provider: Option<ContentProvider>,
}

impl Response {
    /// Response vacía con status 200
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Headers::new(),
            content: String::new(),
            content_type: String::new(),
            chunked_content_provider: None,
        }
    }

    /// Response con headers iniciales (los default headers del servidor)
    pub fn with_headers(headers: Headers) -> Self {
        Self {
            headers,
            ..Self::new()
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body completo y su content type
    pub fn set_content(&mut self, content: impl Into<String>, content_type: &str) {
        self.content = content.into();
        self.content_type = content_type.to_string();
    }

    /// Registra un provider que produce el body de a chunks
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::http::Response;
    /// use rpc_server::sink::DataSink;
    ///
    /// let mut res = Response::new();
    /// res.set_chunked_content_provider("text/event-stream", |offset: usize, sink: &mut DataSink<'_>| {
    ///     sink.write_chunk(b"data: hola\n\n");
    ///     offset == 0
    /// });
    /// assert!(res.has_chunked_content_provider());
    /// ```
    pub fn set_chunked_content_provider<F>(&mut self, content_type: &str, provider: F)
    where
        F: FnMut(usize, &mut DataSink<'_>) -> bool + Send + 'static,
    {
        self.content_type = content_type.to_string();
        self.chunked_content_provider = Some(Box::new(provider));
    }

    pub fn has_chunked_content_provider(&self) -> bool {
        self.chunked_content_provider.is_some()
    }

    /// Saca el provider para que la capa de salida lo ejecute
    pub fn take_chunked_content_provider(&mut self) -> Option<ContentProvider> {
        self.chunked_content_provider.take()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content", &self.content)
            .field("content_type", &self.content_type)
            .field("chunked", &self.chunked_content_provider.is_some())
            .finish()
    }
}
