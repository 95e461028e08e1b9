//! # Códigos de Estado
//!
//! El router no valida semántica HTTP: el status es solo un dato que el
//! handler deja en la `Response` y que decide si corre el error handler
//! (status >= 400).

/// Códigos de estado que usan los handlers del servidor RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCode {
    /// 200 OK - Valor inicial de toda Response
    #[default]
    Ok = 200,

    /// 204 No Content
    NoContent = 204,

    /// 400 Bad Request - Payload que el handler no pudo interpretar
    BadRequest = 400,

    /// 404 Not Found
    NotFound = 404,

    /// 500 Internal Server Error - Típicamente seteado por el exception handler
    InternalServerError = 500,

    /// 503 Service Unavailable - Pool lleno (admission control)
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Valor numérico del código
    ///
    /// ```
    /// use rpc_server::http::StatusCode;
    /// assert_eq!(StatusCode::ServiceUnavailable.as_u16(), 503);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Verifica si el código es 4xx o 5xx
    pub fn is_error(&self) -> bool {
        self.as_u16() >= 400
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
