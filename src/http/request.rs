//! # Request
//! src/http/request.rs
//!
//! Snapshot de una llamada entrante. El parsing del wire HTTP lo hace la
//! capa de transporte (fuera de este crate); acá solo se construye el
//! Request a partir de campos ya parseados y se expone en solo-lectura
//! a los handlers.
//!
//! ## Dos mapas de parámetros
//!
//! - `params`: query string (`/tokenize?lang=es` → `{"lang": "es"}`)
//! - `path_params`: capturas con nombre del path. El router actual hace
//!   match exacto, así que solo se llenan si el transporte las provee.

use crate::error::ServerError;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Headers ordenados por nombre
pub type Headers = BTreeMap<String, String>;

/// Verbos que el router sabe despachar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    GET,
    POST,
    OPTIONS,
}

impl Method {
    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = ServerError;

    /// Match exacto y case-sensitive, como en la request line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(ServerError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request ya parseado, inmutable una vez construido
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path (ej: "/v1/chat/completions"); sin query string solo si vino
    /// de `from_target`
    path: String,

    /// Query parameters
    params: HashMap<String, String>,

    /// Capturas con nombre del path
    path_params: HashMap<String, String>,

    headers: Headers,

    /// Payload de texto (normalmente JSON opaco)
    body: String,

    remote_addr: String,
    remote_port: u16,
}

impl Request {
    /// Crea un request con el path tal cual llega: sin separar query string
    ///
    /// Es lo que usa `rpc_call`, donde el path se compara por igualdad exacta.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            params: HashMap::new(),
            path_params: HashMap::new(),
            headers: Headers::new(),
            body: String::new(),
            remote_addr: String::new(),
            remote_port: 0,
        }
    }

    /// Crea un request desde el target de una request line: si trae query
    /// string, se separa en path y params
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::http::{Method, Request};
    ///
    /// let req = Request::from_target(Method::GET, "/tokenize?lang=es&raw");
    /// assert_eq!(req.path(), "/tokenize");
    /// assert_eq!(req.param("lang"), Some("es"));
    /// assert!(req.has_param("raw"));
    /// ```
    pub fn from_target(method: Method, target: &str) -> Self {
        let (path, params) = Self::parse_path_and_query(target);

        Self {
            path,
            params,
            ..Self::new(method, "")
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Si el header ya existe, se sobrescribe
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    /// Metadata del endpoint remoto
    pub fn with_remote(mut self, addr: &str, port: u16) -> Self {
        self.remote_addr = addr.to_string();
        self.remote_port = port;
        self
    }

    /// Separa "/path?a=1&b" en ("/path", {"a": "1", "b": ""})
    fn parse_path_and_query(target: &str) -> (String, HashMap<String, String>) {
        match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Self::parse_query_string(query)),
            None => (target.to_string(), HashMap::new()),
        }
    }

    fn parse_query_string(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), Self::url_decode(value)),
                // Parámetro sin valor (ej: "?debug")
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }

    /// Decodificación mínima: '+' y %XX
    fn url_decode(s: &str) -> String {
        let bytes = s.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'+' => out.push(b' '),
                b'%' if i + 2 < bytes.len() => {
                    let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                    match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                        Some(b) => {
                            out.push(b);
                            i += 2;
                        }
                        None => out.push(b'%'),
                    }
                }
                b => out.push(b),
            }
            i += 1;
        }

        String::from_utf8_lossy(&out).into_owned()
    }

    // === Accessors ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn remote_port(&self) -> u16 {
        self.remote_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::GET);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::POST);
        assert_eq!("OPTIONS".parse::<Method>().unwrap(), Method::OPTIONS);
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let result = "post".parse::<Method>();
        assert!(matches!(result, Err(ServerError::UnsupportedMethod(m)) if m == "post"));
    }

    #[test]
    fn test_unsupported_method() {
        assert!("PUT".parse::<Method>().is_err());
        assert!("".parse::<Method>().is_err());
    }

    #[test]
    fn test_plain_path() {
        let req = Request::new(Method::POST, "/echo");
        assert_eq!(req.path(), "/echo");
        assert!(req.params().is_empty());
        assert!(req.path_params().is_empty());
        assert_eq!(req.body(), "");
    }

    #[test]
    fn test_new_keeps_query_in_path() {
        let req = Request::new(Method::GET, "/a?x=1");
        assert_eq!(req.path(), "/a?x=1");
        assert!(req.params().is_empty());
    }

    #[test]
    fn test_query_params() {
        let req = Request::from_target(Method::GET, "/status?verbose=1&fmt=json");
        assert_eq!(req.path(), "/status");
        assert_eq!(req.param("verbose"), Some("1"));
        assert_eq!(req.param("fmt"), Some("json"));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn test_query_flag_without_value() {
        let req = Request::from_target(Method::GET, "/status?debug&&x=");
        assert!(req.has_param("debug"));
        assert_eq!(req.param("debug"), Some(""));
        assert_eq!(req.param("x"), Some(""));
        assert_eq!(req.params().len(), 2);
    }

    #[test]
    fn test_url_decode() {
        let req = Request::from_target(Method::GET, "/t?text=hello%20world&q=a+b&pct=100%25");
        assert_eq!(req.param("text"), Some("hello world"));
        assert_eq!(req.param("q"), Some("a b"));
        assert_eq!(req.param("pct"), Some("100%"));
    }

    #[test]
    fn test_url_decode_malformed_escape() {
        let req = Request::from_target(Method::GET, "/t?a=%zz&b=%4");
        assert_eq!(req.param("a"), Some("%zz"));
        assert_eq!(req.param("b"), Some("%4"));
    }

    #[test]
    fn test_builder_fields() {
        let req = Request::new(Method::POST, "/v1/chat/completions")
            .with_body(r#"{"messages":[]}"#)
            .with_header("Content-Type", "application/json")
            .with_path_param("model", "tiny")
            .with_remote("127.0.0.1", 5555);

        assert_eq!(req.body(), r#"{"messages":[]}"#);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert!(req.has_header("Content-Type"));
        assert!(!req.has_header("Accept"));
        assert_eq!(req.path_param("model"), Some("tiny"));
        assert_eq!(req.remote_addr(), "127.0.0.1");
        assert_eq!(req.remote_port(), 5555);
    }
}
