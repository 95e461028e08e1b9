//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tablas de handlers indexadas por (verbo, path).
//!
//! ```text
//! (GET,  "/health")            ──► handler
//! (POST, "/v1/chat/completions") ──► handler
//! (OPTIONS, "/v1/chat/completions") ──► handler
//! ```
//!
//! - El match es exacto: sin wildcards, prefijos ni capturas `:param`.
//! - Registrar dos veces el mismo (verbo, path) reemplaza al anterior.
//! - Se registra en la fase de setup (`&mut self`); el lookup es `&self`
//!   y puede correr desde varios threads a la vez.

use crate::http::{Method, Request, Response};
use std::collections::HashMap;
use std::sync::Arc;

/// Un handler recibe el Request y muta la Response
pub type Handler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// Mapa path → handler para un solo verbo
#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    /// Inserta o reemplaza; retorna `true` si reemplazó uno existente
    pub fn insert(&mut self, path: &str, handler: Handler) -> bool {
        self.handlers.insert(path.to_string(), handler).is_some()
    }

    pub fn get(&self, path: &str) -> Option<&Handler> {
        self.handlers.get(path)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|p| p.as_str())
    }
}

/// Router con una tabla por verbo
#[derive(Default, Clone)]
pub struct Router {
    get: HandlerTable,
    post: HandlerTable,
    options: HandlerTable,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, method: Method) -> &HandlerTable {
        match method {
            Method::GET => &self.get,
            Method::POST => &self.post,
            Method::OPTIONS => &self.options,
        }
    }

    fn table_mut(&mut self, method: Method) -> &mut HandlerTable {
        match method {
            Method::GET => &mut self.get,
            Method::POST => &mut self.post,
            Method::OPTIONS => &mut self.options,
        }
    }

    /// Registra un handler; el último registro para (verbo, path) gana
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::http::{Method, Request, Response};
    /// use rpc_server::router::Router;
    /// use std::sync::Arc;
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", Arc::new(|_req: &Request, res: &mut Response| {
    ///     res.set_content("hello", "text/plain");
    /// }));
    /// assert!(router.lookup(Method::GET, "/hello").is_some());
    /// assert!(router.lookup(Method::POST, "/hello").is_none());
    /// ```
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) -> bool {
        self.table_mut(method).insert(path, handler)
    }

    /// Busca el handler para (verbo, path) con match exacto
    pub fn lookup(&self, method: Method, path: &str) -> Option<&Handler> {
        self.table(method).get(path)
    }

    /// Todas las rutas registradas, ordenadas por verbo y path
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut routes: Vec<(Method, String)> = [Method::GET, Method::POST, Method::OPTIONS]
            .into_iter()
            .flat_map(|m| self.table(m).paths().map(move |p| (m, p.to_string())))
            .collect();
        routes.sort();
        routes
    }

    /// Cantidad total de rutas
    pub fn len(&self) -> usize {
        self.get.len() + self.post.len() + self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
