//! # Servidor RPC
//! src/server/rpc.rs
//!
//! Dueño de las tablas de handlers, de la configuración que consume el
//! transporte y de los hooks. Expone `rpc_call`, el punto de entrada
//! síncrono que usan los embedders en lugar de un socket.
//!
//! ## Estados de un request
//!
//! ```text
//! RECEIVED ──lookup──► MATCHED ──► EXECUTING ──► COMPLETED
//!     │                                   └─panic─► ERRORED
//!     └──sin handler──► NOT_FOUND
//! ```
//!
//! `rpc_call` siempre ejecuta el handler inline. Quien quiera correrlo en
//! un pool usa `new_task_queue` + `spawn_rpc_call`.

use super::hooks::{ErrorHandler, ExceptionHandler, HandlerFailure, Logger, TaskQueueFactory};
use super::result::{RpcEnvelope, RpcResult};
use crate::config::Config;
use crate::error::ServerError;
use crate::http::{Headers, Method, Request, Response};
use crate::router::{Handler, Router};
use crate::sink::collect_chunked;
use crate::task_queue::{TaskQueue, ThreadPool};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resultado de despachar un Request
#[derive(Debug)]
pub enum Dispatch {
    /// El handler terminó (o el exception handler recuperó la respuesta)
    Completed(Response),

    /// No hay handler para (verbo, path)
    NotFound,
}

/// Servidor RPC
pub struct Server {
    router: Router,
    default_headers: Headers,

    // === Configuración del transporte ===
    read_timeout_secs: f64,
    write_timeout_secs: f64,
    base_dir: PathBuf,
    bound_address: Option<(String, u16)>,

    // === Hooks ===
    logger: Option<Logger>,
    error_handler: Option<ErrorHandler>,
    exception_handler: Option<ExceptionHandler>,
    new_task_queue: TaskQueueFactory,
}

impl Server {
    /// Servidor con la configuración por defecto
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Servidor con un logger de accesos inyectado desde la construcción
    pub fn with_logger<F>(logger: F) -> Self
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        let mut server = Self::new();
        server.set_logger(logger);
        server
    }

    /// Crea un servidor a partir de la configuración de CLI/env
    pub fn from_config(config: &Config) -> Self {
        let workers = config.workers;
        let max_queued = config.max_queued;

        let mut server = Self {
            router: Router::new(),
            default_headers: Headers::new(),
            read_timeout_secs: config.read_timeout_secs,
            write_timeout_secs: config.write_timeout_secs,
            base_dir: PathBuf::from(&config.base_dir),
            bound_address: None,
            logger: None,
            error_handler: None,
            exception_handler: None,
            new_task_queue: Arc::new(move || -> Result<Box<dyn TaskQueue>, ServerError> {
                let pool = ThreadPool::with_max_queued(workers, max_queued)?;
                Ok(Box::new(pool) as Box<dyn TaskQueue>)
            }),
        };

        server.bind_to_port(&config.host, config.port);
        server
    }

    // === Registro de handlers (fase de setup) ===

    fn install<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        if self.router.register(method, pattern, handler) {
            debug!(%method, pattern, "replaced handler");
        } else {
            debug!(%method, pattern, "install handler");
        }
        self
    }

    /// Registra un handler GET; el último registro para el path gana
    pub fn get<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.install(Method::GET, pattern, handler)
    }

    /// Registra un handler POST; el último registro para el path gana
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::http::{Request, Response};
    /// use rpc_server::server::Server;
    ///
    /// let mut server = Server::new();
    /// server.post("/echo", |req: &Request, res: &mut Response| {
    ///     res.set_content(req.body(), "application/json");
    /// });
    ///
    /// let result = server.rpc_call("POST", "/echo", r#"{"x":1}"#).unwrap();
    /// assert_eq!(result, r#"{"status":"success","content":"{\"x\":1}"}"#);
    /// ```
    pub fn post<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.install(Method::POST, pattern, handler)
    }

    /// Registra un handler OPTIONS; el último registro para el path gana
    pub fn options<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.install(Method::OPTIONS, pattern, handler)
    }

    /// Rutas registradas, ordenadas (para diagnóstico)
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }

    // === Configuración ===

    pub fn set_read_timeout(&mut self, secs: f64) {
        self.read_timeout_secs = secs;
    }

    pub fn set_write_timeout(&mut self, secs: f64) {
        self.write_timeout_secs = secs;
    }

    pub fn set_base_dir(&mut self, path: impl AsRef<Path>) {
        self.base_dir = path.as_ref().to_path_buf();
    }

    /// Headers que se copian en cada Response antes de correr el handler
    pub fn set_default_headers(&mut self, headers: Headers) {
        self.default_headers = headers;
    }

    pub fn set_logger<F>(&mut self, logger: F)
    where
        F: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(logger));
    }

    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
    }

    pub fn set_exception_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response, &HandlerFailure) + Send + Sync + 'static,
    {
        self.exception_handler = Some(Arc::new(handler));
    }

    /// Reemplaza la factory de colas (por defecto: ThreadPool según config)
    pub fn set_task_queue_factory<F>(&mut self, factory: F)
    where
        F: Fn() -> Result<Box<dyn TaskQueue>, ServerError> + Send + Sync + 'static,
    {
        self.new_task_queue = Arc::new(factory);
    }

    /// Guarda host/puerto para el transporte; el socket lo abre él
    pub fn bind_to_port(&mut self, host: &str, port: u16) -> bool {
        if host.trim().is_empty() {
            warn!(port, "bind_to_port rejected: empty host");
            return false;
        }
        self.bound_address = Some((host.to_string(), port));
        true
    }

    /// `true` si hay una dirección lista para que el transporte escuche
    pub fn listen_after_bind(&self) -> bool {
        match &self.bound_address {
            Some((host, port)) => {
                info!(%host, port, "listen after bind");
                true
            }
            None => false,
        }
    }

    pub fn read_timeout_secs(&self) -> f64 {
        self.read_timeout_secs
    }

    pub fn write_timeout_secs(&self) -> f64 {
        self.write_timeout_secs
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn bound_address(&self) -> Option<(&str, u16)> {
        self.bound_address.as_ref().map(|(h, p)| (h.as_str(), *p))
    }

    /// Crea una cola nueva con la factory configurada
    pub fn new_task_queue(&self) -> Result<Box<dyn TaskQueue>, ServerError> {
        (self.new_task_queue)()
    }

    // === Dispatch ===

    /// Busca y ejecuta el handler para el request
    ///
    /// El handler y su chunked provider (si dejó uno) corren dentro de un
    /// `catch_unwind`: un panic nunca sale de acá. Si hay exception
    /// handler, él decide la respuesta; si no, la falla vuelve al caller
    /// como `ServerError::HandlerPanicked`. La `Response` completada ya
    /// trae el body del provider materializado en `content`.
    pub fn dispatch(&self, req: &Request) -> Result<Dispatch, ServerError> {
        let handler = match self.router.lookup(req.method(), req.path()) {
            Some(handler) => handler,
            None => return Ok(Dispatch::NotFound),
        };

        let mut res = Response::with_headers(self.default_headers.clone());
        let outcome = Self::guarded(|| {
            handler(req, &mut res);
            Self::collect_body(&mut res);
        });

        if let Err(failure) = outcome {
            warn!(method = %req.method(), path = req.path(), error = %failure, "handler panicked");

            let hook = match &self.exception_handler {
                Some(hook) => hook,
                None => return Err(Self::panicked(req, &failure)),
            };
            hook(req, &mut res, &failure);

            // El hook también puede responder con un provider
            if let Err(failure) = Self::guarded(|| Self::collect_body(&mut res)) {
                warn!(method = %req.method(), path = req.path(), error = %failure, "exception handler provider panicked");
                return Err(Self::panicked(req, &failure));
            }
        }

        if res.status().is_error() {
            if let Some(hook) = &self.error_handler {
                hook(req, &mut res);
            }
        }

        if let Some(logger) = &self.logger {
            logger(req, &res);
        }

        Ok(Dispatch::Completed(res))
    }

    fn guarded(f: impl FnOnce()) -> Result<(), HandlerFailure> {
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(HandlerFailure::from_panic)
    }

    fn panicked(req: &Request, failure: &HandlerFailure) -> ServerError {
        ServerError::HandlerPanicked {
            method: req.method().to_string(),
            path: req.path().to_string(),
            message: failure.message().to_string(),
        }
    }

    /// Corre el provider (si hay) y deja su salida como `content`
    ///
    /// Sin socket no hay a dónde mandar el trailer: solo se registra.
    fn collect_body(res: &mut Response) {
        let mut provider = match res.take_chunked_content_provider() {
            Some(provider) => provider,
            None => return,
        };

        let collected = collect_chunked(&mut provider);
        debug!(
            rounds = collected.outcome.rounds,
            bytes = collected.outcome.bytes_written,
            trailer = collected.trailer.is_some(),
            "chunked content collected"
        );

        let content_type = res.content_type().to_string();
        res.set_content(String::from_utf8_lossy(&collected.body).into_owned(), &content_type);
    }

    /// Punto de entrada síncrono: despacha y serializa el resultado
    ///
    /// El path se compara tal cual, query string incluido. Un verbo
    /// desconocido se trata como ruta inexistente.
    pub fn rpc_call(&self, method: &str, path: &str, body: &str) -> Result<String, ServerError> {
        info!(method, path, body_len = body.len(), "rpc call");

        let method = match method.parse::<Method>() {
            Ok(m) => m,
            Err(_) => return RpcResult::not_found(path).to_json(),
        };

        let req = Request::new(method, path).with_body(body);

        let result = match self.dispatch(&req)? {
            Dispatch::NotFound => {
                info!(%method, path, "path not found");
                RpcResult::not_found(path)
            }
            Dispatch::Completed(res) => {
                debug!(%method, path, status = %res.status(), "rpc response");
                RpcResult::success(res.content())
            }
        };

        result.to_json()
    }

    /// Interpreta un envelope `{"method", "path", "body"}`
    ///
    /// Si no se puede, el `Err` ya es el resultado de error listo para
    /// devolver al caller.
    pub fn parse_envelope(envelope: &str) -> Result<RpcEnvelope, RpcResult> {
        serde_json::from_str::<RpcEnvelope>(envelope).map_err(|e| {
            warn!(error = %e, "invalid rpc envelope");
            RpcResult::invalid_envelope(&e.to_string())
        })
    }

    /// Igual que `rpc_call` pero con la llamada empaquetada en un JSON
    /// `{"method", "path", "body"}`
    pub fn rpc_call_json(&self, envelope: &str) -> Result<String, ServerError> {
        match Self::parse_envelope(envelope) {
            Ok(call) => self.rpc_call(&call.method, &call.path, &call.body),
            Err(result) => result.to_json(),
        }
    }

    /// Encola un `rpc_call` en `queue`; `reply` recibe el resultado en el
    /// thread del worker
    ///
    /// Retorna la decisión de admisión de la cola: con `false` el job no
    /// se encoló y `reply` no se llama.
    pub fn spawn_rpc_call<F>(
        self: &Arc<Self>,
        queue: &dyn TaskQueue,
        method: &str,
        path: &str,
        body: &str,
        reply: F,
    ) -> bool
    where
        F: FnOnce(Result<String, ServerError>) + Send + 'static,
    {
        let server = Arc::clone(self);
        let (method, path, body) = (method.to_string(), path.to_string(), body.to_string());

        let accepted = queue.enqueue(Box::new(move || {
            reply(server.rpc_call(&method, &path, &body));
        }));

        if !accepted {
            warn!("rpc call rejected by task queue");
        }
        accepted
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use crate::sink::DataSink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn echo_server() -> Server {
        let mut server = Server::new();
        server.post("/echo", |req: &Request, res: &mut Response| {
            res.set_content(req.body(), "application/json");
        });
        server
    }

    #[test]
    fn test_echo_scenario() {
        let server = echo_server();
        let result = server.rpc_call("POST", "/echo", "{\"x\":1}").unwrap();
        assert_eq!(result, "{\"status\":\"success\",\"content\":\"{\\\"x\\\":1}\"}");
    }

    #[test]
    fn test_missing_scenario() {
        let server = Server::new();
        let result = server.rpc_call("GET", "/missing", "").unwrap();
        assert_eq!(result, r#"{"status":"error","error":"path not found: /missing"}"#);
    }

    #[test]
    fn test_handler_invoked_exactly_once() {
        let mut server = Server::new();
        let hits_a = counter();
        let hits_b = counter();

        let a = Arc::clone(&hits_a);
        server.get("/a", move |_: &Request, _: &mut Response| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&hits_b);
        server.get("/b", move |_: &Request, _: &mut Response| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        server.rpc_call("GET", "/a", "").unwrap();
        assert_eq!(hits_a.load(Ordering::SeqCst), 1);
        assert_eq!(hits_b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_not_found_invokes_nothing() {
        let mut server = Server::new();
        let hits = counter();
        let hooks = counter();

        let h = Arc::clone(&hits);
        server.post("/only-post", move |_: &Request, _: &mut Response| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let k = Arc::clone(&hooks);
        server.set_exception_handler(move |_: &Request, _: &mut Response, _: &HandlerFailure| {
            k.fetch_add(1, Ordering::SeqCst);
        });
        let k = Arc::clone(&hooks);
        server.set_error_handler(move |_: &Request, _: &mut Response| {
            k.fetch_add(1, Ordering::SeqCst);
        });
        let k = Arc::clone(&hooks);
        server.set_logger(move |_: &Request, _: &Response| {
            k.fetch_add(1, Ordering::SeqCst);
        });

        let result = server.rpc_call("GET", "/only-post", "").unwrap();
        assert_eq!(result, r#"{"status":"error","error":"path not found: /only-post"}"#);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut server = Server::new();
        let first = counter();
        let second = counter();

        let f = Arc::clone(&first);
        server.post("/echo", move |_: &Request, res: &mut Response| {
            f.fetch_add(1, Ordering::SeqCst);
            res.set_content("first", "text/plain");
        });
        let s = Arc::clone(&second);
        server.post("/echo", move |_: &Request, res: &mut Response| {
            s.fetch_add(1, Ordering::SeqCst);
            res.set_content("second", "text/plain");
        });

        let result = server.rpc_call("POST", "/echo", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"second"}"#);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(server.routes().len(), 1);
    }

    #[test]
    fn test_unknown_method_is_not_found() {
        let server = echo_server();
        let result = server.rpc_call("PUT", "/echo", "{}").unwrap();
        assert_eq!(result, r#"{"status":"error","error":"path not found: /echo"}"#);
    }

    #[test]
    fn test_options_route() {
        let mut server = Server::new();
        server.options("/v1/chat/completions", |_: &Request, res: &mut Response| {
            res.set_header("Allow", "POST, OPTIONS");
            res.set_content("", "text/plain");
        });

        let result = server.rpc_call("OPTIONS", "/v1/chat/completions", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":""}"#);
    }

    #[test]
    fn test_query_string_is_part_of_the_path() {
        let mut server = Server::new();
        server.get("/a?x=1", |_: &Request, res: &mut Response| {
            res.set_content("literal", "text/plain");
        });
        server.get("/a", |req: &Request, res: &mut Response| {
            res.set_content(format!("plain {}", req.params().len()), "text/plain");
        });

        assert_eq!(
            server.rpc_call("GET", "/a?x=1", "").unwrap(),
            r#"{"status":"success","content":"literal"}"#
        );
        assert_eq!(
            server.rpc_call("GET", "/a", "").unwrap(),
            r#"{"status":"success","content":"plain 0"}"#
        );
        assert_eq!(
            server.rpc_call("GET", "/a?x=2", "").unwrap(),
            r#"{"status":"error","error":"path not found: /a?x=2"}"#
        );
    }

    fn exploding_stream_server() -> Server {
        let mut server = Server::new();
        server.get("/stream", |_: &Request, res: &mut Response| {
            res.set_chunked_content_provider("text/plain", |offset: usize, sink: &mut DataSink<'_>| {
                if offset > 0 {
                    panic!("provider exploded");
                }
                sink.write_chunk(b"first");
                true
            });
        });
        server.get("/ok", |_: &Request, res: &mut Response| {
            res.set_content("ok", "text/plain");
        });
        server
    }

    #[test]
    fn test_provider_panic_without_hook_is_an_error() {
        let server = exploding_stream_server();

        match server.rpc_call("GET", "/stream", "") {
            Err(ServerError::HandlerPanicked { path, message, .. }) => {
                assert_eq!(path, "/stream");
                assert_eq!(message, "provider exploded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(
            server.rpc_call("GET", "/ok", "").unwrap(),
            r#"{"status":"success","content":"ok"}"#
        );
    }

    #[test]
    fn test_provider_panic_goes_to_exception_handler() {
        let mut server = exploding_stream_server();
        let calls = counter();
        let c = Arc::clone(&calls);
        server.set_exception_handler(move |_: &Request, res: &mut Response, failure: &HandlerFailure| {
            c.fetch_add(1, Ordering::SeqCst);
            assert!(!res.has_chunked_content_provider());
            res.set_status(StatusCode::InternalServerError);
            res.set_content(format!("stream failed: {}", failure), "text/plain");
        });

        let result = server.rpc_call("GET", "/stream", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"stream failed: provider exploded"}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exception_handler_may_stream() {
        let mut server = exploding_stream_server();
        server.set_exception_handler(|_: &Request, res: &mut Response, _: &HandlerFailure| {
            res.set_chunked_content_provider("text/plain", |_: usize, sink: &mut DataSink<'_>| {
                sink.write_chunk(b"fallback");
                false
            });
        });

        let result = server.rpc_call("GET", "/stream", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"fallback"}"#);
    }

    #[test]
    fn test_provider_panic_keeps_pool_worker_alive() {
        let server = Arc::new(exploding_stream_server());
        let queue: Box<dyn TaskQueue> = Box::new(ThreadPool::new(1).unwrap());

        let (tx, rx) = mpsc::channel();
        for path in ["/stream", "/ok"] {
            let tx = tx.clone();
            assert!(server.spawn_rpc_call(queue.as_ref(), "GET", path, "", move |r| {
                tx.send(r.map_err(|e| e.to_string())).unwrap();
            }));
        }

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(first.unwrap_err().contains("provider exploded"));
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second.unwrap(), r#"{"status":"success","content":"ok"}"#);

        queue.shutdown();
    }

    #[test]
    fn test_chunked_provider_takes_precedence() {
        let mut server = Server::new();
        server.get("/stream", |_: &Request, res: &mut Response| {
            res.set_content("plain body", "text/plain");
            res.set_chunked_content_provider("text/plain", |offset: usize, sink: &mut DataSink<'_>| {
                sink.write_chunk(format!("[{}]", offset).as_bytes());
                offset < 6
            });
        });

        let result = server.rpc_call("GET", "/stream", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"[0][3][6]"}"#);
    }

    #[test]
    fn test_default_headers_applied() {
        let mut server = Server::new();
        let mut defaults = Headers::new();
        defaults.insert("X-Server".to_string(), "rpc".to_string());
        server.set_default_headers(defaults);

        server.get("/h", |_: &Request, res: &mut Response| {
            let value = res.header("X-Server").unwrap_or("missing").to_string();
            res.set_content(value, "text/plain");
        });

        let result = server.rpc_call("GET", "/h", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"rpc"}"#);
    }

    #[test]
    fn test_panic_without_hook_propagates() {
        let mut server = Server::new();
        server.post("/boom", |_: &Request, _: &mut Response| panic!("kaboom"));

        let err = server.rpc_call("POST", "/boom", "").unwrap_err();
        match err {
            ServerError::HandlerPanicked { method, path, message } => {
                assert_eq!(method, "POST");
                assert_eq!(path, "/boom");
                assert_eq!(message, "kaboom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exception_handler_rewrites_response() {
        let mut server = Server::new();
        server.post("/boom", |_: &Request, res: &mut Response| {
            res.set_content("partial", "text/plain");
            panic!("kaboom");
        });
        server.set_exception_handler(|req: &Request, res: &mut Response, failure: &HandlerFailure| {
            res.set_status(StatusCode::InternalServerError);
            res.set_content(format!("{} failed: {}", req.path(), failure), "text/plain");
        });

        let result = server.rpc_call("POST", "/boom", "").unwrap();
        assert_eq!(result, r#"{"status":"success","content":"/boom failed: kaboom"}"#);
    }

    #[test]
    fn test_error_handler_runs_on_error_status() {
        let mut server = Server::new();
        server.get("/bad", |_: &Request, res: &mut Response| {
            res.set_status(StatusCode::BadRequest);
        });
        server.get("/good", |_: &Request, res: &mut Response| {
            res.set_content("ok", "text/plain");
        });
        server.set_error_handler(|_: &Request, res: &mut Response| {
            let body = format!("error {}", res.status().as_u16());
            res.set_content(body, "text/plain");
        });

        assert_eq!(
            server.rpc_call("GET", "/bad", "").unwrap(),
            r#"{"status":"success","content":"error 400"}"#
        );
        assert_eq!(
            server.rpc_call("GET", "/good", "").unwrap(),
            r#"{"status":"success","content":"ok"}"#
        );
    }

    #[test]
    fn test_logger_sees_final_response() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut server = Server::with_logger(move |req: &Request, res: &Response| {
            log.lock()
                .unwrap()
                .push(format!("{} {} -> {}", req.method(), req.path(), res.content()));
        });
        server.post("/echo", |req: &Request, res: &mut Response| {
            res.set_content(req.body(), "text/plain");
        });

        server.rpc_call("POST", "/echo", "hola").unwrap();
        server.rpc_call("POST", "/nope", "x").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["POST /echo -> hola".to_string()]);
    }

    #[test]
    fn test_configuration_is_stored() {
        let mut server = Server::new();
        server.set_read_timeout(1.5);
        server.set_write_timeout(2.5);
        server.set_base_dir("/tmp/models");

        assert_eq!(server.read_timeout_secs(), 1.5);
        assert_eq!(server.write_timeout_secs(), 2.5);
        assert_eq!(server.base_dir(), Path::new("/tmp/models"));
    }

    #[test]
    fn test_bind_and_listen() {
        let mut server = Server::new();
        assert_eq!(server.bound_address(), Some(("127.0.0.1", 8080)));

        assert!(server.bind_to_port("0.0.0.0", 9090));
        assert_eq!(server.bound_address(), Some(("0.0.0.0", 9090)));
        assert!(server.listen_after_bind());

        assert!(!server.bind_to_port("", 1));
        assert_eq!(server.bound_address(), Some(("0.0.0.0", 9090)));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.read_timeout_secs = 30.0;
        config.base_dir = "/srv/rpc".to_string();
        config.port = 7000;

        let server = Server::from_config(&config);
        assert_eq!(server.read_timeout_secs(), 30.0);
        assert_eq!(server.base_dir(), Path::new("/srv/rpc"));
        assert_eq!(server.bound_address(), Some(("127.0.0.1", 7000)));
    }

    #[test]
    fn test_rpc_call_json() {
        let server = echo_server();

        let ok = server
            .rpc_call_json(r#"{"method":"POST","path":"/echo","body":"{\"x\":1}"}"#)
            .unwrap();
        assert_eq!(ok, r#"{"status":"success","content":"{\"x\":1}"}"#);

        let bad = server.rpc_call_json("not json").unwrap();
        assert!(bad.starts_with(r#"{"status":"error","error":"invalid rpc envelope: "#));
    }

    #[test]
    fn test_parse_envelope() {
        let call = Server::parse_envelope(r#"{"method":"GET","path":"/status"}"#).unwrap();
        assert_eq!((call.method.as_str(), call.path.as_str(), call.body.as_str()), ("GET", "/status", ""));

        let err = Server::parse_envelope(r#"{"path":"/status"}"#).unwrap_err();
        assert!(matches!(err, RpcResult::Error { ref error } if error.starts_with("invalid rpc envelope: ")));
    }

    #[test]
    fn test_spawn_rpc_call_on_pool() {
        let mut config = Config::default();
        config.workers = 2;
        let mut server = Server::from_config(&config);
        server.post("/echo", |req: &Request, res: &mut Response| {
            res.set_content(req.body(), "text/plain");
        });
        let server = Arc::new(server);
        let queue = server.new_task_queue().unwrap();

        let (tx, rx) = mpsc::channel();
        for i in 0..10 {
            let tx = tx.clone();
            let body = format!("msg-{}", i);
            assert!(server.spawn_rpc_call(queue.as_ref(), "POST", "/echo", &body, move |r| {
                tx.send(r.unwrap()).unwrap();
            }));
        }

        queue.shutdown();
        let mut results: Vec<String> = rx.try_iter().collect();
        results.sort();
        assert_eq!(results.len(), 10);
        assert!(results.contains(&r#"{"status":"success","content":"msg-7"}"#.to_string()));
    }

    #[test]
    fn test_spawn_rpc_call_rejected_when_full() {
        let mut server = Server::new();
        let (block_tx, block_rx) = mpsc::channel::<()>();
        let block_rx = Arc::new(Mutex::new(block_rx));
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);

        server.get("/slow", move |_: &Request, _: &mut Response| {
            started_tx.lock().unwrap().send(()).unwrap();
            let _ = block_rx.lock().unwrap().recv();
        });
        server.set_task_queue_factory(|| Ok(Box::new(ThreadPool::with_max_queued(1, 1)?) as Box<dyn TaskQueue>));

        let server = Arc::new(server);
        let queue = server.new_task_queue().unwrap();
        let replies = counter();

        let r = Arc::clone(&replies);
        assert!(server.spawn_rpc_call(queue.as_ref(), "GET", "/slow", "", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let r = Arc::clone(&replies);
        assert!(server.spawn_rpc_call(queue.as_ref(), "GET", "/missing", "", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        let r = Arc::clone(&replies);
        assert!(!server.spawn_rpc_call(queue.as_ref(), "GET", "/missing", "", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        }));

        drop(block_tx);
        queue.shutdown();
        assert_eq!(replies.load(Ordering::SeqCst), 2);
    }
}
