//! # Superficie del Engine de Inferencia
//! src/engine/mod.rs
//!
//! El engine es opaco para el servidor: cada método recibe y retorna
//! texto (normalmente JSON) y `mount_engine` los monta como handlers.
//!
//! ## Rutas montadas
//!
//! | Verbo   | Path                          | Método del engine         |
//! |---------|-------------------------------|---------------------------|
//! | POST    | /init                         | `init`                    |
//! | POST    | /init_async                   | `init_async`              |
//! | POST    | /deinit                       | `deinit`                  |
//! | GET     | /status                       | `poll_system_status`      |
//! | POST    | /tokenize                     | `tokenize`                |
//! | POST    | /v1/chat/completions          | `get_completion`          |
//! | OPTIONS | /v1/chat/completions          | (preflight)               |
//! | POST    | /v1/chat/completions/async    | `async_completion_init`   |
//! | POST    | /v1/chat/completions/poll     | `async_completion_poll`   |
//! | POST    | /v1/chat/completions/cancel   | `async_completion_cancel` |
//! | POST    | /state/save                   | `save_state`              |
//! | POST    | /state/load                   | `load_state`              |

mod echo;

pub use echo::EchoEngine;

use crate::http::{Request, Response};
use crate::server::Server;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const JSON: &str = "application/json";

/// Entry points de un engine de inferencia
pub trait InferenceEngine: Send + Sync {
    /// Inicialización bloqueante; `false` si el engine no quedó listo
    fn init(&self, cmd: &str) -> bool;

    /// Inicialización en segundo plano; el progreso se ve en `poll_system_status`
    fn init_async(&self, cmd: &str);

    fn tokenize(&self, req_json: &str) -> String;

    fn poll_system_status(&self) -> String;

    fn get_completion(&self, req_json: &str) -> String;

    fn async_completion_init(&self, req_json: &str) -> String;

    fn async_completion_poll(&self, cmd_json: &str) -> String;

    fn async_completion_cancel(&self, req_json: &str) -> String;

    fn save_state(&self, req_json: &str) -> String;

    fn load_state(&self, req_json: &str) -> String;

    fn deinit(&self);
}

/// Registra los entry points del engine en el servidor
pub fn mount_engine(server: &mut Server, engine: Arc<dyn InferenceEngine>) {
    let e = Arc::clone(&engine);
    server.post("/init", move |req: &Request, res: &mut Response| {
        let ok = e.init(req.body());
        res.set_content(json!({ "ok": ok }).to_string(), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/init_async", move |req: &Request, res: &mut Response| {
        e.init_async(req.body());
        res.set_content(json!({ "started": true }).to_string(), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/deinit", move |_: &Request, res: &mut Response| {
        e.deinit();
        res.set_content(json!({ "ok": true }).to_string(), JSON);
    });

    let e = Arc::clone(&engine);
    server.get("/status", move |_: &Request, res: &mut Response| {
        res.set_content(e.poll_system_status(), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/tokenize", move |req: &Request, res: &mut Response| {
        res.set_content(e.tokenize(req.body()), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/v1/chat/completions", move |req: &Request, res: &mut Response| {
        res.set_content(e.get_completion(req.body()), JSON);
    });

    server.options("/v1/chat/completions", |_: &Request, res: &mut Response| {
        res.set_header("Allow", "POST, OPTIONS");
        res.set_content("", "text/plain");
    });

    let e = Arc::clone(&engine);
    server.post("/v1/chat/completions/async", move |req: &Request, res: &mut Response| {
        res.set_content(e.async_completion_init(req.body()), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/v1/chat/completions/poll", move |req: &Request, res: &mut Response| {
        res.set_content(e.async_completion_poll(req.body()), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/v1/chat/completions/cancel", move |req: &Request, res: &mut Response| {
        res.set_content(e.async_completion_cancel(req.body()), JSON);
    });

    let e = Arc::clone(&engine);
    server.post("/state/save", move |req: &Request, res: &mut Response| {
        res.set_content(e.save_state(req.body()), JSON);
    });

    server.post("/state/load", move |req: &Request, res: &mut Response| {
        res.set_content(engine.load_state(req.body()), JSON);
    });

    info!(routes = server.routes().len(), "engine mounted");
}
