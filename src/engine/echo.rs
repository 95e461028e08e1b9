//! # EchoEngine
//! src/engine/echo.rs
//!
//! Engine loopback: la "completion" es el último mensaje del usuario y
//! los tokens son las palabras del texto. Sirve para el binario demo y
//! para probar el montaje de rutas sin un modelo real.

use super::InferenceEngine;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct TokenizeRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TaskRef {
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct StateRef {
    name: String,
}

#[derive(Debug, Default)]
struct EchoState {
    model: Option<String>,
    next_task_id: u64,
    /// task_id -> completion lista para el próximo poll
    tasks: HashMap<u64, String>,
    /// nombre -> modelo guardado
    saved: HashMap<String, String>,
}

/// Engine de prueba sin modelo
#[derive(Debug, Default)]
pub struct EchoEngine {
    state: Mutex<EchoState>,
}

fn error_json(message: impl std::fmt::Display) -> String {
    json!({ "error": message.to_string() }).to_string()
}

impl EchoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EchoState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Última intervención del usuario (o del último mensaje si no hay roles)
    fn complete(req_json: &str) -> Result<String, String> {
        let req: ChatRequest = serde_json::from_str(req_json).map_err(|e| e.to_string())?;
        req.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .or_else(|| req.messages.last())
            .map(|m| m.content.clone())
            .ok_or_else(|| "no messages".to_string())
    }
}

impl InferenceEngine for EchoEngine {
    fn init(&self, cmd: &str) -> bool {
        let model = cmd.trim();
        let model = if model.is_empty() { "echo" } else { model };
        debug!(model, "echo engine init");
        self.with_state(|s| s.model = Some(model.to_string()));
        true
    }

    fn init_async(&self, cmd: &str) {
        // No hay nada que cargar: queda listo de inmediato
        self.init(cmd);
    }

    fn tokenize(&self, req_json: &str) -> String {
        match serde_json::from_str::<TokenizeRequest>(req_json) {
            Ok(req) => {
                let tokens: Vec<&str> = req.content.split_whitespace().collect();
                json!({ "tokens": tokens, "count": tokens.len() }).to_string()
            }
            Err(e) => error_json(e),
        }
    }

    fn poll_system_status(&self) -> String {
        self.with_state(|s| {
            json!({
                "initialized": s.model.is_some(),
                "model": s.model,
                "pending_tasks": s.tasks.len(),
            })
            .to_string()
        })
    }

    fn get_completion(&self, req_json: &str) -> String {
        let model = match self.with_state(|s| s.model.clone()) {
            Some(model) => model,
            None => return error_json("engine not initialized"),
        };

        match Self::complete(req_json) {
            Ok(content) => json!({
                "model": model,
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop",
                }],
            })
            .to_string(),
            Err(e) => {
                warn!(error = %e, "bad completion request");
                error_json(e)
            }
        }
    }

    fn async_completion_init(&self, req_json: &str) -> String {
        let content = match Self::complete(req_json) {
            Ok(content) => content,
            Err(e) => return error_json(e),
        };

        self.with_state(|s| {
            if s.model.is_none() {
                return error_json("engine not initialized");
            }
            s.next_task_id += 1;
            let id = s.next_task_id;
            s.tasks.insert(id, content);
            json!({ "task_id": id }).to_string()
        })
    }

    fn async_completion_poll(&self, cmd_json: &str) -> String {
        let task = match serde_json::from_str::<TaskRef>(cmd_json) {
            Ok(task) => task,
            Err(e) => return error_json(e),
        };

        match self.with_state(|s| s.tasks.remove(&task.task_id)) {
            Some(content) => json!({
                "task_id": task.task_id,
                "done": true,
                "content": content,
            })
            .to_string(),
            None => error_json(format!("unknown task: {}", task.task_id)),
        }
    }

    fn async_completion_cancel(&self, req_json: &str) -> String {
        let task = match serde_json::from_str::<TaskRef>(req_json) {
            Ok(task) => task,
            Err(e) => return error_json(e),
        };

        let cancelled = self.with_state(|s| s.tasks.remove(&task.task_id).is_some());
        json!({ "task_id": task.task_id, "cancelled": cancelled }).to_string()
    }

    fn save_state(&self, req_json: &str) -> String {
        let slot = match serde_json::from_str::<StateRef>(req_json) {
            Ok(slot) => slot,
            Err(e) => return error_json(e),
        };

        self.with_state(|s| match s.model.clone() {
            Some(model) => {
                s.saved.insert(slot.name.clone(), model);
                json!({ "saved": slot.name }).to_string()
            }
            None => error_json("engine not initialized"),
        })
    }

    fn load_state(&self, req_json: &str) -> String {
        let slot = match serde_json::from_str::<StateRef>(req_json) {
            Ok(slot) => slot,
            Err(e) => return error_json(e),
        };

        self.with_state(|s| match s.saved.get(&slot.name).cloned() {
            Some(model) => {
                s.model = Some(model.clone());
                json!({ "loaded": slot.name, "model": model }).to_string()
            }
            None => error_json(format!("unknown state: {}", slot.name)),
        })
    }

    fn deinit(&self) {
        debug!("echo engine deinit");
        self.with_state(|s| {
            s.model = None;
            s.tasks.clear();
        });
    }
}
