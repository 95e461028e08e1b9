//! # RPC Server - Entry Point
//! src/main.rs
//!
//! Binario demo: monta el `EchoEngine`, lee un envelope JSON por línea
//! de stdin (`{"method":"POST","path":"/v1/chat/completions","body":"..."}`),
//! lo despacha en el pool e imprime el resultado. Al llegar a EOF drena
//! el pool y termina.
//!
//! Con más de un worker las líneas corren sin orden entre sí: un `/init`
//! seguido de un `/v1/chat/completions` puede ejecutarse al revés. Para
//! una sesión con estado usar `--workers 1`.
//!
//! ```bash
//! printf '%s\n' \
//!   '{"method":"POST","path":"/init","body":"tiny"}' \
//!   '{"method":"GET","path":"/status"}' | ./rpc_server --workers 1
//! ```

use clap::Parser;
use rpc_server::config::Config;
use rpc_server::engine::{mount_engine, EchoEngine};
use rpc_server::logging::init_logging;
use rpc_server::server::Server;
use rpc_server::ServerError;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info, warn};

fn print_line(line: &str) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

fn print_result(result: Result<String, ServerError>) {
    match result {
        Ok(json) => print_line(&json),
        Err(e) => {
            error!(error = %e, "rpc call failed");
            eprintln!("💥 {}", e);
        }
    }
}

fn run(config: &Config) -> Result<(), ServerError> {
    let mut server = Server::from_config(config);
    mount_engine(&mut server, Arc::new(EchoEngine::new()));
    server.listen_after_bind();

    let server = Arc::new(server);
    let queue = server.new_task_queue()?;

    if !config.preserves_order() {
        warn!(workers = config.workers, "stdin lines will run unordered; use --workers 1 for a stateful session");
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let call = match Server::parse_envelope(&line) {
            Ok(call) => call,
            Err(invalid) => {
                print_result(invalid.to_json());
                continue;
            }
        };

        let accepted =
            server.spawn_rpc_call(queue.as_ref(), &call.method, &call.path, &call.body, print_result);
        if !accepted {
            eprintln!("⚠️  Rejected (queue full): {} {}", call.method, call.path);
        }
    }

    info!("stdin closed, draining pool");
    queue.shutdown();
    Ok(())
}

fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuración inválida: {}", e);
        std::process::exit(2);
    }

    init_logging(&config.log_level);
    config.print_summary();

    if let Err(e) = run(&config) {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}
