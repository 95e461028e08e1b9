//! # Logging
//! src/logging.rs
//!
//! Inicialización del subscriber de `tracing`. El nivel sale de
//! `RUST_LOG`; si no está definido, del `--log-level` de la config.
//!
//! ```bash
//! RUST_LOG=rpc_server=debug ./rpc_server
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber global
///
/// Retorna `false` si ya había uno instalado (ej: segunda llamada o
/// tests que corren en el mismo proceso); en ese caso no hace nada.
pub fn init_logging(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_thread_names(true))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("debug");
        // El segundo intento encuentra un subscriber ya instalado
        assert!(!init_logging("info"));
    }
}
