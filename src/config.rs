//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor RPC con soporte para argumentos CLI y
//! variables de entorno. Los timeouts y el bind address solo se guardan:
//! los consume la capa de transporte, no el router.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./rpc_server --workers 4 --max-queued 64 --read-timeout 30
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! RPC_WORKERS=8 RPC_LOG_LEVEL=debug ./rpc_server
//! ```

use crate::error::ServerError;
use clap::Parser;

/// Configuración del servidor RPC
#[derive(Debug, Clone, Parser)]
#[command(name = "rpc_server")]
#[command(about = "Router RPC en proceso con pool de workers y sink de streaming")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Host/IP para bind_to_port
    #[arg(long, default_value = "127.0.0.1", env = "RPC_HOST")]
    pub host: String,

    /// Puerto para bind_to_port
    #[arg(short, long, default_value = "8080", env = "RPC_PORT")]
    pub port: u16,

    /// Timeout de lectura del transporte, en segundos
    #[arg(long = "read-timeout", default_value = "5", env = "RPC_READ_TIMEOUT")]
    pub read_timeout_secs: f64,

    /// Timeout de escritura del transporte, en segundos
    #[arg(long = "write-timeout", default_value = "5", env = "RPC_WRITE_TIMEOUT")]
    pub write_timeout_secs: f64,

    /// Directorio base para archivos estáticos / estado del engine
    #[arg(long = "base-dir", default_value = "./data", env = "RPC_BASE_DIR")]
    pub base_dir: String,

    // === Pool ===
    /// Número de workers del pool
    #[arg(long, default_value = "4", env = "RPC_WORKERS")]
    pub workers: usize,

    /// Máximo de jobs pendientes en el pool (0 = sin límite)
    #[arg(long = "max-queued", default_value = "0", env = "RPC_MAX_QUEUED")]
    pub max_queued: usize,

    // === Logging ===
    /// Nivel de log si RUST_LOG no está definido
    #[arg(long = "log-level", default_value = "info", env = "RPC_LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Obtiene la dirección completa (host:port)
    ///
    /// ```rust
    /// use rpc_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(ServerError::InvalidConfig("workers must be >= 1".to_string()));
        }
        if !Self::is_positive(self.read_timeout_secs) {
            return Err(ServerError::InvalidConfig("read timeout must be > 0".to_string()));
        }
        if !Self::is_positive(self.write_timeout_secs) {
            return Err(ServerError::InvalidConfig("write timeout must be > 0".to_string()));
        }

        Ok(())
    }

    /// `true` si los jobs terminan en el mismo orden en que se encolan
    /// (un solo worker saca de la cola FIFO)
    pub fn preserves_order(&self) -> bool {
        self.workers == 1
    }

    /// NaN no es positivo
    fn is_positive(secs: f64) -> bool {
        secs.is_finite() && secs > 0.0
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════╗");
        println!("║          RPC Server Configuration            ║");
        println!("╚══════════════════════════════════════════════╝");
        println!();
        println!("🌐 Transport:");
        println!("   Address:       {}", self.address());
        println!("   Read timeout:  {} s", self.read_timeout_secs);
        println!("   Write timeout: {} s", self.write_timeout_secs);
        println!("   Base dir:      {}", self.base_dir);
        println!();
        println!("👷 Worker Pool:");
        println!("   Workers:       {}", self.workers);
        if self.max_queued > 0 {
            println!("   Max queued:    {}", self.max_queued);
        } else {
            println!("   Max queued:    unbounded");
        }
        println!();
        println!("📝 Log level:     {}", self.log_level);
        println!();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            read_timeout_secs: 5.0,
            write_timeout_secs: 5.0,
            base_dir: "./data".to_string(),
            workers: 4,
            max_queued: 0,
            log_level: "info".to_string(),
        }
    }
}
