//! # Cola de Tareas
//! src/task_queue/mod.rs
//!
//! Abstracción de "algo que ejecuta trabajos diferidos". El servidor no
//! decide si un handler corre inline o en un pool: solo expone una
//! factory (`Server::new_task_queue`) para que la capa de transporte
//! obtenga una cola y le entregue trabajos.
//!
//! ## Contrato
//!
//! ```text
//! enqueue(job) ──► true  : el job quedó en la cola y correrá
//!              └─► false : cola llena o en shutdown (backpressure)
//! shutdown()   ──► drena la cola, luego detiene y hace join de los workers
//! ```

pub mod pool;

pub use pool::ThreadPool;

/// Unidad de trabajo diferida: sin argumentos, sin retorno
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Capacidad de encolar trabajos
pub trait TaskQueue: Send + Sync {
    /// Intenta encolar un job
    ///
    /// Retorna `false` sin encolar si la cola está llena o en shutdown.
    /// El caller debe tratar `false` como "reintentar o rechazar",
    /// nunca como éxito.
    fn enqueue(&self, job: Job) -> bool;

    /// Detiene la cola: no acepta más trabajos, ejecuta los pendientes
    /// y espera a que terminen todos los workers.
    fn shutdown(&self);

    /// Notificación de inactividad para la capa de transporte
    fn on_idle(&self) {}
}
