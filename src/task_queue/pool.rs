//! # Pool de Workers
//! src/task_queue/pool.rs
//!
//! Implementación de `TaskQueue` con N threads fijos que sacan trabajos
//! de una cola FIFO compartida.
//!
//! ## Sincronización
//!
//! ```text
//!            ┌──────────── Mutex<PoolState> ────────────┐
//! enqueue ──►│ jobs: VecDeque<Job>   shutdown: bool     │──► worker-0
//!            └──────────────────────────────────────────┘──► worker-1
//!                     Condvar: "hay jobs o shutdown"       ──► ...
//! ```
//!
//! - Un solo mutex protege la cola y el flag de shutdown.
//! - Cada worker saca a lo sumo un job por wake y lo ejecuta SIN el lock.
//! - Shutdown es drain-then-stop: los workers siguen sacando jobs hasta
//!   que la cola queda vacía, y recién ahí terminan.

use super::{Job, TaskQueue};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

/// Estado compartido protegido por el mutex
struct PoolState {
    /// Jobs pendientes en orden de llegada
    jobs: VecDeque<Job>,

    /// Una vez en true no vuelve a false
    shutdown: bool,
}

/// Lo que comparten el pool y sus workers
struct Shared {
    state: Mutex<PoolState>,

    /// Despierta workers cuando hay jobs o cuando empieza el shutdown
    condvar: Condvar,

    /// Profundidad máxima de la cola (0 = sin límite)
    max_queued: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Los jobs corren fuera del lock, así que un poison no deja
        // la cola a medio modificar
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool de threads de tamaño fijo
pub struct ThreadPool {
    shared: Arc<Shared>,

    /// Handles de los workers; se vacía al hacer join en `shutdown`
    workers: Mutex<Vec<JoinHandle<()>>>,

    size: usize,
}

impl ThreadPool {
    /// Crea un pool con `size` workers y cola sin límite
    pub fn new(size: usize) -> io::Result<Self> {
        Self::with_max_queued(size, 0)
    }

    /// Crea un pool con `size` workers y a lo sumo `max_queued` jobs
    /// pendientes (0 = sin límite)
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::task_queue::{TaskQueue, ThreadPool};
    ///
    /// let pool = ThreadPool::with_max_queued(2, 16).unwrap();
    /// assert!(pool.enqueue(Box::new(|| println!("hola desde el pool"))));
    /// pool.shutdown();
    /// ```
    pub fn with_max_queued(size: usize, max_queued: usize) -> io::Result<Self> {
        if size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "thread pool needs at least one worker",
            ));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
            max_queued,
        });

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let name = format!("pool-worker-{}", i);
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, worker_shared));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Detener los que sí arrancaron antes de fallar
                    Self::stop_and_join(&shared, &mut workers);
                    return Err(e);
                }
            }
        }

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            size,
        })
    }

    /// Loop principal del worker
    fn worker_loop(name: String, shared: Arc<Shared>) {
        debug!(worker = %name, "worker started");

        loop {
            let job = {
                let guard = shared.lock();
                let mut state = shared
                    .condvar
                    .wait_while(guard, |s| s.jobs.is_empty() && !s.shutdown)
                    .unwrap_or_else(PoisonError::into_inner);

                // Cola vacía tras despertar => shutdown
                match state.jobs.pop_front() {
                    Some(job) => job,
                    None => break,
                }
            };

            job();
        }

        debug!(worker = %name, "worker stopped");
    }

    fn stop_and_join(shared: &Shared, workers: &mut Vec<JoinHandle<()>>) {
        shared.lock().shutdown = true;
        shared.condvar.notify_all();

        for handle in workers.drain(..) {
            let name = handle.thread().name().unwrap_or("pool-worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "worker exited with a panic");
            }
        }
    }

    /// Número de workers del pool
    pub fn worker_count(&self) -> usize {
        self.size
    }

    /// Profundidad máxima configurada (0 = sin límite)
    pub fn max_queued(&self) -> usize {
        self.shared.max_queued
    }

    /// Jobs encolados que ningún worker tomó todavía
    pub fn pending(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Indica si ya se pidió shutdown
    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }
}

impl TaskQueue for ThreadPool {
    fn enqueue(&self, job: Job) -> bool {
        {
            let mut state = self.shared.lock();

            if state.shutdown {
                warn!("enqueue rejected: pool is shutting down");
                return false;
            }

            let max = self.shared.max_queued;
            if max > 0 && state.jobs.len() >= max {
                warn!(max_queued = max, "enqueue rejected: queue is full");
                return false;
            }

            state.jobs.push_back(job);
        }

        self.shared.condvar.notify_one();
        true
    }

    fn shutdown(&self) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        Self::stop_and_join(&self.shared, &mut workers);
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
