//! # DataSink
//! src/sink/mod.rs
//!
//! Puente entre un productor que genera el body de a pedazos y el
//! consumidor que lo transmite (socket, buffer, etc.).
//!
//! ## Ciclo de vida
//!
//! ```text
//!  Open ──write()=false──► Closed ──┐
//!   │                               ├──done() / done_with_trailer()──► Completed
//!   └───────────────────────────────┘
//! ```
//!
//! - `write` después de `Completed` es un error de programación (panic).
//! - Completar dos veces también (panic).
//! - El callback de escritura recibe un slice prestado, válido solo
//!   durante la llamada: si necesita persistirlo, lo copia.

pub mod chunked;

pub use chunked::{collect_chunked, drive_provider, CollectedStream, ContentProvider, StreamOutcome};

use crate::http::Headers;
use std::io;

type WriteFn<'a> = Box<dyn FnMut(&[u8]) -> bool + 'a>;
type DoneFn<'a> = Box<dyn FnOnce() + 'a>;
type TrailerFn<'a> = Box<dyn FnOnce(&Headers) + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Open,
    /// El consumidor rechazó un write
    Closed,
    Completed,
}

/// Sink de escritura ligado a una respuesta en curso
pub struct DataSink<'a> {
    write: WriteFn<'a>,
    done: Option<DoneFn<'a>>,
    done_with_trailer: Option<TrailerFn<'a>>,
    state: SinkState,
    written: usize,
}

impl<'a> DataSink<'a> {
    /// Crea un sink con el callback de escritura; las señales de fin
    /// son no-op hasta que se registren con `on_done*`
    ///
    /// # Ejemplo
    /// ```
    /// use rpc_server::sink::DataSink;
    /// use std::io::Write;
    ///
    /// let mut out = Vec::new();
    /// {
    ///     let mut sink = DataSink::new(|chunk: &[u8]| {
    ///         out.extend_from_slice(chunk);
    ///         true
    ///     });
    ///     sink.write_chunk(b"token ");
    ///     write!(sink, "{}", 42).unwrap();
    ///     sink.done();
    /// }
    /// assert_eq!(out, b"token 42");
    /// ```
    pub fn new(write: impl FnMut(&[u8]) -> bool + 'a) -> Self {
        Self {
            write: Box::new(write),
            done: None,
            done_with_trailer: None,
            state: SinkState::Open,
            written: 0,
        }
    }

    pub fn on_done(mut self, done: impl FnOnce() + 'a) -> Self {
        self.done = Some(Box::new(done));
        self
    }

    pub fn on_done_with_trailer(mut self, done: impl FnOnce(&Headers) + 'a) -> Self {
        self.done_with_trailer = Some(Box::new(done));
        self
    }

    /// Envía un chunk al consumidor
    ///
    /// Retorna `false` si el consumidor ya no acepta datos; desde ahí el
    /// sink queda cerrado y los writes siguientes no llegan al callback.
    pub fn write_chunk(&mut self, data: &[u8]) -> bool {
        assert!(
            self.state != SinkState::Completed,
            "DataSink: write after completion"
        );

        if self.state == SinkState::Closed {
            return false;
        }

        if (self.write)(data) {
            self.written += data.len();
            true
        } else {
            self.state = SinkState::Closed;
            false
        }
    }

    /// Fin del body sin trailer
    pub fn done(&mut self) {
        self.complete();
        if let Some(done) = self.done.take() {
            done();
        }
    }

    /// Fin del body con headers calculados después del stream
    /// (ej: checksum o status final)
    pub fn done_with_trailer(&mut self, trailer: &Headers) {
        self.complete();
        if let Some(done) = self.done_with_trailer.take() {
            done(trailer);
        }
    }

    fn complete(&mut self) {
        assert!(
            self.state != SinkState::Completed,
            "DataSink: completed more than once"
        );
        self.state = SinkState::Completed;
    }

    /// Bytes aceptados por el consumidor hasta ahora
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// `true` mientras el consumidor siga aceptando datos
    pub fn is_writable(&self) -> bool {
        self.state == SinkState::Open
    }

    pub fn is_completed(&self) -> bool {
        self.state == SinkState::Completed
    }
}

/// Interfaz de stream: `write!`/`writeln!` van al mismo callback, en orden
/// y sin buffer intermedio
impl io::Write for DataSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.write_chunk(buf) {
            Ok(buf.len())
        } else {
            Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "data sink closed by consumer",
            ))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for DataSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSink")
            .field("state", &self.state)
            .field("written", &self.written)
            .finish()
    }
}
