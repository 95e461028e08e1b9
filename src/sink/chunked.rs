//! # Protocolo de Chunked Content Provider
//! src/sink/chunked.rs
//!
//! Un handler puede entregar a la `Response` una función
//! `(offset, sink) -> bool` en vez de un body completo. El driver la
//! llama repetidamente:
//!
//! ```text
//! loop:
//!   more = provider(bytes_escritos, &mut sink)
//!   si el provider completó el sink      -> fin (respeta su trailer)
//!   si el consumidor rechazó un write    -> fin
//!   si more == false                     -> fin
//! si el sink no está completo -> sink.done()
//! ```
//!
//! Así se garantiza exactamente una señal de fin por stream.

use super::DataSink;
use crate::http::Headers;
use std::cell::RefCell;

/// Función que produce el body de a chunks
pub type ContentProvider = Box<dyn FnMut(usize, &mut DataSink<'_>) -> bool + Send>;

/// Resumen de un stream ya terminado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOutcome {
    /// Veces que se llamó al provider
    pub rounds: usize,

    /// Bytes aceptados por el consumidor
    pub bytes_written: usize,

    /// El consumidor cortó el stream antes de que el provider terminara
    pub consumer_closed: bool,
}

/// Ejecuta el provider contra un sink hasta que el stream termina
pub fn drive_provider(provider: &mut ContentProvider, sink: &mut DataSink<'_>) -> StreamOutcome {
    let mut rounds = 0;

    loop {
        let more = provider(sink.bytes_written(), sink);
        rounds += 1;

        if sink.is_completed() || !sink.is_writable() || !more {
            break;
        }
    }

    let consumer_closed = !sink.is_completed() && !sink.is_writable();

    if !sink.is_completed() {
        sink.done();
    }

    StreamOutcome {
        rounds,
        bytes_written: sink.bytes_written(),
        consumer_closed,
    }
}

/// Body materializado a partir de un provider
#[derive(Debug, Clone, Default)]
pub struct CollectedStream {
    pub body: Vec<u8>,

    /// Presente solo si el provider terminó con `done_with_trailer`
    pub trailer: Option<Headers>,

    pub outcome: StreamOutcome,
}

/// Corre el provider acumulando todo lo escrito en memoria
///
/// Es lo que usa `rpc_call`, que no tiene socket: el contenido del
/// resultado es la concatenación de los chunks.
pub fn collect_chunked(provider: &mut ContentProvider) -> CollectedStream {
    let body = RefCell::new(Vec::new());
    let trailer = RefCell::new(None);

    let outcome = {
        let mut sink = DataSink::new(|chunk: &[u8]| {
            body.borrow_mut().extend_from_slice(chunk);
            true
        })
        .on_done_with_trailer(|t: &Headers| *trailer.borrow_mut() = Some(t.clone()));

        drive_provider(provider, &mut sink)
    };

    CollectedStream {
        body: body.into_inner(),
        trailer: trailer.into_inner(),
        outcome,
    }
}
