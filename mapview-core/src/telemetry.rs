//! Telemetry integration (optional).
//!
//! With the `telemetry` feature, [`crate::emit::emit_array`] logs each
//! emission at `trace` and a per-call summary at `debug`. [`Traced`] adds the
//! same visibility to any sink, tagged with the view it feeds.

use alloc::string::String;

use crate::emit::Emit;
use crate::value::{Key, Value};

/// An [`Emit`] sink wrapper that logs every row it forwards.
#[derive(Debug)]
pub struct Traced<E> {
    inner: E,
    view: String,
    forwarded: u64,
}

impl<E: Emit> Traced<E> {
    pub fn new(view: impl Into<String>, inner: E) -> Self {
        Self {
            inner,
            view: view.into(),
            forwarded: 0,
        }
    }

    /// Rows forwarded to the inner sink so far
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Emit> Emit for Traced<E> {
    type Error = E::Error;

    fn emit(&mut self, key: Key, value: Value) -> core::result::Result<(), Self::Error> {
        tracing::trace!(view = %self.view, key = ?key, value = ?value, "row");
        self.inner.emit(key, value)?;
        self.forwarded += 1;
        Ok(())
    }
}
