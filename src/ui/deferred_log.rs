//! Log writer that holds output while the terminal view owns the screen
//!
//! Installed as the `tracing_subscriber` writer. In holding mode every line is
//! buffered; `release` writes the buffer to stderr once the terminal is
//! restored and lets later lines straight through.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Default)]
pub struct DeferredStderr {
    /// `Some` while holding
    held: Arc<Mutex<Option<Vec<u8>>>>,
}

impl DeferredStderr {
    /// Writes go straight to stderr
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Writes are buffered until `release`
    pub fn holding() -> Self {
        Self {
            held: Arc::new(Mutex::new(Some(Vec::new()))),
        }
    }

    pub fn is_holding(&self) -> bool {
        self.lock().is_some()
    }

    /// Flush held output to stderr and stop holding
    pub fn release(&self) -> io::Result<()> {
        self.release_into(&mut io::stderr())
    }

    pub fn release_into(&self, out: &mut impl Write) -> io::Result<()> {
        let pending = self.lock().take();
        if let Some(bytes) = pending {
            out.write_all(&bytes)?;
            out.flush()?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        // A panic mid-write leaves the bytes usable
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct DeferredWriter {
    log: DeferredStderr,
}

impl Write for DeferredWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut held = self.log.lock();
            if let Some(bytes) = held.as_mut() {
                bytes.extend_from_slice(buf);
                return Ok(buf.len());
            }
        }
        io::stderr().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.log.is_holding() {
            return Ok(());
        }
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for DeferredStderr {
    type Writer = DeferredWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DeferredWriter { log: self.clone() }
    }
}
