//! Span recording to a Chrome trace file (open it in `chrome://tracing` or Perfetto).

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::subscriber::DefaultGuard;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::prelude::*;

/// Records every span entered on this thread until [`ChromeTrace::finish`] is called or the
/// value is dropped.
pub struct ChromeTrace {
    // Dropped in declaration order: the subscriber, then the flush
    _default: DefaultGuard,
    _flush: FlushGuard,
    path: PathBuf,
}

impl ChromeTrace {
    pub fn record_to(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("could not create trace file `{}`", path.display()))?;

        let (layer, flush) = ChromeLayerBuilder::new()
            .writer(BufWriter::new(file))
            .include_args(true)
            .build();
        let default = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

        log::info!("recording spans to {}", path.display());
        Ok(Self { _default: default, _flush: flush, path: path.to_path_buf() })
    }

    /// Stops recording and writes out the rest of the trace.
    pub fn finish(self) {
        let path = self.path.clone();
        drop(self);
        log::info!("wrote trace to {}", path.display());
    }
}
