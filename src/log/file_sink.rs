use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::log::log_sink::LogSink;

/// File destination opened on first use.
///
/// The append/truncate choice is captured at construction and honored every
/// time the file is opened. At most one handle is open at a time.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    name: String,
    append: bool,
    out: Option<BufWriter<File>>,
}

impl FileSink {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P, append: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.to_string_lossy().into_owned();
        Self {
            path,
            name,
            append,
            out: None,
        }
    }

    #[must_use]
    pub fn append_mode(&self) -> bool {
        self.append
    }

    /// Returns the open stream, opening the file if needed.
    ///
    /// Calling this repeatedly while the file is open hands back the same handle.
    ///
    /// # Errors
    /// Returns the I/O error raised while opening the file.
    pub fn stream(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.out.is_none() {
            let mut opts = OpenOptions::new();
            opts.create(true);
            if self.append {
                opts.append(true);
            } else {
                opts.write(true).truncate(true);
            }
            let file = opts.open(&self.path)?;
            tracing::debug!(path = %self.path.display(), append = self.append, "opened log file");
            self.out = Some(BufWriter::new(file));
        }
        // Populated just above when it was missing.
        self.out
            .as_mut()
            .ok_or_else(|| io::Error::other("log file handle unavailable"))
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.stream()?.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.out.as_mut() {
            Some(out) => out.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.out.take() {
            Some(mut out) => out.flush(),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        self.out.is_some()
    }
}
