//! Append-only temp file writer.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{final_path_for, TEMP_SUFFIX};

/// Append-only destination for one stream. Written only by the collector.
pub struct SegmentSink {
    file: BufWriter<NamedTempFile>,
    written: u64,
}

impl SegmentSink {
    /// Creates `stream-<id>-<random>.mp4.part` in `dir`.
    pub fn create(dir: &Path, stream_id: &str) -> io::Result<Self> {
        let prefix = format!("stream-{}-", file_safe(stream_id));
        let suffix = format!(".mp4{TEMP_SUFFIX}");
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(dir)?;
        tracing::debug!(path = %file.path().display(), "opened segment sink");
        Ok(Self {
            file: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        self.file.get_ref().path()
    }

    /// Flushes, syncs and renames the temp file to its final name.
    pub fn finalize(self) -> io::Result<PathBuf> {
        let file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.as_file().sync_all()?;
        let final_path = final_path_for(file.path());
        file.persist(&final_path).map_err(|e| e.error)?;
        Ok(final_path)
    }
}

impl Write for SegmentSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
