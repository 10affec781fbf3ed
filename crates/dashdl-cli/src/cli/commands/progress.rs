//! Console progress for one stream download.

use dashdl_core::downloader::SegmentProgress;
use std::io::Write;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

/// Prints `Downloaded n/total segments...` on one line until finished.
pub struct ProgressPrinter {
    tx: Sender<SegmentProgress>,
    handle: JoinHandle<()>,
}

impl ProgressPrinter {
    pub fn start(label: &'static str) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<SegmentProgress>();
        let handle = thread::Builder::new()
            .name(format!("progress-{label}"))
            .spawn(move || {
                let mut printed = false;
                for p in rx {
                    print!("\r  [{label}] Downloaded {}/{} segments...", p.written, p.total);
                    let _ = std::io::stdout().flush();
                    printed = true;
                }
                if printed {
                    println!();
                }
            })?;
        Ok(Self { tx, handle })
    }

    pub fn sender(&self) -> &Sender<SegmentProgress> {
        &self.tx
    }

    /// Closes the channel and waits for the last line to be printed.
    pub fn finish(self) {
        drop(self.tx);
        let _ = self.handle.join();
    }
}
