//! Streaming download with Range-based resume

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tokio::sync::watch;

use crate::control::{Control, TransferHandle};
use crate::error::TransferError;
use crate::types::{
    StartMode, TransferOutcome, TransferProgress, TransferState, WRITE_BUFFER_SIZE,
};

enum Segment {
    Finished,
    Paused,
}

enum Interrupt {
    Pause,
    Cancel,
}

/// A single download bound to one source URL and one destination path.
///
/// The transfer runs once. Pausing drops the connection after flushing what
/// has been received; resuming reconnects with `Range: bytes=<offset>-`.
///
/// Bytes land in `<destination>.part`, which replaces the destination only
/// once the transfer completes. A failed or cancelled transfer never touches
/// an existing file at the destination.
pub struct ResumableTransfer {
    client: Client,
    url: String,
    destination: PathBuf,
    mode: StartMode,
    control_tx: Arc<watch::Sender<Control>>,
    control_rx: watch::Receiver<Control>,
    progress_tx: watch::Sender<TransferProgress>,
    total_bytes: Option<u64>,
}

impl ResumableTransfer {
    pub fn new(client: Client, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        let (control_tx, control_rx) = watch::channel(Control::Run);
        let (progress_tx, _) = watch::channel(TransferProgress::pending());
        Self {
            client,
            url: url.into(),
            destination: destination.into(),
            mode: StartMode::Fresh,
            control_tx: Arc::new(control_tx),
            control_rx,
            progress_tx,
            total_bytes: None,
        }
    }

    pub fn with_start_mode(mut self, mode: StartMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Where bytes are written until the transfer completes
    pub fn partial_path(&self) -> PathBuf {
        partial_path(&self.destination)
    }

    pub fn handle(&self) -> TransferHandle {
        TransferHandle::new(self.control_tx.clone(), self.progress_tx.subscribe())
    }

    /// Drive the transfer to completion, cancellation, or the first error.
    pub async fn run(mut self) -> Result<TransferOutcome, TransferError> {
        info!("transfer: {} -> {}", self.url, self.destination.display());

        let result = self.drive().await;

        let state = match &result {
            Ok(outcome) => {
                info!(
                    "transfer: {} completed ({} bytes)",
                    self.destination.display(),
                    outcome.bytes
                );
                TransferState::Completed
            }
            Err(TransferError::Cancelled) => {
                // The file handle is closed once drive() returns
                self.discard_partial(false).await;
                info!("transfer: {} cancelled", self.destination.display());
                TransferState::Cancelled
            }
            Err(e) => {
                // Received bytes stay in the .part file for a later ContinueExisting run
                self.discard_partial(true).await;
                warn!("transfer: {} failed: {}", self.url, e);
                TransferState::Failed
            }
        };

        self.progress_tx.send_modify(|progress| {
            progress.state = state;
            progress.speed = 0.0;
        });

        result
    }

    async fn drive(&mut self) -> Result<TransferOutcome, TransferError> {
        if let Some(parent) = self.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let partial = self.partial_path();
        let mut hasher = Sha256::new();
        let mut offset = match self.mode {
            StartMode::Fresh => 0,
            StartMode::ContinueExisting => {
                if !fs::try_exists(&partial).await? && fs::try_exists(&self.destination).await? {
                    fs::rename(&self.destination, &partial).await?;
                }
                hash_existing(&partial, &mut hasher).await?
            }
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&partial)
            .await?;
        if offset == 0 {
            file.set_len(0).await?;
        }
        file.seek(SeekFrom::End(0)).await?;

        loop {
            self.wait_until_runnable(offset).await?;
            match self
                .fetch_segment(&mut file, &mut hasher, &mut offset)
                .await?
            {
                Segment::Finished => break,
                Segment::Paused => continue,
            }
        }

        file.flush().await?;
        drop(file);
        fs::rename(&partial, &self.destination).await?;

        Ok(TransferOutcome {
            path: self.destination.clone(),
            bytes: offset,
            sha256: hex::encode(hasher.finalize()),
        })
    }

    async fn wait_until_runnable(&mut self, offset: u64) -> Result<(), TransferError> {
        let current = *self.control_rx.borrow_and_update();
        match current {
            Control::Cancel => return Err(TransferError::Cancelled),
            Control::Run => return Ok(()),
            Control::Pause => {}
        }

        debug!("transfer: {} paused at {} bytes", self.url, offset);
        self.publish(TransferState::Paused, offset, 0.0);

        let next = match self.control_rx.wait_for(|c| *c != Control::Pause).await {
            Ok(control) => *control,
            Err(_) => Control::Cancel,
        };
        if next == Control::Cancel {
            return Err(TransferError::Cancelled);
        }

        debug!("transfer: {} resuming from {} bytes", self.url, offset);
        Ok(())
    }

    async fn fetch_segment(
        &mut self,
        file: &mut File,
        hasher: &mut Sha256,
        offset: &mut u64,
    ) -> Result<Segment, TransferError> {
        let mut request = self.client.get(&self.url);
        if *offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }

        self.publish(TransferState::Downloading, *offset, 0.0);
        let response = tokio::select! {
            biased;

            interrupt = interruption(&mut self.control_rx) => {
                return self.interrupted(interrupt, file, &mut Vec::new(), *offset).await;
            }
            response = request.send() => response?,
        };
        let status = response.status();

        if *offset > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            // Nothing left to fetch if the server says the file is exactly this long
            let complete_length = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_complete_length);
            if complete_length == Some(*offset) {
                self.total_bytes = Some(*offset);
                return Ok(Segment::Finished);
            }
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransferError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if *offset > 0 && status != StatusCode::PARTIAL_CONTENT {
            warn!(
                "transfer: {} ignored range request, restarting from zero",
                self.url
            );
            file.set_len(0).await?;
            file.seek(SeekFrom::Start(0)).await?;
            *hasher = Sha256::new();
            *offset = 0;
        }

        if let Some(length) = response.content_length() {
            self.total_bytes = Some(length + *offset);
        }

        let start_time = Instant::now();
        let start_bytes = *offset;
        let mut write_buffer = Vec::with_capacity(WRITE_BUFFER_SIZE);
        let mut stream = response.bytes_stream();

        loop {
            tokio::select! {
                biased;

                interrupt = interruption(&mut self.control_rx) => {
                    return self.interrupted(interrupt, file, &mut write_buffer, *offset).await;
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else {
                        break;
                    };
                    let chunk = chunk?;
                    hasher.update(&chunk);
                    write_buffer.extend_from_slice(&chunk);
                    *offset += chunk.len() as u64;

                    if write_buffer.len() >= WRITE_BUFFER_SIZE {
                        flush_buffer(file, &mut write_buffer).await?;
                        debug!("transfer: {} flushed, {} bytes on disk", self.url, offset);
                    }
                    let speed = session_speed(start_time, *offset - start_bytes);
                    self.publish(TransferState::Downloading, *offset, speed);
                }
            }
        }

        flush_buffer(file, &mut write_buffer).await?;
        let speed = session_speed(start_time, *offset - start_bytes);
        self.publish(TransferState::Downloading, *offset, speed);

        Ok(Segment::Finished)
    }

    /// Pause keeps what was received; cancel gives it up.
    async fn interrupted(
        &self,
        interrupt: Interrupt,
        file: &mut File,
        write_buffer: &mut Vec<u8>,
        offset: u64,
    ) -> Result<Segment, TransferError> {
        match interrupt {
            Interrupt::Pause => {
                flush_buffer(file, write_buffer).await?;
                self.publish(TransferState::Paused, offset, 0.0);
                Ok(Segment::Paused)
            }
            Interrupt::Cancel => Err(TransferError::Cancelled),
        }
    }

    async fn discard_partial(&self, only_if_empty: bool) {
        let partial = self.partial_path();
        if only_if_empty {
            match fs::metadata(&partial).await {
                Ok(meta) if meta.len() == 0 => {}
                _ => return,
            }
        }
        if let Err(e) = fs::remove_file(&partial).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    "transfer: failed to remove partial file {}: {}",
                    partial.display(),
                    e
                );
            }
        }
    }

    fn publish(&self, state: TransferState, downloaded_bytes: u64, speed: f64) {
        self.progress_tx.send_replace(TransferProgress {
            state,
            downloaded_bytes,
            total_bytes: self.total_bytes,
            speed,
        });
    }
}

/// Resolves with the first Pause or Cancel seen on the control channel.
/// A dropped sender counts as Cancel.
async fn interruption(control: &mut watch::Receiver<Control>) -> Interrupt {
    loop {
        if control.changed().await.is_err() {
            return Interrupt::Cancel;
        }
        match *control.borrow_and_update() {
            Control::Run => continue,
            Control::Pause => return Interrupt::Pause,
            Control::Cancel => return Interrupt::Cancel,
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

async fn flush_buffer(file: &mut File, buffer: &mut Vec<u8>) -> io::Result<()> {
    if !buffer.is_empty() {
        file.write_all(buffer).await?;
        buffer.clear();
    }
    Ok(())
}

fn session_speed(start_time: Instant, bytes_this_session: u64) -> f64 {
    let elapsed = start_time.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        bytes_this_session as f64 / elapsed
    } else {
        0.0
    }
}

/// Feed an existing partial file through the hasher and return its length.
async fn hash_existing(path: &Path, hasher: &mut Sha256) -> io::Result<u64> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok(total)
}

/// `bytes */1234` -> 1234
fn parse_complete_length(content_range: &str) -> Option<u64> {
    let total = content_range.split('/').nth(1)?;
    if total == "*" {
        return None;
    }
    total.trim().parse().ok()
}
