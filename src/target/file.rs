use crate::error::BoxError;
use crate::{Part, Target};
use bytes::{Bytes, BytesMut};
use spin::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes part data to a file.
///
/// The file is created (or truncated) when a part starts, so with several
/// parts for the same target the last one wins.
#[derive(Debug)]
pub struct FileTarget {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileTarget {
    /// Creates a target writing to `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> FileTarget {
        FileTarget {
            path: path.into(),
            writer: None,
        }
    }

    /// The path data is written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "file target received data before start"))
    }
}

impl Target for FileTarget {
    fn on_start(&mut self, _: &Part) -> Result<(), BoxError> {
        let file = File::create(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        self.writer()?.write_all(chunk)?;
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), BoxError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Where a finished [`SpooledTarget`] part ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpooledData {
    /// The part stayed below the threshold.
    Memory(Bytes),
    /// The part was spilled to a temporary file. The file is not removed by
    /// this crate.
    File { path: PathBuf, size: u64 },
}

impl SpooledData {
    /// Size of the part body in bytes.
    pub fn len(&self) -> u64 {
        match self {
            SpooledData::Memory(bytes) => bytes.len() as u64,
            SpooledData::File { size, .. } => *size,
        }
    }

    /// Whether the part body was empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the part body, from disk if it was spilled.
    pub fn bytes(&self) -> io::Result<Bytes> {
        match self {
            SpooledData::Memory(bytes) => Ok(bytes.clone()),
            SpooledData::File { path, .. } => fs::read(path).map(Bytes::from),
        }
    }
}

/// A finished part recorded by a [`SpooledTarget`].
#[derive(Debug, Clone)]
pub struct SpooledPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<mime::Mime>,
    pub data: SpooledData,
}

#[derive(Debug)]
enum Spool {
    Memory(BytesMut),
    File(SpillFile),
}

/// A spool file of a part that hasn't finished yet. Dropping it removes the
/// file.
#[derive(Debug)]
struct SpillFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    size: u64,
}

impl SpillFile {
    fn create(dir: &Path) -> io::Result<SpillFile> {
        let (path, file) = create_spool_file(dir)?;
        Ok(SpillFile {
            path,
            writer: Some(BufWriter::new(file)),
            size: 0,
        })
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "spool file already closed"))?;
        writer.write_all(data)?;
        self.size += data.len() as u64;
        Ok(())
    }

    /// Flushes the file and hands it over to the caller, who becomes
    /// responsible for removing it.
    fn persist(mut self) -> io::Result<SpooledData> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        let path = std::mem::take(&mut self.path);
        Ok(SpooledData::File { path, size: self.size })
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        self.writer.take();
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[derive(Debug, Default)]
struct SpoolState {
    current: Option<(SpooledPart, Spool)>,
    parts: Vec<SpooledPart>,
}

/// Keeps part data in memory until it grows past a threshold, then moves it
/// to a file in the system temp directory.
///
/// Clones share the recorded parts. Files of finished parts are left for the
/// caller to remove. The file of a part that never finishes, because the body
/// was cut off or parsing failed, is removed once the next part starts or the
/// last clone is dropped.
///
/// Disk I/O happens outside the lock guarding the shared state, so reading
/// [`parts`](SpooledTarget::parts) from another thread doesn't wait on it.
#[derive(Debug, Clone)]
pub struct SpooledTarget {
    threshold: usize,
    dir: PathBuf,
    state: Arc<Mutex<SpoolState>>,
}

impl SpooledTarget {
    /// Creates a target spilling parts larger than `threshold` bytes.
    pub fn new(threshold: usize) -> SpooledTarget {
        SpooledTarget::with_dir(threshold, std::env::temp_dir())
    }

    /// Like [`new`](SpooledTarget::new), but spills into `dir`.
    pub fn with_dir<P: Into<PathBuf>>(threshold: usize, dir: P) -> SpooledTarget {
        SpooledTarget {
            threshold,
            dir: dir.into(),
            state: Arc::default(),
        }
    }

    /// The parts finished so far, in order.
    pub fn parts(&self) -> Vec<SpooledPart> {
        self.state.lock().parts.clone()
    }

    fn write(&self, spool: &mut Spool, chunk: &[u8]) -> io::Result<()> {
        match spool {
            Spool::Memory(buf) if buf.len() + chunk.len() <= self.threshold => {
                buf.extend_from_slice(chunk);
                Ok(())
            }
            Spool::Memory(buf) => {
                let mut file = SpillFile::create(&self.dir)?;
                file.write(buf)?;
                file.write(chunk)?;
                *spool = Spool::File(file);
                Ok(())
            }
            Spool::File(file) => file.write(chunk),
        }
    }
}

impl Target for SpooledTarget {
    fn on_start(&mut self, part: &Part) -> Result<(), BoxError> {
        let meta = SpooledPart {
            name: part.name().to_owned(),
            file_name: part.file_name().map(ToOwned::to_owned),
            content_type: part.content_type().cloned(),
            data: SpooledData::Memory(Bytes::new()),
        };
        let unfinished = self.state.lock().current.replace((meta, Spool::Memory(BytesMut::new())));
        // Outside the lock: removes the spill file of a part that never finished.
        drop(unfinished);
        Ok(())
    }

    fn on_data(&mut self, chunk: &[u8]) -> Result<(), BoxError> {
        let (meta, mut spool) = self
            .state
            .lock()
            .current
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "spooled target received data before start"))?;

        let res = self.write(&mut spool, chunk);
        self.state.lock().current = Some((meta, spool));

        res.map_err(Into::into)
    }

    fn on_finish(&mut self) -> Result<(), BoxError> {
        let (mut meta, spool) = match self.state.lock().current.take() {
            Some(current) => current,
            None => return Ok(()),
        };

        meta.data = match spool {
            Spool::Memory(buf) => SpooledData::Memory(buf.freeze()),
            Spool::File(file) => file.persist()?,
        };
        self.state.lock().parts.push(meta);
        Ok(())
    }
}

fn create_spool_file(dir: &Path) -> io::Result<(PathBuf, File)> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    for _ in 0..16 {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos());
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("streaming-form-data-{}-{}-{}.part", pid, nanos, n));

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "couldn't create a unique spool file",
    ))
}
