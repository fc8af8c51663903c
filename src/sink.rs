//! Sample destinations.

use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{info, warn};

use crate::error::Error;

/// Where acquired samples go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// 8 hex digits per line on stdout
    Console,
    /// Buffer everything, write the file after the capture
    MemoryThenFile,
    /// Append each sample to the file as it arrives
    #[default]
    File,
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "console" => Ok(OutputMode::Console),
            "1" | "memory" => Ok(OutputMode::MemoryThenFile),
            "2" | "file" => Ok(OutputMode::File),
            _ => Err(Error::InvalidOutputMode(s.to_owned())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Console => "console",
            OutputMode::MemoryThenFile => "memory",
            OutputMode::File => "file",
        })
    }
}

/// Receives samples in emission order.
pub trait Sink {
    fn accept(&mut self, sample: u32) -> Result<(), Error>;

    /// Commits everything accepted so far. Called once, after the last sample.
    fn finalize(&mut self) -> Result<(), Error>;

    /// Drops any partial output of an aborted run.
    fn discard(&mut self) {}
}

/// Opens the sink for `mode`, sized for `expected` samples.
///
/// Persistent modes write to `path`; the console ignores it.
pub fn open(mode: OutputMode, path: &Path, expected: u64) -> Result<Box<dyn Sink>, Error> {
    Ok(match mode {
        OutputMode::Console => Box::new(ConsoleSink::new(io::stdout().lock())),
        OutputMode::File => Box::new(FileStreamSink::create(path)?),
        OutputMode::MemoryThenFile => Box::new(MemorySink::new(path, expected)?),
    })
}

pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn accept(&mut self, sample: u32) -> Result<(), Error> {
        writeln!(self.out, "{sample:08x}").map_err(Error::IoError)
    }

    fn finalize(&mut self) -> Result<(), Error> {
        self.out.flush().map_err(Error::IoError)
    }
}

/// Streams samples to a file as they arrive.
pub struct FileStreamSink {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    written: u64,
}

impl FileStreamSink {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let file = create_file(&path)?;
        Ok(Self {
            path,
            out: Some(BufWriter::new(file)),
            written: 0,
        })
    }
}

impl Sink for FileStreamSink {
    fn accept(&mut self, sample: u32) -> Result<(), Error> {
        let out = self.out.as_mut().ok_or_else(closed)?;
        out.write_all(&sample.to_le_bytes()).map_err(Error::IoError)?;
        self.written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), Error> {
        if let Some(out) = self.out.as_mut() {
            out.flush().map_err(Error::IoError)?;
            self.out = None;
            info!("wrote {} samples to {}", self.written, self.path.display());
        }
        Ok(())
    }

    fn discard(&mut self) {
        if self.out.take().is_some() {
            remove_partial(&self.path);
        }
    }
}

/// Fixed-capacity sample storage; it never grows past the size it was
/// created with.
#[derive(Debug)]
pub struct SampleBuffer {
    words: Vec<u32>,
    limit: usize,
}

impl SampleBuffer {
    pub fn with_exact_capacity(words: u64) -> Result<Self, Error> {
        let failed = || Error::AllocationFailed { words };
        let len = usize::try_from(words).map_err(|_| failed())?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| failed())?;
        Ok(Self {
            words: buf,
            limit: len,
        })
    }

    /// # Panics
    ///
    /// Panics if the buffer is already full.
    pub fn push(&mut self, sample: u32) {
        assert!(self.words.len() < self.limit, "sample buffer full");
        self.words.push(sample);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.words
    }
}

/// Keeps file I/O out of the capture: samples go to memory and the file is
/// created and written in one go by `finalize`.
pub struct MemorySink {
    path: PathBuf,
    buffer: SampleBuffer,
    /// Output file exists but has not been completely written
    uncommitted: bool,
}

impl MemorySink {
    pub fn new(path: impl Into<PathBuf>, expected: u64) -> Result<Self, Error> {
        Ok(Self {
            path: path.into(),
            buffer: SampleBuffer::with_exact_capacity(expected)?,
            uncommitted: false,
        })
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}

impl Sink for MemorySink {
    fn accept(&mut self, sample: u32) -> Result<(), Error> {
        self.buffer.push(sample);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), Error> {
        let mut out = BufWriter::new(create_file(&self.path)?);
        self.uncommitted = true;
        for word in self.buffer.as_slice() {
            out.write_all(&word.to_le_bytes()).map_err(Error::IoError)?;
        }
        out.flush().map_err(Error::IoError)?;
        self.uncommitted = false;
        info!("wrote {} samples to {}", self.buffer.len(), self.path.display());

        self.buffer = SampleBuffer {
            words: Vec::new(),
            limit: 0,
        };
        Ok(())
    }

    fn discard(&mut self) {
        if self.uncommitted {
            self.uncommitted = false;
            remove_partial(&self.path);
        }
    }
}

fn create_file(path: &Path) -> Result<File, Error> {
    File::create(path).map_err(|source| Error::FileCreateFailed {
        path: path.to_owned(),
        source,
    })
}

fn remove_partial(path: &Path) {
    warn!("removing partial output {}", path.display());
    if let Err(e) = fs::remove_file(path) {
        warn!("cannot remove {}: {e}", path.display());
    }
}

fn closed() -> Error {
    Error::IoError(io::Error::other("sink already finalized"))
}

/// Decodes a persisted sample file.
pub fn read_samples(path: &Path) -> Result<Vec<u32>, Error> {
    let bytes = fs::read(path).map_err(Error::IoError)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
