use std::{io, path::PathBuf, process::ExitCode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open {}: {source}", path.display())]
    ResourceUnavailable { path: PathBuf, source: io::Error },

    #[error("cannot map {len:#x} bytes at {base:#010x}: {source}")]
    MappingFailed {
        base: u64,
        len: usize,
        source: io::Error,
    },

    #[error("error allocating memory for {words} samples")]
    AllocationFailed { words: u64 },

    #[error("{ticks} ticks of {per_tick} samples do not fit in a 64-bit count")]
    SampleCountOverflow { ticks: u64, per_tick: u32 },

    #[error("cannot create {}: {source}", path.display())]
    FileCreateFailed { path: PathBuf, source: io::Error },

    #[error("io error: {0}")]
    IoError(io::Error),

    #[error("invalid stream mask {0:#b}: only slots 0-4 exist")]
    InvalidStreamMask(u32),

    #[error("`{0}` is not a 0x, 0b or decimal number")]
    InvalidNumber(String),

    #[error("address {0:#010x} is not word aligned")]
    MisalignedAddress(u64),

    #[error("no memory bank {0}")]
    NoSuchBank(u8),

    #[error("invalid output mode `{0}` (expected console, memory, file or 0-2)")]
    InvalidOutputMode(String),

    #[error("{words} words at offset {offset:#x} run past the {window:#x} byte window")]
    WindowOverrun {
        offset: usize,
        words: usize,
        window: usize,
    },

    #[error("{} holds only {read} of {expected} words", path.display())]
    InputTruncated {
        path: PathBuf,
        read: usize,
        expected: usize,
    },
}

impl Error {
    /// Process exit status for a run aborted by this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            // the allocation failure has always surfaced as `-1`
            Error::AllocationFailed { .. } => ExitCode::from(255),
            _ => ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_failure_exits_negative() {
        let err = Error::AllocationFailed { words: 12 };
        assert_eq!(err.exit_code(), ExitCode::from(255));
        assert_eq!(
            Error::InvalidStreamMask(0b100000).exit_code(),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn messages_name_the_resource() {
        let err = Error::ResourceUnavailable {
            path: PathBuf::from("/dev/mem"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("cannot open /dev/mem"));

        let err = Error::MappingFailed {
            base: 0x4000_0000,
            len: 0x40000,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        };
        assert!(err.to_string().contains("0x40000 bytes at 0x40000000"));
    }
}
