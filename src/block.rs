//! Plain block reads and register writes, without FIFO sequencing.

use std::path::Path;

use log::info;

use crate::{
    error::Error,
    region::Registers,
    sink::{Sink, read_samples},
};

/// Reads `words` consecutive words from the start of the window into `sink`.
pub fn fetch<R: Registers + ?Sized>(regs: &mut R, words: usize, sink: &mut dyn Sink) -> Result<usize, Error> {
    let window = regs.window_len();
    if words.checked_mul(4).is_none_or(|bytes| bytes > window) {
        sink.discard();
        return Err(Error::WindowOverrun {
            offset: 0,
            words,
            window,
        });
    }

    let result = (0..words).try_for_each(|i| sink.accept(regs.read_u32(i * 4)));
    if let Err(e) = result.and_then(|()| sink.finalize()) {
        sink.discard();
        return Err(e);
    }
    info!("fetched {words} words");
    Ok(words)
}

/// Loads exactly `count` little-endian words from `path`.
pub fn load_words(path: &Path, count: usize) -> Result<Vec<u32>, Error> {
    let mut words = read_samples(path)?;
    if words.len() < count {
        return Err(Error::InputTruncated {
            path: path.to_owned(),
            read: words.len(),
            expected: count,
        });
    }
    words.truncate(count);
    Ok(words)
}

/// Writes `words` one after another to the register at `offset`.
pub fn write_all<R: Registers + ?Sized>(regs: &mut R, offset: usize, words: &[u32]) {
    for &word in words {
        regs.write_u32(offset, word);
    }
    info!("wrote {} words to register {:#x}", words.len(), offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimulatedDevice, sink::ConsoleSink};

    #[test]
    fn fetch_reads_consecutive_words() {
        let mut dev = SimulatedDevice::new(16)
            .with_samples(0, [1])
            .with_samples(4, [2])
            .with_samples(8, [3]);
        let mut sink = ConsoleSink::new(Vec::new());

        assert_eq!(fetch(&mut dev, 3, &mut sink).unwrap(), 3);
        assert_eq!(dev.reads().collect::<Vec<_>>(), [(0, 1), (4, 2), (8, 3)]);
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "00000001\n00000002\n00000003\n");
    }

    #[test]
    fn fetch_past_window_reads_nothing() {
        let mut dev = SimulatedDevice::new(16);
        let mut sink = ConsoleSink::new(Vec::new());

        let err = fetch(&mut dev, 5, &mut sink).unwrap_err();

        assert!(matches!(err, Error::WindowOverrun { words: 5, window: 16, .. }));
        assert!(dev.accesses().is_empty());
        assert!(fetch(&mut dev, usize::MAX, &mut sink).is_err());
    }

    #[test]
    fn load_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data-to-write.bin");
        std::fs::write(&path, [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]).unwrap();

        let words = load_words(&path, 2).unwrap();
        assert_eq!(words, [1, 2]);

        let mut dev = SimulatedDevice::new(64);
        write_all(&mut dev, 0x34, &words);
        let writes: Vec<_> = dev.writes().map(|(offset, value, _)| (offset, value)).collect();
        assert_eq!(writes, [(0x34, 1), (0x34, 2)]);

        let err = load_words(&path, 4).unwrap_err();
        assert!(matches!(err, Error::InputTruncated { read: 3, expected: 4, .. }));
    }
}
