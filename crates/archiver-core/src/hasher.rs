//! # Content Hasher — Whole-Buffer and Chunked SHA-256
//!
//! `ContentHasher` computes a [`ContentDigest`] either over a materialized
//! byte slice or incrementally over any [`Read`] source in bounded chunks.
//!
//! ## Invariant
//!
//! For every byte sequence `B` and every chunk size `c` (including `0`,
//! meaning "read the whole input at once"), the chunked digest of `B`
//! equals the whole-buffer digest of `B`. Chunking bounds peak memory; it
//! never changes the result.
//!
//! Read errors propagate unchanged. `ErrorKind::Interrupted` is retried, as
//! `std::io::Read::read_to_end` does.

use std::io::{ErrorKind, Read};

use sha2::{Digest, Sha256};

use crate::digest::{ContentDigest, DigestAlgorithm};

/// Default chunk size for streamed hashing: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Computes content digests, optionally streaming in bounded chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ContentHasher {
    /// Create a hasher that reads `chunk_size` bytes at a time.
    ///
    /// A chunk size of `0` reads the whole input into memory before hashing.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Create a hasher that always reads the whole input at once.
    pub fn whole() -> Self {
        Self::new(0)
    }

    /// The configured chunk size (`0` = whole input).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Digest a fully materialized byte slice.
    pub fn digest_bytes(&self, data: &[u8]) -> ContentDigest {
        let mut digest = IncrementalDigest::new();
        if self.chunk_size == 0 {
            digest.update(data);
        } else {
            for chunk in data.chunks(self.chunk_size) {
                digest.update(chunk);
            }
        }
        digest.finalize()
    }

    /// Digest everything `reader` yields until end of input.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the source cannot be read to
    /// completion. A partial digest is never returned.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<ContentDigest> {
        let mut digest = IncrementalDigest::new();
        if self.chunk_size == 0 {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            digest.update(&data);
            return Ok(digest.finalize());
        }

        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => digest.update(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(digest.finalize())
    }
}

/// An in-progress SHA-256 computation fed one chunk at a time.
#[derive(Debug, Clone, Default)]
pub struct IncrementalDigest {
    hasher: Sha256,
    len: u64,
}

impl IncrementalDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of input.
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Total number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the computation and produce the digest.
    pub fn finalize(self) -> ContentDigest {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.hasher.finalize());
        ContentDigest::new(DigestAlgorithm::Sha256, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::sha256_digest;
    use proptest::prelude::*;
    use std::io::Cursor;

    /// A reader that hands out at most `max` bytes per call and injects one
    /// `Interrupted` error before the first read.
    struct TrickleReader {
        data: Vec<u8>,
        pos: usize,
        max: usize,
        interrupted: bool,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.max).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_default_chunk_size_is_64k() {
        assert_eq!(ContentHasher::default().chunk_size(), 65536);
        assert_eq!(ContentHasher::whole().chunk_size(), 0);
    }

    #[test]
    fn test_data_chunk_two_matches_whole() {
        let chunked = ContentHasher::new(2).digest_reader(Cursor::new(b"data")).unwrap();
        let whole = ContentHasher::whole().digest_reader(Cursor::new(b"data")).unwrap();
        assert_eq!(chunked, whole);
        assert_eq!(whole, sha256_digest(b"data"));
    }

    #[test]
    fn test_empty_input() {
        let empty = sha256_digest(b"");
        assert_eq!(ContentHasher::new(1).digest_reader(Cursor::new(b"")).unwrap(), empty);
        assert_eq!(ContentHasher::whole().digest_reader(Cursor::new(b"")).unwrap(), empty);
        assert_eq!(ContentHasher::default().digest_bytes(b""), empty);
    }

    #[test]
    fn test_short_reads_and_interrupts_are_tolerated() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let reader = TrickleReader {
            data: data.clone(),
            pos: 0,
            max: 7,
            interrupted: false,
        };
        let digest = ContentHasher::new(4096).digest_reader(reader).unwrap();
        assert_eq!(digest, sha256_digest(&data));
    }

    #[test]
    fn test_read_error_propagates() {
        let err = ContentHasher::default().digest_reader(FailingReader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = ContentHasher::whole().digest_reader(FailingReader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_incremental_len() {
        let mut d = IncrementalDigest::new();
        assert!(d.is_empty());
        d.update(b"he");
        d.update(b"llo");
        assert_eq!(d.len(), 5);
        assert_eq!(d.finalize(), sha256_digest(b"hello"));
    }

    proptest! {
        /// Streaming in chunks of any size yields the whole-buffer digest.
        #[test]
        fn chunked_reader_matches_whole(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            chunk in 0usize..600,
        ) {
            let whole = sha256_digest(&data);
            let streamed = ContentHasher::new(chunk).digest_reader(Cursor::new(&data)).unwrap();
            prop_assert_eq!(streamed, whole);
        }

        /// Slicing an in-memory buffer into chunks yields the whole-buffer digest.
        #[test]
        fn chunked_bytes_matches_whole(
            data in prop::collection::vec(any::<u8>(), 0..4096),
            chunk in 0usize..600,
        ) {
            prop_assert_eq!(ContentHasher::new(chunk).digest_bytes(&data), sha256_digest(&data));
        }
    }
}
