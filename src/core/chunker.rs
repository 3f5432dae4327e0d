use std::num::NonZeroUsize;

use crate::core::error::ConfigurationError;

/// Reference chunk size for tournament rounds
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Smallest chunk that still lets the judge compare candidates
pub const MIN_CHUNK_SIZE: usize = 2;

/// Validated chunk size of at least [`MIN_CHUNK_SIZE`]
///
/// With two or more candidates per chunk a pool larger than one chunk always
/// shrinks, so every tournament terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub fn new(size: usize) -> Result<Self, ConfigurationError> {
        NonZeroUsize::new(size)
            .filter(|n| n.get() >= MIN_CHUNK_SIZE)
            .map(Self)
            .ok_or(ConfigurationError::ChunkSizeTooSmall {
                size,
                min: MIN_CHUNK_SIZE,
            })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Split candidates into consecutive chunks of `size`, the last one possibly shorter
///
/// Boundaries depend only on input order and `size`. An empty input yields no
/// chunks.
pub fn chunk<T>(candidates: &[T], size: ChunkSize) -> Vec<&[T]> {
    candidates.chunks(size.get()).collect()
}

/// Number of chunks `chunk` produces for `len` candidates
pub fn chunk_count(len: usize, size: ChunkSize) -> usize {
    len.div_ceil(size.get())
}
