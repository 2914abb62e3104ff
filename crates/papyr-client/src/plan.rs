//! Part planning for chunked uploads.
//!
//! A `PartPlan` splits a known file size into fixed-size parts. Planning is
//! pure arithmetic over the size: the iterator yields byte ranges lazily, so a
//! plan can be built (and cloned for a retry from scratch) without touching
//! file data.

/// Files at or above this size go through the chunked protocol.
pub const DIRECT_UPLOAD_THRESHOLD: usize = 10 * 1024 * 1024;

/// Default and minimum part size. S3 rejects non-final parts under 5 MiB, so
/// smaller requested sizes are raised rather than honored.
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Whether a file of this size must use the chunked protocol.
pub fn needs_chunking(file_size: usize) -> bool {
    file_size >= DIRECT_UPLOAD_THRESHOLD
}

/// One planned part: a 1-based part number and the half-open byte range
/// `[byte_start, byte_end)` it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpec {
    pub part_number: i32,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl PartSpec {
    pub fn len(&self) -> usize {
        self.byte_end - self.byte_start
    }

    pub fn is_empty(&self) -> bool {
        self.byte_start == self.byte_end
    }
}

/// Lazy iterator over the parts of a file. Cloning restarts from part 1.
#[derive(Debug, Clone)]
pub struct PartPlan {
    total_size: usize,
    part_size: usize,
    next_start: usize,
    next_number: i32,
}

impl PartPlan {
    /// Plan parts of `part_size` bytes over `total_size` bytes. A requested
    /// part size below the minimum is raised to it.
    pub fn new(total_size: usize, part_size: usize) -> Self {
        PartPlan {
            total_size,
            part_size: part_size.max(MIN_PART_SIZE),
            next_start: 0,
            next_number: 1,
        }
    }

    pub fn part_size(&self) -> usize {
        self.part_size
    }

    /// Total number of parts this plan yields.
    pub fn part_count(&self) -> usize {
        self.total_size.div_ceil(self.part_size)
    }
}

impl Iterator for PartPlan {
    type Item = PartSpec;

    fn next(&mut self) -> Option<PartSpec> {
        if self.next_start >= self.total_size {
            return None;
        }
        let byte_start = self.next_start;
        let byte_end = (byte_start + self.part_size).min(self.total_size);
        let part_number = self.next_number;
        self.next_start = byte_end;
        self.next_number += 1;
        Some(PartSpec {
            part_number,
            byte_start,
            byte_end,
        })
    }
}
