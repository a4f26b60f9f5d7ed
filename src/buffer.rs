// SampleBuffer - fixed-length f32 sample container
//
// The Rust-side counterpart of the `fvec` handle. Length is fixed at
// construction; storage is allocated fallibly so an allocation failure
// becomes a typed error (and a null handle at the FFI edge) instead of an
// abort.

use crate::error::{WrapperError, WrapperResult};

/// Fixed-capacity, zero-initialised sample buffer
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: Vec<f32>,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer of `length` samples
    ///
    /// # Errors
    /// - `InvalidParameter` when `length` is zero
    /// - `AllocationFailed` when the storage cannot be reserved
    pub fn new(length: usize) -> WrapperResult<Self> {
        if length == 0 {
            return Err(WrapperError::invalid("length", "must be greater than 0"));
        }

        let mut data = Vec::new();
        data.try_reserve_exact(length)
            .map_err(|_| WrapperError::AllocationFailed { samples: length })?;
        data.resize(length, 0.0);

        Ok(Self { data })
    }

    /// Allocate a buffer holding a copy of `samples`
    pub fn from_slice(samples: &[f32]) -> WrapperResult<Self> {
        let mut buffer = Self::new(samples.len())?;
        buffer.data.copy_from_slice(samples);
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; zero-length buffers cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read one sample
    pub fn get(&self, index: usize) -> WrapperResult<f32> {
        self.data
            .get(index)
            .copied()
            .ok_or(WrapperError::IndexOutOfBounds {
                index,
                length: self.data.len(),
            })
    }

    /// Write one sample
    pub fn set(&mut self, index: usize, value: f32) -> WrapperResult<()> {
        let length = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(WrapperError::IndexOutOfBounds { index, length })?;
        *slot = value;
        Ok(())
    }

    /// Reset every sample to 0.0
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Contiguous storage for bulk marshalling; valid until the buffer drops
    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }
}
