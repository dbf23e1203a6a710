use thiserror::Error;

/// A flat byte-addressable memory with little-endian multi-byte access.
///
/// Half-word and word accesses require natural alignment; every access
/// is bounds-checked against the owned buffer.
pub struct Memory {
    data: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MemoryError {
    #[error("address {address:#010X} not aligned to {required} bytes")]
    Misaligned { address: u32, required: u32 },

    #[error("access of {size} bytes at {address:#010X} outside memory")]
    OutOfBounds { address: u32, size: u32 },
}

impl Memory {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check(&self, address: u32, size: u32) -> Result<usize, MemoryError> {
        if size > 1 && address % size != 0 {
            return Err(MemoryError::Misaligned {
                address,
                required: size,
            });
        }

        let end = u64::from(address) + u64::from(size);
        if end > self.data.len() as u64 {
            return Err(MemoryError::OutOfBounds { address, size });
        }

        Ok(address as usize)
    }

    pub fn read_at(&self, address: u32) -> Result<u8, MemoryError> {
        let index = self.check(address, 1)?;
        Ok(self.data[index])
    }

    pub fn write_at(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        let index = self.check(address, 1)?;
        self.data[index] = value;
        Ok(())
    }

    pub fn read_half_word(&self, address: u32) -> Result<u16, MemoryError> {
        let index = self.check(address, 2)?;
        Ok(u16::from(self.data[index]) | (u16::from(self.data[index + 1]) << 8))
    }

    pub fn write_half_word(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        let index = self.check(address, 2)?;
        self.data[index] = value as u8;
        self.data[index + 1] = (value >> 8) as u8;
        Ok(())
    }

    pub fn read_word(&self, address: u32) -> Result<u32, MemoryError> {
        let index = self.check(address, 4)?;
        let part_0 = u32::from(self.data[index]);
        let part_1 = u32::from(self.data[index + 1]);
        let part_2 = u32::from(self.data[index + 2]);
        let part_3 = u32::from(self.data[index + 3]);

        Ok(part_3 << 24 | part_2 << 16 | part_1 << 8 | part_0)
    }

    pub fn write_word(&mut self, address: u32, value: u32) -> Result<(), MemoryError> {
        let index = self.check(address, 4)?;
        self.data[index] = value as u8;
        self.data[index + 1] = (value >> 8) as u8;
        self.data[index + 2] = (value >> 16) as u8;
        self.data[index + 3] = (value >> 24) as u8;
        Ok(())
    }

    /// Copies a program image into memory starting at `origin`.
    pub fn load(&mut self, origin: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let size = u32::try_from(bytes.len()).map_err(|_| MemoryError::OutOfBounds {
            address: origin,
            size: u32::MAX,
        })?;

        let end = u64::from(origin) + u64::from(size);
        if end > self.data.len() as u64 {
            return Err(MemoryError::OutOfBounds {
                address: origin,
                size,
            });
        }

        let origin = origin as usize;
        self.data[origin..origin + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
