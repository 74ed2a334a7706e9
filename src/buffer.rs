//! Grow-on-write byte buffer used for the rename channel and any other
//! reads whose length isn't known up front (header fields are fixed-width
//! and never need this). `Vec<u8>` already amortizes growth, so this is a
//! thin wrapper that adds the NUL-terminated accumulate-until-terminator
//! behavior the driver needs.

use std::io::BufRead;

#[derive(Default)]
pub struct DynBuffer {
    data: Vec<u8>,
}

impl DynBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Reads bytes from `r` up to and including `terminator`, appending them
    /// (terminator excluded) to the buffer. Returns `false` if EOF was hit
    /// before any byte was read, matching `ds_fgetstr`'s "no more data"
    /// signal; an EOF after at least one byte still returns `true`.
    pub fn fgetstr(&mut self, r: &mut impl BufRead, terminator: u8) -> std::io::Result<bool> {
        let start_len = self.data.len();
        loop {
            let mut byte = [0u8; 1];
            match r.read(&mut byte)? {
                0 => return Ok(self.data.len() != start_len),
                _ => {
                    if byte[0] == terminator {
                        return Ok(true);
                    }
                    self.data.push(byte[0]);
                }
            }
        }
    }
}
