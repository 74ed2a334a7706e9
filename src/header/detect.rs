use crate::dialect::Dialect;
use crate::error::StreamError;
use crate::numeric::from_ascii;
use crate::reader::ArchiveReader;

const OLD_BINARY_MAGIC: [u8; 2] = 0o070707u16.to_ne_bytes();

pub struct DetectedFormat {
    pub dialect: Dialect,
    /// Set only for `Dialect::OldBinary`: whether every 16-bit header field
    /// needs byte-swapping before use.
    pub swap_binary: bool,
    /// Bytes discarded before the magic was found, for the "skipped N
    /// bytes of junk" warning.
    pub junk_skipped: u64,
}

/// Peeks ahead to classify the archive's wire format, discarding one byte
/// at a time on mismatch until a magic is recognized. Never consumes the
/// matched magic itself; the per-dialect decoder re-reads it as part of its
/// own header.
pub fn detect_format(reader: &mut dyn ArchiveReader) -> Result<DetectedFormat, StreamError> {
    let mut junk_skipped: u64 = 0;

    loop {
        let mut probe = [0u8; 512];
        let n = reader.peek(&mut probe)?;
        if n < 6 {
            return Err(StreamError::ShortHeader);
        }

        if &probe[..6] == b"070701" {
            return Ok(DetectedFormat {
                dialect: Dialect::NewAscii,
                swap_binary: false,
                junk_skipped,
            });
        }
        if &probe[..6] == b"070707" {
            return Ok(DetectedFormat {
                dialect: Dialect::OldAscii,
                swap_binary: false,
                junk_skipped,
            });
        }
        if &probe[..6] == b"070702" {
            return Ok(DetectedFormat {
                dialect: Dialect::NewCrc,
                swap_binary: false,
                junk_skipped,
            });
        }
        if probe[..2] == OLD_BINARY_MAGIC {
            return Ok(DetectedFormat {
                dialect: Dialect::OldBinary,
                swap_binary: false,
                junk_skipped,
            });
        }
        if probe[0] == OLD_BINARY_MAGIC[1] && probe[1] == OLD_BINARY_MAGIC[0] {
            return Ok(DetectedFormat {
                dialect: Dialect::OldBinary,
                swap_binary: true,
                junk_skipped,
            });
        }
        if n == 512 {
            if let Some(is_ustar) = classify_tar_block(&probe) {
                return Ok(DetectedFormat {
                    dialect: if is_ustar { Dialect::Ustar } else { Dialect::Tar },
                    swap_binary: false,
                    junk_skipped,
                });
            }
        }

        reader.toss(1)?;
        junk_skipped += 1;
    }
}

/// A 512-byte block is a valid tar header if its checksum field matches the
/// sum of every other byte (treating the checksum field itself as eight
/// spaces while summing). Returns whether the ustar magic is present.
fn classify_tar_block(block: &[u8; 512]) -> Option<bool> {
    let field = from_ascii(&block[148..156], 3);
    if field.malformed {
        return None;
    }

    let mut sum: u32 = 8 * b' ' as u32;
    for (i, &b) in block.iter().enumerate() {
        if (148..156).contains(&i) {
            continue;
        }
        sum += b as u32;
    }

    if sum as u64 != field.value {
        return None;
    }

    let is_ustar = &block[257..263] == b"ustar\0" || &block[257..263] == b"ustar ";
    Some(is_ustar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ArchiveReader, PipeReader};
    use std::io::Cursor;

    fn reader_for(bytes: Vec<u8>) -> PipeReader<Cursor<Vec<u8>>> {
        PipeReader::new(Cursor::new(bytes))
    }

    #[test]
    fn detects_new_ascii() {
        let mut r = reader_for(b"070701rest-of-header".to_vec());
        let f = detect_format(&mut r).unwrap();
        assert_eq!(f.dialect, Dialect::NewAscii);
        assert_eq!(f.junk_skipped, 0);
    }

    #[test]
    fn detects_new_crc() {
        let mut r = reader_for(b"070702rest-of-header".to_vec());
        let f = detect_format(&mut r).unwrap();
        assert_eq!(f.dialect, Dialect::NewCrc);
    }

    #[test]
    fn skips_junk_before_magic() {
        let mut bytes = b"GARBAGE".to_vec();
        bytes.extend_from_slice(b"070707restofheader");
        let mut r = reader_for(bytes);
        let f = detect_format(&mut r).unwrap();
        assert_eq!(f.dialect, Dialect::OldAscii);
        assert_eq!(f.junk_skipped, 7);

        let mut rest = [0u8; 6];
        r.read_exact(&mut rest).unwrap();
        assert_eq!(&rest, b"070707");
    }

    #[test]
    fn detects_swapped_old_binary() {
        let swapped = [OLD_BINARY_MAGIC[1], OLD_BINARY_MAGIC[0]];
        let mut bytes = swapped.to_vec();
        bytes.extend_from_slice(&[0u8; 24]);
        let mut r = reader_for(bytes);
        let f = detect_format(&mut r).unwrap();
        assert_eq!(f.dialect, Dialect::OldBinary);
        assert!(f.swap_binary);
    }
}
