//! The interactive/batch rename channel invoked per record when
//! `rename_flag` is set: offers the operator (or a pre-recorded batch file)
//! a chance to rename or skip each member before it's dispatched.

use std::io::{BufRead, Write};

use crate::buffer::DynBuffer;

#[derive(Debug, PartialEq, Eq)]
pub enum RenameOutcome {
    Unchanged,
    Renamed(Vec<u8>),
    Skip,
}

/// Prompts `output` with the member's current name and reads a replacement
/// line from `input`. A blank line means "skip this file"; a line equal to
/// the original name is treated the same as no input at all.
pub fn prompt_rename(
    input: &mut impl BufRead,
    output: &mut impl Write,
    name: &[u8],
    interactive: bool,
) -> std::io::Result<RenameOutcome> {
    if interactive {
        write!(output, "{} -> ", String::from_utf8_lossy(name))?;
        output.flush()?;
    }

    let mut buf = DynBuffer::new();
    if !buf.fgetstr(input, b'\n')? {
        return Ok(RenameOutcome::Skip);
    }
    let line = buf.as_bytes();
    if line.is_empty() {
        return Ok(RenameOutcome::Skip);
    }
    if line == name {
        return Ok(RenameOutcome::Unchanged);
    }
    Ok(RenameOutcome::Renamed(line.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blank_line_skips() {
        let mut input = Cursor::new(b"\n".to_vec());
        let mut output = Vec::new();
        let outcome = prompt_rename(&mut input, &mut output, b"a.txt", false).unwrap();
        assert_eq!(outcome, RenameOutcome::Skip);
    }

    #[test]
    fn same_name_is_unchanged() {
        let mut input = Cursor::new(b"a.txt\n".to_vec());
        let mut output = Vec::new();
        let outcome = prompt_rename(&mut input, &mut output, b"a.txt", false).unwrap();
        assert_eq!(outcome, RenameOutcome::Unchanged);
    }

    #[test]
    fn different_name_renames() {
        let mut input = Cursor::new(b"b.txt\n".to_vec());
        let mut output = Vec::new();
        let outcome = prompt_rename(&mut input, &mut output, b"a.txt", false).unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed(b"b.txt".to_vec()));
    }

    #[test]
    fn eof_before_any_input_skips() {
        let mut input = Cursor::new(Vec::<u8>::new());
        let mut output = Vec::new();
        let outcome = prompt_rename(&mut input, &mut output, b"a.txt", false).unwrap();
        assert_eq!(outcome, RenameOutcome::Skip);
    }
}
