use std::ffi::CString;
use std::io::BufRead;

/// Shell-glob match against a sanitized archive member name, using the
/// platform's `fnmatch(3)` so behavior (bracket expressions, `*`/`?`
/// semantics) matches what users expect from the historical tool.
pub fn matches(pattern: &str, name: &[u8]) -> bool {
    let Ok(pattern_c) = CString::new(pattern) else {
        return false;
    };
    let Ok(name_c) = CString::new(name) else {
        return false;
    };
    let ret = unsafe { libc::fnmatch(pattern_c.as_ptr(), name_c.as_ptr(), 0) };
    ret == 0
}

pub fn any_match(patterns: &[String], name: &[u8]) -> bool {
    patterns.iter().any(|p| matches(p, name))
}

/// Loads one pattern per line from a pattern file, the way `-E file` does.
/// Blank lines are skipped.
pub fn load_pattern_file(reader: impl std::io::Read) -> std::io::Result<Vec<String>> {
    let mut patterns = Vec::new();
    for line in std::io::BufReader::new(reader).lines() {
        let line = line?;
        if !line.is_empty() {
            patterns.push(line);
        }
    }
    Ok(patterns)
}
