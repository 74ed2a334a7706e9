//! End-to-end scenarios driving the whole decode -> dispatch -> write
//! pipeline through [`starry_cpio::driver::run`], one per archive built by
//! hand at the byte level. Mirrors the concrete scenarios in the design
//! notes (S1-S6): single-file round trip, hard-link groups with and
//! without a data-bearing member, CRC verification, junk tolerance, and the
//! delayed-symlink placeholder protocol.

use std::io::Cursor;
use std::os::unix::fs::MetadataExt;

use tempfile::tempdir;

use starry_cpio::options::Options;
use starry_cpio::reader::{ArchiveReader, PipeReader};

struct NewAsciiFields {
    magic: &'static str,
    ino: u32,
    mode: u32,
    uid: u32,
    gid: u32,
    nlink: u32,
    mtime: u32,
    dev_major: u32,
    dev_minor: u32,
    rdev_major: u32,
    rdev_minor: u32,
    chksum: u32,
}

fn new_ascii_record(fields: NewAsciiFields, name: &str, payload: &[u8]) -> Vec<u8> {
    let namesize = (name.len() + 1) as u32;
    let mut s = String::from(fields.magic);
    for v in [
        fields.ino,
        fields.mode,
        fields.uid,
        fields.gid,
        fields.nlink,
        fields.mtime,
        payload.len() as u32,
        fields.dev_major,
        fields.dev_minor,
        fields.rdev_major,
        fields.rdev_minor,
        namesize,
        fields.chksum,
    ] {
        s += &format!("{v:08x}");
    }
    let mut bytes = s.into_bytes();
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    let pad1 = (4 - bytes.len() % 4) % 4;
    bytes.extend(std::iter::repeat(0u8).take(pad1));
    bytes.extend_from_slice(payload);
    let pad2 = (4 - payload.len() % 4) % 4;
    bytes.extend(std::iter::repeat(0u8).take(pad2));
    bytes
}

fn trailer(magic: &'static str) -> Vec<u8> {
    new_ascii_record(
        NewAsciiFields {
            magic,
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 0,
            dev_major: 0,
            dev_minor: 0,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
        },
        "TRAILER!!!",
        b"",
    )
}

/// Hand-builds an old-binary header in native byte order: 13 native u16
/// fields, magic included, mtime and filesize each split high-half-first.
fn old_binary_record(ino: u16, mode: u16, mtime: u32, name: &str, payload: &[u8]) -> Vec<u8> {
    let namesize = (name.len() + 1) as u16;
    let filesize = payload.len() as u32;
    let fields: [u16; 13] = [
        0o070707,
        0,
        ino,
        mode,
        0,
        0,
        1,
        0,
        (mtime >> 16) as u16,
        (mtime & 0xffff) as u16,
        namesize,
        (filesize >> 16) as u16,
        (filesize & 0xffff) as u16,
    ];
    let mut bytes = Vec::new();
    for f in fields {
        bytes.extend_from_slice(&f.to_ne_bytes());
    }
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    let total = bytes.len();
    let pad1 = (2 - total % 2) % 2;
    bytes.extend(std::iter::repeat(0u8).take(pad1));
    bytes.extend_from_slice(payload);
    let pad2 = (2 - payload.len() % 2) % 2;
    bytes.extend(std::iter::repeat(0u8).take(pad2));
    bytes
}

fn old_binary_trailer() -> Vec<u8> {
    old_binary_record(0, 0, 0, "TRAILER!!!", b"")
}

fn run_archive(bytes: Vec<u8>, options: &Options) -> (bool, Vec<u8>) {
    let mut reader = PipeReader::new(Cursor::new(bytes));
    let mut diagnostics = Vec::new();
    let mut listing = Vec::new();
    let outcome = starry_cpio::driver::run(&mut reader, options, &mut diagnostics, &mut listing, None, 1_700_000_000)
        .expect("archive framing should succeed");
    (outcome.had_errors, diagnostics)
}

fn file_record(ino: u32, nlink: u32, name: &str, payload: &[u8]) -> Vec<u8> {
    new_ascii_record(
        NewAsciiFields {
            magic: "070701",
            ino,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            nlink,
            mtime: 1000,
            dev_major: 0,
            dev_minor: 1,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
        },
        name,
        payload,
    )
}

#[test]
fn s1_single_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");

    let mut bytes = file_record(1, 1, path.to_str().unwrap(), b"hello\n");
    bytes.extend(trailer("070701"));

    let options = Options::default();
    let (had_errors, _diagnostics) = run_archive(bytes, &options);

    assert!(!had_errors);
    assert_eq!(std::fs::read(&path).unwrap(), b"hello\n");
}

#[test]
fn s2_hardlink_group_links_every_member_to_the_data_bearing_one() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    let z = dir.path().join("z");

    let mut bytes = Vec::new();
    bytes.extend(file_record(7, 3, x.to_str().unwrap(), b""));
    bytes.extend(file_record(7, 3, y.to_str().unwrap(), b""));
    bytes.extend(file_record(7, 3, z.to_str().unwrap(), b"abc"));
    bytes.extend(trailer("070701"));

    let options = Options::default();
    let (had_errors, _diagnostics) = run_archive(bytes, &options);

    assert!(!had_errors);
    assert_eq!(std::fs::read(&x).unwrap(), b"abc");
    assert_eq!(std::fs::read(&y).unwrap(), b"abc");
    assert_eq!(std::fs::read(&z).unwrap(), b"abc");

    let ino_x = std::fs::metadata(&x).unwrap().ino();
    let ino_z = std::fs::metadata(&z).unwrap().ino();
    assert_eq!(ino_x, ino_z);
}

#[test]
fn s3_hardlink_group_with_no_data_materializes_an_empty_file() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    let z = dir.path().join("z");

    let mut bytes = Vec::new();
    bytes.extend(file_record(9, 3, x.to_str().unwrap(), b""));
    bytes.extend(file_record(9, 3, y.to_str().unwrap(), b""));
    bytes.extend(file_record(9, 3, z.to_str().unwrap(), b""));
    bytes.extend(trailer("070701"));

    let options = Options::default();
    let (_had_errors, _diagnostics) = run_archive(bytes, &options);

    for path in [&x, &y, &z] {
        assert_eq!(std::fs::read(path).unwrap(), b"");
    }
    let ino_x = std::fs::metadata(&x).unwrap().ino();
    let ino_z = std::fs::metadata(&z).unwrap().ino();
    assert_eq!(ino_x, ino_z);
}

#[test]
fn s4_crc_mismatch_reported_only_when_the_payload_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("f.bin");
    let payload = [0x01u8, 0x02, 0x03];
    let sum: u32 = payload.iter().map(|&b| b as u32).sum();

    let mut options = Options::default();
    options.only_verify_crc_flag = true;

    let mut good = new_ascii_record(
        NewAsciiFields {
            magic: "070702",
            ino: 1,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 1000,
            dev_major: 0,
            dev_minor: 1,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: sum,
        },
        path.to_str().unwrap(),
        &payload,
    );
    good.extend(trailer("070702"));
    let (had_errors, diagnostics) = run_archive(good, &options);
    assert!(!had_errors);
    assert!(!String::from_utf8_lossy(&diagnostics).contains("checksum error"));

    let mut bad = new_ascii_record(
        NewAsciiFields {
            magic: "070702",
            ino: 1,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 1000,
            dev_major: 0,
            dev_minor: 1,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: sum + 1,
        },
        path.to_str().unwrap(),
        &payload,
    );
    bad.extend(trailer("070702"));
    let (had_errors, diagnostics) = run_archive(bad, &options);
    assert!(had_errors);
    assert!(String::from_utf8_lossy(&diagnostics).contains("checksum error"));
}

#[test]
fn s5_leading_junk_is_skipped_and_warned_about_once() {
    let mut bytes = b"GARBAGE".to_vec();
    bytes.extend(old_binary_record(3, 0o100644, 1000, "b.txt", b"xy"));
    bytes.extend(old_binary_trailer());

    let options = Options::default();
    let (had_errors, diagnostics) = run_archive(bytes, &options);

    assert!(!had_errors);
    let text = String::from_utf8_lossy(&diagnostics);
    assert_eq!(text.matches("bytes of junk skipped").count(), 1);
    assert!(text.contains("7 bytes of junk skipped"));
}

#[test]
fn s6_delayed_symlink_placeholder_becomes_a_real_symlink() {
    // `no_abs_paths_flag` also strips leading slashes from the record's own
    // name (dispatcher::sanitize_name), so the archive member name here must
    // already be relative — only the symlink *target* below is absolute.
    // Run from inside the tempdir so the relative name still lands somewhere
    // this test can assert against.
    let dir = tempdir().unwrap();
    let original_cwd = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let link_name = "link";
    let target = b"/etc/passwd";

    let bytes_record = new_ascii_record(
        NewAsciiFields {
            magic: "070701",
            ino: 1,
            mode: 0o120777,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 1000,
            dev_major: 0,
            dev_minor: 1,
            rdev_major: 0,
            rdev_minor: 0,
            chksum: 0,
        },
        link_name,
        target,
    );
    let mut bytes = bytes_record;
    bytes.extend(trailer("070701"));

    let mut options = Options::default();
    options.no_abs_paths_flag = true;
    let (had_errors, _diagnostics) = run_archive(bytes, &options);

    let link = dir.path().join(link_name);
    let result = std::panic::catch_unwind(|| {
        assert!(!had_errors);
        let meta = std::fs::symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), std::path::PathBuf::from("/etc/passwd"));
    });
    std::env::set_current_dir(original_cwd).unwrap();
    result.unwrap();
}

#[test]
fn pipe_reader_round_trips_a_plain_peek() {
    // Sanity check that the test helpers above build headers the reader
    // actually recognizes, independent of the driver.
    let mut r = PipeReader::new(Cursor::new(b"070701".to_vec()));
    let mut probe = [0u8; 6];
    assert_eq!(r.peek(&mut probe).unwrap(), 6);
    assert_eq!(&probe, b"070701");
}
