use assert_cmd::Command;
use predicates::prelude::*;
use std::{
    fs::{self, File},
    os::unix::fs::FileExt,
};

fn bin(name: &str) -> Command {
    Command::cargo_bin(name).unwrap()
}

/// A sparse file standing in for physical memory up to `len` bytes.
fn fake_mem(dir: &tempfile::TempDir, len: u64) -> std::path::PathBuf {
    let path = dir.path().join("mem");
    File::create(&path).unwrap().set_len(len).unwrap();
    path
}

fn word_at(path: &std::path::Path, address: u64) -> u32 {
    let mut buf = [0; 4];
    File::open(path).unwrap().read_exact_at(&mut buf, address).unwrap();
    u32::from_ne_bytes(buf)
}

#[test]
fn save_data_without_sample_count_is_not_an_error() {
    bin("save-data")
        .assert()
        .success()
        .stdout(predicate::str::contains("number of samples"));
}

#[test]
fn save_data_rejects_unknown_flags() {
    bin("save-data")
        .args(["-n", "3", "-z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("-z"));
}

#[test]
fn save_data_rejects_wide_masks() {
    bin("save-data")
        .args(["-n", "3", "--streams", "0b100000"])
        .assert()
        .failure();
}

#[test]
fn unopenable_device_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("SavedData.bin");

    bin("save-data")
        .args(["-n", "3", "--streams", "0b101", "-t", "file", "--device", "/nonexistent/mem"])
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("save-data: cannot open /nonexistent/mem"));

    assert!(!out.exists());
}

#[test]
fn save_data_against_a_memory_image() {
    let dir = tempfile::tempdir().unwrap();
    let mem = fake_mem(&dir, 0x4000_0000 + 0x4_0000);

    bin("save-data")
        .args(["-n", "3", "-p", "-d", "-t", "console", "-b", "-f", "--device"])
        .arg(&mem)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("00000000\n".repeat(6)))
        .stdout(predicate::str::contains("Execution time: "))
        .stdout(predicate::str::contains("Time per read: "));

    // FIFO left disabled, control holds the start pattern
    assert_eq!(word_at(&mem, 0x4000_0024), 0);
    assert_eq!(word_at(&mem, 0x4000_0000), 0b10);
}

#[test]
fn save_data_rejects_uncountable_runs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("SavedData.bin");

    bin("save-data")
        .args(["-n", "9223372036854775808", "-p", "-s", "--device", "/nonexistent/mem"])
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("do not fit in a 64-bit count"));

    assert!(!out.exists());
}

#[test]
fn save_data_memory_mode_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let mem = fake_mem(&dir, 0x4000_0000 + 0x4_0000);
    let out = dir.path().join("capture.bin");

    bin("save-data")
        .args(["-n", "5", "--streams", "0x1f", "-t", "1", "--device"])
        .arg(&mem)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::metadata(&out).unwrap().len(), 5 * 5 * 4);
    assert_eq!(word_at(&mem, 0x4000_0000), 0b100);
}

#[test]
fn fetch_data_rejects_missing_bank() {
    bin("fetch-data")
        .args(["4", "7"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fetch-data: no memory bank 7"));
    bin("fetch-data")
        .assert()
        .success()
        .stdout(predicate::str::contains("at least one argument"));
}

#[test]
fn fetch_data_past_window() {
    let dir = tempfile::tempdir().unwrap();
    let mem = fake_mem(&dir, 0x4200_0000 + 0x4_0000);

    bin("fetch-data")
        .args(["65537", "--device"])
        .arg(&mem)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("run past"));
}

#[test]
fn monitor_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mem = fake_mem(&dir, 0x2000);

    bin("monitor").args(["0x1010", "0xabc", "--device"]).arg(&mem).assert().success();
    bin("monitor")
        .args(["0x1010", "--device"])
        .arg(&mem)
        .assert()
        .success()
        .stdout("0x00000abc\n");
    assert_eq!(word_at(&mem, 0x1010), 0xabc);

    bin("monitor")
        .args(["0x1012", "--device"])
        .arg(&mem)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not word aligned"));
}

#[test]
fn write_file_needs_enough_input() {
    let dir = tempfile::tempdir().unwrap();
    let mem = fake_mem(&dir, 0x4000_0000 + 0x4_0000);
    let input = dir.path().join("data-to-write.bin");
    fs::write(&input, [1, 0, 0, 0]).unwrap();

    bin("write-file")
        .args(["2", "--device"])
        .arg(&mem)
        .arg("-i")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("holds only 1 of 2 words"));

    bin("write-file")
        .args(["1", "--device"])
        .arg(&mem)
        .arg("-i")
        .arg(&input)
        .assert()
        .success();
    assert_eq!(word_at(&mem, 0x4000_0034), 1);
}
