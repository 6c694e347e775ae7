use assert_cmd::Command;
use assert_cmd::cargo_bin;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(name)
}

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file.flush().unwrap();
    file
}

/// The binary with logging left at its defaults.
pub fn vendsim() -> Command {
    let mut cmd = Command::new(cargo_bin!("vendsim"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// The binary loaded with the fixture settings, coins and products.
pub fn stocked_machine() -> Command {
    let mut cmd = vendsim();
    cmd.arg("--settings")
        .arg(fixture("settings.json"))
        .arg("--coins")
        .arg(fixture("coins.txt"))
        .arg("--products")
        .arg(fixture("products.txt"));
    cmd
}
