//! Runs the tickmud binary the way an operator would.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn tickmud(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tickmud"))
        .args(args)
        .output()
        .expect("failed to run tickmud")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tickmud-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn help_lists_the_flags() {
    let output = tickmud(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--check", "--dir", "--mini", "--quick", "--restrict", "--no-specials", "--logfile", "--seed"] {
        assert!(stdout.contains(flag), "missing {}", flag);
    }
}

#[test]
fn check_mode_boots_the_shipped_world() {
    let output = tickmud(&["--check", "--dir", "lib"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn check_mode_falls_back_to_the_builtin_world() {
    let dir = scratch_dir("builtin");
    let output = tickmud(&["--check", "--dir", dir.to_str().unwrap()]);
    assert!(output.status.success());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn a_broken_world_file_fails_the_check() {
    let dir = scratch_dir("broken");
    fs::write(dir.join("world.json"), "{ \"rooms\": [ }").unwrap();
    let output = tickmud(&["--check", "--dir", dir.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn privileged_ports_are_refused() {
    let output = tickmud(&["80"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Illegal port number 80"));
}
