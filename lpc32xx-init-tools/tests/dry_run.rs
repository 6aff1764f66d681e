use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn lpc32xx_init(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lpc32xx-init"))
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run lpc32xx-init")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn dry_run_reset_prints_the_trace() {
    let output = lpc32xx_init(&["--dry-run", "reset"]);
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 54);
    assert_eq!(lines[0], "halt-and-hold 1");
    assert_eq!(lines[2], "mcr   p15, 0, c1, c0, 0 <- 0xffffeffa");
    assert_eq!(lines[53], "write 0x31080200 <- 0x00000081");
}

#[test]
fn dry_run_nor_loader() {
    let output = lpc32xx_init(&["--dry-run", "reset", "--script", "nor-loader"]);
    assert!(output.status.success());

    assert_eq!(
        stdout_lines(&output),
        [
            "halt-and-hold 1",
            "mrc   p15, 0, c1, c0, 0 -> 0xffffffff",
            "mcr   p15, 0, c1, c0, 0 <- 0xffffeffa",
            "ice   5 -> 0xffffffff",
        ]
    );
}

#[test]
fn init_ddr_needs_a_memory_bring_up() {
    let output = lpc32xx_init(&["--dry-run", "init-ddr", "--script", "nor-loader"]);
    assert!(!output.status.success());
}

#[test]
fn steps_json_lists_the_sequence() {
    let output = lpc32xx_init(&["steps", "--memory", "--json"]);
    assert!(output.status.success());

    let sequence: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sequence["name"], "DDR bring-up");
    assert_eq!(sequence["phases"].as_array().unwrap().len(), 6);
}

#[test]
fn unknown_script_is_rejected() {
    let output = lpc32xx_init(&["steps", "--script", "lpc3180"]);
    assert!(!output.status.success());
}
