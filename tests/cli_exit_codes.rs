//! Exit codes and on-disk effects of the two binaries

#![cfg(feature = "cli")]

mod common;

use common::{cutout, png_bytes, spawn_http_server};
use std::collections::HashMap;
use std::process::{Command, Output};
use tempfile::TempDir;

fn process_images() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_process_images"));
    command.env_remove("RUST_LOG").env("NO_COLOR", "1");
    command
}

fn process_single_image() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_process_single_image"));
    command.env_remove("RUST_LOG").env("NO_COLOR", "1");
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_batch_wrong_argument_count_exits_one() {
    let output = process_images().arg("only-one.csv").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let output = process_images().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let output = process_images().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("image_url"));
}

#[test]
fn test_batch_missing_csv_exits_one() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("out");
    let output = process_images()
        .arg(dir.path().join("absent.csv"))
        .arg(&output_dir)
        .args(["--matte", "passthrough"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!output_dir.exists());
}

#[test]
fn test_batch_missing_column_exits_one_without_output() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("rows.csv");
    std::fs::write(&csv_path, "name,url\nmug,http://127.0.0.1:1/mug.png\n").unwrap();
    let output_dir = dir.path().join("out");

    let output = process_images()
        .arg(&csv_path)
        .arg(&output_dir)
        .args(["--matte", "passthrough"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!output_dir.exists());
}

#[test]
fn test_batch_skips_empty_row_and_exits_zero() {
    let mut routes = HashMap::new();
    routes.insert(
        "first.png".to_string(),
        png_bytes(&cutout(120, 80, (10, 10, 100, 50), [255, 0, 0])),
    );
    routes.insert(
        "third.png".to_string(),
        png_bytes(&cutout(40, 40, (5, 5, 20, 30), [0, 0, 255])),
    );
    let base = spawn_http_server(routes);

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("rows.csv");
    std::fs::write(
        &csv_path,
        format!(
            "name,image_url\nfirst,{base}/first.png\nsecond,\n\
             third,{base}/third.png\nfourth,{base}/missing.png\n"
        ),
    )
    .unwrap();
    let output_dir = dir.path().join("out");
    let report_path = dir.path().join("report.json");

    let output = process_images()
        .arg(&csv_path)
        .arg(&output_dir)
        .args(["--matte", "passthrough", "--report"])
        .arg(&report_path)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
    assert!(output_dir.join("processed_1.png").exists());
    assert!(!output_dir.join("processed_2.png").exists());
    assert!(output_dir.join("processed_3.png").exists());
    assert!(!output_dir.join("processed_4.png").exists());

    let first = image::open(output_dir.join("processed_1.png")).unwrap();
    assert_eq!((first.width(), first.height()), (112, 112));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["processed"], 2);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 1);

    let log = stdout(&output);
    assert!(log.contains("No image URL found in row 2"));
    assert!(log.contains("Error processing row 4"));
}

#[test]
fn test_single_missing_input_exits_one() {
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("nested").join("out.png");

    let output = process_single_image()
        .arg(dir.path().join("absent.jpg"))
        .arg(&output_path)
        .args(["--matte", "passthrough"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!output_path.exists());
}

#[test]
fn test_single_wrong_argument_count_exits_one() {
    let output = process_single_image().arg("in.png").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_single_success_and_decode_failure() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.png");
    std::fs::write(&input, png_bytes(&cutout(30, 30, (0, 0, 30, 10), [0, 255, 0]))).unwrap();
    let output_path = dir.path().join("deep").join("dir").join("out.png");

    let output = process_single_image()
        .arg(&input)
        .arg(&output_path)
        .args(["--matte", "passthrough", "--background", "#ffffff"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
    let written = image::open(&output_path).unwrap().to_rgb8();
    // 30x10, margin 1 -> 32x12 -> 32x32
    assert_eq!(written.dimensions(), (32, 32));
    assert_eq!(written.get_pixel(0, 0).0, [255, 255, 255]);

    let garbage = dir.path().join("garbage.jpg");
    std::fs::write(&garbage, b"definitely not a jpeg").unwrap();
    let failed_output = dir.path().join("garbage.png");
    let output = process_single_image()
        .arg(&garbage)
        .arg(&failed_output)
        .args(["--matte", "passthrough"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(!failed_output.exists());
}
