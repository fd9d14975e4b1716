//! Integration tests for the `csv-report` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const CITIES: &str = "name,population\nTokyo,37400000\nDelhi,30290000\n";

fn cmd() -> Command {
    Command::cargo_bin("csv-report").unwrap()
}

#[test]
fn help_lists_report_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--image-mode"))
        .stdout(predicate::str::contains("--row-policy"))
        .stdout(predicate::str::contains("--no-image"));
}

#[test]
fn missing_source_exits_non_zero_without_output() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("absent.csv")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("absent.csv"));

    assert!(!dir.path().join("reporte.pdf").exists());
}

#[test]
fn default_source_is_cities_csv() {
    let dir = tempfile::tempdir().unwrap();

    cmd()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cities.csv"));
}

#[test]
fn strict_policy_rejects_ragged_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ragged.csv"), "a,b\n1,2\n3\n").unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["ragged.csv", "--row-policy", "strict", "--no-image"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));

    assert!(!dir.path().join("reporte.pdf").exists());
}

#[test]
fn wrong_number_of_column_widths_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cities.csv"), CITIES).unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["--no-image", "--column-widths", "50,50,50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("column widths"));

    assert!(!dir.path().join("reporte.pdf").exists());
}

#[test]
fn renders_report_in_working_directory() {
    if !csv_report::fonts::default_fonts_available() {
        eprintln!("Skipping CLI render test: report fonts are not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cities.csv"), CITIES).unwrap();

    // stats.png does not exist here; the report is still produced without it.
    cmd()
        .current_dir(dir.path())
        .assert()
        .success();

    let pdf = fs::read(dir.path().join("reporte.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn long_table_renders_across_pages() {
    if !csv_report::fonts::default_fonts_available() {
        eprintln!("Skipping CLI render test: report fonts are not available");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("name,population\n");
    for index in 0..30 {
        csv.push_str(&format!("city{index},{index}000\n"));
    }
    fs::write(dir.path().join("cities.csv"), csv).unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("--no-image")
        .assert()
        .success();

    let pdf = fs::read(dir.path().join("reporte.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}
