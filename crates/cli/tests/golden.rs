//! Golden tests for verifying JSON output format stability
//!
//! None of these need a running object store.
//!
//! Run with: `cargo test --features golden`

#![cfg(feature = "golden")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_s3fc"))
        .args(args)
        .env("S3FC_CONFIG_DIR", config_dir)
        .env_remove("S3FC_ENDPOINT")
        .env_remove("S3FC_REGION")
        .env_remove("S3FC_PROFILE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute s3fc")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

mod merge_tests {
    use super::*;

    #[test]
    fn test_merge_json() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path();
        let old = dir.join("menu2160-code100060-to20240103-save20240104.csv");
        let new = dir.join("menu2160-code100060-to20240105-save20240106.csv");
        std::fs::write(
            &old,
            "일자,price\n2024-01-01,10\n2024-01-02,11\n2024-01-03,12\n",
        )
        .unwrap();
        std::fs::write(
            &new,
            "일자,price\n2024-01-02,11\n2024-01-03,12\n2024-01-04,13\n2024-01-05,14\n",
        )
        .unwrap();

        let output = run(
            dir,
            &[
                "merge",
                old.to_str().unwrap(),
                new.to_str().unwrap(),
                "--output-root",
                dir.to_str().unwrap(),
                "--today",
                "2024-01-06",
                "--json",
            ],
        );
        assert!(output.status.success(), "Command should succeed");

        let mut json = stdout_json(&output);
        let path = json
            .as_object_mut()
            .and_then(|o| o.remove("path"))
            .and_then(|p| p.as_str().map(str::to_string))
            .expect("Output should contain the written path");
        assert!(path.ends_with(
            "dataset-timeseries-menu2160-from20240101-to20240105-merge20240106/menu2160-code100060-to20240105-save20240106.csv"
        ));

        insta::assert_json_snapshot!(json, @r#"
        {
          "appended_rows": 2,
          "columns": 2,
          "first_date": "2024-01-01",
          "last_date": "2024-01-05",
          "rows": 5
        }
        "#);
    }

    #[test]
    fn test_merge_missing_date_column_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path();
        let old = dir.join("old.csv");
        let new = dir.join("new.csv");
        std::fs::write(&old, "date,price\n2024-01-01,10\n").unwrap();
        std::fs::write(&new, "date,price\n2024-01-02,11\n").unwrap();

        let output = run(
            dir,
            &[
                "merge",
                old.to_str().unwrap(),
                new.to_str().unwrap(),
                "--output-root",
                dir.to_str().unwrap(),
                "--json",
            ],
        );
        assert_eq!(output.status.code(), Some(2));
        assert!(output.stdout.is_empty());
    }
}

mod scan_tests {
    use super::*;

    #[test]
    fn test_scan_unknown_mode_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let output = run(
            temp_dir.path(),
            &["scan", "bucket/data", r"\.csv$", "--mode", "size", "--json"],
        );
        assert!(output.status.success(), "Command should succeed");

        let json = stdout_json(&output);
        insta::assert_json_snapshot!(json, @r#"
        {
          "bucket": "bucket",
          "count": 0,
          "entries": [],
          "error": "Invalid option 'size'. Available options: key, name",
          "mode": "size",
          "pattern": "\\.csv$",
          "prefix": "data"
        }
        "#);
    }

    #[test]
    fn test_scan_invalid_regex_is_usage_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let output = run(temp_dir.path(), &["scan", "bucket", "(", "--json"]);
        assert_eq!(output.status.code(), Some(2));
    }
}
