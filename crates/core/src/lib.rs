//! s3fc-core: Core library for the s3fc object storage file control tool
//!
//! This crate provides:
//! - Prefix normalization and segment-wise key rewriting
//! - The `ObjectStore` trait and an in-memory implementation
//! - Regex-scoped scanning of bucket listings
//! - Bulk download, upload, copy and move driven by scans
//! - CSV and spreadsheet reads into an in-memory `Table`
//! - Time-series CSV merging
//! - Configuration management
//!
//! Nothing here depends on a particular SDK; the S3 adapter lives in
//! `s3fc-s3`.

pub mod config;
pub mod error;
pub mod memory;
pub mod path;
pub mod relocate;
pub mod scan;
pub mod table;
pub mod timeseries;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, MergeSettings, StoreSettings};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use path::{RemoteKey, RemotePath, key_name, normalize_prefix};
pub use relocate::{
    RelocateMode, RelocateReport, copy_by_pattern, create_folder, move_by_pattern,
    relocate_by_pattern,
};
pub use scan::{ScanMode, ScanOutcome, compile_pattern, scan_by_pattern};
pub use table::{
    ObjectRef, ReadFailure, Table, read_csv, read_csv_by_pattern, read_excel,
    read_excel_by_pattern,
};
pub use timeseries::{MergeOptions, MergeOutcome, merge_timeseries_csv};
pub use traits::{ListPage, ObjectEntry, ObjectStore};
pub use transfer::{
    DownloadedFile, LocalScanMode, UploadedFile, download_by_pattern, scan_local_files,
    upload_by_pattern,
};
