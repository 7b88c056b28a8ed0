//! s3fc-s3: S3 SDK adapter for s3fc
//!
//! Implements the `ObjectStore` trait from s3fc-core on top of aws-sdk-s3.

mod client;

pub use client::S3Client;
