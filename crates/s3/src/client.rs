//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3fc-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_smithy_types::error::display::DisplayErrorContext;
use s3fc_core::{Error, ListPage, ObjectEntry, ObjectStore, RemotePath, Result, StoreSettings};

/// Page size requested from ListObjectsV2
const LIST_PAGE_SIZE: i32 = 1000;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from store settings.
    ///
    /// Without static keys the default AWS credential chain (environment,
    /// shared profile, instance metadata) is used.
    pub async fn new(settings: &StoreSettings) -> Result<Self> {
        settings.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key)
        {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "s3fc-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }

        let config = loader.load().await;
        tracing::debug!(region = ?config.region(), "Loaded AWS SDK config");

        // Self-hosted endpoints generally need path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.force_path_style || settings.endpoint.is_some())
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

/// Format an SDK error with its full source chain
fn format_sdk_error<E, R>(error: &SdkError<E, R>) -> String
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match error {
        SdkError::ServiceError(service_err) => {
            format!("Service error: {}", DisplayErrorContext(service_err.err()))
        }
        SdkError::TimeoutError(_) => "Request timeout".to_string(),
        SdkError::DispatchFailure(err) => format!("Network dispatch error: {err:?}"),
        _ => DisplayErrorContext(error).to_string(),
    }
}

/// Service error codes meaning the bucket or key does not exist
const MISSING_CODES: [&str; 3] = ["NoSuchKey", "NoSuchBucket", "NotFound"];

/// Service error codes meaning the credentials were rejected
const AUTH_CODES: [&str; 6] = [
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
    "AllAccessDisabled",
];

/// Map an SDK failure onto the s3fc error taxonomy.
///
/// `missing` describes the resource reported when the service says it does
/// not exist.
fn map_sdk_error<E, R>(error: SdkError<E, R>, missing: impl FnOnce() -> String) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format_sdk_error(&error);

    match error.as_service_error().and_then(|e| e.code()) {
        Some(code) if MISSING_CODES.contains(&code) => Error::NotFound(missing()),
        Some(code) if AUTH_CODES.contains(&code) => Error::Auth(message),
        Some(_) => Error::Network(message),
        // Credential resolution fails before the request reaches the service
        None if message.to_lowercase().contains("credential") => Error::Auth(message),
        None => Error::Network(message),
    }
}

/// `x-amz-copy-source` value: bucket plus the percent-encoded key
fn copy_source(src: &RemotePath) -> String {
    let key = src
        .key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{key}", src.bucket)
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(LIST_PAGE_SIZE);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, || format!("Bucket not found: {bucket}")))?;

        let entries = response
            .contents()
            .iter()
            .filter_map(|object| {
                object
                    .key()
                    .map(|key| ObjectEntry::new(key, object.size()))
            })
            .collect();

        let continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        tracing::debug!(
            bucket,
            prefix,
            count = response.key_count().unwrap_or_default(),
            truncated = continuation_token.is_some(),
            "Listed page"
        );

        Ok(ListPage {
            entries,
            continuation_token,
        })
    }

    async fn get_object(&self, path: &RemotePath) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, || path.to_string()))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        let mut request = self
            .inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, || format!("Bucket not found: {}", path.bucket)))?;

        Ok(())
    }

    async fn copy_object(&self, src: &RemotePath, dst: &RemotePath) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(src))
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, || src.to_string()))?;

        Ok(())
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, || path.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::http::HttpResponse;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::get_object::GetObjectError;
    use aws_sdk_s3::primitives::SdkBody;

    #[tokio::test]
    async fn test_new_rejects_partial_credentials() {
        let settings = StoreSettings {
            access_key: Some("AKIAEXAMPLE".to_string()),
            ..Default::default()
        };
        let err = S3Client::new(&settings).await.err().unwrap();
        assert!(err.is_auth());
    }

    fn service_error(status: u16, code: &str) -> SdkError<GetObjectError, HttpResponse> {
        let meta = ErrorMetadata::builder()
            .code(code)
            .message("service said no")
            .build();
        SdkError::service_error(
            GetObjectError::generic(meta),
            HttpResponse::new(status.try_into().unwrap(), SdkBody::empty()),
        )
    }

    #[test]
    fn test_copy_source_encodes_key() {
        let src = RemotePath::new("bucket", "in/일자 2024+a%.csv");
        assert_eq!(
            copy_source(&src),
            "bucket/in/%EC%9D%BC%EC%9E%90%202024%2Ba%25.csv"
        );

        let plain = RemotePath::new("bucket", "data/menu2160-a.csv");
        assert_eq!(copy_source(&plain), "bucket/data/menu2160-a.csv");
    }

    #[test]
    fn test_map_sdk_error_by_code() {
        let missing = map_sdk_error(service_error(404, "NoSuchKey"), || "s3://b/k".to_string());
        assert!(matches!(missing, Error::NotFound(ref what) if what == "s3://b/k"));

        let denied = map_sdk_error(service_error(403, "AccessDenied"), String::new);
        assert!(denied.is_auth());

        let throttled = map_sdk_error(service_error(503, "SlowDown"), String::new);
        assert!(matches!(throttled, Error::Network(_)));
    }

    #[test]
    fn test_map_sdk_error_without_service_code() {
        let no_credentials: SdkError<GetObjectError, HttpResponse> =
            SdkError::construction_failure("no credentials in the provider chain");
        assert!(map_sdk_error(no_credentials, String::new).is_auth());

        let other: SdkError<GetObjectError, HttpResponse> =
            SdkError::construction_failure("invalid endpoint");
        assert!(matches!(
            map_sdk_error(other, String::new),
            Error::Network(_)
        ));
    }

    #[tokio::test]
    async fn test_new_with_static_credentials() {
        let settings = StoreSettings {
            endpoint: Some("http://localhost:9000".to_string()),
            region: Some("us-east-1".to_string()),
            access_key: Some("minio".to_string()),
            secret_key: Some("minio123".to_string()),
            ..Default::default()
        };
        let client = S3Client::new(&settings).await.unwrap();
        assert_eq!(
            client.inner().config().region().map(|r| r.as_ref()),
            Some("us-east-1")
        );
    }
}
