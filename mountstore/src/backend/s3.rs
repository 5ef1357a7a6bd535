//! S3-compatible backend adapter.
//!
//! Handles AWS S3, Backblaze B2 and MinIO through the S3 API. Uses reqwest
//! with manual AWS Signature V4 signing so no SDK dependency is needed.
//! Objects are sent in a single PUT; multipart upload is not supported.

use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use mountstore_common::backend::{
    join_path, normalize_path, BackendError, BoxReader, Filesystem, Visibility, WriteOptions,
};

type HmacSha256 = Hmac<Sha256>;

const REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub prefix: String,
    pub region: String,
    pub endpoint: Option<String>, // Path-style endpoint for B2, MinIO or other S3-compatible APIs
    pub access_key_id: String,
    pub secret_access_key: String,
    pub storage_class: Option<String>,
    /// ACL applied when a write does not ask for one.
    pub visibility: Option<Visibility>,
}

pub struct S3Adapter {
    config: S3Config,
    client: Client,
}

impl S3Adapter {
    pub fn new(config: S3Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        match &self.config.endpoint {
            Some(ep) => format!("{}/{}", ep.trim_end_matches('/'), self.config.bucket),
            None => format!(
                "https://s3.{}.amazonaws.com/{}",
                self.config.region, self.config.bucket
            ),
        }
    }

    fn object_key(&self, path: &str) -> String {
        join_path(&[&self.config.prefix, &normalize_path(path)])
    }

    fn object_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect();
        format!("{}/{}", self.endpoint().trim_end_matches('/'), encoded.join("/"))
    }

    /// Compute the AWS Signature V4 `Authorization` header for a request.
    fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        headers: &BTreeMap<String, String>,
        body_hash: &str,
        date_time: &str,
        date: &str,
    ) -> String {
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers: String = headers.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method, canonical_uri, canonical_headers, signed_headers, body_hash
        );

        let cr_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let credential_scope = format!("{}/{}/s3/aws4_request", date, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            date_time, credential_scope, cr_hash
        );

        let signing_key =
            derive_signing_key(&self.config.secret_access_key, date, &self.config.region);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{},SignedHeaders={},Signature={}",
            self.config.access_key_id, credential_scope, signed_headers, signature
        )
    }

    /// Build a signed request. `extra` headers are included in the signature.
    fn request(
        &self,
        method: Method,
        key: &str,
        extra: BTreeMap<String, String>,
        body_hash: &str,
        now: DateTime<Utc>,
    ) -> RequestBuilder {
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let url = self.object_url(key);

        let mut headers = extra;
        headers.insert("host".to_string(), url_host(&url));
        headers.insert("x-amz-content-sha256".to_string(), body_hash.to_string());
        headers.insert("x-amz-date".to_string(), date_time.clone());

        let canonical_uri = url_path(&url);
        let auth = self.sign(
            method.as_str(),
            &canonical_uri,
            &headers,
            body_hash,
            &date_time,
            &date,
        );

        let mut req = self.client.request(method, &url);
        for (name, value) in &headers {
            if name != "host" {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        req.header("Authorization", auth)
    }

    /// Signed headers for a PUT of `len` bytes.
    fn put_headers(&self, len: usize, options: &WriteOptions) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-length".to_string(), len.to_string());
        headers.insert(
            "content-type".to_string(),
            options.content_type.clone().unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        );
        if let Some(visibility) = options.visibility.or(self.config.visibility) {
            headers.insert("x-amz-acl".to_string(), acl(visibility).to_string());
        }
        if let Some(ref sc) = self.config.storage_class {
            headers.insert("x-amz-storage-class".to_string(), sc.clone());
        }
        headers
    }
}

fn derive_signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let key = format!("AWS4{}", secret);
    let k_date = hmac_sha256(key.as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, b"s3");
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn body_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn acl(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public-read",
        Visibility::Private => "private",
    }
}

async fn http_error(resp: Response) -> BackendError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    BackendError::Http { status, body }
}

#[async_trait]
impl Filesystem for S3Adapter {
    async fn write_stream(
        &self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        options: &WriteOptions,
    ) -> Result<(), BackendError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let key = self.object_key(path);
        let hash = body_hash(&data);

        let headers = self.put_headers(data.len(), options);

        let resp = self
            .request(Method::PUT, &key, headers, &hash, Utc::now())
            .body(data)
            .send()
            .await
            .context("S3 PUT request failed")?;

        if !resp.status().is_success() {
            return Err(http_error(resp).await);
        }

        debug!(key = %key, "S3 upload complete");
        Ok(())
    }

    async fn read_stream(&self, path: &str) -> Result<BoxReader, BackendError> {
        let key = self.object_key(path);
        let resp = self
            .request(Method::GET, &key, BTreeMap::new(), &body_hash(b""), Utc::now())
            .send()
            .await
            .context("S3 GET request failed")?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(BackendError::FileNotFound(path.to_string())),
            status if status.is_success() => {
                let data = resp.bytes().await.context("Failed to read S3 response body")?;
                Ok(Box::new(std::io::Cursor::new(data)))
            }
            _ => Err(http_error(resp).await),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let key = self.object_key(path);
        let resp = self
            .request(Method::DELETE, &key, BTreeMap::new(), &body_hash(b""), Utc::now())
            .send()
            .await
            .context("S3 DELETE request failed")?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(BackendError::FileNotFound(path.to_string())),
            status if status.is_success() => {
                debug!(key = %key, "S3 delete complete");
                Ok(())
            }
            _ => Err(http_error(resp).await),
        }
    }

    /// A HEAD on a missing key answers 403 instead of 404 when the caller
    /// lacks `s3:ListBucket`; both count as absent.
    async fn has(&self, path: &str) -> Result<bool, BackendError> {
        let key = self.object_key(path);
        let resp = self
            .request(Method::HEAD, &key, BTreeMap::new(), &body_hash(b""), Utc::now())
            .send()
            .await
            .context("S3 HEAD request failed")?;

        match head_exists(resp.status()) {
            Some(found) => Ok(found),
            None => Err(http_error(resp).await),
        }
    }
}

/// Interpret a HEAD status; `None` means the response is an error.
fn head_exists(status: StatusCode) -> Option<bool> {
    match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Some(false),
        status if status.is_success() => Some(true),
        _ => None,
    }
}

/// Extract the host part from a URL for use in signing.
fn url_host(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme.split('/').next().unwrap_or(without_scheme).to_string()
}

/// Extract the absolute path of a URL, the canonical URI in SigV4 terms.
fn url_path(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    match without_scheme.find('/') {
        Some(idx) => without_scheme[idx..].to_string(),
        None => "/".to_string(),
    }
}
