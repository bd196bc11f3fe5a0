//! Storage roots (local, S3, GCS, Azure)

use crate::config::AwsCredentials;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// A directory-like root inside an object store
///
/// All paths taken and returned by `Storage` are relative to the root.
#[derive(Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Location as given, for logging
    url: String,
    /// URL scheme (s3, gs, az, file)
    scheme: String,
    /// Root as the query engine addresses it
    engine_root: String,
    /// Root directory when the root is local
    local_root: Option<PathBuf>,
}

impl Storage {
    /// Open an existing root for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path`, `s3a://bucket/path`, `s3n://bucket/path` - AWS S3
    /// - `gs://bucket/path` - Google Cloud Storage
    /// - `az://container/path` - Azure Blob Storage
    /// - `/local/path`, `./path` or `file:///path` - Local filesystem
    pub fn open(location: &str, credentials: &AwsCredentials) -> Result<Self> {
        Self::parse(location, credentials, false)
    }

    /// Open a root for writing, creating it when it is a local directory
    pub fn create(location: &str, credentials: &AwsCredentials) -> Result<Self> {
        Self::parse(location, credentials, true)
    }

    fn parse(location: &str, credentials: &AwsCredentials, create: bool) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::invalid_location(location, "location is empty"));
        }

        match location.split_once("://") {
            Some(("file", path)) => Self::parse_local(location, path, create),
            Some((scheme, _)) => Self::parse_cloud(location, scheme, credentials),
            None => Self::parse_local(location, location, create),
        }
    }

    fn parse_cloud(location: &str, scheme: &str, credentials: &AwsCredentials) -> Result<Self> {
        let url = Url::parse(location).map_err(|e| Error::invalid_location(location, e.to_string()))?;
        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::invalid_location(location, "missing bucket name"))?;
        let prefix = url.path().trim_matches('/').to_string();

        let (store, scheme): (Arc<dyn ObjectStore>, &str) = match scheme {
            "s3" | "s3a" | "s3n" => (Arc::new(Self::build_s3(location, bucket, credentials)?), "s3"),
            "gs" => {
                let store = GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| {
                        Error::invalid_location(location, format!("Failed to create GCS client: {e}"))
                    })?;
                (Arc::new(store), "gs")
            }
            "az" => {
                let store = MicrosoftAzureBuilder::from_env()
                    .with_container_name(bucket)
                    .build()
                    .map_err(|e| {
                        Error::invalid_location(
                            location,
                            format!("Failed to create Azure client: {e}"),
                        )
                    })?;
                (Arc::new(store), "az")
            }
            other => {
                return Err(Error::invalid_location(
                    location,
                    format!("unsupported scheme '{other}'"),
                ))
            }
        };

        let engine_root = if prefix.is_empty() {
            format!("{scheme}://{bucket}")
        } else {
            format!("{scheme}://{bucket}/{prefix}")
        };

        Ok(Self {
            store,
            prefix,
            url: location.trim_end_matches('/').to_string(),
            scheme: scheme.to_string(),
            engine_root,
            local_root: None,
        })
    }

    fn build_s3(
        location: &str,
        bucket: &str,
        credentials: &AwsCredentials,
    ) -> Result<object_store::aws::AmazonS3> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        if let (Some(key_id), Some(secret)) =
            (&credentials.access_key_id, &credentials.secret_access_key)
        {
            builder = builder
                .with_access_key_id(key_id)
                .with_secret_access_key(secret);
        }
        if let Some(region) = &credentials.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &credentials.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        builder
            .build()
            .map_err(|e| Error::invalid_location(location, format!("Failed to create S3 client: {e}")))
    }

    fn parse_local(location: &str, path: &str, create: bool) -> Result<Self> {
        let dir = std::path::Path::new(path);
        if create {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::invalid_location(location, format!("Failed to create directory: {e}"))
            })?;
        } else if !dir.is_dir() {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        let root = std::fs::canonicalize(dir).map_err(|e| {
            Error::invalid_location(location, format!("Failed to resolve directory: {e}"))
        })?;
        let store = LocalFileSystem::new_with_prefix(&root).map_err(|e| {
            Error::invalid_location(location, format!("Failed to create local store: {e}"))
        })?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            url: path.trim_end_matches('/').to_string(),
            scheme: "file".to_string(),
            engine_root: root.to_string_lossy().trim_end_matches('/').to_string(),
            local_root: Some(root),
        })
    }

    /// Check if this is a cloud root (not local)
    pub fn is_cloud(&self) -> bool {
        self.local_root.is_none()
    }

    /// Check if this root lives in Azure Blob Storage
    pub fn is_azure(&self) -> bool {
        self.scheme == "az"
    }

    /// The root location
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full location of a relative path, for logging
    pub fn display(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{relative}", self.url)
        }
    }

    /// Location of a relative path or glob as the query engine addresses it
    ///
    /// `s3a://` and `s3n://` roots come out as `s3://`; local roots as
    /// absolute paths.
    pub fn engine_path(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            self.engine_root.clone()
        } else {
            format!("{}/{relative}", self.engine_root)
        }
    }

    /// Create a relative directory on local roots; object stores need none
    pub fn ensure_dir(&self, relative: &str) -> Result<()> {
        if let Some(root) = &self.local_root {
            std::fs::create_dir_all(root.join(relative.trim_matches('/')))?;
        }
        Ok(())
    }

    fn object_path(&self, relative: &str) -> Result<ObjectPath> {
        let relative = relative.trim_matches('/');
        let full = match (self.prefix.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{relative}", self.prefix),
        };
        // Paths are kept as given: listed paths and escaped partition names round-trip
        ObjectPath::parse(&full).map_err(|e| Error::invalid_location(self.display(relative), e.to_string()))
    }

    fn relative(&self, location: &ObjectPath) -> String {
        let full = location.as_ref();
        if self.prefix.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(self.prefix.as_str())
            .map_or(full, |rest| rest.trim_start_matches('/'))
            .to_string()
    }

    /// List every object below a relative directory, sorted by path
    pub async fn list(&self, relative: &str) -> Result<Vec<String>> {
        let prefix = self.object_path(relative)?;
        let prefix = if prefix.as_ref().is_empty() {
            None
        } else {
            Some(prefix)
        };

        let objects: Vec<_> = self.store.list(prefix.as_ref()).try_collect().await?;
        let mut paths: Vec<String> = objects
            .iter()
            .map(|meta| self.relative(&meta.location))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Write an object, replacing any previous content
    pub async fn put(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative)?;
        self.store.put(&path, data.into()).await?;
        Ok(self.display(relative))
    }

    /// Delete every object below a relative directory
    ///
    /// Returns the number of objects removed.
    pub async fn delete_prefix(&self, relative: &str) -> Result<usize> {
        let paths = self.list(relative).await?;
        for path in &paths {
            match self.store.delete(&self.object_path(path)?).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(paths.len())
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("url", &self.url)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}
