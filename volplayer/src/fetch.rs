/*!
    Blocking HTTP downloads of the manifest and media blob.
*/

use std::io::Read;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

const MANIFEST_PATH: &str = "manifest/frames.json";
const FRAMES_PATH: &str = "frames";

/// Upper bound on the body buffer reserved from `Content-Length`.
const MAX_PREALLOCATION: u64 = 64 << 20;

/**
    Process-wide network handle.

    Create one at startup and clone it into every fetcher; clones share the
    connection pool. Dropping the last clone releases it.
*/
#[derive(Clone, Debug)]
pub struct NetworkContext {
    client: Client,
}

impl NetworkContext {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::limited(10))
            .tcp_nodelay(true)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/**
    Downloads the manifest and media blob from a server root.
*/
#[derive(Clone, Debug)]
pub struct BlobFetcher {
    network: NetworkContext,
    base_url: String,
}

impl BlobFetcher {
    pub fn new(network: NetworkContext, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { network, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/{MANIFEST_PATH}", self.base_url)
    }

    /**
        URL of a media file. The file name is percent-encoded as a single
        path segment.
    */
    pub fn blob_url(&self, file: &str) -> Result<String> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: self.base_url.clone(),
            reason: reason.to_owned(),
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base"))?
            .pop_if_empty()
            .push(FRAMES_PATH)
            .push(file);
        Ok(url.into())
    }

    /**
        Fetch the manifest document as text.
    */
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub fn fetch_manifest(&self) -> Result<String> {
        let url = self.manifest_url();
        let mut response = self.get(&url)?;

        let mut text = String::new();
        response
            .read_to_string(&mut text)
            .map_err(|source| Error::Body {
                url: url.clone(),
                source,
            })?;
        if text.is_empty() {
            return Err(Error::EmptyBody { url });
        }
        Ok(text)
    }

    /**
        Fetch a media file, buffering the whole body in memory.
    */
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub fn fetch_blob(&self, file: &str) -> Result<Vec<u8>> {
        let url = self.blob_url(file)?;
        let mut response = self.get(&url)?;

        // the header is only a hint; the body read decides the real size
        let expected = response.content_length().unwrap_or(0).min(MAX_PREALLOCATION);
        let mut blob = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        response
            .read_to_end(&mut blob)
            .map_err(|source| Error::Body {
                url: url.clone(),
                source,
            })?;
        if blob.is_empty() {
            return Err(Error::EmptyBody { url });
        }

        tracing::info!(bytes = blob.len(), "downloaded media blob");
        Ok(blob)
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .network
            .client
            .get(url)
            .send()
            .map_err(|source| Error::Http {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
