// HTTP content fetching seam
// URL sources and the playlist expander pull bytes through these traits

use std::io::Read;
use std::time::Duration;

use crate::error::{PlayerError, Result};

/// A fetched HTTP response, body unread.
pub struct HttpContent {
    pub status: u16,
    /// Media type with any parameters stripped, lowercased.
    pub content_type: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl HttpContent {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the content of a single URL.
pub trait HttpContentFetcher: Send {
    fn url(&self) -> &str;

    /// Perform the request. Transport failures are errors; HTTP error
    /// statuses come back as an [`HttpContent`] for the caller to classify.
    fn fetch(&mut self) -> Result<HttpContent>;
}

/// Creates a fetcher per URL. Supplied at player construction.
pub trait HttpContentFetcherFactory: Send + Sync {
    fn create(&self, url: &str) -> Box<dyn HttpContentFetcher>;
}

/// Production factory backed by a shared `ureq` agent.
pub struct UreqContentFetcherFactory {
    agent: ureq::Agent,
}

impl UreqContentFetcherFactory {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(Duration::from_secs(60))
            .user_agent("MediaController/0.1")
            .redirects(10)
            .build();
        Self { agent }
    }
}

impl Default for UreqContentFetcherFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpContentFetcherFactory for UreqContentFetcherFactory {
    fn create(&self, url: &str) -> Box<dyn HttpContentFetcher> {
        Box::new(UreqContentFetcher {
            agent: self.agent.clone(),
            url: url.to_string(),
        })
    }
}

struct UreqContentFetcher {
    agent: ureq::Agent,
    url: String,
}

impl HttpContentFetcher for UreqContentFetcher {
    fn url(&self) -> &str {
        &self.url
    }

    fn fetch(&mut self) -> Result<HttpContent> {
        log::debug!("Fetching: {}", self.url);
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(PlayerError::NetworkError(format!(
                    "request for {} failed: {}",
                    self.url, err
                )));
            }
        };
        let status = response.status();
        let content_type = response
            .header("Content-Type")
            .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase());
        Ok(HttpContent {
            status,
            content_type,
            body: Box::new(response.into_reader()),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::io::Cursor;

    #[derive(Clone)]
    struct StubEntry {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    /// Factory serving canned responses from memory.
    #[derive(Default)]
    pub(crate) struct StubFetcherFactory {
        entries: Mutex<HashMap<String, StubEntry>>,
        requests: Mutex<Vec<String>>,
    }

    impl StubFetcherFactory {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn insert(&self, url: &str, content_type: &str, body: &[u8]) {
            self.entries.lock().insert(
                url.to_string(),
                StubEntry {
                    status: 200,
                    content_type: Some(content_type.to_string()),
                    body: body.to_vec(),
                },
            );
        }

        pub(crate) fn insert_status(&self, url: &str, status: u16) {
            self.entries.lock().insert(
                url.to_string(),
                StubEntry {
                    status,
                    content_type: None,
                    body: Vec::new(),
                },
            );
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl HttpContentFetcherFactory for StubFetcherFactory {
        fn create(&self, url: &str) -> Box<dyn HttpContentFetcher> {
            self.requests.lock().push(url.to_string());
            let entry = self.entries.lock().get(url).cloned();
            Box::new(StubFetcher {
                url: url.to_string(),
                entry,
            })
        }
    }

    struct StubFetcher {
        url: String,
        entry: Option<StubEntry>,
    }

    impl HttpContentFetcher for StubFetcher {
        fn url(&self) -> &str {
            &self.url
        }

        fn fetch(&mut self) -> Result<HttpContent> {
            match self.entry.take() {
                Some(entry) => Ok(HttpContent {
                    status: entry.status,
                    content_type: entry.content_type,
                    body: Box::new(Cursor::new(entry.body)),
                }),
                None => Err(PlayerError::NetworkError(format!(
                    "no stub registered for {}",
                    self.url
                ))),
            }
        }
    }
}
