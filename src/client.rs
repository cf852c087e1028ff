//! Single reachability attempts against one target

use crate::{
    defaults,
    error::{AppError, Result},
    models::{ProbeOutcome, ProbeStatus},
    types::{Target, Transport},
};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use url::Url;

/// One bounded-time attempt to reach a target
///
/// Implementations classify every failure into a [`ProbeStatus`] instead of
/// returning errors, and hold no shared mutable state. Dropping the returned
/// future aborts the attempt.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &Target, transport: Transport, timeout: Duration) -> ProbeOutcome;
}

/// Probe issuing HEAD requests through reqwest and TCP connects through tokio
pub struct NetworkProbe {
    client: Client,
    https_port: Option<u16>,
    http_port: Option<u16>,
}

impl NetworkProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(defaults::DEFAULT_USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            https_port: None,
            http_port: None,
        })
    }

    /// Send HTTPS probes to a non-standard port
    pub fn with_https_port(mut self, port: u16) -> Self {
        self.https_port = Some(port);
        self
    }

    /// Send HTTP probes to a non-standard port
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    /// URL probed for a domain over the given web transport
    pub fn url_for(&self, host: &str, transport: Transport) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}/", transport.scheme(), host))?;
        let port = match transport {
            Transport::Https => self.https_port,
            Transport::Http => self.http_port,
            Transport::Tcp => None,
        };
        if port.is_some() {
            url.set_port(port)
                .map_err(|_| AppError::validation(format!("cannot set a port on {}", url)))?;
        }
        Ok(url)
    }

    /// HEAD the URL and classify the outcome
    pub async fn head_status(&self, url: Url, limit: Duration) -> ProbeStatus {
        let request = self.client.head(url).timeout(limit).send();

        match timeout(limit, request).await {
            Err(_) => ProbeStatus::Timeout,
            Ok(Ok(response)) => classify_status(response.status().as_u16()),
            Ok(Err(e)) => classify_error(&e),
        }
    }

    /// Open and immediately close a TCP connection
    pub async fn connect_status(&self, host: &str, port: u16, limit: Duration) -> ProbeStatus {
        match timeout(limit, TcpStream::connect((host, port))).await {
            Err(_) => ProbeStatus::Timeout,
            Ok(Ok(_stream)) => ProbeStatus::Reachable,
            Ok(Err(e)) => ProbeStatus::Blocked {
                status_code: None,
                reason: Some(e.kind().to_string()),
            },
        }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn probe(&self, target: &Target, transport: Transport, limit: Duration) -> ProbeOutcome {
        let status = match (target, transport) {
            (Target::Service { host, port, .. }, _) => self.connect_status(host, *port, limit).await,
            (Target::Domain(host), Transport::Tcp) => self.connect_status(host, 443, limit).await,
            (Target::Domain(host), web) => {
                match self.url_for(host, web) {
                    Ok(url) => self.head_status(url, limit).await,
                    Err(e) => ProbeStatus::Error(e.to_string()),
                }
            }
        };
        ProbeOutcome::new(target.clone(), status)
    }
}

/// Any status below 500 means the server answered
pub fn classify_status(status_code: u16) -> ProbeStatus {
    if status_code < 500 {
        ProbeStatus::Reachable
    } else {
        ProbeStatus::blocked_with_status(status_code)
    }
}

/// Map a transport failure onto a probe status
pub fn classify_error(error: &reqwest::Error) -> ProbeStatus {
    if error.is_timeout() {
        ProbeStatus::Timeout
    } else if error.is_connect() {
        ProbeStatus::Blocked {
            status_code: None,
            reason: Some("connection failed".to_string()),
        }
    } else {
        ProbeStatus::Error(error.to_string())
    }
}
