//! Content fetching seam between the lifecycle controller and the channel

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::channel::{BackgroundClient, FetchReply, Request, Response};
use crate::settings::Settings;

/// Fetch failure taxonomy the controller branches on
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The messaging channel cannot be reached; the controller renders the
    /// direct fallback card instead of surfacing a hard failure
    #[error("messaging channel unavailable")]
    ChannelUnavailable,

    /// The background service reported a non-success outcome
    #[error("fetch failed: {0}")]
    Failed(String),
}

/// Retrieves and classifies the content behind a URL
pub trait ContentFetcher {
    /// Whether the channel behind this fetcher is currently reachable.
    /// Checked before a fetch is attempted so the offline path never blocks.
    fn available(&self) -> bool;

    fn fetch(&mut self, url: &Url) -> Result<FetchReply, FetchError>;
}

/// Fetcher backed by the background-service channel
pub struct ChannelFetcher {
    client: Option<BackgroundClient>,
}

impl ChannelFetcher {
    /// Connect to the default socket; an unreachable service is not an error,
    /// it just puts the fetcher in the unavailable state.
    pub fn connect() -> Self {
        match BackgroundClient::connect() {
            Ok(client) => Self { client: Some(client) },
            Err(e) => {
                debug!(error = %e, "Background service unreachable, previews degrade to direct cards");
                Self { client: None }
            }
        }
    }

    /// Fetch settings over the channel. None when the channel is down or the
    /// service errors; the caller falls back to last-known or defaults.
    pub fn get_settings(&mut self) -> Option<Settings> {
        let client = self.client.as_mut()?;
        match client.request(&Request::GetSettings) {
            Ok(Response::Settings { settings }) => Some(settings),
            Ok(other) => {
                debug!(response = ?other, "Unexpected settings response");
                None
            }
            Err(e) => {
                debug!(error = %e, "Settings request failed");
                self.client = None;
                None
            }
        }
    }
}

impl ContentFetcher for ChannelFetcher {
    fn available(&self) -> bool {
        self.client.is_some()
    }

    fn fetch(&mut self, url: &Url) -> Result<FetchReply, FetchError> {
        let Some(client) = self.client.as_mut() else {
            return Err(FetchError::ChannelUnavailable);
        };

        let request = Request::FetchContent { url: url.to_string() };
        match client.request(&request) {
            Ok(Response::Fetch { reply }) => Ok(reply),
            Ok(Response::Error { message }) => Err(FetchError::Failed(message)),
            Ok(other) => Err(FetchError::Failed(format!("unexpected response: {other:?}"))),
            Err(e) => {
                // Transport broke under us; drop the connection so later
                // requests take the offline path immediately
                debug!(error = %e, "Channel transport error");
                self.client = None;
                Err(FetchError::ChannelUnavailable)
            }
        }
    }
}
