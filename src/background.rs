//! Background fetch service
//!
//! Owns the persistent settings store and performs the HTTP round trips the
//! content side cannot. One thread per accepted connection; requests on a
//! connection are served in order.

use anyhow::{Context, Result};
use std::thread;
use tracing::{error, info, warn};
use url::Url;

use crate::channel::{BackgroundServer, FetchReply, Peer, Request, Response};
use crate::constants::fetch;
use crate::metadata;
use crate::settings::Settings;

/// Coarse classification of a response content type
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContentClass {
    Html,
    Image,
    Other(String),
}

fn classify(content_type: &str) -> ContentClass {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type.contains("text/html") {
        ContentClass::Html
    } else if media_type.starts_with("image/") {
        ContentClass::Image
    } else {
        ContentClass::Other(media_type)
    }
}

/// Bind the socket and serve requests until killed
pub fn run() -> Result<()> {
    let server = BackgroundServer::bind()?;
    info!(socket = %server.path().display(), "Background service listening");

    loop {
        match server.accept() {
            Ok(peer) => {
                thread::spawn(move || {
                    if let Err(e) = serve_peer(peer) {
                        error!(error = %e, "Peer connection ended with error");
                    }
                });
            }
            Err(e) => error!(error = %e, "Failed to accept connection"),
        }
    }
}

fn serve_peer(mut peer: Peer) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(fetch::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    while let Some(request) = peer.recv_request()? {
        let response = handle_request(&client, request);
        peer.send_response(&response)?;
    }
    Ok(())
}

fn handle_request(client: &reqwest::blocking::Client, request: Request) -> Response {
    match request {
        Request::GetSettings => match Settings::load() {
            Ok(settings) => Response::Settings { settings },
            Err(e) => {
                error!(error = %e, "Failed to load settings");
                Response::Error { message: e.to_string() }
            }
        },
        Request::UpdateSettings { mut settings } => {
            settings.validate_and_clamp();
            match settings.save() {
                Ok(()) => Response::Updated,
                Err(e) => {
                    error!(error = %e, "Failed to save settings");
                    Response::Error { message: e.to_string() }
                }
            }
        }
        Request::FetchContent { url } => fetch_content(client, &url),
    }
}

fn fetch_content(client: &reqwest::blocking::Client, raw_url: &str) -> Response {
    // Scheme check mirrors the content side; a hostile peer gets the same
    // answer as a bad link
    let url = match Url::parse(raw_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => {
            warn!(url = %raw_url, "Rejecting fetch for invalid URL");
            return Response::Error { message: "Invalid URL".to_string() };
        }
    };

    info!(url = %url, "Fetching content");
    let response = match client.get(url.clone()).send() {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Fetch transport error");
            return Response::Error { message: e.to_string() };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return Response::Error {
            message: format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("")),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match classify(&content_type) {
        ContentClass::Html => match response.text() {
            Ok(content) => {
                let metadata = metadata::extract(&content);
                Response::Fetch { reply: FetchReply::Html { content, metadata } }
            }
            Err(e) => Response::Error { message: e.to_string() },
        },
        ContentClass::Image => Response::Fetch {
            reply: FetchReply::Image { url: url.to_string() },
        },
        ContentClass::Other(media_type) => Response::Fetch {
            reply: FetchReply::Other { media_type },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_html_with_charset() {
        assert_eq!(classify("text/html; charset=utf-8"), ContentClass::Html);
        assert_eq!(classify("TEXT/HTML"), ContentClass::Html);
    }

    #[test]
    fn test_classify_image_subtypes() {
        assert_eq!(classify("image/png"), ContentClass::Image);
        assert_eq!(classify("image/svg+xml; charset=utf-8"), ContentClass::Image);
    }

    #[test]
    fn test_classify_other_keeps_media_type() {
        assert_eq!(
            classify("application/pdf"),
            ContentClass::Other("application/pdf".to_string())
        );
        assert_eq!(classify(""), ContentClass::Other(String::new()));
    }

    #[test]
    fn test_invalid_url_rejected_without_fetch() {
        let client = reqwest::blocking::Client::new();
        match fetch_content(&client, "file:///etc/passwd") {
            Response::Error { message } => assert_eq!(message, "Invalid URL"),
            other => panic!("unexpected response: {other:?}"),
        }
        match fetch_content(&client, "not a url") {
            Response::Error { message } => assert_eq!(message, "Invalid URL"),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
