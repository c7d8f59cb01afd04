//! Message contract between the content side and the background service

use serde::{Deserialize, Serialize};

use crate::metadata::PageMetadata;
use crate::settings::Settings;

/// Requests sent from the content side to the background service
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Fetch current settings from the persistent store
    GetSettings,

    /// Persist updated settings
    UpdateSettings { settings: Settings },

    /// Fetch and classify the content behind a URL
    FetchContent { url: String },
}

/// Responses from the background service
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Response {
    Settings { settings: Settings },

    /// Settings were persisted
    Updated,

    Fetch { reply: FetchReply },

    /// Request failed; the content side maps this to its fallback paths
    Error { message: String },
}

/// Classified fetch outcome
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "contentType", rename_all = "camelCase")]
pub enum FetchReply {
    /// An HTML page: raw body plus extracted metadata
    Html { content: String, metadata: PageMetadata },

    /// An image; the panel embeds it by URL
    Image { url: String },

    /// Anything else; the panel offers open-in-new-tab
    Other { media_type: String },
}

/// Fire-and-forget push from background to content (context-menu action,
/// options-page save). No acknowledgment is expected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    ShowPreview { url: String },
    SettingsUpdated,
}
