//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the application,
//! providing a single source of truth for constant values.

/// Preview panel sizing and placement
pub mod panel {
    /// Minimum panel width in logical pixels
    pub const MIN_WIDTH: i32 = 300;

    /// Minimum panel height in logical pixels
    pub const MIN_HEIGHT: i32 = 200;

    /// Maximum panel size as a fraction of the viewport, per dimension
    pub const MAX_VIEWPORT_FRACTION: f64 = 0.95;

    /// Default panel width as a fraction of the viewport width
    pub const DEFAULT_WIDTH_FRACTION: f64 = 0.6;

    /// Default panel height as a fraction of the viewport height
    pub const DEFAULT_HEIGHT_FRACTION: f64 = 0.8;

    /// Margin kept between the panel and the viewport edges after placement
    pub const VIEWPORT_MARGIN: i32 = 10;

    /// Fraction of the viewport used as the placement anchor line
    pub const ANCHOR_FRACTION: f64 = 0.1;

    /// Header bar height (drag handle region)
    pub const HEADER_HEIGHT: i32 = 30;

    /// Close control square side length, anchored to the header's right edge
    pub const CLOSE_CONTROL_SIZE: i32 = 30;
}

/// Dimming overlay defaults
pub mod overlay {
    /// Default overlay opacity when settings carry none
    pub const DEFAULT_OPACITY: f32 = 0.3;

    /// Default backdrop blur in pixels
    pub const DEFAULT_BLUR_PX: f32 = 2.0;

    /// The overlay sits one layer below the panel
    pub const Z_INDEX_OFFSET: i32 = 1;
}

/// Timing constants
pub mod timing {
    /// Default long-hover delay before a preview is requested
    pub const DEFAULT_LONG_HOVER_MS: u64 = 1000;

    /// Upper bound on the configurable hover delay
    pub const MAX_LONG_HOVER_MS: u64 = 60_000;

    /// How long the fetch-error toast stays visible
    pub const ERROR_TOAST_MS: u64 = 3000;
}

/// Well-known identifiers for the singleton presentation elements
pub mod ids {
    pub const OVERLAY: &str = "linkpeek-overlay";
    pub const PANEL: &str = "linkpeek-panel";
    pub const LOADER: &str = "linkpeek-loader";
    pub const ERROR_TOAST: &str = "linkpeek-error";
}

/// Configuration file location
pub mod config {
    /// Directory under the user config dir
    pub const APP_DIR: &str = "linkpeek";

    /// Settings file name
    pub const FILENAME: &str = "config.toml";
}

/// Settings validation ranges
pub mod validation {
    /// Maximum backdrop blur accepted from config
    pub const MAX_BLUR_PX: f32 = 50.0;

    /// Lowest z-index base that keeps the panel above page content
    pub const MIN_Z_INDEX: i32 = 100;
}

/// Background fetch behavior
pub mod fetch {
    /// User agent sent with preview fetches
    pub const USER_AGENT: &str = "LinkPeek";
}
