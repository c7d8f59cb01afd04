//! Preview lifecycle controller
//!
//! Owns the single active preview session: the dimming overlay, the loading
//! indicator, the floating panel and the transient error toast. Every code
//! path terminates in Shown or Idle; a superseded fetch result is detected
//! by generation and discarded.

pub mod panel;

use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

use crate::channel::FetchReply;
use crate::constants::{ids, overlay, timing};
use crate::fetcher::FetchError;
use crate::geometry::{Point, Size};
use crate::metadata::PageMetadata;
use crate::settings::Settings;

pub use panel::{Panel, PanelContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Shown,
}

/// Full-viewport dimming layer, created with the session and destroyed with it
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: &'static str,
    pub opacity: f32,
    pub blur_px: f32,
    pub z_index: i32,
}

impl Overlay {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            id: ids::OVERLAY,
            opacity: settings.appearance.overlay_opacity,
            blur_px: settings.appearance.overlay_blur_px,
            z_index: settings.appearance.z_index_base - overlay::Z_INDEX_OFFSET,
        }
    }
}

/// Transient loading indicator shown while the fetch is in flight
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingIndicator {
    pub id: &'static str,
    pub position: Point,
}

/// Inline error affordance, auto-dismissed, independent of the panel
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorToast {
    pub id: &'static str,
    pub message: String,
    pub position: Point,
    pub deadline: Instant,
}

/// The at-most-one active preview
#[derive(Debug)]
pub struct PreviewSession {
    pub url: Url,
    pub state: SessionState,
    pub overlay: Overlay,
    pub panel: Option<Panel>,
    pub origin: Option<Point>,
    generation: u64,
    loader: Option<LoadingIndicator>,
}

/// Handle for the fetch the driver must perform for a Loading session
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub url: Url,
    pub generation: u64,
}

pub struct PreviewController {
    viewport: Size,
    session: Option<PreviewSession>,
    generation: u64,
    toast: Option<ErrorToast>,
}

impl PreviewController {
    pub fn new(viewport: Size) -> Self {
        Self { viewport, session: None, generation: 0, toast: None }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn session(&self) -> Option<&PreviewSession> {
        self.session.as_ref()
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.session.as_ref().and_then(|s| s.panel.as_ref())
    }

    pub fn panel_mut(&mut self) -> Option<&mut Panel> {
        self.session.as_mut().and_then(|s| s.panel.as_mut())
    }

    pub fn toast(&self) -> Option<&ErrorToast> {
        self.toast.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    /// Open a new session for `url`, closing any live one first. The page
    /// dims immediately; the loading indicator appears near the origin (or
    /// viewport-centered without one). The caller performs the fetch named
    /// by the returned handle and delivers it to [`on_fetch_result`].
    ///
    /// [`on_fetch_result`]: Self::on_fetch_result
    pub fn request_preview(
        &mut self,
        url: Url,
        origin: Option<Point>,
        settings: &Settings,
    ) -> PendingFetch {
        // Close-before-open keeps the single-session invariant; no point
        // exists where two overlays or panels coexist
        self.close_preview();

        self.generation += 1;
        let generation = self.generation;
        info!(url = %url, generation = generation, "Opening preview session");

        let loader_position = origin.unwrap_or(Point::new(
            self.viewport.width / 2,
            self.viewport.height / 2,
        ));

        self.session = Some(PreviewSession {
            url: url.clone(),
            state: SessionState::Loading,
            overlay: Overlay::from_settings(settings),
            panel: None,
            origin,
            generation,
            loader: Some(LoadingIndicator { id: ids::LOADER, position: loader_position }),
        });

        PendingFetch { url, generation }
    }

    /// Deliver a fetch outcome. Results for a superseded generation are
    /// discarded. The loading indicator is removed exactly once, and the
    /// session always lands in Shown.
    pub fn on_fetch_result(
        &mut self,
        generation: u64,
        result: Result<FetchReply, FetchError>,
        settings: &Settings,
        now: Instant,
    ) {
        let Some(session) = self.session.as_mut() else {
            debug!(generation = generation, "Fetch result with no session, discarding");
            return;
        };
        if session.generation != generation {
            debug!(
                stale = generation,
                current = session.generation,
                "Stale fetch result, discarding"
            );
            return;
        }

        let loader = session.loader.take();
        let hostname = hostname_of(&session.url);
        let url = session.url.clone();
        let origin = session.origin;
        let z_index = settings.appearance.z_index_base;

        let content = match result {
            Ok(FetchReply::Html { metadata, .. }) => PanelContent::Frame { url, metadata },
            Ok(FetchReply::Image { url }) => PanelContent::Image { url },
            Ok(FetchReply::Other { media_type }) => PanelContent::Generic { media_type },
            Err(FetchError::ChannelUnavailable) => {
                info!(url = %url, "Channel unavailable, showing direct preview card");
                PanelContent::Card { metadata: direct_metadata(&hostname, &url) }
            }
            Err(FetchError::Failed(message)) => {
                // Visible near the trigger point, while the session still
                // terminates in Shown with the fallback card
                let position = loader
                    .as_ref()
                    .map(|l| l.position)
                    .unwrap_or(Point::new(self.viewport.width / 2, self.viewport.height / 2));
                self.toast = Some(ErrorToast {
                    id: ids::ERROR_TOAST,
                    message,
                    position,
                    deadline: now + Duration::from_millis(timing::ERROR_TOAST_MS),
                });
                PanelContent::Card { metadata: direct_metadata(&hostname, &url) }
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.panel = Some(Panel::new(content, hostname, self.viewport, origin, z_index));
            session.state = SessionState::Shown;
            info!(url = %session.url, "Preview shown");
        }
    }

    /// Embedded frame failed to load: downgrade to the metadata card in
    /// place rather than leaving a blank panel
    pub fn frame_load_failed(&mut self, settings: &Settings) {
        let viewport = self.viewport;
        let Some(session) = self.session.as_mut() else { return };
        let Some(panel) = session.panel.as_ref() else { return };

        if let PanelContent::Frame { url, metadata } = &panel.content {
            let mut metadata = metadata.clone();
            let hostname = hostname_of(url);
            if metadata.title.is_empty() {
                metadata.title = hostname.clone();
            }
            info!(url = %url, "Frame load failed, downgrading to metadata card");
            session.panel = Some(Panel::new(
                PanelContent::Card { metadata },
                hostname,
                viewport,
                session.origin,
                settings.appearance.z_index_base,
            ));
        }
    }

    /// Tear down the active session. Idempotent; overlay and panel are
    /// released together, and a no-session call is a no-op.
    pub fn close_preview(&mut self) {
        if let Some(session) = self.session.take() {
            info!(url = %session.url, "Closing preview session");
        }
    }

    /// Click somewhere on the page. Closes a shown preview when the point
    /// is outside the panel and the policy is enabled. Returns true when
    /// the session was closed.
    pub fn handle_outside_click(&mut self, point: Point, settings: &Settings) -> bool {
        if !settings.behavior.close_on_outside_click {
            return false;
        }
        let shown_outside = self
            .session
            .as_ref()
            .is_some_and(|s| s.state == SessionState::Shown)
            && self.panel().is_some_and(|p| !p.contains(point));
        if shown_outside {
            self.close_preview();
        }
        shown_outside
    }

    /// Page scrolled. Closes a shown preview under the scroll policy.
    pub fn handle_scroll(&mut self, settings: &Settings) {
        if settings.behavior.close_on_scroll_over
            && self.session.as_ref().is_some_and(|s| s.state == SessionState::Shown)
        {
            self.close_preview();
        }
    }

    /// Pointer-down on the panel: close control wins over the drag handle.
    /// Returns true when the click closed the session.
    pub fn handle_panel_pointer_down(&mut self, point: Point) -> bool {
        let on_close = match self.panel() {
            Some(panel) => panel.is_on_close_control(point),
            None => return false,
        };
        if on_close {
            self.close_preview();
            return true;
        }
        if let Some(panel) = self.panel_mut() {
            panel.begin_drag(point);
        }
        false
    }

    pub fn handle_pointer_move(&mut self, point: Point) {
        let viewport = self.viewport;
        if let Some(panel) = self.panel_mut() {
            panel.drag_to(point, viewport);
        }
    }

    pub fn handle_pointer_up(&mut self) {
        if let Some(panel) = self.panel_mut() {
            panel.end_drag();
        }
    }

    /// Expire the error toast
    pub fn poll(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.deadline <= now) {
            self.toast = None;
        }
    }
}

fn hostname_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

/// Best-effort local metadata used when no fetch result is available
fn direct_metadata(hostname: &str, url: &Url) -> PageMetadata {
    PageMetadata {
        title: hostname.to_string(),
        description: "Preview".to_string(),
        image: String::new(),
        url: url.to_string(),
    }
}
