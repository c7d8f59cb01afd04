//! Trigger engine
//!
//! Converts raw pointer/keyboard signals on page nodes into preview requests,
//! honoring the configured trigger mode and the per-site exclusion list.
//! Hover timers are plain data polled by the main loop, so arming and
//! cancellation stay deterministic and testable.

use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::dom::{Document, NodeId};
use crate::geometry::Point;
use crate::input::{Key, Modifiers};
use crate::settings::{Settings, Trigger};

/// Why a candidate URL was rejected. Both cases are silent no-ops: no timer
/// is armed and no request is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRejection {
    /// Not http/https, or unparsable
    InvalidUrl,
    /// Hostname contains an entry from the disabled list
    ExcludedHost,
}

/// Validate a candidate href against scheme and host-exclusion rules.
/// Exclusion is substring-based on the hostname by design.
pub fn validate_preview_url(raw: &str, settings: &Settings) -> Result<Url, UrlRejection> {
    let url = Url::parse(raw).map_err(|_| UrlRejection::InvalidUrl)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlRejection::InvalidUrl);
    }

    let hostname = url.host_str().ok_or(UrlRejection::InvalidUrl)?;
    for entry in &settings.disabled_host_substrings {
        if !entry.is_empty() && hostname.contains(entry.as_str()) {
            return Err(UrlRejection::ExcludedHost);
        }
    }

    Ok(url)
}

/// A preview decision emitted by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub url: Url,
    pub origin: Option<Point>,
}

/// Outcome of a click on the page
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Default navigation is suppressed; a preview is requested instead
    Preview(PreviewRequest),
    /// Fall through to the page's default link behavior
    Navigate,
}

#[derive(Debug)]
struct ArmedTimer {
    target: NodeId,
    url: Url,
    origin: Point,
    deadline: Instant,
}

/// Per-page trigger state. At most one hover timer is armed at a time;
/// entering a new link replaces the old timer, leaving cancels it.
#[derive(Debug, Default)]
pub struct TriggerEngine {
    hover_timer: Option<ArmedTimer>,
    space_pressed: bool,
    highlighted: Option<NodeId>,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer entered `target`. Resolves the nearest anchor, applies the
    /// hover highlight, and either fires immediately (hover+Space) or arms
    /// the long-hover timer. Returns a request only for the immediate path.
    pub fn on_pointer_enter(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        target: NodeId,
        position: Point,
        now: Instant,
    ) -> Option<PreviewRequest> {
        if !settings.enabled {
            return None;
        }

        let (anchor, href) = doc.anchor_ancestor(target)?;
        let url = match validate_preview_url(href, settings) {
            Ok(url) => url,
            Err(rejection) => {
                debug!(href = %href, rejection = ?rejection, "Ignoring link");
                return None;
            }
        };

        if settings.behavior.highlight_on_hover {
            // A leave for the previous anchor may never arrive when enters
            // interleave; revert it here so at most one node stays lit
            if let Some(previous) = self.highlighted.take()
                && previous != anchor
            {
                doc.set_highlight(previous, false);
            }
            doc.set_highlight(anchor, true);
            self.highlighted = Some(anchor);
        }

        if settings.hover_space && self.space_pressed {
            return Some(PreviewRequest { url, origin: Some(position) });
        }

        if settings.trigger == Trigger::LongHover {
            self.hover_timer = Some(ArmedTimer {
                target: anchor,
                url,
                origin: position,
                deadline: now + Duration::from_millis(settings.long_hover_delay_ms),
            });
        }

        None
    }

    /// Pointer left `target`. Cancels the timer armed by the matching enter
    /// and reverts the highlight. Returns true when a shown preview should
    /// close under the close-on-pointer-leave policy.
    pub fn on_pointer_leave(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        target: NodeId,
    ) -> bool {
        let anchor = doc.anchor_ancestor(target).map(|(id, _)| id);

        if let Some(id) = anchor {
            doc.set_highlight(id, false);
            if self.highlighted == Some(id) {
                self.highlighted = None;
            }
        }

        if let Some(timer) = &self.hover_timer
            && anchor == Some(timer.target)
        {
            self.hover_timer = None;
        }

        settings.behavior.close_on_pointer_leave
    }

    /// Click on `target`. For the matching click trigger the default
    /// navigation is suppressed and a preview is requested immediately;
    /// non-matching modifier combinations fall through.
    pub fn on_click(
        &mut self,
        doc: &Document,
        settings: &Settings,
        target: NodeId,
        modifiers: Modifiers,
        position: Point,
    ) -> ClickOutcome {
        if !settings.enabled {
            return ClickOutcome::Navigate;
        }

        let Some((_, href)) = doc.anchor_ancestor(target) else {
            return ClickOutcome::Navigate;
        };
        let Ok(url) = validate_preview_url(href, settings) else {
            return ClickOutcome::Navigate;
        };

        let matched = match settings.trigger {
            Trigger::HardClick => !modifiers.any(),
            Trigger::AltClick => modifiers.alt,
            Trigger::CtrlShiftClick => modifiers.ctrl && modifiers.shift,
            Trigger::LongHover => false,
        };

        if matched {
            ClickOutcome::Preview(PreviewRequest { url, origin: Some(position) })
        } else {
            ClickOutcome::Navigate
        }
    }

    /// Key pressed. Returns true when the active preview should close (Escape).
    pub fn on_key_down(&mut self, key: &Key) -> bool {
        match key {
            Key::Space => {
                self.space_pressed = true;
                false
            }
            Key::Escape => true,
            Key::Other(_) => false,
        }
    }

    pub fn on_key_up(&mut self, key: &Key) {
        if *key == Key::Space {
            self.space_pressed = false;
        }
    }

    /// Fire the hover timer if its deadline has passed. Disarms on fire.
    pub fn poll(&mut self, now: Instant) -> Option<PreviewRequest> {
        if self.hover_timer.as_ref()?.deadline > now {
            return None;
        }
        let timer = self.hover_timer.take()?;
        Some(PreviewRequest { url: timer.url, origin: Some(timer.origin) })
    }

    /// Number of outstanding armed timers (0 or 1)
    pub fn armed_timers(&self) -> usize {
        usize::from(self.hover_timer.is_some())
    }
}
