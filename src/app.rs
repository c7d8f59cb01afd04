//! Content-side wiring: one controller object owning configuration, the page
//! model, the trigger engine and the preview lifecycle, with a single event
//! dispatch entry point.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::dom::Document;
use crate::engine::{ClickOutcome, PreviewRequest, TriggerEngine, validate_preview_url};
use crate::fetcher::{ContentFetcher, FetchError};
use crate::geometry::Size;
use crate::input::InputEvent;
use crate::channel::Notification;
use crate::preview::{PreviewController, SessionState};
use crate::settings::Settings;

pub struct App<F: ContentFetcher> {
    pub settings: Settings,
    pub document: Document,
    pub preview: PreviewController,
    engine: TriggerEngine,
    fetcher: F,
    /// Settings update received mid-session; applied on the next trigger
    pending_settings: Option<Settings>,
}

impl<F: ContentFetcher> App<F> {
    pub fn new(mut settings: Settings, document: Document, viewport: Size, fetcher: F) -> Self {
        settings.validate_and_clamp();
        Self {
            settings,
            document,
            preview: PreviewController::new(viewport),
            engine: TriggerEngine::new(),
            fetcher,
            pending_settings: None,
        }
    }

    /// Dispatch one raw input event
    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        if self.preview.is_idle() {
            self.apply_pending_settings();
        }

        match event {
            InputEvent::PointerEnter { target, position } => {
                let Some(node) = self.document.node_by_index(target) else {
                    warn!(target = target, "Pointer enter on unknown node");
                    return;
                };
                if let Some(request) = self.engine.on_pointer_enter(
                    &mut self.document,
                    &self.settings,
                    node,
                    position,
                    now,
                ) {
                    self.begin_preview(request, now);
                }
            }
            InputEvent::PointerLeave { target } => {
                let Some(node) = self.document.node_by_index(target) else {
                    warn!(target = target, "Pointer leave on unknown node");
                    return;
                };
                let close = self.engine.on_pointer_leave(&mut self.document, &self.settings, node);
                if close
                    && self
                        .preview
                        .session()
                        .is_some_and(|s| s.state == SessionState::Shown)
                {
                    self.preview.close_preview();
                }
            }
            InputEvent::Click { target, position, modifiers } => {
                let Some(node) = self.document.node_by_index(target) else {
                    warn!(target = target, "Click on unknown node");
                    return;
                };
                match self.engine.on_click(&self.document, &self.settings, node, modifiers, position)
                {
                    ClickOutcome::Preview(request) => {
                        debug!(url = %request.url, "Click trigger matched, navigation suppressed");
                        self.begin_preview(request, now);
                    }
                    ClickOutcome::Navigate => {
                        self.preview.handle_outside_click(position, &self.settings);
                    }
                }
            }
            InputEvent::PointerDown { position } => {
                if self.preview.panel().is_some_and(|p| p.contains(position)) {
                    self.preview.handle_panel_pointer_down(position);
                }
            }
            InputEvent::PointerMove { position } => {
                self.preview.handle_pointer_move(position);
            }
            InputEvent::PointerUp => {
                self.preview.handle_pointer_up();
            }
            InputEvent::KeyDown { key } => {
                if self.engine.on_key_down(&key) {
                    self.preview.close_preview();
                }
            }
            InputEvent::KeyUp { key } => {
                self.engine.on_key_up(&key);
            }
            InputEvent::Scroll => {
                self.preview.handle_scroll(&self.settings);
            }
        }
    }

    /// Advance timers: fires a due hover trigger and expires the error toast
    pub fn poll(&mut self, now: Instant) {
        if let Some(request) = self.engine.poll(now) {
            self.begin_preview(request, now);
        }
        self.preview.poll(now);
    }

    /// Background push: context-menu preview or settings change
    pub fn handle_notification(&mut self, notification: Notification, now: Instant) {
        match notification {
            Notification::ShowPreview { url } => {
                match validate_preview_url(&url, &self.settings) {
                    Ok(url) => self.begin_preview(PreviewRequest { url, origin: None }, now),
                    Err(rejection) => {
                        debug!(url = %url, rejection = ?rejection, "Ignoring pushed preview")
                    }
                }
            }
            Notification::SettingsUpdated => {
                info!("Settings update signaled, picked up on next trigger");
            }
        }
    }

    /// Stage a settings update. Per the settings-immutability rule it takes
    /// effect on the next trigger, never mid-session.
    pub fn update_settings(&mut self, mut settings: Settings) {
        settings.validate_and_clamp();
        if self.preview.is_idle() {
            self.settings = settings;
        } else {
            self.pending_settings = Some(settings);
        }
    }

    fn apply_pending_settings(&mut self) {
        if let Some(settings) = self.pending_settings.take() {
            self.settings = settings;
        }
    }

    /// Run the fetch-or-fallback flow for a trigger decision
    fn begin_preview(&mut self, request: PreviewRequest, now: Instant) {
        // A superseding trigger is a "next trigger" for settings purposes
        self.apply_pending_settings();

        let pending =
            self.preview
                .request_preview(request.url, request.origin, &self.settings);

        // Channel availability is checked before the fetch so the offline
        // path renders the direct card without a doomed round trip
        let result = if self.fetcher.available() {
            self.fetcher.fetch(&pending.url)
        } else {
            Err(FetchError::ChannelUnavailable)
        };

        self.preview
            .on_fetch_result(pending.generation, result, &self.settings, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::FetchReply;
    use crate::fetcher::testing::ScriptedFetcher;
    use crate::geometry::Point;
    use crate::input::{Key, Modifiers};
    use crate::metadata::PageMetadata;
    use crate::preview::PanelContent;
    use crate::settings::Trigger;
    use std::time::Duration;

    const VIEWPORT: Size = Size { width: 1000, height: 1000 };

    fn page_with_link(href: &str) -> (Document, usize) {
        let mut doc = Document::new();
        doc.create_anchor(doc.root(), href);
        (doc, 1)
    }

    fn html_reply() -> FetchReply {
        FetchReply::Html {
            content: String::new(),
            metadata: PageMetadata::default(),
        }
    }

    fn app_with(
        settings: Settings,
        href: &str,
        replies: Vec<Result<FetchReply, FetchError>>,
    ) -> (App<ScriptedFetcher>, usize) {
        let (doc, link) = page_with_link(href);
        (App::new(settings, doc, VIEWPORT, ScriptedFetcher::new(replies)), link)
    }

    #[test]
    fn test_hard_click_opens_preview_immediately() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let (mut app, link) =
            app_with(settings, "https://example.org/page", vec![Ok(html_reply())]);

        app.handle_event(
            InputEvent::Click {
                target: link,
                position: Point::new(200, 480),
                modifiers: Modifiers::NONE,
            },
            Instant::now(),
        );

        let session = app.preview.session().unwrap();
        assert_eq!(session.state, SessionState::Shown);
        assert_eq!(session.url.as_str(), "https://example.org/page");
    }

    #[test]
    fn test_long_hover_fires_only_after_delay() {
        let (mut app, link) =
            app_with(Settings::default(), "https://example.org/", vec![Ok(html_reply())]);
        let start = Instant::now();

        app.handle_event(
            InputEvent::PointerEnter { target: link, position: Point::new(10, 10) },
            start,
        );
        app.poll(start + Duration::from_millis(500));
        assert!(app.preview.is_idle());

        app.poll(start + Duration::from_millis(1000));
        assert_eq!(app.preview.session().unwrap().state, SessionState::Shown);
    }

    #[test]
    fn test_hover_then_leave_never_previews() {
        let (mut app, link) =
            app_with(Settings::default(), "https://example.org/", vec![Ok(html_reply())]);
        let start = Instant::now();

        app.handle_event(
            InputEvent::PointerEnter { target: link, position: Point::new(10, 10) },
            start,
        );
        app.handle_event(
            InputEvent::PointerLeave { target: link },
            start + Duration::from_millis(500),
        );
        app.poll(start + Duration::from_millis(5000));

        assert!(app.preview.is_idle());
    }

    #[test]
    fn test_escape_closes_shown_preview() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let (mut app, link) = app_with(settings, "https://example.org/", vec![Ok(html_reply())]);
        let now = Instant::now();

        app.handle_event(
            InputEvent::Click { target: link, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );
        assert!(!app.preview.is_idle());

        app.handle_event(InputEvent::KeyDown { key: Key::Escape }, now);
        assert!(app.preview.is_idle());
    }

    #[test]
    fn test_new_trigger_supersedes_active_session() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let mut doc = Document::new();
        doc.create_anchor(doc.root(), "https://first.example/");
        doc.create_anchor(doc.root(), "https://second.example/");
        let fetcher = ScriptedFetcher::new(vec![Ok(html_reply()), Ok(html_reply())]);
        let mut app = App::new(settings, doc, VIEWPORT, fetcher);
        let now = Instant::now();

        app.handle_event(
            InputEvent::Click { target: 1, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );
        app.handle_event(
            InputEvent::Click { target: 2, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );

        let session = app.preview.session().unwrap();
        assert_eq!(session.url.as_str(), "https://second.example/");
        assert_eq!(session.state, SessionState::Shown);
    }

    #[test]
    fn test_settings_update_deferred_until_next_trigger() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let (mut app, link) = app_with(
            settings.clone(),
            "https://example.org/",
            vec![Ok(html_reply()), Ok(html_reply())],
        );
        let now = Instant::now();

        app.handle_event(
            InputEvent::Click { target: link, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );

        // Update arrives while the session is live: scroll-close stays on
        let mut updated = settings.clone();
        updated.behavior.close_on_scroll_over = false;
        app.update_settings(updated);
        assert!(app.settings.behavior.close_on_scroll_over);

        app.handle_event(InputEvent::Scroll, now);
        assert!(app.preview.is_idle());

        // Next trigger picks the update up
        app.handle_event(
            InputEvent::Click { target: link, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );
        assert!(!app.settings.behavior.close_on_scroll_over);
        app.handle_event(InputEvent::Scroll, now);
        assert!(!app.preview.is_idle());
    }

    #[test]
    fn test_show_preview_notification() {
        let (mut app, _) =
            app_with(Settings::default(), "https://example.org/", vec![Ok(html_reply())]);
        let now = Instant::now();

        app.handle_notification(
            Notification::ShowPreview { url: "https://pushed.example/".to_string() },
            now,
        );
        assert_eq!(app.preview.session().unwrap().url.as_str(), "https://pushed.example/");

        // Invalid pushed URLs are ignored
        app.handle_notification(
            Notification::ShowPreview { url: "javascript:alert(1)".to_string() },
            now,
        );
        assert_eq!(app.preview.session().unwrap().url.as_str(), "https://pushed.example/");
    }

    #[test]
    fn test_drag_flow_through_events() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let (mut app, link) = app_with(settings, "https://example.org/", vec![Ok(html_reply())]);
        let now = Instant::now();

        app.handle_event(
            InputEvent::Click {
                target: link,
                position: Point::new(800, 500),
                modifiers: Modifiers::NONE,
            },
            now,
        );
        let rect = app.preview.panel().unwrap().rect;
        let grab = Point::new(rect.x + 40, rect.y + 10);

        app.handle_event(InputEvent::PointerDown { position: grab }, now);
        app.handle_event(
            InputEvent::PointerMove { position: Point::new(grab.x + 15, grab.y + 20) },
            now,
        );
        app.handle_event(InputEvent::PointerUp, now);

        let moved = app.preview.panel().unwrap().rect;
        assert_eq!((moved.x, moved.y), (rect.x + 15, rect.y + 20));
    }

    #[test]
    fn test_close_on_pointer_leave_policy() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        settings.behavior.close_on_pointer_leave = true;
        let (mut app, link) = app_with(settings, "https://example.org/", vec![Ok(html_reply())]);
        let now = Instant::now();

        app.handle_event(
            InputEvent::Click { target: link, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            now,
        );
        assert!(!app.preview.is_idle());

        app.handle_event(InputEvent::PointerLeave { target: link }, now);
        assert!(app.preview.is_idle());
    }

    #[test]
    fn test_offline_app_still_shows_direct_card() {
        let mut settings = Settings::default();
        settings.trigger = Trigger::HardClick;
        let (doc, link) = page_with_link("https://example.org/");
        let mut app = App::new(settings, doc, VIEWPORT, ScriptedFetcher::unavailable());

        app.handle_event(
            InputEvent::Click { target: link, position: Point::new(5, 5), modifiers: Modifiers::NONE },
            Instant::now(),
        );

        assert!(matches!(
            app.preview.panel().unwrap().content,
            PanelContent::Card { .. }
        ));
    }
}
