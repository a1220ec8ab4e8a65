//! The HUD actor owns every piece of layout state and is the only thing that
//! mutates it.
//!
//! Host messages, render frames and pointer input arrive as [`Event`]s. After
//! any change that affects geometry (screen size, disabled widgets, the ready
//! transition, a moved widget) the full layout pipeline is re-run and the
//! result handed to the rendering surface.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{Span, debug, info, instrument, trace, warn};

use super::drag::{self, GuideOverlay, SnapSession};
use super::host::{HostBridge, HostCall, HostEvent};
use super::readiness::{AllLoaded, ReadinessBarrier};
use crate::actor;
use crate::common::collections::HashMap;
use crate::common::config::Settings;
use crate::common::log::trace_frames;
use crate::layout_engine::{ContextFlags, Direction, PlacedWidget, SnapLine, compute_hud_layout};
use crate::model::history::{InputHistory, LANGUAGE_KEY, LanguagePreference};
use crate::model::notifications::{NotificationId, NotificationQueue};
use crate::model::registry::WidgetRegistry;
use crate::model::stores::{Store, Stores, VisibilityUpdate};
use crate::model::widget::WidgetId;
use crate::sys::geometry::{Point, Size};
use crate::sys::measure::Surface;
use crate::sys::storage::Storage;
use crate::sys::timer::Timer;

const NOTIFICATION_CAPACITY: usize = 5;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    Host(HostEvent),
    /// An unparsed host envelope.
    RawHost(String),
    /// A render cycle completed.
    Frame,
    AsyncWidgetRegistered(WidgetId),
    AsyncWidgetReady(WidgetId),
    ModifierDown,
    ModifierUp,
    DragMove {
        widget: WidgetId,
        position: Point,
    },
    DragEnd {
        widget: WidgetId,
    },
    Nudge {
        widget: WidgetId,
        direction: Direction,
    },
    SetSelection(Vec<WidgetId>),
    ResetPosition(WidgetId),
    /// Drops every player override: positions, scales, visibility.
    ResetLayout,
    /// Something the player asked the host to do.
    Request(HostCall),
    NotificationExpired(NotificationId),
    Shutdown,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HudStats {
    pub dropped_host_events: u64,
    pub coalesced_drag_moves: u64,
}

pub struct Hud<S: Surface> {
    settings: Settings,
    registry: WidgetRegistry,
    stores: Stores,
    surface: S,
    storage: Box<dyn Storage>,
    bridge: Box<dyn HostBridge>,
    readiness: ReadinessBarrier,
    snap: SnapSession,
    guides: GuideOverlay,
    history: InputHistory,
    language: LanguagePreference,
    notifications: NotificationQueue,
    notification_timers: HashMap<NotificationId, Timer>,
    layout: Vec<PlacedWidget>,
    restore_path: Option<PathBuf>,
    stats: HudStats,
    events_tx: Sender,
    events: Receiver,
    pending: Option<(Span, Event)>,
}

impl<S: Surface> Hud<S> {
    pub fn new(
        settings: Settings,
        registry: WidgetRegistry,
        surface: S,
        storage: Box<dyn Storage>,
        bridge: Box<dyn HostBridge>,
        screen: Size,
    ) -> (Self, Sender) {
        let (events_tx, events) = actor::channel();

        let history = InputHistory::load(storage.as_ref(), settings.history_limit);
        let mut language = LanguagePreference::load(storage.as_ref());
        if storage.get(LANGUAGE_KEY).is_none() {
            language.set(&settings.language);
        }

        let mut hud = Self {
            registry,
            stores: Stores::new(screen),
            surface,
            storage,
            bridge,
            readiness: ReadinessBarrier::new(settings.layout.mount_frame_budget),
            snap: SnapSession::new(settings.layout.snap_threshold),
            guides: GuideOverlay::new(Duration::from_millis(settings.layout.guide_display_ms)),
            history,
            language,
            notifications: NotificationQueue::new(
                NOTIFICATION_CAPACITY,
                Duration::from_millis(settings.notification_ttl_ms),
            ),
            notification_timers: HashMap::default(),
            layout: Vec::new(),
            restore_path: None,
            stats: HudStats::default(),
            events_tx: events_tx.clone(),
            events,
            pending: None,
            settings,
        };
        hud.relayout();
        (hud, events_tx)
    }

    /// Saves the player's layout edits to `path` whenever a drag or nudge
    /// finishes.
    pub fn with_restore_path(mut self, path: PathBuf) -> Self {
        self.restore_path = Some(path);
        self
    }

    pub fn layout(&self) -> &[PlacedWidget] { &self.layout }

    pub fn placed(&self, id: &WidgetId) -> Option<&PlacedWidget> {
        self.layout.iter().find(|w| &w.id == id)
    }

    pub fn guides(&self) -> Vec<SnapLine> { self.guides.lines() }

    pub fn registry(&self) -> &WidgetRegistry { &self.registry }

    pub fn stores(&self) -> &Stores { &self.stores }

    pub fn readiness(&self) -> &ReadinessBarrier { &self.readiness }

    pub fn notifications(&self) -> &NotificationQueue { &self.notifications }

    pub fn history(&self) -> &InputHistory { &self.history }

    pub fn language(&self) -> &LanguagePreference { &self.language }

    pub fn stats(&self) -> &HudStats { &self.stats }

    /// Processes events until [`Event::Shutdown`], then hands the HUD back
    /// for inspection.
    pub async fn run(mut self) -> Self {
        loop {
            let (span, event) = match self.pending.take() {
                Some(next) => next,
                None => match self.events.recv().await {
                    Some(next) => next,
                    None => break,
                },
            };
            let _guard = span.enter();
            let event = self.coalesce(event);
            if !self.handle_event(event) {
                break;
            }
        }
        self
    }

    /// Only the newest queued position of a drag matters.
    fn coalesce(&mut self, mut event: Event) -> Event {
        while let Event::DragMove { widget, .. } = &event {
            let widget = widget.clone();
            match self.events.try_recv() {
                Ok((span, next)) => {
                    if matches!(&next, Event::DragMove { widget: w, .. } if *w == widget) {
                        self.stats.coalesced_drag_moves += 1;
                        event = next;
                    } else {
                        self.pending = Some((span, next));
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        event
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::Frame | Event::DragMove { .. } => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    /// Returns false once the HUD should stop.
    #[instrument(name = "hud::handle_event", skip(self), fields(event = ?event))]
    pub fn handle_event(&mut self, event: Event) -> bool {
        self.log_event(&event);
        match event {
            Event::Host(event) => self.handle_host_event(event),
            Event::RawHost(raw) => match HostEvent::parse(&raw) {
                Ok(event) => self.handle_host_event(event),
                Err(err) => {
                    self.stats.dropped_host_events += 1;
                    warn!(%err, "dropping host event");
                }
            },
            Event::Frame => {
                if self.stores.visibility.visible() {
                    if let Some(loaded) = self.readiness.on_frame() {
                        self.on_all_loaded(loaded);
                    }
                }
            }
            Event::AsyncWidgetRegistered(id) => {
                self.readiness.register_async(id);
            }
            Event::AsyncWidgetReady(id) => {
                if let Some(loaded) = self.readiness.signal_ready(&id) {
                    self.on_all_loaded(loaded);
                }
            }
            Event::ModifierDown => {
                self.snap.modifier_down(&self.layout, self.settings.layout.simple_mode);
            }
            Event::ModifierUp => {
                self.snap.modifier_up();
                self.guides.clear();
            }
            Event::DragMove { widget, position } => self.drag_move(widget, position),
            Event::DragEnd { widget } => {
                debug!(%widget, "drag end");
                self.snap.drag_end();
                self.guides.clear();
                self.persist_layout();
            }
            Event::Nudge { widget, direction } => self.nudge(widget, direction),
            Event::SetSelection(ids) => self.snap.set_selection(ids),
            Event::ResetPosition(id) => {
                if self.registry.reset_position(&id) {
                    self.relayout();
                    self.persist_layout();
                }
            }
            Event::ResetLayout => {
                self.registry.reset_all();
                self.relayout();
                self.persist_layout();
            }
            Event::Request(call) => self.bridge.post(call),
            Event::NotificationExpired(id) => {
                self.notification_timers.remove(&id);
                if self.notifications.expire(id) {
                    trace!(%id, "notification expired");
                }
            }
            Event::Shutdown => {
                info!("hud shutting down");
                return false;
            }
        }
        true
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::UpdateStatus(update) => {
                self.stores.status.apply(&update);
            }
            HostEvent::UpdateVehicle(update) => {
                let was_in_vehicle = self.stores.vehicle.in_vehicle();
                if self.stores.vehicle.apply(&update)
                    && was_in_vehicle != self.stores.vehicle.in_vehicle()
                {
                    self.relayout();
                }
            }
            HostEvent::UpdateVoice(update) => {
                self.stores.voice.apply(&update);
            }
            HostEvent::SetVisible { visible } => {
                if !self.stores.visibility.apply(&VisibilityUpdate::Shown(visible)) {
                    return;
                }
                if visible {
                    self.readiness.reset();
                    self.relayout();
                } else {
                    self.snap.modifier_up();
                    self.guides.clear();
                }
            }
            HostEvent::SetScreen { width, height } => {
                let screen = Size::new(width, height);
                if self.stores.visibility.apply(&VisibilityUpdate::Screen(screen)) {
                    self.relayout();
                }
            }
            HostEvent::SetDisabledWidgets { widgets } => {
                if self.registry.set_disabled(widgets) {
                    self.relayout();
                }
            }
            HostEvent::Notify { kind, text, duration_ms } => {
                let (notification, evicted) =
                    self.notifications.push(kind, text, duration_ms.map(Duration::from_millis));
                if let Some(evicted) = evicted {
                    self.notification_timers.remove(&evicted);
                }
                let id = notification.id;
                let events_tx = self.events_tx.clone();
                self.notification_timers.insert(
                    id,
                    Timer::after(notification.ttl, move || {
                        events_tx.send(Event::NotificationExpired(id))
                    }),
                );
            }
            HostEvent::ChatInput { text } => {
                if self.history.push(&text) {
                    if let Err(err) = self.history.save(self.storage.as_mut()) {
                        warn!(%err, "failed to save input history");
                    }
                }
            }
            HostEvent::SetLanguage { language } => {
                if self.language.set(&language) {
                    if let Err(err) = self.language.save(self.storage.as_mut()) {
                        warn!(%err, "failed to save language");
                    }
                }
            }
        }
    }

    fn on_all_loaded(&mut self, loaded: AllLoaded) {
        info!(session = loaded.session, "hud loaded");
        self.bridge.post(HostCall::Loaded);
        // sizes now come from the rendered widgets
        self.relayout();
    }

    fn flags(&self) -> ContextFlags {
        let mut flags = self.settings.layout.context_flags();
        flags.set(ContextFlags::IN_VEHICLE, self.stores.vehicle.in_vehicle());
        flags
    }

    #[instrument(skip(self))]
    fn relayout(&mut self) {
        self.layout = compute_hud_layout(
            &self.registry,
            &self.surface,
            self.stores.visibility.screen(),
            self.readiness.is_ready(),
            self.flags(),
            &self.settings.layout.status,
        );
        self.surface.present(&self.layout);
        if trace_frames() {
            for widget in &self.layout {
                trace!(id = %widget.id, rect = ?widget.rect, shown = widget.is_shown(), "placed");
            }
        }
    }

    fn move_widget(&mut self, widget: &WidgetId, position: Point) {
        if let Err(err) = self.registry.set_position(widget, position) {
            warn!(%err, "ignoring move");
            return;
        }
        self.relayout();
    }

    fn drag_move(&mut self, widget: WidgetId, position: Point) {
        let Some(current) = self.placed(&widget).map(|w| w.rect) else {
            warn!(%widget, "drag for unknown widget");
            return;
        };
        let result = self.snap.drag_move(&widget, current.with_origin(position), &self.layout);
        if self.snap.is_snapping() {
            self.guides.show(&result.lines);
        }
        self.move_widget(&widget, result.position);
    }

    fn nudge(&mut self, widget: WidgetId, direction: Direction) {
        let Some(current) = self.placed(&widget).map(|w| w.rect) else {
            warn!(%widget, "nudge for unknown widget");
            return;
        };
        let step = self.settings.layout.nudge_step;
        let result = drag::nudge(&widget, current, direction, step, &self.layout);
        self.move_widget(&widget, result.position);
        self.guides.show_temporarily(&result.lines);
        self.persist_layout();
    }

    fn persist_layout(&self) {
        let Some(path) = &self.restore_path else { return };
        if let Err(err) = self.registry.save(path) {
            warn!(?path, ?err, "failed to save layout");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor::readiness::ReadyPhase;
    use crate::layout_engine::defaults::default_measure;
    use crate::layout_engine::{Orientation, SnapKind};
    use crate::model::stores::VehicleUpdate;
    use crate::sys::measure::StaticMeasure;
    use crate::sys::storage::{FileStorage, MemoryStorage};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<HostCall>>>);

    impl HostBridge for Recorder {
        fn post(&self, call: HostCall) { self.0.lock().push(call); }
    }

    impl Recorder {
        fn calls(&self) -> Vec<HostCall> { self.0.lock().clone() }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.layout.mount_frame_budget = 2;
        settings
    }

    fn hud_with(settings: Settings, storage: Box<dyn Storage>) -> (Hud<StaticMeasure>, Recorder) {
        let recorder = Recorder::default();
        let (hud, _tx) = Hud::new(
            settings,
            WidgetRegistry::default(),
            default_measure(),
            storage,
            Box::new(recorder.clone()),
            Size::new(1920.0, 1080.0),
        );
        (hud, recorder)
    }

    fn hud() -> (Hud<StaticMeasure>, Recorder) { hud_with(settings(), Box::new(MemoryStorage::new())) }

    fn id(s: &str) -> WidgetId { WidgetId::from(s) }

    fn x_of(hud: &Hud<StaticMeasure>, widget: &str) -> f64 { hud.placed(&id(widget)).unwrap().rect.x }

    /// Handles whatever timers have queued so far.
    fn pump(hud: &mut Hud<StaticMeasure>) {
        while let Ok((_, event)) = hud.events.try_recv() {
            hud.handle_event(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loaded_is_posted_once_after_the_barrier() {
        let (mut hud, recorder) = hud();
        hud.handle_event(Event::AsyncWidgetRegistered(id("minimap")));
        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        assert_eq!(hud.readiness().phase(), &ReadyPhase::Waiting);
        assert!(recorder.calls().is_empty());

        hud.handle_event(Event::AsyncWidgetReady(id("minimap")));
        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        assert_eq!(recorder.calls(), [HostCall::Loaded]);
        assert!(hud.readiness().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn layout_is_stable_across_the_ready_transition() {
        let (mut hud, _) = hud();
        let before = hud.layout().to_vec();
        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        assert!(hud.readiness().is_ready());
        assert_eq!(hud.layout(), before.as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn drag_snaps_to_an_edge_and_key_release_clears_guides() {
        let (mut hud, _) = hud();
        let compass = hud.placed(&id("compass")).unwrap().rect;
        assert_eq!(compass.right(), 1120.0);

        hud.handle_event(Event::ModifierDown);
        hud.handle_event(Event::DragMove {
            widget: id("chat"),
            position: Point::new(1123.0, 500.0),
        });

        assert_eq!(hud.placed(&id("chat")).unwrap().rect.origin(), Point::new(1120.0, 500.0));
        assert!(hud.guides().contains(&SnapLine {
            orientation: Orientation::Vertical,
            position: 1120.0,
            kind: SnapKind::Edge,
        }));

        hud.handle_event(Event::ModifierUp);
        assert!(hud.guides().is_empty());
        assert_eq!(hud.registry().saved_position(&id("chat")), Some(Point::new(1120.0, 500.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_host_events_are_dropped() {
        let (mut hud, _) = hud();
        assert!(hud.handle_event(Event::RawHost("{".to_string())));
        assert!(hud.handle_event(Event::RawHost(r#"{"action":"explode","data":{}}"#.to_string())));
        assert_eq!(hud.stats().dropped_host_events, 2);

        assert_eq!(x_of(&hud, "hunger"), 396.0);
        hud.handle_event(Event::RawHost(
            r#"{"action":"set_disabled_widgets","data":{"widgets":["armor"]}}"#.to_string(),
        ));
        assert_eq!(x_of(&hud, "hunger"), 344.0);
        assert!(hud.placed(&id("armor")).unwrap().disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn entering_a_vehicle_shows_the_gauges() {
        let (mut hud, _) = hud();
        assert!(!hud.placed(&id("speedometer")).unwrap().visible);
        hud.handle_event(Event::Host(HostEvent::UpdateVehicle(VehicleUpdate {
            in_vehicle: Some(true),
            ..Default::default()
        })));
        assert!(hud.placed(&id("speedometer")).unwrap().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn screen_changes_move_anchored_widgets() {
        let (mut hud, _) = hud();
        hud.handle_event(Event::Host(HostEvent::SetScreen { width: 1280.0, height: 720.0 }));
        assert_eq!(x_of(&hud, "compass"), (1280.0 - 320.0) / 2.0);
        // degenerate sizes are ignored
        hud.handle_event(Event::Host(HostEvent::SetScreen { width: 0.0, height: 720.0 }));
        assert_eq!(x_of(&hud, "compass"), (1280.0 - 320.0) / 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_expire_on_their_own() {
        let (mut hud, _) = hud();
        hud.handle_event(Event::Host(HostEvent::Notify {
            kind: Default::default(),
            text: "saved".to_string(),
            duration_ms: Some(1000),
        }));
        assert_eq!(hud.notifications().len(), 1);

        tokio::time::sleep(Duration::from_millis(999)).await;
        pump(&mut hud);
        assert_eq!(hud.notifications().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        pump(&mut hud);
        assert!(hud.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn nudge_moves_one_step_and_shows_guides_briefly() {
        let (mut hud, _) = hud();
        let money = hud.placed(&id("money")).unwrap().rect;
        hud.handle_event(Event::Nudge { widget: id("money"), direction: Direction::Down });

        assert_eq!(
            hud.placed(&id("money")).unwrap().rect.origin(),
            Point::new(money.x, money.y + 1.0)
        );
        // still right-aligned with the notifications panel
        assert!(hud.guides().contains(&SnapLine::vertical(1900.0, SnapKind::Edge)));

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(hud.guides().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hiding_and_showing_starts_a_new_ready_session() {
        let (mut hud, recorder) = hud();
        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        hud.handle_event(Event::Host(HostEvent::SetVisible { visible: false }));
        // frames while hidden do not count
        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        hud.handle_event(Event::Host(HostEvent::SetVisible { visible: true }));
        assert_eq!(hud.readiness().session(), 1);
        assert!(!hud.readiness().is_ready());

        for _ in 0..3 {
            hud.handle_event(Event::Frame);
        }
        assert_eq!(recorder.calls(), [HostCall::Loaded, HostCall::Loaded]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_coalesces_queued_drag_moves() {
        let recorder = Recorder::default();
        let (hud, tx) = Hud::new(
            settings(),
            WidgetRegistry::default(),
            default_measure(),
            Box::new(MemoryStorage::new()),
            Box::new(recorder.clone()),
            Size::new(1920.0, 1080.0),
        );
        for x in [100.0, 200.0, 300.0] {
            tx.send(Event::DragMove { widget: id("chat"), position: Point::new(x, x) });
        }
        tx.send(Event::DragEnd { widget: id("chat") });
        tx.send(Event::Request(HostCall::CloseOverlay));
        tx.send(Event::Shutdown);

        let hud = hud.run().await;
        assert_eq!(hud.registry().saved_position(&id("chat")), Some(Point::new(300.0, 300.0)));
        assert_eq!(hud.stats().coalesced_drag_moves, 2);
        assert_eq!(recorder.calls(), [HostCall::CloseOverlay]);
    }

    #[tokio::test(start_paused = true)]
    async fn drag_end_saves_the_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.ron");
        let (hud, _) = hud();
        let mut hud = hud.with_restore_path(path.clone());

        hud.handle_event(Event::DragMove { widget: id("chat"), position: Point::new(40.0, 60.0) });
        hud.handle_event(Event::DragEnd { widget: id("chat") });

        let saved = WidgetRegistry::load(&path).unwrap();
        assert_eq!(saved.widgets[&id("chat")].position, Some(Point::new(40.0, 60.0)));

        hud.handle_event(Event::ResetPosition(id("chat")));
        assert_eq!(x_of(&hud, "chat"), 20.0);
        assert!(WidgetRegistry::load(&path).unwrap().widgets.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_layout_restores_stock_positions_and_visibility() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.ron");
        let (hud, _) = hud();
        let mut hud = hud.with_restore_path(path.clone());

        hud.handle_event(Event::DragMove { widget: id("chat"), position: Point::new(40.0, 60.0) });
        hud.handle_event(Event::DragEnd { widget: id("chat") });
        hud.registry.set_visible(&id("armor"), false).unwrap();
        hud.handle_event(Event::ResetLayout);

        assert_eq!(x_of(&hud, "chat"), 20.0);
        assert!(hud.placed(&id("armor")).unwrap().visible);
        assert_eq!(x_of(&hud, "hunger"), 396.0);
        assert!(hud.registry.saved_layout().widgets.is_empty());
        assert!(WidgetRegistry::load(&path).unwrap().widgets.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn chat_history_and_language_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut settings = settings();
        settings.language = "fr".to_string();

        let (mut hud, _) = hud_with(settings.clone(), Box::new(FileStorage::open(&path)));
        assert_eq!(hud.language().code(), "fr");
        hud.handle_event(Event::Host(HostEvent::ChatInput { text: "hello".to_string() }));
        hud.handle_event(Event::Host(HostEvent::ChatInput { text: "hello".to_string() }));
        hud.handle_event(Event::Host(HostEvent::SetLanguage { language: "de".to_string() }));
        drop(hud);

        let (hud, _) = hud_with(settings, Box::new(FileStorage::open(&path)));
        assert_eq!(hud.history().entries(), ["hello"]);
        assert_eq!(hud.language().code(), "de");
    }
}
