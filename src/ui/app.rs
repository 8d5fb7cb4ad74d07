use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    clock::{Clock, Millis},
    config,
    editor::DraftSession,
    emotion::Palette,
    export::{self, Aspect, ExportSink, Typeface},
    flags::{FlagStore, Guide, Onboarding},
    garden::{Garden, GardenLayout},
    store::ThoughtStore,
};

use super::activity::ActivityStrip;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Editor,
    Garden,
}

/// Everything the terminal loop needs between frames.
pub struct App<'a, S, C>
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    session: DraftSession<&'a S, C>,
    flags: &'a S,
    sink: Box<dyn ExportSink + 'a>,
    typeface: Option<Box<dyn Typeface + 'a>>,
    palette: Palette,
    garden_size: (f32, f32),
    garden: Option<Garden>,
    activity: ActivityStrip,
    guide: Option<Guide>,
    status: Option<String>,
    opacity: f32,
    opacity_checked_at: Millis,
    quit: bool,
}

impl<'a, S, C> App<'a, S, C>
where
    S: ThoughtStore + FlagStore,
    C: Clock,
{
    pub fn new(
        store: &'a S,
        clock: C,
        sink: Box<dyn ExportSink + 'a>,
        typeface: Option<Box<dyn Typeface + 'a>>,
        garden_size: (f32, f32),
    ) -> crate::store::StoreResult<Self> {
        let session = DraftSession::load(store, clock)?;
        let onboarding = Onboarding::new(store);
        let guide = onboarding
            .should_show(Guide::FirstVisit)
            .then_some(Guide::FirstVisit);
        let opacity = session.opacity();
        let opacity_checked_at = session.clock().now_ms();
        Ok(Self {
            session,
            flags: store,
            sink,
            typeface,
            palette: Palette::default(),
            garden_size,
            garden: None,
            activity: ActivityStrip::from_entropy(),
            guide,
            status: None,
            opacity,
            opacity_checked_at,
            quit: false,
        })
    }

    pub fn screen(&self) -> Screen {
        if self.garden.is_some() {
            Screen::Garden
        } else {
            Screen::Editor
        }
    }

    pub fn session(&self) -> &DraftSession<&'a S, C> {
        &self.session
    }

    pub fn garden_mut(&mut self) -> Option<&mut Garden> {
        self.garden.as_mut()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn activity(&self) -> &ActivityStrip {
        &self.activity
    }

    pub fn guide(&self) -> Option<Guide> {
        self.guide
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Text opacity as of the last poll.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Per-frame housekeeping: autosave, opacity poll, ambient motes.
    pub fn tick(&mut self) {
        self.session.poll();
        let now = self.session.clock().now_ms();
        if now - self.opacity_checked_at >= config::OPACITY_POLL_MS {
            self.opacity = self.session.opacity();
            self.opacity_checked_at = now;
        }
        if self.garden.is_none() {
            self.activity.step(self.session.velocity());
        }
    }

    /// Writes any pending draft before the program exits.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.session.flush() {
            tracing::warn!(error = %err, "final draft save failed");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if let Some(guide) = self.guide.take() {
            Onboarding::new(self.flags).dismiss(guide);
            return;
        }
        match self.screen() {
            Screen::Editor => self.editor_key(key),
            Screen::Garden => self.garden_key(key),
        }
    }

    fn editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if ctrl => self.quit = true,
            KeyCode::Char('s') if ctrl => {
                self.preserve();
            }
            KeyCode::Char('e') if ctrl => self.share(),
            KeyCode::Char('g') if ctrl => self.open_garden(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(ch) => self.edited(|s| s.push_char(ch)),
            KeyCode::Enter => self.edited(|s| s.push_char('\n')),
            KeyCode::Backspace => self.edited(|s| s.pop_char()),
            _ => {}
        }
    }

    fn edited(&mut self, edit: impl FnOnce(&mut DraftSession<&'a S, C>)) {
        edit(&mut self.session);
        self.opacity = self.session.opacity();
        self.opacity_checked_at = self.session.clock().now_ms();
        self.status = None;
    }

    fn garden_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.garden = None,
            KeyCode::Char('s') => self.export_meadow(Aspect::Square),
            KeyCode::Char('t') => self.export_meadow(Aspect::Story),
            _ => {}
        }
    }

    /// Returns whether a bloom was actually preserved.
    fn preserve(&mut self) -> bool {
        match self.session.solidify() {
            Ok(Some(record)) => {
                self.status = Some(format!("{} bloom preserved", record.emotion));
                let onboarding = Onboarding::new(self.flags);
                if onboarding.should_show(Guide::FirstPreserve) {
                    self.guide = Some(Guide::FirstPreserve);
                }
                self.opacity = 1.0;
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "preserve failed");
                self.status = Some(format!("could not preserve: {err}"));
                false
            }
        }
    }

    fn share(&mut self) {
        if !self.session.can_preserve() {
            return;
        }
        let now = self.session.clock().now_ms();
        let result = export::export_thought(
            self.session.content(),
            self.session.emotion(),
            Aspect::Square,
            now,
            self.typeface.as_deref(),
            self.sink.as_mut(),
        );
        match result {
            Ok(Some(path)) => {
                if self.preserve() {
                    self.status = Some(format!("card saved to {}", path.display()));
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "thought card export failed");
                self.status = Some(format!("could not export: {err}"));
            }
        }
    }

    fn open_garden(&mut self) {
        let records = match self.session.store().query_by_solidified(true) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load garden");
                self.status = Some(format!("could not open the garden: {err}"));
                return;
            }
        };
        let (width, height) = self.garden_size;
        let mut garden = Garden::new(GardenLayout::from_entropy(width, height), self.palette.clone());
        garden.load(&records);
        self.garden = Some(garden);
        self.status = None;
        if Onboarding::new(self.flags).should_show(Guide::GardenHint) {
            self.guide = Some(Guide::GardenHint);
        }
    }

    fn export_meadow(&mut self, aspect: Aspect) {
        let Some(garden) = self.garden.as_ref() else {
            return;
        };
        let now = self.session.clock().now_ms();
        match export::export_meadow(garden, aspect, now, self.typeface.as_deref(), self.sink.as_mut()) {
            Ok(Some(path)) => self.status = Some(format!("meadow map saved to {}", path.display())),
            Ok(None) => self.status = Some("nothing has bloomed yet".into()),
            Err(err) => {
                tracing::warn!(error = %err, "meadow export failed");
                self.status = Some(format!("could not export: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::emotion::Emotion;
    use crate::export::testing::FixedFace;
    use crate::export::{Card, ExportResult};
    use crate::store::{
        NewThought, SqliteStore, StoreError, StoreResult, ThoughtId, ThoughtPatch, ThoughtRecord,
    };

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<Card>>>);

    impl ExportSink for SharedSink {
        fn deliver(&mut self, card: &Card) -> ExportResult<PathBuf> {
            self.0.borrow_mut().push(card.clone());
            Ok(PathBuf::from(&card.filename))
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    /// Sqlite store whose updates can be made to fail.
    struct LockedStore {
        inner: SqliteStore,
        locked: Cell<bool>,
    }

    impl LockedStore {
        fn new() -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                locked: Cell::new(false),
            }
        }

        fn db(&self) -> &SqliteStore {
            &self.inner
        }
    }

    impl ThoughtStore for LockedStore {
        fn create(&self, thought: &NewThought) -> StoreResult<ThoughtId> {
            self.db().create(thought)
        }

        fn update(&self, id: ThoughtId, patch: &ThoughtPatch) -> StoreResult<()> {
            if self.locked.get() {
                return Err(StoreError::Unavailable("database is locked".into()));
            }
            self.db().update(id, patch)
        }

        fn query_by_solidified(&self, solidified: bool) -> StoreResult<Vec<ThoughtRecord>> {
            self.db().query_by_solidified(solidified)
        }
    }

    impl FlagStore for LockedStore {
        fn is_set(&self, key: &str) -> StoreResult<bool> {
            self.db().is_set(key)
        }

        fn set(&self, key: &str) -> StoreResult<()> {
            self.db().set(key)
        }
    }

    fn type_text<S: ThoughtStore + FlagStore, C: Clock>(app: &mut App<'_, S, C>, text: &str) {
        for ch in text.chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
    }

    fn app<'a, S: ThoughtStore + FlagStore>(
        store: &'a S,
        clock: &'a ManualClock,
        sink: SharedSink,
    ) -> App<'a, S, &'a ManualClock> {
        let face: Box<dyn Typeface> = Box::new(FixedFace::default());
        let mut app = App::new(store, clock, Box::new(sink), Some(face), (1280.0, 800.0)).unwrap();
        if app.guide().is_some() {
            app.handle_key(press(KeyCode::Enter));
        }
        app
    }

    mod onboarding {
        use super::*;

        #[test]
        fn first_visit_banner_swallows_one_key() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let mut app =
                App::new(&store, &clock, Box::new(SharedSink::default()), None, (800.0, 600.0)).unwrap();
            assert_eq!(app.guide(), Some(Guide::FirstVisit));
            app.handle_key(press(KeyCode::Char('x')));
            assert_eq!(app.guide(), None);
            assert_eq!(app.session().content(), "");

            let again =
                App::new(&store, &clock, Box::new(SharedSink::default()), None, (800.0, 600.0)).unwrap();
            assert_eq!(again.guide(), None);
        }

        #[test]
        fn first_preserve_guide_shows_once() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let mut app = app(&store, &clock, SharedSink::default());
            type_text(&mut app, "hello");
            app.handle_key(ctrl('s'));
            assert_eq!(app.guide(), Some(Guide::FirstPreserve));
            app.handle_key(press(KeyCode::Char('a')));

            type_text(&mut app, "again");
            app.handle_key(ctrl('s'));
            assert_eq!(app.guide(), None);
        }
    }

    mod editor {
        use super::*;

        #[test]
        fn typing_then_autosave_creates_one_draft() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(1_000);
            let mut app = app(&store, &clock, SharedSink::default());
            type_text(&mut app, "so worried");
            app.handle_key(press(KeyCode::Backspace));
            clock.advance(config::AUTOSAVE_DELAY_MS);
            app.tick();
            let drafts = store.query_by_solidified(false).unwrap();
            assert_eq!(drafts.len(), 1);
            assert_eq!(drafts[0].content, "so worrie");
        }

        #[test]
        fn opacity_refreshes_on_poll_interval() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let mut app = app(&store, &clock, SharedSink::default());
            type_text(&mut app, "x");
            clock.advance(config::DECAY_HORIZON_MS / 2);
            assert_eq!(app.opacity(), 1.0);
            app.tick();
            assert!((app.opacity() - 0.5).abs() < 1e-3);
        }

        #[test]
        fn preserve_reports_emotion() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let mut app = app(&store, &clock, SharedSink::default());
            type_text(&mut app, "I am so angry");
            app.handle_key(ctrl('s'));
            assert_eq!(app.status(), Some("anger bloom preserved"));
            let kept = store.query_by_solidified(true).unwrap();
            assert_eq!(kept[0].emotion, Emotion::Anger);
            assert_eq!(app.session().content(), "");
        }

        #[test]
        fn share_exports_then_preserves() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(7);
            let sink = SharedSink::default();
            let mut app = app(&store, &clock, sink.clone());
            type_text(&mut app, "grateful");
            app.handle_key(ctrl('e'));
            if app.guide().is_some() {
                app.handle_key(press(KeyCode::Enter));
            }
            assert_eq!(sink.0.borrow().len(), 1);
            assert_eq!(sink.0.borrow()[0].filename, "udyana-square-7.png");
            assert_eq!(store.query_by_solidified(true).unwrap().len(), 1);
            assert_eq!(app.status(), Some("card saved to udyana-square-7.png"));
        }

        #[test]
        fn share_reports_failed_preserve() {
            let store = LockedStore::new();
            let clock = ManualClock::new(7);
            let sink = SharedSink::default();
            let mut app = app(&store, &clock, sink.clone());
            type_text(&mut app, "grateful");
            store.locked.set(true);
            app.handle_key(ctrl('e'));
            assert_eq!(sink.0.borrow().len(), 1);
            assert!(store.query_by_solidified(true).unwrap().is_empty());
            let status = app.status().unwrap();
            assert!(status.starts_with("could not preserve"), "{status}");
            assert_eq!(app.session().content(), "grateful");
        }

        #[test]
        fn share_without_font_keeps_draft() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(7);
            let sink = SharedSink::default();
            let mut app =
                App::new(&store, &clock, Box::new(sink.clone()), None, (1280.0, 800.0)).unwrap();
            app.handle_key(press(KeyCode::Enter));
            type_text(&mut app, "grateful");
            app.handle_key(ctrl('e'));
            assert!(sink.0.borrow().is_empty());
            assert!(app.status().unwrap().starts_with("could not export"));
            assert_eq!(app.session().content(), "grateful");
        }

        #[test]
        fn share_on_blank_draft_does_nothing() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let sink = SharedSink::default();
            let mut app = app(&store, &clock, sink.clone());
            type_text(&mut app, "   ");
            app.handle_key(ctrl('e'));
            app.handle_key(ctrl('s'));
            assert!(sink.0.borrow().is_empty());
            assert!(store.query_by_solidified(true).unwrap().is_empty());
        }

        #[test]
        fn escape_quits_and_flushes() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let mut app = app(&store, &clock, SharedSink::default());
            type_text(&mut app, "unsaved");
            app.handle_key(press(KeyCode::Esc));
            assert!(app.should_quit());
            app.shutdown();
            assert_eq!(store.query_by_solidified(false).unwrap()[0].content, "unsaved");
        }
    }

    mod garden {
        use super::*;

        #[test]
        fn opens_with_preserved_thoughts_and_exports() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(5);
            let sink = SharedSink::default();
            let mut app = app(&store, &clock, sink.clone());
            type_text(&mut app, "so happy");
            app.handle_key(ctrl('s'));
            app.handle_key(press(KeyCode::Enter));

            app.handle_key(ctrl('g'));
            assert_eq!(app.screen(), Screen::Garden);
            assert_eq!(app.guide(), Some(Guide::GardenHint));
            app.handle_key(press(KeyCode::Char('x')));
            assert_eq!(app.garden_mut().unwrap().nodes().len(), 1);

            app.handle_key(press(KeyCode::Char('t')));
            assert_eq!(sink.0.borrow()[0].filename, "udyana-meadow-map-story-5.png");

            app.handle_key(press(KeyCode::Char('q')));
            assert_eq!(app.screen(), Screen::Editor);
            assert!(!app.should_quit());
        }

        #[test]
        fn empty_garden_refuses_export() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(0);
            let sink = SharedSink::default();
            let mut app = app(&store, &clock, sink.clone());
            app.handle_key(ctrl('g'));
            app.handle_key(press(KeyCode::Esc));
            assert_eq!(app.screen(), Screen::Garden);
            app.handle_key(press(KeyCode::Char('s')));
            assert!(sink.0.borrow().is_empty());
            assert_eq!(app.status(), Some("nothing has bloomed yet"));
        }
    }
}
