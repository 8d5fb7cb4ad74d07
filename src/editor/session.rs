use crate::clock::{Clock, Millis};
use crate::emotion::{self, Emotion};
use crate::store::{NewThought, StoreResult, ThoughtId, ThoughtPatch, ThoughtRecord, ThoughtStore};

use super::autosave::Autosave;
use super::fade::{FadeClock, FadePhase};
use super::velocity::VelocityTracker;

/// The editor's single logical draft.
///
/// In-memory state is authoritative for display. The store sees it through
/// the debounced autosave; a failed write leaves the draft dirty and the next
/// edit schedules another attempt.
pub struct DraftSession<S: ThoughtStore, C: Clock> {
    store: S,
    clock: C,
    draft_id: Option<ThoughtId>,
    created_at: Option<Millis>,
    content: String,
    emotion: Emotion,
    last_active: Millis,
    autosave: Autosave,
    velocity: VelocityTracker,
    fade: FadeClock,
    dirty: bool,
}

impl<S: ThoughtStore, C: Clock> DraftSession<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            store,
            clock,
            draft_id: None,
            created_at: None,
            content: String::new(),
            emotion: Emotion::DEFAULT,
            last_active: now,
            autosave: Autosave::default(),
            velocity: VelocityTracker::default(),
            fade: FadeClock::default(),
            dirty: false,
        }
    }

    /// Resumes the most recently active unsolidified draft, if any.
    pub fn load(store: S, clock: C) -> StoreResult<Self> {
        let existing = store.active_draft()?;
        let mut session = Self::new(store, clock);
        if let Some(record) = existing {
            tracing::info!(id = %record.id, chars = record.content.chars().count(), "resumed draft");
            session.draft_id = Some(record.id);
            session.created_at = Some(record.created_at);
            session.content = record.content;
            session.emotion = record.emotion;
            session.last_active = record.last_active_at;
        }
        Ok(session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn last_active(&self) -> Millis {
        self.last_active
    }

    pub fn draft_id(&self) -> Option<ThoughtId> {
        self.draft_id
    }

    pub fn velocity(&self) -> f32 {
        self.velocity.current_velocity()
    }

    pub fn opacity(&self) -> f32 {
        self.fade.opacity(self.clock.now_ms(), self.last_active)
    }

    pub fn phase(&self) -> FadePhase {
        FadePhase::from_opacity(self.opacity())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Preserve and share are only offered for non-blank drafts.
    pub fn can_preserve(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn update_content(&mut self, content: impl Into<String>) {
        let now = self.clock.now_ms();
        self.content = content.into();
        self.emotion = emotion::classify(&self.content);
        self.last_active = now;
        self.dirty = true;
        self.velocity.record_event(now);
        self.autosave.on_edit(now);
    }

    pub fn push_char(&mut self, ch: char) {
        let mut next = self.content.clone();
        next.push(ch);
        self.update_content(next);
    }

    pub fn pop_char(&mut self) {
        let mut next = self.content.clone();
        if next.pop().is_some() {
            self.update_content(next);
        }
    }

    /// Drives the debounce; call from the event loop.
    pub fn poll(&mut self) {
        if self.autosave.poll(self.clock.now_ms()) {
            let _ = self.write();
        }
    }

    /// Writes any pending or previously failed edit immediately.
    pub fn flush(&mut self) -> StoreResult<()> {
        if self.autosave.take_now() || self.dirty {
            self.write()?;
        }
        Ok(())
    }

    fn write(&mut self) -> StoreResult<()> {
        let result = self.persist();
        self.autosave.on_write_complete();
        match &result {
            Ok(()) => self.dirty = false,
            Err(err) => {
                tracing::warn!(
                    draft = ?self.draft_id,
                    error = %err,
                    "draft write failed; keeping in-memory copy"
                );
            }
        }
        result
    }

    fn persist(&mut self) -> StoreResult<()> {
        match self.draft_id {
            Some(id) => {
                self.store.update(
                    id,
                    &ThoughtPatch {
                        content: Some(self.content.clone()),
                        last_active_at: Some(self.last_active),
                        emotion: Some(self.emotion),
                        solidified: None,
                    },
                )?;
                tracing::debug!(%id, chars = self.content.chars().count(), "draft saved");
            }
            None if self.content.trim().is_empty() => {}
            None => {
                let id = self.store.create(&NewThought::draft(
                    self.content.clone(),
                    self.last_active,
                    self.emotion,
                ))?;
                tracing::debug!(%id, "draft created");
                self.draft_id = Some(id);
                self.created_at = Some(self.last_active);
            }
        }
        Ok(())
    }

    /// Commits the draft to the garden and starts a fresh, not-yet-persisted
    /// draft. Returns `None` for blank content.
    pub fn solidify(&mut self) -> StoreResult<Option<ThoughtRecord>> {
        if !self.can_preserve() {
            return Ok(None);
        }
        if self.draft_id.is_none() || self.dirty {
            self.autosave.cancel();
            self.write()?;
        }
        let Some(id) = self.draft_id else {
            return Ok(None);
        };

        self.store.update(
            id,
            &ThoughtPatch {
                solidified: Some(true),
                emotion: Some(self.emotion),
                ..Default::default()
            },
        )?;

        let record = ThoughtRecord {
            id,
            content: std::mem::take(&mut self.content),
            created_at: self.created_at.unwrap_or(self.last_active),
            last_active_at: self.last_active,
            emotion: self.emotion,
            solidified: true,
        };
        tracing::info!(
            %id,
            emotion = %record.emotion,
            chars = record.content.chars().count(),
            "thought preserved"
        );

        self.draft_id = None;
        self.created_at = None;
        self.emotion = Emotion::DEFAULT;
        self.last_active = self.clock.now_ms();
        self.autosave.cancel();
        self.dirty = false;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config;
    use crate::store::{SqliteStore, StoreError};

    struct FlakyStore {
        inner: SqliteStore,
        failing: Cell<bool>,
        creates: Cell<usize>,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                failing: Cell::new(false),
                creates: Cell::new(0),
            }
        }

        fn check(&self) -> StoreResult<()> {
            if self.failing.get() {
                Err(StoreError::Unavailable("disk went away".into()))
            } else {
                Ok(())
            }
        }
    }

    impl ThoughtStore for FlakyStore {
        fn create(&self, thought: &NewThought) -> StoreResult<ThoughtId> {
            self.check()?;
            self.creates.set(self.creates.get() + 1);
            self.inner.create(thought)
        }

        fn update(&self, id: ThoughtId, patch: &ThoughtPatch) -> StoreResult<()> {
            self.check()?;
            self.inner.update(id, patch)
        }

        fn query_by_solidified(&self, solidified: bool) -> StoreResult<Vec<ThoughtRecord>> {
            self.check()?;
            self.inner.query_by_solidified(solidified)
        }
    }

    fn type_text<S: ThoughtStore, C: Clock>(
        session: &mut DraftSession<S, C>,
        clock: &ManualClock,
        text: &str,
    ) {
        for ch in text.chars() {
            clock.advance(50);
            session.push_char(ch);
            session.poll();
        }
    }

    mod autosave_flow {
        use super::*;

        #[test]
        fn rapid_edits_create_exactly_one_record() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);

            type_text(&mut session, &clock, "hello there");
            assert_eq!(store.creates.get(), 0);

            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert_eq!(store.creates.get(), 1);

            type_text(&mut session, &clock, " again");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert_eq!(store.creates.get(), 1);

            let drafts = store.query_by_solidified(false).unwrap();
            assert_eq!(drafts.len(), 1);
            assert_eq!(drafts[0].content, "hello there again");
        }

        #[test]
        fn load_resumes_latest_draft() {
            let store = SqliteStore::open_in_memory().unwrap();
            let clock = ManualClock::new(10_000);
            store
                .create(&NewThought::draft("so lonely tonight", 9_000, Emotion::Melancholy))
                .unwrap();

            let session = DraftSession::load(&store, &clock).unwrap();
            assert_eq!(session.content(), "so lonely tonight");
            assert_eq!(session.emotion(), Emotion::Melancholy);
            assert_eq!(session.last_active(), 9_000);
            assert!(session.draft_id().is_some());
        }

        #[test]
        fn blank_content_never_creates_a_record() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            session.push_char('a');
            session.pop_char();
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert_eq!(store.creates.get(), 0);
        }

        #[test]
        fn failed_write_is_retried_on_next_edit() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);

            store.failing.set(true);
            type_text(&mut session, &clock, "calm");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert!(session.has_unsaved_changes());
            assert_eq!(session.content(), "calm");

            store.failing.set(false);
            type_text(&mut session, &clock, " sea");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert!(!session.has_unsaved_changes());
            let drafts = store.query_by_solidified(false).unwrap();
            assert_eq!(drafts.len(), 1);
            assert_eq!(drafts[0].content, "calm sea");
        }

        #[test]
        fn flush_writes_after_failed_debounce() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);

            store.failing.set(true);
            type_text(&mut session, &clock, "calm sea");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            assert!(session.has_unsaved_changes());

            store.failing.set(false);
            session.flush().unwrap();
            assert!(!session.has_unsaved_changes());
            let drafts = store.query_by_solidified(false).unwrap();
            assert_eq!(drafts.len(), 1);
            assert_eq!(drafts[0].content, "calm sea");
        }

        #[test]
        fn whitespace_only_draft_is_not_persisted() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            type_text(&mut session, &clock, "   ");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();
            session.flush().unwrap();
            assert_eq!(store.creates.get(), 0);
            assert!(store.query_by_solidified(false).unwrap().is_empty());
        }
    }

    mod solidify {
        use super::*;

        #[test]
        fn blank_draft_is_a_no_op() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            type_text(&mut session, &clock, "   ");
            assert!(!session.can_preserve());
            assert!(session.solidify().unwrap().is_none());
            assert!(store.query_by_solidified(true).unwrap().is_empty());
        }

        #[test]
        fn flushes_unsaved_text_before_flagging() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            type_text(&mut session, &clock, "i adore this");

            let record = session.solidify().unwrap().expect("preserved");
            assert_eq!(record.emotion, Emotion::Love);
            assert_eq!(record.content, "i adore this");
            let kept = store.query_by_solidified(true).unwrap();
            assert_eq!(kept.len(), 1);
            assert_eq!(kept[0].content, "i adore this");
        }

        #[test]
        fn transitions_exactly_one_record() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            type_text(&mut session, &clock, "a quiet walk");
            clock.advance(config::AUTOSAVE_DELAY_MS);
            session.poll();

            assert!(session.solidify().unwrap().is_some());
            assert!(session.solidify().unwrap().is_none());
            assert_eq!(store.query_by_solidified(true).unwrap().len(), 1);
            assert!(store.query_by_solidified(false).unwrap().is_empty());
            assert_eq!(session.content(), "");
            assert_eq!(session.emotion(), Emotion::DEFAULT);
        }

        #[test]
        fn store_failure_keeps_draft_intact() {
            let store = FlakyStore::new();
            let clock = ManualClock::new(0);
            let mut session = DraftSession::new(&store, &clock);
            type_text(&mut session, &clock, "keep me");
            store.failing.set(true);
            assert!(session.solidify().is_err());
            assert_eq!(session.content(), "keep me");
            store.failing.set(false);
            assert!(session.solidify().unwrap().is_some());
        }
    }

    #[test]
    fn anxious_thought_end_to_end() {
        let store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::new(1_700_000_000_000);
        let mut session = DraftSession::load(&store, &clock).unwrap();

        type_text(&mut session, &clock, "I am so anxious about tomorrow");
        assert_eq!(session.emotion(), Emotion::Anxiety);
        assert_eq!(session.opacity(), 1.0);

        clock.advance(config::DECAY_HORIZON_MS + 1);
        session.poll();
        assert_eq!(session.opacity(), 0.0);
        assert_eq!(session.phase(), FadePhase::Releasing);

        let first = session.solidify().unwrap().expect("preserved");
        assert_eq!(first.emotion, Emotion::Anxiety);
        let kept = store.query_by_solidified(true).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].emotion, Emotion::Anxiety);
        assert!(store.query_by_solidified(false).unwrap().is_empty());
        assert_eq!(session.opacity(), 1.0);

        type_text(&mut session, &clock, "x");
        clock.advance(config::AUTOSAVE_DELAY_MS);
        session.poll();
        let drafts = store.query_by_solidified(false).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_ne!(drafts[0].id, first.id);
    }
}
