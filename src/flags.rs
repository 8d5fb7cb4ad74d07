//! First-run flags. Values are only ever checked and set once; nothing in the
//! core depends on them beyond hiding guides that were already seen.

use crate::store::StoreResult;

pub trait FlagStore {
    fn is_set(&self, key: &str) -> StoreResult<bool>;
    fn set(&self, key: &str) -> StoreResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guide {
    FirstVisit,
    FirstPreserve,
    GardenHint,
}

impl Guide {
    pub fn key(self) -> &'static str {
        match self {
            Guide::FirstVisit => "udyana_visited",
            Guide::FirstPreserve => "udyana_first_preserve_done",
            Guide::GardenHint => "udyana_garden_visited",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Guide::FirstVisit => {
                "welcome. write whatever is on your heart; unkept words fade within a day."
            }
            Guide::FirstPreserve => {
                "your first bloom is planted. press ctrl-g to visit your garden."
            }
            Guide::GardenHint => {
                "each flower is a preserved thought, clustered by feeling. s/t export a card."
            }
        }
    }
}

pub struct Onboarding<'a, F: FlagStore + ?Sized> {
    flags: &'a F,
}

impl<'a, F: FlagStore + ?Sized> Onboarding<'a, F> {
    pub fn new(flags: &'a F) -> Self {
        Self { flags }
    }

    /// A flag store that cannot be read hides the guide rather than nagging.
    pub fn should_show(&self, guide: Guide) -> bool {
        match self.flags.is_set(guide.key()) {
            Ok(seen) => !seen,
            Err(err) => {
                tracing::warn!(key = guide.key(), error = %err, "failed to read onboarding flag");
                false
            }
        }
    }

    pub fn dismiss(&self, guide: Guide) {
        if let Err(err) = self.flags.set(guide.key()) {
            tracing::warn!(key = guide.key(), error = %err, "failed to persist onboarding flag");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use super::*;
    use crate::store::StoreError;

    #[derive(Default)]
    pub(crate) struct MemoryFlags {
        keys: RefCell<HashSet<String>>,
        pub broken: bool,
    }

    impl FlagStore for MemoryFlags {
        fn is_set(&self, key: &str) -> StoreResult<bool> {
            if self.broken {
                return Err(StoreError::Unavailable("flags offline".into()));
            }
            Ok(self.keys.borrow().contains(key))
        }

        fn set(&self, key: &str) -> StoreResult<()> {
            if self.broken {
                return Err(StoreError::Unavailable("flags offline".into()));
            }
            self.keys.borrow_mut().insert(key.to_string());
            Ok(())
        }
    }

    #[test]
    fn guide_shows_until_dismissed() {
        let flags = MemoryFlags::default();
        let onboarding = Onboarding::new(&flags);
        assert!(onboarding.should_show(Guide::FirstVisit));
        onboarding.dismiss(Guide::FirstVisit);
        assert!(!onboarding.should_show(Guide::FirstVisit));
        assert!(onboarding.should_show(Guide::GardenHint));
    }

    #[test]
    fn unreadable_flags_hide_guides() {
        let flags = MemoryFlags {
            broken: true,
            ..Default::default()
        };
        let onboarding = Onboarding::new(&flags);
        assert!(!onboarding.should_show(Guide::FirstPreserve));
        onboarding.dismiss(Guide::FirstPreserve);
    }

    #[test]
    fn keys_are_distinct() {
        let keys: HashSet<&str> = [Guide::FirstVisit, Guide::FirstPreserve, Guide::GardenHint]
            .iter()
            .map(|g| g.key())
            .collect();
        assert_eq!(keys.len(), 3);
    }
}
