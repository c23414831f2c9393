use std::sync::atomic::{AtomicU32, Ordering};

use super::domain::{ApplicationId, EntityKind, InternshipId};
use super::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKey {
    Internship,
    Application,
}

/// Monotonic id allocator, one counter per record kind. Loading existing
/// records seeds the counters so new ids never collide with stored ones.
#[derive(Debug, Default)]
pub struct IdSequence {
    internships: AtomicU32,
    applications: AtomicU32,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the counter so the next id is strictly greater than `observed`.
    pub fn seed(&self, key: SequenceKey, observed: u32) {
        self.counter(key).fetch_max(observed, Ordering::SeqCst);
    }

    /// Allocate the next id, or `None` once the counter has reached `u32::MAX`.
    pub fn next(&self, key: SequenceKey) -> Option<u32> {
        self.counter(key)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    pub fn current(&self, key: SequenceKey) -> u32 {
        self.counter(key).load(Ordering::SeqCst)
    }

    pub fn next_internship_id(&self) -> Result<InternshipId, RepositoryError> {
        self.next(SequenceKey::Internship)
            .map(InternshipId)
            .ok_or(RepositoryError::IdsExhausted(EntityKind::Internship))
    }

    pub fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.next(SequenceKey::Application)
            .map(ApplicationId)
            .ok_or(RepositoryError::IdsExhausted(EntityKind::Application))
    }

    fn counter(&self, key: SequenceKey) -> &AtomicU32 {
        match key {
            SequenceKey::Internship => &self.internships,
            SequenceKey::Application => &self.applications,
        }
    }
}
