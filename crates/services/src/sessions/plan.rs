use rand::Rng;
use rand::seq::index;

use quiz_core::model::{Bank, Question};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub requested: i64,
    pub pool_size: usize,
}

impl SessionPlan {
    /// Number of questions actually selected.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// True when the requested count had to be reduced to fit the pool.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        usize::try_from(self.requested).is_ok_and(|requested| requested > self.total())
    }
}

/// Picks a session's questions from a window of a bank.
///
/// The window `[start, end)` is clamped to the bank, `count` is clamped to the
/// window size, and the draw is uniform without replacement. The returned
/// order is itself a uniformly random permutation of the drawn set.
pub struct SessionBuilder<'a> {
    bank: &'a Bank,
    count: i64,
    start: i64,
    end: Option<i64>,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a Bank, count: i64) -> Self {
        Self {
            bank,
            count,
            start: 0,
            end: None,
        }
    }

    #[must_use]
    pub fn with_window(mut self, start: i64, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> SessionPlan {
        let pool = self.bank.pool(self.start, self.end);
        let amount = usize::try_from(self.count.max(0))
            .unwrap_or(usize::MAX)
            .min(pool.len());

        let questions = index::sample(rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect();

        SessionPlan {
            questions,
            requested: self.count,
            pool_size: pool.len(),
        }
    }
}
