//! Outcomes of storing a sequence of keys.

use crate::Error;

/// The outcome of storing a single key.
#[derive(Debug)]
pub enum KeyOutcome {
    /// The key has been written.
    Stored,

    /// Writing the key failed.
    Failed(Error),

    /// The key has not been written because an earlier key failed.
    Skipped,
}

impl KeyOutcome {
    /// Returns whether the key has been written.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }
}

/// The ordered per-key outcomes of storing a sequence of keys.
///
/// Keys are stored in order and storing stops at the first failure, so a report consists of zero
/// or more [`KeyOutcome::Stored`], at most one [`KeyOutcome::Failed`] and any number of trailing
/// [`KeyOutcome::Skipped`].
#[derive(Debug, Default)]
pub struct StoreReport {
    outcomes: Vec<KeyOutcome>,
    flush_failure: Option<Error>,
}

impl StoreReport {
    pub(crate) fn push(&mut self, outcome: KeyOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn set_flush_failure(&mut self, error: Error) {
        self.flush_failure = Some(error);
    }

    /// Returns the outcome for each key, in input order.
    pub fn outcomes(&self) -> &[KeyOutcome] {
        &self.outcomes
    }

    /// Returns the number of keys that have been written.
    pub fn stored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_stored())
            .count()
    }

    /// Returns the index and error of the key that failed, if any.
    pub fn failure(&self) -> Option<(usize, &Error)> {
        self.outcomes
            .iter()
            .enumerate()
            .find_map(|(index, outcome)| match outcome {
                KeyOutcome::Failed(error) => Some((index, error)),
                _ => None,
            })
    }

    /// Returns the error of the final flush of the store, if it failed.
    pub fn flush_failure(&self) -> Option<&Error> {
        self.flush_failure.as_ref()
    }

    /// Returns whether every key has been written and persisted.
    pub fn is_complete(&self) -> bool {
        self.flush_failure.is_none() && self.outcomes.iter().all(KeyOutcome::is_stored)
    }

    /// Converts the report into the number of stored keys or the error that stopped storing.
    ///
    /// # Errors
    ///
    /// Returns
    /// * an [`Error::Incomplete`] wrapping the error of the failed key,
    /// * or the error of the final flush, if all keys have been written but not persisted.
    pub fn into_result(self) -> Result<usize, Error> {
        let stored = self.stored();
        let total = self.outcomes.len();
        let failure = self
            .outcomes
            .into_iter()
            .enumerate()
            .find_map(|(index, outcome)| match outcome {
                KeyOutcome::Failed(error) => Some((index, error)),
                _ => None,
            });

        if let Some((index, error)) = failure {
            return Err(Error::Incomplete {
                stored,
                total,
                index,
                source: Box::new(error),
            });
        }
        match self.flush_failure {
            Some(error) => Err(error),
            None => Ok(stored),
        }
    }
}
