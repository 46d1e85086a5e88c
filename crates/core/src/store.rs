use alloc::vec::Vec;

use crate::error::Error;
use crate::transaction::types::{RecordId, Value};

/// Fixed-size array of record values addressed by [`RecordId`].
///
/// The length is set at construction and never changes. Every access is
/// bounds-checked and reports [`Error::RecordOutOfBounds`] instead of
/// panicking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordStore {
    values: Vec<Value>,
}

impl RecordStore {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// A store of `len` records where record `i` holds `i`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn identity(len: usize) -> Self {
        Self::new((0..len).map(|i| i as Value).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fails unless `record` addresses a record of this store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] when `record >= len`.
    pub fn check(&self, record: RecordId) -> Result<(), Error> {
        if record < self.values.len() {
            Ok(())
        } else {
            Err(Error::RecordOutOfBounds {
                record,
                len: self.values.len(),
            })
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] when `record >= len`.
    pub fn get(&self, record: RecordId) -> Result<Value, Error> {
        self.check(record)?;
        Ok(self.values[record])
    }

    /// Installs `value` and returns the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] when `record >= len`.
    pub fn set(&mut self, record: RecordId, value: Value) -> Result<Value, Error> {
        self.check(record)?;
        Ok(core::mem::replace(&mut self.values[record], value))
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for RecordStore {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
