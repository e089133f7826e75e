use serde::Serialize;
use staircase_core::TrialRecord;

/// Append-only record of completed trials, in trial order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrialLog {
    records: Vec<TrialRecord>,
}

impl TrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: TrialRecord) {
        debug_assert_eq!(record.trial, self.records.len() + 1);
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrialRecord> {
        self.records.iter()
    }

    /// Number of trials scored correct
    pub fn correct_count(&self) -> usize {
        self.records.iter().filter(|r| r.correct).count()
    }

    pub fn timeout_count(&self) -> usize {
        self.records.iter().filter(|r| r.response.is_timeout()).count()
    }
}

impl<'a> IntoIterator for &'a TrialLog {
    type Item = &'a TrialRecord;
    type IntoIter = std::slice::Iter<'a, TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for TrialLog {
    type Item = TrialRecord;
    type IntoIter = std::vec::IntoIter<TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
