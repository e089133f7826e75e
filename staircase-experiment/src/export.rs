use std::io::Write;

use serde::Serialize;
use staircase_core::{Participant, TrialRecord};

use crate::error::ExportError;
use crate::log::TrialLog;

/// Every trial belongs to the single staircase block
pub const BLOCK: u32 = 1;

/// One exported row; field order is the column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow<'a> {
    pub participant_id: &'a str,
    pub gender: &'a str,
    pub age: u32,
    pub block: u32,
    pub trial: usize,
    pub contrast_used: f64,
    pub stim_present: u8,
    pub response: i8,
    pub correct: u8,
    pub reaction_time_ms: Option<f64>,
}

impl<'a> DatasetRow<'a> {
    pub fn new(participant: &'a Participant, record: &'a TrialRecord) -> Self {
        Self {
            participant_id: &record.participant_id,
            gender: &participant.gender,
            age: participant.age,
            block: BLOCK,
            trial: record.trial,
            contrast_used: record.contrast_used,
            stim_present: u8::from(record.stimulus_present),
            response: record.response.code(),
            correct: u8::from(record.correct),
            reaction_time_ms: record.reaction_time_ms,
        }
    }
}

pub fn rows<'a>(
    participant: &'a Participant,
    log: &'a TrialLog,
) -> impl Iterator<Item = DatasetRow<'a>> + 'a {
    log.iter().map(move |record| DatasetRow::new(participant, record))
}

/// Writes a header and one row per trial. Timeouts leave the reaction time
/// column empty.
pub fn write_csv<W: Write>(
    writer: W,
    participant: &Participant,
    log: &TrialLog,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    if log.is_empty() {
        csv.write_record(COLUMNS)?;
    }
    for row in rows(participant, log) {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Same rows as [`write_csv`], as a pretty-printed JSON array
pub fn write_json<W: Write>(
    mut writer: W,
    participant: &Participant,
    log: &TrialLog,
) -> Result<(), ExportError> {
    let rows: Vec<DatasetRow<'_>> = rows(participant, log).collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.flush()?;
    Ok(())
}

const COLUMNS: [&str; 10] = [
    "participant_id",
    "gender",
    "age",
    "block",
    "trial",
    "contrast_used",
    "stim_present",
    "response",
    "correct",
    "reaction_time_ms",
];
