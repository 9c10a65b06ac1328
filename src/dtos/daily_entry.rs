use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::daily::{EntryLine, SheetLine};

#[derive(Debug, Deserialize)]
pub struct DailyEntryQuery {
    pub entry_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SaveDailyEntriesRequest {
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub entries: Vec<EntryLine>,
}

#[derive(Debug, Serialize)]
pub struct DailyEntriesResponse {
    pub entry_date: NaiveDate,
    pub is_holiday: bool,
    /// False while the sheet only shows default quantities.
    pub recorded: bool,
    pub entries: Vec<SheetLine>,
}
