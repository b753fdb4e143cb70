use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A Monday..Sunday run of seven days. Boundary weeks of a month spill into the
/// neighbouring months.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Week {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: [NaiveDate; 7],
}

impl Week {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
