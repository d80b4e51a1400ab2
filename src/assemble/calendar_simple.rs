use chrono::{Datelike, NaiveDate};

use crate::model::{ColorSpec, DayRecord};

/// One row of the simplified wall calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    /// Abbreviated weekday name ("Thu").
    pub weekday: String,
    pub color: ColorSpec,
}

pub fn simple_calendar(days: &[DayRecord]) -> Vec<SimpleDay> {
    days.iter()
        .map(|r| SimpleDay {
            date: r.date,
            day_of_month: r.date.day(),
            weekday: r.date.format("%a").to_string(),
            color: r.color.clone(),
        })
        .collect()
}
