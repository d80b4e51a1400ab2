use crate::calendar::CalendarTables;
use crate::model::{DayRecord, HolidayRecord};

/// Day records that carry a US holiday name. Federal status comes from the
/// holiday table; a name without a table entry counts as federal.
pub fn holiday_table(days: &[DayRecord], tables: &CalendarTables) -> Vec<HolidayRecord> {
    days.iter()
        .filter_map(|r| {
            let name = r.us_holiday.as_ref().filter(|n| !n.is_empty())?;
            Some(HolidayRecord {
                date: r.date,
                name: name.clone(),
                is_federal: tables.holiday(r.date).map_or(true, |h| h.federal),
            })
        })
        .collect()
}
