use chrono::{Days, NaiveDate};

use crate::models::{DailyUptimeBucket, UptimeCheck};

/// Number of calendar days covered by the rolling uptime report.
pub const REPORT_DAYS: u64 = 7;

/// Bucket a link's check history into the last `REPORT_DAYS` UTC calendar
/// days ending at `today`, oldest first.
///
/// The input may be in any order and may reach arbitrarily far back; checks
/// outside the window are ignored. Days without checks report 0%.
pub fn daily_uptime<'a, I>(checks: I, today: NaiveDate) -> Vec<DailyUptimeBucket>
where
    I: IntoIterator<Item = &'a UptimeCheck>,
{
    let first_day = today
        .checked_sub_days(Days::new(REPORT_DAYS - 1))
        .unwrap_or(today);

    // (total, up) per day, index 0 = first_day
    let mut tally = [(0u32, 0u32); REPORT_DAYS as usize];

    for check in checks {
        let day = check.created_at.date_naive();
        if day < first_day || day > today {
            continue;
        }

        let idx = (day - first_day).num_days() as usize;
        let slot = &mut tally[idx];
        slot.0 += 1;
        if check.status.is_up() {
            slot.1 += 1;
        }
    }

    tally
        .iter()
        .enumerate()
        .filter_map(|(offset, &(total, up))| {
            let date = first_day.checked_add_days(Days::new(offset as u64))?;
            Some(DailyUptimeBucket {
                date: date.format("%Y-%m-%d").to_string(),
                total_checks: total,
                up_checks: up,
                down_checks: total - up,
                uptime_percentage: uptime_percentage(up, total),
            })
        })
        .collect()
}

/// `round(up / total * 100)` with halves rounded up; 0 when there is no data.
pub fn uptime_percentage(up: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (up, total) = (u64::from(up), u64::from(total));
    ((200 * up + total) / (2 * total)) as u8
}
