//! Pure window arithmetic for the drip and countdown campaigns.

use chrono::{DateTime, Duration, Utc};

/// Signup window for the drip email sent `day` days after signup:
/// `[now - (day + 1) days, now - day days)`.
pub fn drip_window(now: DateTime<Utc>, day: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = i64::from(day);
    (now - Duration::days(day + 1), now - Duration::days(day))
}

/// The single countdown offset (in hours) due at `now`, if any.
///
/// Offset `h` is due when `launch_at - h <= now < launch_at - h'`, where `h'`
/// is the next smaller configured offset, or `launch_at` itself for the
/// smallest one. Duplicate offsets collapse.
pub fn due_countdown_offset(
    now: DateTime<Utc>,
    launch_at: DateTime<Utc>,
    offsets_hours: &[u32],
) -> Option<u32> {
    let mut offsets = offsets_hours.to_vec();
    offsets.sort_unstable_by(|a, b| b.cmp(a));
    offsets.dedup();

    offsets.iter().enumerate().find_map(|(i, &h)| {
        let start = launch_at - Duration::hours(i64::from(h));
        let end = offsets
            .get(i + 1)
            .map_or(launch_at, |&next| launch_at - Duration::hours(i64::from(next)));
        (start <= now && now < end).then_some(h)
    })
}
