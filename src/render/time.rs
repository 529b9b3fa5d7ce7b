use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// Hours added to server UTC timestamps before they are shown. The platform
/// runs in a single region, so this is a fixed offset, not a time zone.
pub const DEFAULT_OFFSET_HOURS: i32 = 8;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses the timestamp formats the server emits: SQLite `CURRENT_TIMESTAMP`
/// text (UTC without an offset), RFC 3339, or the RFC 2822 dates Flask uses
/// when it serializes a `datetime`.
pub fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Turns instants into the labels shown under chat bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayClock {
    offset: FixedOffset,
    with_time: bool,
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::new(DEFAULT_OFFSET_HOURS, false)
    }
}

impl DisplayClock {
    /// `with_time` appends `HH:MM` to absolute dates (admin view).
    pub fn new(offset_hours: i32, with_time: bool) -> Self {
        let offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .or_else(|| FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600))
            .unwrap_or_else(|| Utc.fix());
        Self { offset, with_time }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn humanize(&self, created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
        let Some(created) = created else {
            return String::new();
        };

        let elapsed = now.signed_duration_since(created);
        let minutes = elapsed.num_minutes();
        if minutes < 1 {
            return "Just now".to_string();
        }
        if minutes < 60 {
            return format!("{minutes} min ago");
        }

        let hours = elapsed.num_hours();
        if hours < 24 {
            return format!("{hours} hour{} ago", plural(hours));
        }

        let days = elapsed.num_days();
        if days < 7 {
            return format!("{days} day{} ago", plural(days));
        }

        self.absolute(created)
    }

    pub fn absolute(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.offset);
        if self.with_time {
            local.format("%Y-%m-%d %H:%M").to_string()
        } else {
            local.format("%Y-%m-%d").to_string()
        }
    }
}

fn plural(count: i64) -> &'static str {
    if count > 1 { "s" } else { "" }
}
