use crate::cache::ResultCache;
use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

pub const REFRESH_DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// State that lives for one user session: its identity and its result cache.
#[derive(Debug)]
pub struct DashboardSession {
    session_id: String,
    started_at: DateTime<Utc>,
    cache: ResultCache,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::with_cache(ResultCache::new())
    }

    pub fn with_cache(cache: ResultCache) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            cache,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn cache_mut(&mut self) -> &mut ResultCache {
        &mut self.cache
    }

    pub fn last_refreshed_display(&self) -> String {
        format_refresh_time(self.cache.last_refreshed())
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_refresh_time(instant: DateTime<Local>) -> String {
    instant.format(REFRESH_DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_refresh_time, DashboardSession};
    use chrono::{Local, TimeZone};

    #[test]
    fn sessions_get_distinct_ids() {
        let first = DashboardSession::new();
        let second = DashboardSession::new();
        assert_ne!(first.session_id(), second.session_id());
        assert!(first.started_at() <= second.started_at());
    }

    #[test]
    fn refresh_time_uses_day_first_format() {
        let instant = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .single()
            .expect("valid local time");
        assert_eq!(format_refresh_time(instant), "09-03-2024 07:05:01");
    }
}
