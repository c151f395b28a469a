//! In-memory calendar for development and tests

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::RwLock;

use super::CalendarClient;
use crate::error::{ClassroomError, Result};
use crate::model::CalendarEvent;

/// Calendar held in process memory
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    events: RwLock<Vec<CalendarEvent>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing events
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl CalendarClient for MemoryCalendar {
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
        let mut found: Vec<CalendarEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.start < to && e.end > from)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start);
        Ok(found)
    }

    async fn insert(
        &self,
        summary: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent> {
        if end <= start {
            return Err(ClassroomError::InvalidTime(format!("{start} .. {end}")));
        }

        let event = CalendarEvent {
            id: uuid::Uuid::new_v4().to_string(),
            summary: summary.to_string(),
            start,
            end,
        };
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn find_by_summary(&self, summary: &str) -> Result<Option<CalendarEvent>> {
        let wanted = summary.trim().to_lowercase();
        Ok(self
            .events
            .read()
            .await
            .iter()
            .find(|e| e.summary.to_lowercase() == wanted)
            .cloned())
    }

    async fn patch_times(
        &self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<CalendarEvent> {
        if end <= start {
            return Err(ClassroomError::InvalidTime(format!("{start} .. {end}")));
        }

        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ClassroomError::EventNotFound(id.to_string()))?;
        event.start = start;
        event.end = end;
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(ClassroomError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ist, to_local_datetime};
    use chrono::{Duration, NaiveDate};

    fn at(time: &str) -> DateTime<FixedOffset> {
        to_local_datetime(time, NaiveDate::from_ymd_opt(2025, 7, 14), ist()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_window_query() {
        let calendar = MemoryCalendar::new();
        calendar.insert("Science", at("11:00"), at("12:00")).await.unwrap();
        calendar.insert("Maths", at("09:00"), at("10:00")).await.unwrap();

        let from = at("00:00").with_timezone(&Utc);
        let events = calendar.events_between(from, from + Duration::days(1)).await.unwrap();
        let names: Vec<_> = events.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, vec!["Maths", "Science"]);

        let later = calendar
            .events_between(from + Duration::days(1), from + Duration::days(2))
            .await
            .unwrap();
        assert!(later.is_empty());
    }

    #[tokio::test]
    async fn test_find_is_case_insensitive() {
        let calendar = MemoryCalendar::new();
        calendar.insert("Maths Class", at("09:00"), at("10:00")).await.unwrap();

        assert!(calendar.find_by_summary("maths class").await.unwrap().is_some());
        assert!(calendar.find_by_summary("history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let calendar = MemoryCalendar::new();
        let event = calendar.insert("Maths", at("09:00"), at("10:00")).await.unwrap();

        let moved = calendar.patch_times(&event.id, at("14:00"), at("15:00")).await.unwrap();
        assert_eq!(moved.start, at("14:00"));

        calendar.delete(&event.id).await.unwrap();
        assert!(calendar.is_empty().await);
        assert!(matches!(
            calendar.delete(&event.id).await,
            Err(ClassroomError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_inverted_range() {
        let calendar = MemoryCalendar::new();
        let result = calendar.insert("Maths", at("10:00"), at("09:00")).await;
        assert!(matches!(result, Err(ClassroomError::InvalidTime(_))));
    }
}
