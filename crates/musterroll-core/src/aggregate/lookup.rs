use std::collections::HashMap;

use crate::models::{CadetRecord, CohortYear, EventRecord, EventType};

/// Enrollment id to cohort, built from the roster partitions.
#[derive(Debug, Clone, Default)]
pub struct CohortMap {
    years: HashMap<String, CohortYear>,
}

impl CohortMap {
    /// Cadets are applied in order, so when an id appears in two partitions
    /// the later partition's year is kept.
    pub fn from_cadets<'a>(cadets: impl IntoIterator<Item = &'a CadetRecord>) -> Self {
        let mut years = HashMap::new();
        for cadet in cadets {
            years.insert(cadet.enrollment_id.trim().to_string(), cadet.cohort);
        }
        Self { years }
    }

    pub fn resolve(&self, enrollment_id: &str) -> Option<CohortYear> {
        self.years.get(enrollment_id.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Event id to event type, built from the event catalog.
#[derive(Debug, Clone, Default)]
pub struct EventTypeMap {
    types: HashMap<String, EventType>,
}

impl EventTypeMap {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a EventRecord>) -> Self {
        let types = events
            .into_iter()
            .map(|e| (e.event_id.trim().to_string(), e.event_type))
            .collect();
        Self { types }
    }

    /// Events missing from the catalog are treated as `Other`.
    pub fn resolve(&self, event_id: &str) -> EventType {
        self.types
            .get(event_id.trim())
            .copied()
            .unwrap_or(EventType::Other)
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.types.contains_key(event_id.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    #[test]
    fn test_last_partition_wins() {
        let cadets = vec![
            CadetRecord::new("C1", CohortYear::First),
            CadetRecord::new(" C1 ", CohortYear::Third),
            CadetRecord::new("C2", CohortYear::Second),
        ];
        let map = CohortMap::from_cadets(&cadets);
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("C1"), Some(CohortYear::Third));
        assert_eq!(map.resolve(" C2"), Some(CohortYear::Second));
        assert_eq!(map.resolve("c2"), None);
    }

    #[test]
    fn test_unknown_event_is_other() {
        let events = vec![EventRecord {
            event_id: "EVT1".to_string(),
            title: "Drill".to_string(),
            event_type: EventType::MandatoryParade,
            type_label: "Mandatory Parade".to_string(),
            date: None,
            time: None,
            created_at: None,
            status: EventStatus::Ended,
        }];
        let map = EventTypeMap::from_events(&events);
        assert_eq!(map.resolve("EVT1"), EventType::MandatoryParade);
        assert_eq!(map.resolve("EVT404"), EventType::Other);
        assert!(!map.contains("EVT404"));
    }
}
