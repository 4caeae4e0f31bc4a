use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// Whatever went wrong inside a data source; reported to callers unchanged.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Raw rows backing one report request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedRows {
    pub resources: Vec<Resource>,
    pub maintenance: Vec<Interval>,
    pub reservations: Vec<Interval>,
}

/// Where resources and intervals come from.
///
/// Implementations must be safe to call concurrently; every report request
/// fetches once and works on its own copy of the rows.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Resources matching `window.filter`, plus every interval of those
    /// resources that intersects the window. Interval rows are passed through
    /// as stored, bad bounds included.
    async fn fetch(&self, window: &QueryWindow) -> Result<FetchedRows, SourceError>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn fetch(&self, window: &QueryWindow) -> Result<FetchedRows, SourceError> {
        (**self).fetch(window).await
    }
}

/// In-process source backed by concurrent maps.
pub struct InMemorySource {
    resources: DashMap<Ulid, Resource>,
    intervals: DashMap<Ulid, Interval>,
    /// Resource id → ids of its intervals.
    by_resource: DashMap<Ulid, Vec<Ulid>>,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            resources: DashMap::new(),
            intervals: DashMap::new(),
            by_resource: DashMap::new(),
        }
    }

    // ── Resources ────────────────────────────────────────────

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn contains_resource(&self, id: &Ulid) -> bool {
        self.resources.contains_key(id)
    }

    pub fn get_resource(&self, id: &Ulid) -> Option<Resource> {
        self.resources.get(id).map(|e| e.value().clone())
    }

    pub fn insert_resource(&self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    /// Remove a resource together with all of its intervals.
    pub fn remove_resource(&self, id: &Ulid) -> Option<Resource> {
        let (_, resource) = self.resources.remove(id)?;
        if let Some((_, ids)) = self.by_resource.remove(id) {
            for interval_id in ids {
                self.intervals.remove(&interval_id);
            }
        }
        Some(resource)
    }

    // ── Intervals ────────────────────────────────────────────

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn get_interval(&self, id: &Ulid) -> Option<Interval> {
        self.intervals.get(id).map(|e| e.value().clone())
    }

    /// Insert or replace an interval by id.
    pub fn insert_interval(&self, interval: Interval) {
        let id = interval.id;
        let resource_id = interval.resource_id;
        if let Some(old) = self.intervals.insert(id, interval) {
            if old.resource_id == resource_id {
                return;
            }
            self.unindex(&old.resource_id, &id);
        }
        self.by_resource.entry(resource_id).or_default().push(id);
    }

    pub fn remove_interval(&self, id: &Ulid) -> Option<Interval> {
        let (_, interval) = self.intervals.remove(id)?;
        self.unindex(&interval.resource_id, id);
        Some(interval)
    }

    /// Mark a reservation cancelled. Returns false for unknown ids and maintenance windows.
    pub fn cancel_reservation(&self, id: &Ulid) -> bool {
        match self.intervals.get_mut(id) {
            Some(mut entry) if entry.is_reservation() => {
                entry.kind = IntervalKind::Reservation(ReservationStatus::Cancelled);
                true
            }
            _ => false,
        }
    }

    fn unindex(&self, resource_id: &Ulid, interval_id: &Ulid) {
        if let Some(mut ids) = self.by_resource.get_mut(resource_id) {
            ids.retain(|i| i != interval_id);
        }
    }

    // ── Query ────────────────────────────────────────────────

    /// Resources sorted by name, intervals sorted by start.
    pub fn rows_for(&self, window: &QueryWindow) -> FetchedRows {
        let bounds = window.span();
        let mut rows = FetchedRows {
            resources: self
                .resources
                .iter()
                .filter(|e| window.filter.matches(e.value()))
                .map(|e| e.value().clone())
                .collect(),
            ..FetchedRows::default()
        };
        rows.resources
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        for resource in &rows.resources {
            let Some(ids) = self.by_resource.get(&resource.id) else {
                continue;
            };
            for id in ids.iter() {
                let Some(entry) = self.intervals.get(id) else {
                    continue;
                };
                let interval = entry.value();
                if !interval.span.overlaps(&bounds) {
                    continue;
                }
                match interval.kind {
                    IntervalKind::Reservation(_) => rows.reservations.push(interval.clone()),
                    IntervalKind::Maintenance(_) => rows.maintenance.push(interval.clone()),
                }
            }
        }

        rows.reservations.sort_by_key(|i| (i.span.start, i.id));
        rows.maintenance.sort_by_key(|i| (i.span.start, i.id));
        rows
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn fetch(&self, window: &QueryWindow) -> Result<FetchedRows, SourceError> {
        Ok(self.rows_for(window))
    }
}
