use std::sync::Arc;

use chrono::{Days, NaiveDate};
use ulid::Ulid;

use occupancy::config::ReportConfig;
use occupancy::model::*;
use occupancy::report::*;
use occupancy::source::InMemorySource;

const H: Ms = 3_600_000;

// ── Test infrastructure ──────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Timestamp `offset` after midnight of `day`.
fn on(day: NaiveDate, offset: Ms) -> Ms {
    day_start(day) + offset
}

struct Fixture {
    source: Arc<InMemorySource>,
    room_type: Ulid,
    equipment_type: Ulid,
}

impl Fixture {
    fn new() -> Self {
        Self {
            source: Arc::new(InMemorySource::new()),
            room_type: Ulid::new(),
            equipment_type: Ulid::new(),
        }
    }

    fn room(&self, name: &str) -> Ulid {
        let r = Resource::new(name, self.room_type, 12).with_location("East wing");
        let id = r.id;
        self.source.insert_resource(r);
        id
    }

    fn equipment(&self, name: &str) -> Ulid {
        let r = Resource::new(name, self.equipment_type, 1);
        let id = r.id;
        self.source.insert_resource(r);
        id
    }

    fn reserve(&self, resource_id: Ulid, start: Ms, end: Ms, status: ReservationStatus) -> Ulid {
        let i = Interval::reservation(resource_id, start, end, status);
        let id = i.id;
        self.source.insert_interval(i);
        id
    }

    fn maintain(&self, resource_id: Ulid, start: Ms, end: Ms, status: MaintenanceStatus) -> Ulid {
        let i = Interval::maintenance(resource_id, start, end, status);
        let id = i.id;
        self.source.insert_interval(i);
        id
    }

    fn aggregator(&self) -> SnapshotAggregator<Arc<InMemorySource>> {
        SnapshotAggregator::new(self.source.clone(), ReportConfig::default())
    }
}

// ── Scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_maintenance_outranks_reservation() {
    let fx = Fixture::new();
    let day = date(2024, 1, 1);
    let room = fx.room("Room 101");
    fx.maintain(room, on(day, 8 * H), on(day, 12 * H), MaintenanceStatus::InProgress);
    fx.reserve(room, on(day, 8 * H), on(day, 10 * H), ReservationStatus::Confirmed);

    let window = QueryWindow::new(day, day).unwrap();
    let snapshot = fx.aggregator().build_snapshot(&window, on(day, 9 * H)).await.unwrap();
    assert_eq!(snapshot.resources[0].state, CurrentState::Maintenance);
    assert_eq!(snapshot.resources[0].occupied_until, Some(on(day, 12 * H)));
}

#[tokio::test]
async fn scenario_b_end_exclusive_hour_boundary() {
    let fx = Fixture::new();
    let day = date(2024, 3, 12);
    let room = fx.room("Room 101");
    fx.reserve(room, on(day, 9 * H), on(day, 11 * H), ReservationStatus::Confirmed);

    let window = QueryWindow::new(day, day).unwrap();
    let snapshot = fx.aggregator().build_snapshot(&window, on(day, 15 * H)).await.unwrap();
    assert_eq!(snapshot.hourly.count(9), 1);
    assert_eq!(snapshot.hourly.count(10), 1);
    assert_eq!(snapshot.hourly.count(11), 0);
    assert_eq!(snapshot.peak_hours, vec![9, 10]);
}

#[tokio::test]
async fn scenario_c_no_matching_resources() {
    let fx = Fixture::new();
    let day = date(2024, 1, 1);
    let room = fx.room("Room 101");
    fx.reserve(room, on(day, 9 * H), on(day, 10 * H), ReservationStatus::Confirmed);

    let window = QueryWindow::new(day, day).unwrap().with_resource(Ulid::new());
    let snapshot = fx.aggregator().build_snapshot(&window, on(day, 9 * H)).await.unwrap();
    assert_eq!(snapshot.counts, StateCounts::default());
    assert_eq!(snapshot.percentages, StatePercentages::default());
    assert!(snapshot.resources.is_empty());
    assert!(snapshot.peak_hours.is_empty());
    assert!(snapshot.peak_weekdays.is_empty());
}

#[tokio::test]
async fn scenario_d_everything_reserved() {
    let fx = Fixture::new();
    let day = date(2024, 1, 1);
    let a = fx.room("Room A");
    let b = fx.room("Room B");
    fx.reserve(a, on(day, 8 * H), on(day, 10 * H), ReservationStatus::Confirmed);
    fx.reserve(b, on(day, 9 * H), on(day, 12 * H), ReservationStatus::Pending);

    let window = QueryWindow::new(day, day).unwrap();
    let snapshot = fx.aggregator().build_snapshot(&window, on(day, 9 * H)).await.unwrap();
    assert_eq!(snapshot.percentages.reserved, 100.0);
    assert_eq!(snapshot.percentages.available, 0.0);
    assert_eq!(snapshot.percentages.maintenance, 0.0);
}

#[tokio::test]
async fn scenario_e_overnight_weekday_counts() {
    let fx = Fixture::new();
    let monday = date(2024, 1, 1);
    let room = fx.room("Room 101");
    fx.reserve(room, on(monday, 22 * H), on(monday, 26 * H), ReservationStatus::Confirmed);

    let window = QueryWindow::new(monday, monday + Days::new(6)).unwrap();
    let snapshot = fx.aggregator().build_snapshot(&window, on(monday, 12 * H)).await.unwrap();
    assert_eq!(snapshot.weekday.count(0), 1); // Monday
    assert_eq!(snapshot.weekday.count(1), 1); // Tuesday
    assert_eq!(snapshot.weekday.total(), 2);
}

// ── Report flow ──────────────────────────────────────────────

#[tokio::test]
async fn type_filter_narrows_a_mixed_inventory() {
    let fx = Fixture::new();
    let day = date(2024, 5, 6);
    let room = fx.room("Room 101");
    let projector = fx.equipment("Projector");
    fx.reserve(room, on(day, 9 * H), on(day, 10 * H), ReservationStatus::Confirmed);
    fx.maintain(projector, on(day, 0), on(day, 24 * H), MaintenanceStatus::Pending);

    let everything = QueryWindow::new(day, day).unwrap();
    let rooms_only = everything.with_resource_type(fx.room_type);
    let agg = fx.aggregator();

    let all = agg.build_snapshot(&everything, on(day, 9 * H)).await.unwrap();
    assert_eq!(all.counts.reserved, 1);
    assert_eq!(all.counts.maintenance, 1);
    assert_eq!(all.percentages.reserved, 50.0);

    let rooms = agg.build_snapshot(&rooms_only, on(day, 9 * H)).await.unwrap();
    assert_eq!(rooms.counts.total(), 1);
    assert_eq!(rooms.resources[0].id, room);
    assert_eq!(rooms.capacity.total, 12);
}

#[tokio::test]
async fn disabled_resource_reported_apart() {
    let fx = Fixture::new();
    let day = date(2024, 5, 6);
    fx.room("Room 101");
    let retired = Resource::new("Old projector", fx.equipment_type, 1).disabled();
    let retired_id = retired.id;
    fx.source.insert_resource(retired);
    fx.reserve(retired_id, on(day, 9 * H), on(day, 10 * H), ReservationStatus::Confirmed);

    let window = QueryWindow::new(day, day).unwrap();
    let snapshot = fx.aggregator().build_snapshot(&window, on(day, 9 * H)).await.unwrap();
    assert_eq!(snapshot.disabled, vec![retired_id]);
    assert_eq!(snapshot.counts.available, 1);
    assert_eq!(snapshot.hourly.total(), 0);
}

#[tokio::test]
async fn parallel_requests_share_one_aggregator() {
    let fx = Fixture::new();
    let monday = date(2024, 1, 1);
    for n in 0..10i64 {
        let room = fx.room(&format!("Room {n}"));
        let start = on(monday, (n % 7) * 24 * H + 9 * H);
        fx.reserve(room, start, start + (n + 1) * H, ReservationStatus::Confirmed);
    }
    let agg = Arc::new(fx.aggregator());
    let window = QueryWindow::new(monday, monday + Days::new(6)).unwrap();

    let mut handles = Vec::new();
    for day in 0..7i64 {
        let agg = agg.clone();
        handles.push(tokio::spawn(async move {
            agg.build_snapshot(&window, on(monday, day * 24 * H + 10 * H)).await
        }));
    }

    let mut weekday_maps = Vec::new();
    for handle in handles {
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.counts.total(), 10);
        weekday_maps.push(snapshot.weekday);
    }
    // The weekday map does not depend on `now`.
    assert!(weekday_maps.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(weekday_maps[0].count(0), 2); // rooms 0 and 7
}

#[test]
fn invalid_configuration_is_rejected_before_building() {
    assert!(matches!(
        OperatingHours::new(23, 6),
        Err(ReportError::InvalidOperatingHours { .. })
    ));
    assert!(matches!(
        QueryWindow::new(date(2024, 2, 1), date(2024, 1, 1)),
        Err(ReportError::InvalidWindow { .. })
    ));
}

#[tokio::test]
async fn custom_operating_hours_shape_the_series() {
    let fx = Fixture::new();
    let day = date(2024, 5, 6);
    let room = fx.room("Room 101");
    fx.reserve(room, on(day, 5 * H), on(day, 7 * H), ReservationStatus::Confirmed);

    let config = ReportConfig {
        operating_hours: OperatingHours::new(0, 24).unwrap(),
        ..ReportConfig::default()
    };
    let agg = SnapshotAggregator::new(fx.source.clone(), config);
    let window = QueryWindow::new(day, day).unwrap();
    let snapshot = agg.build_snapshot(&window, on(day, 12 * H)).await.unwrap();
    assert_eq!(snapshot.hourly_series.len(), 24);
    assert_eq!(snapshot.peak_hours, vec![5, 6]);
}
