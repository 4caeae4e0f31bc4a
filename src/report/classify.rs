use serde::Serialize;
use ulid::Ulid;

use crate::model::*;

/// State of a resource at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentState {
    Available,
    Reserved,
    Maintenance,
}

impl CurrentState {
    pub const ALL: [CurrentState; 3] = [
        CurrentState::Available,
        CurrentState::Reserved,
        CurrentState::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CurrentState::Available => "available",
            CurrentState::Reserved => "reserved",
            CurrentState::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub state: CurrentState,
    /// Interval that decided the state; `None` when available.
    pub interval_id: Option<Ulid>,
    pub occupied_until: Option<Ms>,
}

impl Classification {
    fn available() -> Self {
        Self {
            state: CurrentState::Available,
            interval_id: None,
            occupied_until: None,
        }
    }

    fn decided_by(state: CurrentState, interval: &Interval) -> Self {
        Self {
            state,
            interval_id: Some(interval.id),
            occupied_until: Some(interval.span.end),
        }
    }
}

/// Decide the state of `resource` at `now`.
///
/// Maintenance: TERMINAL. An active window (pending/in_progress) wins and
/// reservations are not consulted.
/// Reservation: pending/confirmed intervals covering `now` mark it reserved.
///
/// The enabled flag is not looked at; callers pre-filter disabled resources.
pub fn classify(
    resource: &Resource,
    maintenance: &[Interval],
    reservations: &[Interval],
    now: Ms,
) -> CurrentState {
    classify_detailed(resource, maintenance, reservations, now).state
}

/// Same decision as [`classify`], also reporting which interval decided it.
/// Among several active intervals of the deciding kind the one ending last is reported.
pub fn classify_detailed(
    resource: &Resource,
    maintenance: &[Interval],
    reservations: &[Interval],
    now: Ms,
) -> Classification {
    if let Some(window) = latest_active(resource.id, maintenance, now, Interval::is_maintenance) {
        return Classification::decided_by(CurrentState::Maintenance, window);
    }
    if let Some(booking) = latest_active(resource.id, reservations, now, Interval::is_reservation) {
        return Classification::decided_by(CurrentState::Reserved, booking);
    }
    Classification::available()
}

fn latest_active<'a>(
    resource_id: Ulid,
    intervals: &'a [Interval],
    now: Ms,
    of_kind: fn(&Interval) -> bool,
) -> Option<&'a Interval> {
    intervals
        .iter()
        .filter(|i| i.resource_id == resource_id && of_kind(i) && i.is_active_at(now))
        .max_by_key(|i| i.span.end)
}
