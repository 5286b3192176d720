use serde::Serialize;

use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaggedPoint {
    pub seq: u64,
    pub point: GeoPoint,
}

/// Displayed courier position, fed by two writers.
///
/// The simulator only ever writes `simulated`, the subscriber only ever
/// writes `subscribed`. `current` is what a viewer should render: the
/// subscriber's latest value once one exists, the simulator's otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LivePosition {
    pub simulated: Option<TaggedPoint>,
    pub subscribed: Option<GeoPoint>,
    pub current: Option<GeoPoint>,
}

impl LivePosition {
    /// Applies a simulated fix reported at tick `seq`. Fixes that are not
    /// newer than the last applied one are dropped; returns whether the fix
    /// was taken.
    pub fn apply_simulated(&mut self, seq: u64, point: GeoPoint) -> bool {
        if let Some(last) = self.simulated {
            if seq <= last.seq {
                return false;
            }
        }

        self.simulated = Some(TaggedPoint { seq, point });
        if self.subscribed.is_none() {
            self.current = Some(point);
        }
        true
    }

    pub fn apply_subscribed(&mut self, point: GeoPoint) {
        self.subscribed = Some(point);
        self.current = Some(point);
    }
}
