use serde::Serialize;

use crate::geo::{interpolate, planar_distance};
use crate::models::location::GeoPoint;

/// Position of the simulated courier: segment `index → index + 1`, and how
/// far along that segment it is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Cursor {
    pub index: usize,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The courier moved within its segment; `point` should be reported.
    Report { seq: u64, point: GeoPoint },
    /// The courier finished a segment. Nothing to report on this tick.
    Advanced { index: usize },
    /// The final waypoint was reached. Emitted once per simulator.
    Arrived,
    /// Ticks after arrival are no-ops.
    Finished,
}

pub struct RouteSimulator {
    route: Vec<GeoPoint>,
    step_size: f64,
    cursor: Cursor,
    ticks: u64,
    arrived: bool,
}

impl RouteSimulator {
    /// Returns `None` for an empty route; there is nothing to drive along.
    pub fn new(route: Vec<GeoPoint>, step_size: f64) -> Option<Self> {
        if route.is_empty() {
            return None;
        }

        Some(Self {
            route,
            step_size,
            cursor: Cursor::default(),
            ticks: 0,
            arrived: false,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    fn last_index(&self) -> usize {
        self.route.len() - 1
    }

    /// Interpolated position for the current cursor.
    pub fn position(&self) -> GeoPoint {
        let start = &self.route[self.cursor.index];
        match self.route.get(self.cursor.index + 1) {
            Some(end) => interpolate(start, end, self.cursor.progress),
            None => *start,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.arrived {
            return Tick::Finished;
        }
        self.ticks += 1;

        if self.cursor.index >= self.last_index() {
            self.arrived = true;
            return Tick::Arrived;
        }

        let start = self.route[self.cursor.index];
        let end = self.route[self.cursor.index + 1];
        let distance = planar_distance(&start, &end);

        // Scaling by segment length keeps ground speed uniform across
        // segments. A zero-length segment is crossed in one tick.
        let progress = if distance > 0.0 {
            self.cursor.progress + self.step_size / distance
        } else {
            1.0
        };

        if progress < 1.0 {
            self.cursor.progress = progress;
            Tick::Report {
                seq: self.ticks,
                point: interpolate(&start, &end, progress),
            }
        } else {
            self.cursor.index += 1;
            self.cursor.progress = 0.0;
            Tick::Advanced {
                index: self.cursor.index,
            }
        }
    }
}
