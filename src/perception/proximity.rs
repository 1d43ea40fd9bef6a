//! Proximity warnings from the three infrared range sensors

use crate::common::{PerSide, RangeReading, Side};
use crate::config::ProximityConfig;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A side whose latest reading is closer than the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityWarning {
    pub side: Side,
    /// Reading as received, in the configured unit
    pub distance: f64,
    pub meters: f64,
}

/// Keeps the most recent reading of each sensor and flags the close ones
///
/// Each side is a single-slot cell; a new reading replaces the old one and
/// nothing is queued. Updates take `&self` so sensor callbacks can share the
/// monitor with the control loop.
#[derive(Debug)]
pub struct ProximityMonitor {
    config: ProximityConfig,
    latest: PerSide<Mutex<Option<RangeReading>>>,
}

impl ProximityMonitor {
    pub fn new(config: ProximityConfig) -> Self {
        ProximityMonitor {
            config,
            latest: PerSide::default(),
        }
    }

    /// Store `reading` as the latest for `side`
    pub fn update(&self, side: Side, reading: RangeReading) {
        *self.slot(side) = Some(reading);
    }

    /// Latest reading for `side`, if one has arrived
    pub fn latest(&self, side: Side) -> Option<RangeReading> {
        *self.slot(side)
    }

    /// Forget every stored reading
    pub fn clear(&self) {
        for side in Side::ALL {
            *self.slot(side) = None;
        }
    }

    /// Warnings for every side whose latest reading is strictly below the threshold
    pub fn check(&self) -> Vec<ProximityWarning> {
        Side::ALL
            .iter()
            .filter_map(|&side| {
                let reading = self.latest(side)?;
                (reading.distance < self.config.threshold).then(|| ProximityWarning {
                    side,
                    distance: reading.distance,
                    meters: self.config.unit.to_meters(reading.distance),
                })
            })
            .collect()
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    // A panic while holding the lock cannot leave a half-written reading
    fn slot(&self, side: Side) -> MutexGuard<'_, Option<RangeReading>> {
        self.latest
            .get(side)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
