//! # Driver Events
//!
//! Payload-free notifications fired by the engine loop. Consumers react
//! by pulling the latest snapshot through the [`DriverHandle`] accessors;
//! an event never carries (or aliases) engine-owned state.
//!
//! [`DriverHandle`]: super::DriverHandle

use crate::protocol::sensors::SensorKind;

/// One fire-and-forget notification from the engine loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// A sensor record of this kind was overwritten by a decoded frame
    Sensor(SensorKind),
    /// Wheel odometry advanced (fired alongside every core record)
    Odometry,
    /// The outbound motion command state changed
    CommandChanged,
}
