//! Simulated bus positions for the live map.
//!
//! Each bus walks its route polyline at a constant speed and turns around at
//! either end. [`BusSimulator::step`] is pure and deterministic so it can be
//! tested directly; [`BusSimulator::spawn`] drives it from a tokio interval and
//! publishes every snapshot on a watch channel.

use crate::constants::SIMULATION_JITTER_DEGREES;
use crate::error::{MapError, Result};
use crate::models::{is_valid, GeoPoint};
use serde::Serialize;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BusPosition {
    pub bus_id: String,
    pub position: GeoPoint,
    /// Degrees clockwise from north.
    pub heading_degrees: f64,
    pub speed_kmh: f64,
    /// RFC 3339 timestamp of the tick that produced this position.
    pub recorded_at: String,
}

#[derive(Debug, Clone)]
struct SimulatedBus {
    id: String,
    path: Vec<GeoPoint>,
    segment_lengths: Vec<f64>,
    total_length: f64,
    speed_kmh: f64,
    /// Distance travelled along the out-and-back loop, in [0, 2 * total_length).
    travelled: f64,
}

impl SimulatedBus {
    fn speed_mps(&self) -> f64 {
        self.speed_kmh * 1000.0 / 3600.0
    }

    fn advance(&mut self, elapsed: Duration) {
        let loop_length = self.total_length * 2.0;
        self.travelled = (self.travelled + self.speed_mps() * elapsed.as_secs_f64()) % loop_length;
    }

    /// Point on the path and direction of travel.
    fn locate(&self) -> (GeoPoint, f64) {
        let (offset, forward) = if self.travelled <= self.total_length {
            (self.travelled, true)
        } else {
            (self.total_length * 2.0 - self.travelled, false)
        };

        let mut remaining = offset;
        let mut last_segment = None;
        for (i, length) in self.segment_lengths.iter().enumerate() {
            if *length <= 0.0 {
                continue;
            }
            last_segment = Some(i);
            if remaining <= *length {
                return self.on_segment(i, remaining / length, forward);
            }
            remaining -= length;
        }

        // Float drift past the final vertex
        match last_segment {
            Some(i) => self.on_segment(i, 1.0, forward),
            None => (self.path[0], 0.0),
        }
    }

    fn on_segment(&self, index: usize, t: f64, forward: bool) -> (GeoPoint, f64) {
        let start = &self.path[index];
        let end = &self.path[index + 1];
        let heading = if forward {
            start.bearing_to(end)
        } else {
            end.bearing_to(start)
        };
        (start.lerp(end, t), heading)
    }
}

/// Fleet of simulated buses.
#[derive(Debug, Clone, Default)]
pub struct BusSimulator {
    buses: Vec<SimulatedBus>,
    ticks: u64,
    seed: u64,
}

impl BusSimulator {
    pub fn new(seed: u64) -> Self {
        BusSimulator {
            buses: Vec::new(),
            ticks: 0,
            seed,
        }
    }

    /// Register a bus starting at the first point of `path`.
    pub fn add_bus(&mut self, id: impl Into<String>, path: Vec<GeoPoint>, speed_kmh: f64) -> Result<()> {
        let id = id.into();
        if path.len() < 2 {
            return Err(MapError::InvalidRequest(format!(
                "bus {} needs at least 2 path points, got {}",
                id,
                path.len()
            )));
        }
        if let Some(bad) = path.iter().find(|p| !is_valid(p.latitude, p.longitude)) {
            return Err(MapError::invalid_coordinates(bad.latitude, bad.longitude));
        }
        if !speed_kmh.is_finite() || speed_kmh <= 0.0 {
            return Err(MapError::InvalidRequest(format!(
                "bus {} speed must be positive, got {}",
                id, speed_kmh
            )));
        }

        let segment_lengths: Vec<f64> = path.windows(2).map(|w| w[0].distance_to(&w[1])).collect();
        let total_length: f64 = segment_lengths.iter().sum();
        if total_length <= 0.0 {
            return Err(MapError::InvalidRequest(format!(
                "bus {} path has zero length",
                id
            )));
        }

        tracing::debug!(bus_id = %id, length_m = total_length, "Added simulated bus");
        self.buses.push(SimulatedBus {
            id,
            path,
            segment_lengths,
            total_length,
            speed_kmh,
            travelled: 0.0,
        });
        Ok(())
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    /// Advance every bus by `elapsed` and return the new positions.
    pub fn step(&mut self, elapsed: Duration) -> Vec<BusPosition> {
        for bus in &mut self.buses {
            bus.advance(elapsed);
        }
        self.ticks += 1;
        self.positions()
    }

    /// Current positions without advancing.
    pub fn positions(&self) -> Vec<BusPosition> {
        let recorded_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        self.buses
            .iter()
            .enumerate()
            .map(|(index, bus)| {
                let (exact, heading) = bus.locate();
                BusPosition {
                    bus_id: bus.id.clone(),
                    position: self.jittered(exact, index),
                    heading_degrees: heading,
                    speed_kmh: bus.speed_kmh,
                    recorded_at: recorded_at.clone(),
                }
            })
            .collect()
    }

    // Jitter only affects the reported point, never the bus's progress.
    fn jittered(&self, point: GeoPoint, bus_index: usize) -> GeoPoint {
        let seed = self.seed.wrapping_add((bus_index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        let slot = (self.ticks as usize).wrapping_mul(2);
        let offset = |i: usize| {
            pseudo_random_f64(seed, slot.wrapping_add(i)) * SIMULATION_JITTER_DEGREES * 2.0
                - SIMULATION_JITTER_DEGREES
        };

        GeoPoint::new(point.latitude + offset(0), point.longitude + offset(1)).unwrap_or(point)
    }

    /// Run the simulation on its own task, publishing a snapshot every `interval`.
    pub fn spawn(mut self, interval: Duration) -> Result<SimulationHandle> {
        if interval.is_zero() {
            return Err(MapError::InvalidRequest(
                "simulation interval must be greater than zero".to_string(),
            ));
        }

        let (sender, receiver) = watch::channel(self.positions());
        tracing::info!(
            buses = self.bus_count(),
            interval_ms = interval.as_millis() as u64,
            "Bus simulation started"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            let mut last = Instant::now();

            loop {
                ticker.tick().await;
                let now = Instant::now();
                let positions = self.step(now - last);
                last = now;
                if sender.send(positions).is_err() {
                    tracing::debug!("No simulation subscribers left");
                    break;
                }
            }
        });

        Ok(SimulationHandle { receiver, task })
    }
}

/// Owner of a running simulation. Dropping it stops the task.
pub struct SimulationHandle {
    receiver: watch::Receiver<Vec<BusPosition>>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    pub fn subscribe(&self) -> watch::Receiver<Vec<BusPosition>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Vec<BusPosition> {
        self.receiver.borrow().clone()
    }

    pub fn stop(self) {
        self.task.abort();
        tracing::info!("Bus simulation stopped");
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deterministic hash-based value in [0.0, 1.0).
fn pseudo_random_f64(seed: u64, index: usize) -> f64 {
    let mut x = seed
        .wrapping_add(index as u64)
        .wrapping_mul(6364136223846793005);
    x = x.wrapping_add(1442695040888963407);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    (x as f64) / (u64::MAX as f64)
}
