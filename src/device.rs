//! Simulated device under test.
//!
//! Answers the diagnostic vocabulary with randomized-but-bounded sensor
//! values, so sequences and demos run without hardware. The only state is
//! the uptime clock, which `reset_device` rewinds.

use std::time::Instant;

use rand::Rng;

use crate::transport::Response;

/// In-process DUT emulator speaking the `(Status, payload)` contract.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    started: Instant,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Handle one command. Matching is case-insensitive on the trimmed text.
    pub fn handle(&mut self, command: &str) -> Response {
        let mut rng = rand::thread_rng();
        match command.trim().to_lowercase().as_str() {
            "ping" => Response::ok("pong"),
            "read_voltage" => Response::ok(format!("{:.3}", rng.gen_range(12.2..=12.8))),
            "read_temperature" => Response::ok(format!("{:.2}", rng.gen_range(24.0..=30.0))),
            "read_current" => Response::ok(format!("{:.3}", rng.gen_range(0.8..=1.5))),
            "read_status" => Response::ok(format!("uptime={:.1}s", self.uptime_secs())),
            "reset_device" => {
                self.started = Instant::now();
                Response::ok("reset")
            }
            _ => Response::error(format!("unknown command: {command}")),
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Status;

    fn uptime_of(payload: &str) -> f64 {
        payload
            .strip_prefix("uptime=")
            .and_then(|s| s.strip_suffix('s'))
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("bad uptime payload: {payload:?}"))
    }

    #[test]
    fn test_ping_pong() {
        let mut dev = SimulatedDevice::new();
        assert_eq!(dev.handle("ping"), Response::ok("pong"));
    }

    #[test]
    fn test_matching_is_case_insensitive_and_trimmed() {
        let mut dev = SimulatedDevice::new();
        assert_eq!(dev.handle("  PING  "), Response::ok("pong"));
        assert_eq!(dev.handle("Reset_Device"), Response::ok("reset"));
    }

    #[test]
    fn test_sensor_readings_within_simulated_bounds() {
        let mut dev = SimulatedDevice::new();
        for _ in 0..50 {
            let v: f64 = dev.handle("read_voltage").payload.parse().unwrap();
            assert!((12.2..=12.8).contains(&v), "voltage out of bounds: {v}");
            let t: f64 = dev.handle("read_temperature").payload.parse().unwrap();
            assert!((24.0..=30.0).contains(&t), "temperature out of bounds: {t}");
            let a: f64 = dev.handle("read_current").payload.parse().unwrap();
            assert!((0.8..=1.5).contains(&a), "current out of bounds: {a}");
        }
    }

    #[test]
    fn test_reset_rewinds_uptime() {
        let mut dev = SimulatedDevice::new();
        std::thread::sleep(std::time::Duration::from_millis(150));

        let before = uptime_of(&dev.handle("read_status").payload);
        assert_eq!(dev.handle("reset_device"), Response::ok("reset"));
        let after = uptime_of(&dev.handle("read_status").payload);

        assert!(after <= before, "uptime did not rewind: {before} -> {after}");
    }

    #[test]
    fn test_unknown_command() {
        let mut dev = SimulatedDevice::new();
        let resp = dev.handle("unknown_cmd");
        assert_eq!(resp.status, Status::Error);
        assert_eq!(resp.payload, "unknown command: unknown_cmd");
    }
}
