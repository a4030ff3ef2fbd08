//! Synthetic speed-test measurement generation.
//!
//! The service does not probe the network: every "measurement" is drawn
//! uniformly from fixed, plausible ranges. Real throughput probing is an
//! explicit non-goal.

use rand::Rng;

/// Generation bounds for a synthetic measurement.
pub const DOWNLOAD_RANGE_MBPS: (f64, f64) = (50.0, 150.0);
pub const UPLOAD_RANGE_MBPS: (f64, f64) = (40.0, 120.0);
pub const PING_RANGE_MS: (i32, i32) = (3, 100);
pub const JITTER_RANGE_MS: (i32, i32) = (1, 20);
pub const PACKET_LOSS_RANGE_PCT: (f64, f64) = (0.0, 5.0);

/// One freshly synthesized set of measurement values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedMeasurement {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: i32,
    pub jitter_ms: i32,
    pub packet_loss_pct: f64,
}

/// Draw a measurement from the fixed ranges, rounding speeds and packet
/// loss to two decimal places.
pub fn generate() -> GeneratedMeasurement {
    let mut rng = rand::thread_rng();
    generate_with(&mut rng)
}

/// Same as [`generate`] but with a caller-provided RNG, for deterministic
/// tests.
pub fn generate_with<R: Rng>(rng: &mut R) -> GeneratedMeasurement {
    GeneratedMeasurement {
        download_mbps: round2(rng.gen_range(DOWNLOAD_RANGE_MBPS.0..=DOWNLOAD_RANGE_MBPS.1)),
        upload_mbps: round2(rng.gen_range(UPLOAD_RANGE_MBPS.0..=UPLOAD_RANGE_MBPS.1)),
        ping_ms: rng.gen_range(PING_RANGE_MS.0..=PING_RANGE_MS.1),
        jitter_ms: rng.gen_range(JITTER_RANGE_MS.0..=JITTER_RANGE_MS.1),
        packet_loss_pct: round2(
            rng.gen_range(PACKET_LOSS_RANGE_PCT.0..=PACKET_LOSS_RANGE_PCT.1),
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let m = generate_with(&mut rng);
            assert!(m.download_mbps >= DOWNLOAD_RANGE_MBPS.0);
            assert!(m.download_mbps <= DOWNLOAD_RANGE_MBPS.1);
            assert!(m.upload_mbps >= UPLOAD_RANGE_MBPS.0);
            assert!(m.upload_mbps <= UPLOAD_RANGE_MBPS.1);
            assert!(m.ping_ms >= PING_RANGE_MS.0 && m.ping_ms <= PING_RANGE_MS.1);
            assert!(m.jitter_ms >= JITTER_RANGE_MS.0 && m.jitter_ms <= JITTER_RANGE_MS.1);
            assert!(m.packet_loss_pct >= PACKET_LOSS_RANGE_PCT.0);
            assert!(m.packet_loss_pct <= PACKET_LOSS_RANGE_PCT.1);
        }
    }

    #[test]
    fn speeds_are_rounded_to_two_decimals() {
        let mut rng = StdRng::seed_from_u64(42);
        let m = generate_with(&mut rng);
        assert_eq!(m.download_mbps, round2(m.download_mbps));
        assert_eq!(m.upload_mbps, round2(m.upload_mbps));
        assert_eq!(m.packet_loss_pct, round2(m.packet_loss_pct));
    }
}
