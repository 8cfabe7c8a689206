use std::fs;
use std::io::Write;
use std::time::{Duration, SystemTime};

use camino::Utf8PathBuf;
use nalgebra::Vector3;

use pulstoa::constants::{AU, DPI, T2000};
use pulstoa::geometry::ephemeris::Ephemeris;
use pulstoa::geometry::{Body, FramePoint, PosVel};
use pulstoa::observatories::clock::ClockCorrectionTable;
use pulstoa::observatories::{Observatory, ObservatoryRegistry};
use pulstoa::pulstoa_errors::PulstoaError;
use pulstoa::time::MjdPair;

/// Route pipeline log output through the test harness.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Registry with two physical sites; GBT carries a clock table.
pub fn build_registry() -> ObservatoryRegistry {
    let mut registry = ObservatoryRegistry::new();
    let gbt_clock =
        ClockCorrectionTable::new([(50000.0, 1.0), (55000.0, 2.0), (60000.0, 1.5)]).unwrap();
    registry.insert(
        Observatory::new("GBT", &["G", "GBT", "1"], 882.589, -4924.872, 3943.729)
            .unwrap()
            .with_clock_table(gbt_clock),
    );
    registry.insert(
        Observatory::new("Arecibo", &["AO", "3"], 2390.487, -5564.731, 1994.721).unwrap(),
    );
    registry
}

/// Analytic test oracle: coplanar circular orbits around the SSB.
pub struct CircularEphemeris;

impl CircularEphemeris {
    fn ssb_state(body: Body, epoch: f64) -> (Vector3<f64>, Vector3<f64>) {
        // (orbit radius in AU, period in days); the Sun sits at the origin
        let (radius, period) = match body {
            Body::Sun => (0.0, 1.0),
            Body::Venus => (0.72, 224.7),
            Body::Earth => (1.0, 365.25),
            Body::Jupiter => (5.2, 4332.6),
            Body::Saturn => (9.5, 10759.2),
            Body::Uranus => (19.2, 30688.5),
            _ => (30.0, 60182.0),
        };
        let theta = DPI * (epoch - T2000) / period;
        let r = radius * AU;
        let w = DPI / (period * 86400.0);
        (
            Vector3::new(r * theta.cos(), r * theta.sin(), 0.0),
            Vector3::new(-r * w * theta.sin(), r * w * theta.cos(), 0.0),
        )
    }
}

impl Ephemeris for CircularEphemeris {
    fn state(
        &self,
        target: Body,
        center: FramePoint,
        epoch_tdb: &MjdPair,
    ) -> Result<PosVel, PulstoaError> {
        let epoch = epoch_tdb.as_days();
        let (target_pos, target_vel) = Self::ssb_state(target, epoch);
        let (center_pos, center_vel) = match center {
            FramePoint::Ssb => (Vector3::zeros(), Vector3::zeros()),
            FramePoint::Body(body) => Self::ssb_state(body, epoch),
            FramePoint::Observatory => {
                return Err(PulstoaError::EphemerisError {
                    body: target.name().to_string(),
                    reason: "observatory-centered queries are not supported".to_string(),
                })
            }
        };
        Ok(PosVel::new(
            target_pos - center_pos,
            target_vel - center_vel,
            FramePoint::Body(target),
            center,
            epoch,
        ))
    }

    fn label(&self) -> &str {
        "circular-test-orbits"
    }
}

/// Write a TOA file into `dir` and backdate its mtime so a cache artifact
/// written immediately afterwards registers as newer.
pub fn write_tim(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
    let path = dir.path().join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.set_modified(SystemTime::now() - Duration::from_secs(60))
        .unwrap();
    Utf8PathBuf::from_path_buf(path).unwrap()
}
