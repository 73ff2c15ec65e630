use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use starmap::loader::{DataSource, LoadOptions, DEFAULT_SEED};
use starmap::synth::SyntheticKind;
use starmap::{ControlMode, DeviceClass, LayoutSet};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Visualiser {
    /// Star catalogue: sky, HR diagram, galactic plane, magnitude histogram.
    Stellar,
    /// Exoplanet hosts: sky, period/radius, galactic plane, discovery years.
    Exoplanet,
    /// Curl-noise flow field particles.
    Flow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Interactive,
    Demo,
    Preview,
}

impl From<Mode> for ControlMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Interactive => ControlMode::Interactive,
            Mode::Demo => ControlMode::ScriptedDemo,
            Mode::Preview => ControlMode::StaticPreview,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Device {
    Desktop,
    Mobile,
}

impl From<Device> for DeviceClass {
    fn from(d: Device) -> Self {
        match d {
            Device::Desktop => DeviceClass::Desktop,
            Device::Mobile => DeviceClass::Mobile,
        }
    }
}

/// `starmap_viewer` - real-time star map with animated layout transitions.
///
/// Loads a point catalogue (HTTP, file, directory or synthetic), projects it
/// into four layouts and either tours them on a loop or hands the transition
/// and camera to the user.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Which visualiser to run.
    #[arg(long, value_enum, default_value_t = Visualiser::Stellar, env = "STARMAP_VISUALISER")]
    pub visualiser: Visualiser,

    /// Catalogue source: an http(s) URL, a JSON file, a directory of JSON
    /// files or `synthetic:<stars|exoplanets>[:count]`.
    ///
    /// Defaults to the synthetic catalogue matching the visualiser.
    #[arg(long, env = "STARMAP_SOURCE")]
    pub source: Option<String>,

    /// Keep only the N brightest points.
    #[arg(long, env = "STARMAP_LIMIT")]
    pub limit: Option<usize>,

    #[arg(long, value_enum, default_value_t = Mode::Demo, env = "STARMAP_MODE")]
    pub mode: Mode,

    /// Mobile shortens the demo loop.
    #[arg(long, value_enum, default_value_t = Device::Desktop, env = "STARMAP_DEVICE_CLASS")]
    pub device_class: Device,

    /// Seed for synthetic catalogues, histogram jitter and the noise field.
    #[arg(long, default_value_t = DEFAULT_SEED, env = "STARMAP_SEED")]
    pub seed: u64,

    /// Size of synthetic catalogues, including the fallback.
    #[arg(long, default_value_t = 50_000, env = "STARMAP_POINTS")]
    pub points: usize,

    /// Flow-field particle count.
    #[arg(long, default_value_t = 4_000, env = "STARMAP_PARTICLES")]
    pub particles: usize,

    /// HTTP timeout for catalogue fetches, seconds.
    #[arg(long, default_value_t = 10, env = "STARMAP_FETCH_TIMEOUT_S")]
    pub fetch_timeout_s: u64,
}

impl Config {
    fn synthetic_kind(&self) -> SyntheticKind {
        match self.visualiser {
            Visualiser::Exoplanet => SyntheticKind::Exoplanets,
            Visualiser::Stellar | Visualiser::Flow => SyntheticKind::Stars,
        }
    }

    pub fn data_source(&self) -> Result<DataSource> {
        match &self.source {
            Some(s) => match s.parse() {
                Ok(DataSource::Synthetic { kind, count, .. }) => Ok(DataSource::Synthetic {
                    kind,
                    count,
                    seed: self.seed,
                }),
                Ok(other) => Ok(other),
                Err(e) => Err(anyhow!("invalid --source '{s}': {e}")),
            },
            None => Ok(DataSource::Synthetic {
                kind: self.synthetic_kind(),
                count: self.points,
                seed: self.seed,
            }),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            limit: self.limit,
            timeout: Duration::from_secs(self.fetch_timeout_s.max(1)),
            fallback_kind: self.synthetic_kind(),
            fallback_count: self.points,
            seed: self.seed,
        }
    }

    pub fn layout_set(&self) -> LayoutSet {
        match self.visualiser {
            Visualiser::Exoplanet => LayoutSet::exoplanet(),
            Visualiser::Stellar | Visualiser::Flow => LayoutSet::stellar(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.visualiser {
            Visualiser::Stellar => "Star Map",
            Visualiser::Exoplanet => "Exoplanet Map",
            Visualiser::Flow => "Flow Field",
        }
    }
}
