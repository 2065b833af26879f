//! Scale presets: named zoom levels for the star map.
//!
//! Each preset is one row of a fixed lookup table holding its selection rule,
//! a camera eye hint and the base marker style. Farther presets use larger
//! eye magnitudes, smaller markers and lower opacity.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Zoom level requested by a front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScalePreset {
    EarthVicinity,
    SolarNeighborhood,
    #[default]
    MilkyWay,
    LocalGroup,
    ObservableUniverse,
}

/// How a preset picks its visible rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Rows with `radius` strictly below the cutoff, in parsecs.
    Within(f64),
    /// Every row.
    Everything,
    /// A uniform random sample of at most this many rows.
    Sample(usize),
}

/// Camera eye position hint, in plot-relative units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraEye {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CameraEye {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance of the eye from the scene center.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Everything a preset decides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetSpec {
    pub preset: ScalePreset,
    /// Human-readable name, used in captions.
    pub label: &'static str,
    pub selection: Selection,
    pub camera: CameraEye,
    /// Marker size before radial falloff.
    pub base_size: f64,
    /// Marker opacity before radial falloff.
    pub base_opacity: f64,
    /// Radius in parsecs at which the falloff weight halves.
    pub falloff_pc: f64,
}

impl PresetSpec {
    /// Radius cutoff, if the preset has one.
    pub fn radius_cutoff(&self) -> Option<f64> {
        match self.selection {
            Selection::Within(cutoff) => Some(cutoff),
            _ => None,
        }
    }

    /// Sample cap, if the preset samples.
    pub fn max_sample(&self) -> Option<usize> {
        match self.selection {
            Selection::Sample(max) => Some(max),
            _ => None,
        }
    }
}

const PRESETS: [PresetSpec; 5] = [
    PresetSpec {
        preset: ScalePreset::EarthVicinity,
        label: "Earth Vicinity",
        selection: Selection::Within(50.0),
        camera: CameraEye::new(0.3, 0.3, 0.2),
        base_size: 3.5,
        base_opacity: 0.95,
        falloff_pc: 50.0,
    },
    PresetSpec {
        preset: ScalePreset::SolarNeighborhood,
        label: "Solar Neighborhood",
        selection: Selection::Within(500.0),
        camera: CameraEye::new(0.7, 0.7, 0.4),
        base_size: 2.5,
        base_opacity: 0.8,
        falloff_pc: 500.0,
    },
    PresetSpec {
        preset: ScalePreset::MilkyWay,
        label: "Milky Way",
        selection: Selection::Everything,
        camera: CameraEye::new(1.6, 1.6, 0.6),
        base_size: 1.6,
        base_opacity: 0.6,
        falloff_pc: 5_000.0,
    },
    PresetSpec {
        preset: ScalePreset::LocalGroup,
        label: "Local Group",
        selection: Selection::Sample(6_000),
        camera: CameraEye::new(3.0, 3.0, 1.4),
        base_size: 1.1,
        base_opacity: 0.35,
        falloff_pc: 20_000.0,
    },
    PresetSpec {
        preset: ScalePreset::ObservableUniverse,
        label: "Observable Universe",
        selection: Selection::Sample(3_000),
        camera: CameraEye::new(5.0, 5.0, 2.2),
        base_size: 0.9,
        base_opacity: 0.25,
        falloff_pc: 100_000.0,
    },
];

impl ScalePreset {
    /// All presets, nearest first.
    pub const ALL: [ScalePreset; 5] = [
        ScalePreset::EarthVicinity,
        ScalePreset::SolarNeighborhood,
        ScalePreset::MilkyWay,
        ScalePreset::LocalGroup,
        ScalePreset::ObservableUniverse,
    ];

    #[inline]
    pub fn spec(self) -> &'static PresetSpec {
        &PRESETS[self as usize]
    }

    #[inline]
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// File-name friendly name, e.g. `solar_neighborhood`.
    pub fn slug(self) -> String {
        self.label().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for ScalePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognized preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown scale preset: {0}")]
pub struct UnknownPreset(pub String);

impl FromStr for ScalePreset {
    type Err = UnknownPreset;

    /// Accepts labels ("Milky Way") as well as `milky_way` / `milky-way`,
    /// ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        ScalePreset::ALL
            .into_iter()
            .find(|preset| {
                let name: String = preset
                    .label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == wanted
            })
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
