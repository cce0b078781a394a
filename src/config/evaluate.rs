//! Configuration file parser for the evaluation run

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use units::{Length, mm};
use units::todo::{PerLengthf32, Countf32};

use crate::config::{deserialize_uom, deserialize_uom_2d};
use crate::projector::filter::FilterKind;
use crate::{Error, Result};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// Seed of the generator driving the noise simulation
    #[serde(default)]
    pub seed: u64,

    /// Number of pixels along each side of the reconstruction grid
    #[serde(default = "default_size")]
    pub size: usize,

    /// Number of samples per generated batch
    #[serde(default = "default_n_data")]
    pub n_data: usize,

    #[serde(default)] pub geometry: GeometryConfig,
    #[serde(default)] pub fbp     : FbpConfig,
    #[serde(default)] pub noise   : NoiseConfig,
    #[serde(default)] pub data    : DataConfig,
    #[serde(default)] pub model   : ModelConfig,
    #[serde(default)] pub output  : OutputConfig,
}

/// Reconstruction extent and fan-beam scanner
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct GeometryConfig {
    #[serde(deserialize_with = "deserialize_uom_2d")]
    pub min: (Length, Length),

    #[serde(deserialize_with = "deserialize_uom_2d")]
    pub max: (Length, Length),

    /// Number of source positions, evenly spread over a full turn
    pub angles: usize,

    pub detector: DetectorConfig,

    /// Distance from the rotation centre to the source
    #[serde(deserialize_with = "deserialize_uom")]
    pub src_radius: Length,

    /// Distance from the rotation centre to the detector
    #[serde(deserialize_with = "deserialize_uom")]
    pub det_radius: Length,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DetectorConfig {
    pub bins: usize,
    #[serde(deserialize_with = "deserialize_uom")] pub min: Length,
    #[serde(deserialize_with = "deserialize_uom")] pub max: Length,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct FbpConfig {
    pub filter: FilterKind,
    /// Fraction of the Nyquist frequency above which the filter is zero
    pub frequency_scaling: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct NoiseConfig {
    /// Linear attenuation coefficient of water, per millimetre
    pub mu_water: PerLengthf32,
    pub photons_per_pixel: Countf32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DataConfig {
    /// Directory containing the phantom files
    pub folder: PathBuf,
    /// Phantom files whose names contain this pattern are never served by the loader
    pub exclude: Option<String>,
    /// Fixed phantom used for evaluation, relative to `folder`
    pub validation: PathBuf,
    /// Divisor converting stored values into the units of reconstruction
    pub density_scale: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ModelConfig {
    pub name: String,
    /// Where to look for `<name>`; no lookup when absent
    pub checkpoint_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    /// Defaults to the model name
    pub directory: Option<PathBuf>,
}

fn default_size  () -> usize { 512 }
fn default_n_data() -> usize {   1 }

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            size: default_size(),
            n_data: default_n_data(),
            geometry: Default::default(),
            fbp     : Default::default(),
            noise   : Default::default(),
            data    : Default::default(),
            model   : Default::default(),
            output  : Default::default(),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min: (mm(-128.0), mm(-128.0)),
            max: (mm( 128.0), mm( 128.0)),
            angles: 1000,
            detector: Default::default(),
            src_radius: mm(500.0),
            det_radius: mm(500.0),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self { Self { bins: 1000, min: mm(-360.0), max: mm(360.0) } }
}

impl Default for FbpConfig {
    fn default() -> Self { Self { filter: FilterKind::Hann, frequency_scaling: 0.45 } }
}

impl Default for NoiseConfig {
    fn default() -> Self { Self { mu_water: 0.02, photons_per_pixel: 10_000.0 } }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            folder: "data/mayo".into(),
            exclude: Some("L286".into()),
            validation: "L286_FD_3_1.CT.0002.0201.2015.12.22.18.22.49.651226.358225786.npy".into(),
            density_scale: 1000.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self { Self { name: "mayo_reference_unet".into(), checkpoint_dir: None } }
}

impl DataConfig {
    pub fn validation_path(&self) -> PathBuf { self.folder.join(&self.validation) }
}

impl Config {
    pub fn output_directory(&self) -> PathBuf {
        self.output.directory.clone()
            .unwrap_or_else(|| PathBuf::from(&self.model.name))
    }
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let bad = |reason: String| Error::Config { path: path.into(), reason };
    let text = fs::read_to_string(path)
        .map_err(|e| bad(e.to_string()))?;
    toml::from_str(&text)
        .map_err(|e| bad(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use units::{cm, mm};
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    // ----- Test an example on-disk config file -----------------------------------------
    #[test]
    fn test_config_file() {
        let config = read_config_file("evaluate-config.toml".as_ref()).unwrap();
        assert_eq!(config.seed, 0);
        assert_eq!(config.size, 512);
        assert_eq!(config.geometry.angles, 1000);
        assert_eq!(config.geometry.detector.bins, 1000);
        assert_eq!(config.geometry.detector.min, mm(-360.0));
        assert_eq!(config.geometry.src_radius, mm(500.0));
        assert_eq!(config.fbp.filter, FilterKind::Hann);
        assert_eq!(config.fbp.frequency_scaling, 0.45);
        assert_eq!(config.noise.photons_per_pixel, 10_000.0);
        assert_eq!(config.data.exclude.as_deref(), Some("L286"));
        assert_eq!(config.data.density_scale, 1000.0);
        assert_eq!(config.output_directory(), PathBuf::from("mayo_reference_unet"));
    }

    #[test]
    fn missing_config_file() {
        let result = read_config_file("no/such/file.toml".as_ref());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    // ----- Some helpers to make the tests more concise ---------------------------------
    fn parse<'d, D: Deserialize<'d>>(input: &'d str) -> D {
        toml::from_str(input).unwrap()
    }
    //  ---  Macro for concise assertions about values of parsed fields -------------------
    macro_rules! check {
        ($type:ident($text:expr).$field:ident = $expected:expr) => {
            let config: $type = parse::<$type>($text);
            println!("DESERIALIZED: {config:?}");
            assert_eq!(config.$field, $expected);
        };
        ($type:ident($text:expr) fields: $($field:ident = $expected:expr);+$(;)?) => {
            let config: $type = parse::<$type>($text);
            println!("DESERIALIZED: {config:?}");
            $(assert_eq!(config.$field, $expected);)*
        }
    }

    #[test]
    fn empty_config_gives_defaults() {
        let config: Config = parse("");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_top_level() {
        check!{Config("seed = 42") fields:
               seed   = 42;
               size   = 512;
               n_data = 1
        }
        check!{Config(r#"
                 size = 64
                 n_data = 8
               "#) fields:
               size   = 64;
               n_data = 8
        }
    }

    #[test]
    fn config_geometry() {
        check!{GeometryConfig(r#"
                 min = ["-10 cm", "-64 mm"]
                 max = [ "10 cm",  "64 mm"]
                 angles = 360
                 src_radius = "60 cm"
               "#) fields:
               min        = (cm(-10.0), mm(-64.0));
               max        = (cm( 10.0), mm( 64.0));
               angles     = 360;
               src_radius = cm(60.0);
               det_radius = mm(500.0);
        }
        check!{GeometryConfig(r#"
                 detector.bins = 256
                 detector.max = "20 cm"
               "#).detector = DetectorConfig { bins: 256, min: mm(-360.0), max: cm(20.0) }
        }
    }

    #[test]
    fn config_fbp() {
        check!{FbpConfig(r#"filter = "Shepp-Logan""#) fields:
               filter = FilterKind::SheppLogan;
               frequency_scaling = 0.45
        }
        check!{FbpConfig(r#"
                 filter = "Ram-Lak"
                 frequency_scaling = 1.0
               "#) fields:
               filter = FilterKind::RamLak;
               frequency_scaling = 1.0
        }
    }

    #[test]
    fn config_data() {
        check!{DataConfig(r#"
                 folder = "/tmp/phantoms"
                 validation = "v.npy"
               "#) fields:
               folder = PathBuf::from("/tmp/phantoms");
               exclude = Some("L286".to_string());
               density_scale = 1000.0
        }
        let data: DataConfig = parse(r#"folder = "/tmp/phantoms""#);
        assert!(data.validation_path().starts_with("/tmp/phantoms"));
    }

    // ----- Make sure that unknown fields are not accepted -----------------------------
    #[rstest::rstest(/**/ text,
        case("unknown_field = 666"),
        case("[geometry]\nangle = 10"),
        case("[noise]\nphotons = 10"),
        case("[fbp]\nfilter = \"Gaussian\""),
    )]
    fn config_reject_unknown(text: &str) {
        assert!(toml::from_str::<Config>(text).is_err());
    }

    #[test]
    fn lengths_need_units() {
        assert!(toml::from_str::<Config>("[geometry]\nsrc_radius = 500").is_err());
    }
}
