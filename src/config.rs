use crate::decode::{BarcodeFormat, FormatSet};
use crate::orientation::CameraFacing;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScannerConfig {
    pub camera: CameraConfig,
    pub preview: PreviewConfig,
    pub autofocus: AutofocusConfig,
    pub decode: DecodeConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Which way the lens faces
    #[serde(default = "default_camera_facing")]
    pub facing: CameraFacing,

    /// Clockwise mounting angle of the sensor relative to the device
    #[serde(default = "default_sensor_orientation")]
    pub sensor_orientation: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PreviewConfig {
    /// Maximum aspect ratio difference for the first selection pass
    #[serde(default = "default_aspect_tolerance")]
    pub aspect_tolerance: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AutofocusConfig {
    /// Run continuous autofocus while streaming
    #[serde(default = "default_autofocus_enabled")]
    pub enabled: bool,

    /// Delay before retrying when the surface is missing or the hardware faults
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between a completed pass and the next one
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Side of the square focus area in view pixels
    #[serde(default = "default_area_size")]
    pub area_size: u32,

    /// Metering area side relative to the focus area
    #[serde(default = "default_metering_scale")]
    pub metering_scale: f32,

    /// Weight given to both areas (1..=1000)
    #[serde(default = "default_area_weight")]
    pub weight: u16,
}

impl AutofocusConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for AutofocusConfig {
    fn default() -> Self {
        Self {
            enabled: default_autofocus_enabled(),
            retry_delay_ms: default_retry_delay_ms(),
            cooldown_ms: default_cooldown_ms(),
            area_size: default_area_size(),
            metering_scale: default_metering_scale(),
            weight: default_area_weight(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DecodeConfig {
    /// Enabled symbologies; empty enables all of them
    #[serde(default)]
    pub formats: Vec<BarcodeFormat>,
}

impl DecodeConfig {
    pub fn format_set(&self) -> FormatSet {
        self.formats.iter().copied().collect()
    }
}

impl ScannerConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.facing", "back")?
            .set_default("camera.sensor_orientation", default_sensor_orientation() as i64)?
            .set_default("preview.aspect_tolerance", default_aspect_tolerance())?
            .set_default("autofocus.enabled", default_autofocus_enabled())?
            .set_default("autofocus.retry_delay_ms", default_retry_delay_ms())?
            .set_default("autofocus.cooldown_ms", default_cooldown_ms())?
            .set_default("autofocus.area_size", default_area_size() as i64)?
            .set_default("autofocus.metering_scale", default_metering_scale() as f64)?
            .set_default("autofocus.weight", default_area_weight() as i64)?
            .set_default("decode.formats", Vec::<String>::new())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // CODESCAN_AUTOFOCUS__COOLDOWN_MS=500
            .add_source(
                Environment::with_prefix("CODESCAN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ScannerConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.sensor_orientation % 90 != 0 || self.camera.sensor_orientation >= 360 {
            return Err(ConfigError::Message(format!(
                "Sensor orientation must be one of 0, 90, 180, 270 (got {})",
                self.camera.sensor_orientation
            )));
        }

        if !(self.preview.aspect_tolerance > 0.0) {
            return Err(ConfigError::Message(
                "Preview aspect_tolerance must be greater than 0".to_string(),
            ));
        }

        let autofocus = &self.autofocus;
        if autofocus.retry_delay_ms == 0 || autofocus.cooldown_ms == 0 {
            return Err(ConfigError::Message(
                "Autofocus delays must be greater than 0".to_string(),
            ));
        }

        if autofocus.area_size == 0 {
            return Err(ConfigError::Message(
                "Autofocus area_size must be greater than 0".to_string(),
            ));
        }

        if !(autofocus.metering_scale >= 1.0) {
            return Err(ConfigError::Message(
                "Autofocus metering_scale must be at least 1.0".to_string(),
            ));
        }

        if autofocus.weight == 0 || autofocus.weight > 1000 {
            return Err(ConfigError::Message(
                "Autofocus weight must be between 1 and 1000".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                facing: default_camera_facing(),
                sensor_orientation: default_sensor_orientation(),
            },
            preview: PreviewConfig {
                aspect_tolerance: default_aspect_tolerance(),
            },
            autofocus: AutofocusConfig::default(),
            decode: DecodeConfig::default(),
        }
    }
}

// Default value functions
fn default_camera_facing() -> CameraFacing {
    CameraFacing::Back
}
fn default_sensor_orientation() -> u16 {
    90
}

fn default_aspect_tolerance() -> f64 {
    crate::preview_size::DEFAULT_ASPECT_TOLERANCE
}

fn default_autofocus_enabled() -> bool {
    true
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_cooldown_ms() -> u64 {
    2000
}
fn default_area_size() -> u32 {
    50
}
fn default_metering_scale() -> f32 {
    1.5
}
fn default_area_weight() -> u16 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.sensor_orientation, 90);
        assert_eq!(config.autofocus.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.autofocus.cooldown(), Duration::from_secs(2));
        assert!(config.decode.format_set().is_unrestricted());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
facing = "front"
sensor_orientation = 270

[autofocus]
enabled = false
cooldown_ms = 500

[decode]
formats = ["QR_CODE", "EAN_13"]
"#
        )
        .unwrap();

        let config = ScannerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.camera.facing, CameraFacing::Front);
        assert_eq!(config.camera.sensor_orientation, 270);
        assert!(!config.autofocus.enabled);
        assert_eq!(config.autofocus.cooldown_ms, 500);
        // untouched keys keep their defaults
        assert_eq!(config.autofocus.retry_delay_ms, 1000);
        assert_eq!(config.preview.aspect_tolerance, 0.1);

        let formats = config.decode.format_set();
        assert!(formats.contains(BarcodeFormat::QrCode));
        assert!(!formats.contains(BarcodeFormat::Code128));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScannerConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ScannerConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();
        config.camera.sensor_orientation = 45;
        assert!(config.validate().is_err());

        config.camera.sensor_orientation = 180;
        assert!(config.validate().is_ok());

        config.autofocus.weight = 0;
        assert!(config.validate().is_err());
        config.autofocus.weight = 100;

        config.autofocus.metering_scale = 0.5;
        assert!(config.validate().is_err());
        config.autofocus.metering_scale = 1.5;

        config.preview.aspect_tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let text = toml::to_string_pretty(&ScannerConfig::default()).unwrap();
        assert!(text.contains("[autofocus]"));
        assert!(text.contains("sensor_orientation = 90"));
    }
}
