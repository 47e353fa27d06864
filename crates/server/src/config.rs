use std::fs;

use anyhow::{bail, Context};
use arbiter::SurfaceConfig;
use serde::Deserialize;

const CONFIG_FILE: &str = "sofb.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub orbit_max_length: u32,
    pub orbit_n_samples: u32,
    pub initial_weight: f64,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5064".into(),
            orbit_max_length: 100,
            orbit_n_samples: 10,
            initial_weight: 1.0,
            event_capacity: 256,
        }
    }
}

impl Settings {
    pub fn surface_config(&self) -> SurfaceConfig {
        SurfaceConfig {
            max_length: self.orbit_max_length,
            n_samples: self.orbit_n_samples,
            weight: self.initial_weight,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    orbit_max_length: Option<u32>,
    orbit_n_samples: Option<u32>,
    initial_weight: Option<f64>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse {CONFIG_FILE}"))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok())?;

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.orbit_max_length {
        settings.orbit_max_length = v;
    }
    if let Some(v) = file_cfg.orbit_n_samples {
        settings.orbit_n_samples = v;
    }
    if let Some(v) = file_cfg.initial_weight {
        settings.initial_weight = v;
    }
    if let Some(v) = file_cfg.event_capacity {
        settings.event_capacity = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("SOFB_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("APP__ORBIT_MAX_LENGTH") {
        settings.orbit_max_length = v
            .parse()
            .with_context(|| format!("APP__ORBIT_MAX_LENGTH is not a count: {v}"))?;
    }
    if let Some(v) = lookup("APP__ORBIT_N_SAMPLES") {
        settings.orbit_n_samples = v
            .parse()
            .with_context(|| format!("APP__ORBIT_N_SAMPLES is not a count: {v}"))?;
    }
    if let Some(v) = lookup("APP__WEIGHT") {
        settings.initial_weight = v
            .parse()
            .with_context(|| format!("APP__WEIGHT is not a number: {v}"))?;
    }
    if let Some(v) = lookup("APP__EVENT_CAPACITY") {
        settings.event_capacity = v
            .parse()
            .with_context(|| format!("APP__EVENT_CAPACITY is not a count: {v}"))?;
    }

    Ok(())
}

pub fn validate_settings(settings: &Settings) -> anyhow::Result<()> {
    if settings.orbit_n_samples > settings.orbit_max_length {
        bail!(
            "orbit_n_samples ({}) exceeds orbit_max_length ({})",
            settings.orbit_n_samples,
            settings.orbit_max_length
        );
    }
    if !(0.0..=1.0).contains(&settings.initial_weight) {
        bail!("initial_weight {} outside [0, 1]", settings.initial_weight);
    }
    if settings.event_capacity == 0 {
        bail!("event_capacity must be positive");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
