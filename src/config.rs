use std::{fs, path::Path};

use serde::Deserialize;

/// Evolution settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// bound on node invocations per execution run
    pub max_steps: usize,
    /// maximum number of outer-loop generations
    pub max_generations: usize,
    /// score (percent) at which evolution stops early
    pub score_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_steps: 15,
            max_generations: 3,
            score_threshold: 90.0,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Self {
        let data = fs::read_to_string(path.as_ref()).expect(&format!("failed to load config file {:?}", path.as_ref()));

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Self {
        let config = toml::from_str::<Config>(toml_str).expect("failed to parse the toml str");
        config
    }
}
