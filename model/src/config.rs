use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Tuning for one run of the model. Every field has a default, so a partial JSON file is fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// In minutes. A jump in predicted arrival bigger than this between consecutive predictions
    /// for one vehicle starts a new trip.
    pub max_delta: f64,
    /// In minutes. The first time a trip's cumulative delay reaches this, the vehicle has departed.
    pub epsilon: f64,
    pub demarcations: Demarcations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_delta: 30.0,
            epsilon: 0.01,
            demarcations: Demarcations::default(),
        }
    }
}

impl Config {
    /// The trip boundary threshold used against the live feed
    pub const PRODUCTION_MAX_DELTA: f64 = 10.0;

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_delta.is_finite() || self.max_delta < 0.0 {
            bail!(
                "max_delta must be a non-negative number of minutes, not {}",
                self.max_delta
            );
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            bail!(
                "epsilon must be a non-negative number of minutes, not {}",
                self.epsilon
            );
        }
        Ok(())
    }
}

/// Four hour-of-day boundaries splitting a weekday into pre-rush, morning rush, midday, evening
/// rush and post-rush. Always sorted ascending; never changes after construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Demarcations([f64; 4]);

impl Demarcations {
    pub fn new(mut hours: [f64; 4]) -> Result<Self> {
        if let Some(bad) = hours.iter().find(|h| !(0.0..=24.0).contains(*h)) {
            bail!("Demarcation {} isn't a valid hour of the day", bad);
        }
        // The array is our own copy; the caller's value is untouched
        hours.sort_by(|a, b| a.total_cmp(b));
        Ok(Self(hours))
    }

    pub fn hours(&self) -> [f64; 4] {
        self.0
    }
}

impl Default for Demarcations {
    fn default() -> Self {
        Self([7.0, 9.5, 16.5, 18.5])
    }
}

impl TryFrom<[f64; 4]> for Demarcations {
    type Error = anyhow::Error;

    fn try_from(hours: [f64; 4]) -> Result<Self> {
        Self::new(hours)
    }
}

impl From<Demarcations> for [f64; 4] {
    fn from(d: Demarcations) -> Self {
        d.0
    }
}
