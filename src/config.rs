//! Test-run configuration.
//!
//! A [`TestConfig`] holds what stays fixed for one run of a test sequence:
//! the nominal and data bit timing programmed into the IUT and the seed of
//! the generator that randomizes frames. Configurations are stored as JSON:
//!
//! ```json
//! {
//!   "nominal": { "brp": 4, "prop": 8, "ph1": 6, "ph2": 5, "sjw": 4 },
//!   "data":    { "brp": 1, "prop": 6, "ph1": 5, "ph2": 4, "sjw": 3 },
//!   "seed": 1234
//! }
//! ```
//!
//! `seed` may be omitted and defaults to 0.
//!
//! # Example
//!
//! ```
//! use can_bitframe::{BitFrame, TestConfig};
//! use can_bitframe::frame::{Frame, FrameFlags};
//!
//! # fn main() -> can_bitframe::Result<()> {
//! let config = TestConfig::from_json(
//!     r#"{ "nominal": { "brp": 2, "prop": 3, "ph1": 4, "ph2": 5, "sjw": 2 },
//!          "data": { "brp": 1, "prop": 1, "ph1": 2, "ph2": 3, "sjw": 1 },
//!          "seed": 7 }"#,
//! )?;
//! let mut rng = config.rng();
//! let mut frame = Frame::new(FrameFlags::new())?;
//! frame.randomize(&mut rng)?;
//! let bit_frame = BitFrame::new(&frame, &config.timing());
//! assert!(!bit_frame.is_empty());
//! # Ok(())
//! # }
//! ```

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::timing::{BitTiming, FrameTiming};
use crate::Result;

/// Bit timing and generator seed of one test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestConfig {
    /// Arbitration-phase timing.
    pub nominal: BitTiming,
    /// Data-phase timing of bit-rate switching FD frames.
    pub data: BitTiming,
    /// Seed of the frame randomization generator.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: u64,
}

impl TestConfig {
    pub fn new(nominal: BitTiming, data: BitTiming, seed: u64) -> Self {
        Self {
            nominal,
            data,
            seed,
        }
    }

    /// The timing pair bits are sized with.
    pub fn timing(&self) -> FrameTiming {
        FrameTiming::new(self.nominal, self.data)
    }

    /// Check both bit timings.
    pub fn validate(&self) -> Result<()> {
        self.timing().validate()
    }

    /// A fresh generator seeded from [`TestConfig::seed`]. Two generators
    /// from the same configuration produce the same frames.
    pub fn rng(&self) -> Xoshiro256StarStar {
        Xoshiro256StarStar::seed_from_u64(self.seed)
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Requires the `serde` feature.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TestConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!(
            "Loaded test configuration: nominal {:?}, data {:?}, seed {}",
            config.nominal,
            config.data,
            config.seed
        );
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// Requires the `serde` feature.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// Requires the `std` and `serde` features.
    #[cfg(all(feature = "std", feature = "serde"))]
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(crate::Error::IOError)?;
        Self::from_json(&json)
    }

    /// Write the configuration as JSON.
    ///
    /// Requires the `std` and `serde` features.
    #[cfg(all(feature = "std", feature = "serde"))]
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(crate::Error::IOError)?;
        Ok(())
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        let timing = FrameTiming::default();
        Self::new(timing.nominal, timing.data, 0)
    }
}
