//! The closed set of particle species that we know how to identify.
//!
//! Each track carries a detector response (a "number of sigmas") for every
//! species hypothesis. [`Species`] is used to look up the response for the
//! hypothesis of interest, which means that supporting another species
//! requires touching every `match` below (the compiler will tell you where).

use crate::Error;

/// A particle species that can be identified via TPC/TOF responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    Pion,
    Kaon,
    Proton,
    Deuteron,
}

impl Species {
    /// Resolve a PDG code.
    ///
    /// The sign of the code is ignored (the charge requirement is configured
    /// separately). Anything outside of the supported set is a configuration
    /// error.
    pub fn from_pdg(code: i32) -> Result<Species, Error> {
        match code.unsigned_abs() {
            211 => Ok(Species::Pion),
            321 => Ok(Species::Kaon),
            2212 => Ok(Species::Proton),
            1000010020 => Ok(Species::Deuteron),
            _ => Err(Error::unsupported_species(None, code)),
        }
    }

    /// the (positive) PDG code
    pub fn pdg(&self) -> i32 {
        match self {
            Species::Pion => 211,
            Species::Kaon => 321,
            Species::Proton => 2212,
            Species::Deuteron => 1000010020,
        }
    }

    /// rest mass in GeV/c²
    pub fn mass(&self) -> f64 {
        match self {
            Species::Pion => 0.13957039,
            Species::Kaon => 0.493677,
            Species::Proton => 0.93827208816,
            Species::Deuteron => 1.87561294257,
        }
    }

    /// short label, used when naming monitoring output
    pub fn symbol(&self) -> &'static str {
        match self {
            Species::Pion => "π",
            Species::Kaon => "K",
            Species::Proton => "p",
            Species::Deuteron => "d",
        }
    }
}

impl core::fmt::Display for Species {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which side of a pair a track is selected for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    First,
    Second,
}

/// Detector response of a single track under each species hypothesis.
///
/// The values are expressed in numbers of standard deviations from the
/// expected response.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NSigma {
    pub pion: f64,
    pub kaon: f64,
    pub proton: f64,
    pub deuteron: f64,
}

impl NSigma {
    /// the response under the `species` hypothesis
    #[inline]
    pub fn get(&self, species: Species) -> f64 {
        match species {
            Species::Pion => self.pion,
            Species::Kaon => self.kaon,
            Species::Proton => self.proton,
            Species::Deuteron => self.deuteron,
        }
    }

    /// Returns a copy where the response for `species` is replaced by `value`.
    pub fn with(mut self, species: Species, value: f64) -> NSigma {
        match species {
            Species::Pion => self.pion = value,
            Species::Kaon => self.kaon = value,
            Species::Proton => self.proton = value,
            Species::Deuteron => self.deuteron = value,
        }
        self
    }
}
