//! Analysis method identifiers
//!
//! Callers name the spectral descriptor with a short string. The set is
//! closed, so the string is parsed once at the boundary and unknown names are
//! rejected before any analysis state is allocated. The names are the ones
//! aubio understands, plus `default`.

use std::fmt;
use std::str::FromStr;

use aubio::OnsetMode;

use crate::error::WrapperError;

/// Spectral descriptor driving onset detection and beat tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Resolves to `Hfc` for onsets and `SpecFlux` for tempo
    Default,
    /// Local energy
    Energy,
    /// High frequency content
    Hfc,
    /// Complex domain deviation
    Complex,
    /// Phase deviation
    Phase,
    /// Magnitude-weighted phase deviation
    WPhase,
    /// Spectral difference
    SpecDiff,
    /// Kullback-Liebler
    Kl,
    /// Modified Kullback-Liebler
    Mkl,
    /// Spectral flux
    SpecFlux,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::Default,
        Method::Energy,
        Method::Hfc,
        Method::Complex,
        Method::Phase,
        Method::WPhase,
        Method::SpecDiff,
        Method::Kl,
        Method::Mkl,
        Method::SpecFlux,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Default => "default",
            Method::Energy => "energy",
            Method::Hfc => "hfc",
            Method::Complex => "complex",
            Method::Phase => "phase",
            Method::WPhase => "wphase",
            Method::SpecDiff => "specdiff",
            Method::Kl => "kl",
            Method::Mkl => "mkl",
            Method::SpecFlux => "specflux",
        }
    }

    /// Concrete descriptor used by an onset detector
    pub fn for_onset(self) -> Method {
        match self {
            Method::Default => Method::Hfc,
            other => other,
        }
    }

    /// Concrete descriptor used by a tempo tracker
    pub fn for_tempo(self) -> Method {
        match self {
            Method::Default => Method::SpecFlux,
            other => other,
        }
    }

    /// aubio descriptor for a concrete method (`Default` maps to aubio's own default)
    pub fn onset_mode(self) -> OnsetMode {
        match self {
            Method::Default => OnsetMode::default(),
            Method::Energy => OnsetMode::Energy,
            Method::Hfc => OnsetMode::Hfc,
            Method::Complex => OnsetMode::Complex,
            Method::Phase => OnsetMode::Phase,
            Method::WPhase => OnsetMode::WPhase,
            Method::SpecDiff => OnsetMode::SpecDiff,
            Method::Kl => OnsetMode::Kl,
            Method::Mkl => OnsetMode::Mkl,
            Method::SpecFlux => OnsetMode::SpecFlux,
        }
    }

    /// Parse an optional identifier, treating `None` and `""` as `Default`
    pub fn parse_or_default(name: Option<&str>) -> Result<Method, WrapperError> {
        match name {
            None => Ok(Method::Default),
            Some(name) if name.is_empty() => Ok(Method::Default),
            Some(name) => name.parse(),
        }
    }
}

impl FromStr for Method {
    type Err = WrapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| WrapperError::UnknownMethod {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
