use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::profile::Profile;
use crate::error::{CapgenError, Result};

/// Key widths, in units, generated for every profile.
pub const WIDTHS: [f64; 4] = [1.0, 1.25, 1.5, 2.0];

/// Rows generated for sculpted profiles.
pub const ROWS: [u8; 6] = [0, 1, 2, 3, 4, 5];

/// Row used to render DSA keys, which are the same on every row.
const DSA_ROW: u8 = 3;

/// One keycap model to generate.
///
/// A job has no identity beyond its parameters. It travels to a worker
/// process as a JSON descriptor, see [`Job::to_descriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJob")]
pub struct Job {
    pub profile: Profile,
    pub u: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJob {
    profile: Profile,
    u: f64,
    #[serde(default)]
    row: Option<u8>,
}

impl TryFrom<RawJob> for Job {
    type Error = String;

    fn try_from(raw: RawJob) -> Result<Self, String> {
        let job = Job {
            profile: raw.profile,
            u: raw.u,
            row: raw.row,
        };
        job.check()?;
        Ok(job)
    }
}

impl Job {
    /// A job for a uniform profile (no row).
    pub fn uniform(profile: Profile, u: f64) -> Self {
        Self {
            profile,
            u,
            row: None,
        }
    }

    /// A job for a sculpted profile at the given row.
    pub fn sculpted(profile: Profile, u: f64, row: u8) -> Self {
        Self {
            profile,
            u,
            row: Some(row),
        }
    }

    /// Checks that the parameters describe something the generator can build.
    fn check(&self) -> Result<(), String> {
        if !self.u.is_finite() || self.u <= 0.0 {
            return Err(format!(
                "key width must be a positive number, got {}",
                self.u
            ));
        }
        match (self.profile.is_uniform(), self.row) {
            (true, Some(row)) => Err(format!(
                "profile {} is uniform and takes no row (got row {row})",
                self.profile
            )),
            (false, None) => Err(format!("profile {} is sculpted and needs a row", self.profile)),
            (false, Some(row)) if !ROWS.contains(&row) => Err(format!(
                "row {row} is out of range for profile {}",
                self.profile
            )),
            _ => Ok(()),
        }
    }

    /// Row passed to the profile's row function when rendering.
    pub fn effective_row(&self) -> Option<u8> {
        if self.profile == Profile::Dsa {
            Some(DSA_ROW)
        } else {
            self.row
        }
    }

    /// Human-readable name, used as the task name: `1.25u r3 mt3`.
    pub fn display_name(&self) -> String {
        match self.row {
            Some(row) => format!("{}u r{row} {}", self.u, self.profile),
            None => format!("{}u {}", self.u, self.profile),
        }
    }

    /// File stem of the generated artifact: `mt3-3-1.25`, `dsa-1`.
    pub fn artifact_stem(&self) -> String {
        match self.row {
            Some(row) => format!("{}-{row}-{}", self.profile, self.u),
            None => format!("{}-{}", self.profile, self.u),
        }
    }

    /// Serializes the job into the single argument handed to a worker.
    pub fn to_descriptor(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a worker argument back into a job.
    pub fn from_descriptor(descriptor: &str) -> Result<Self> {
        serde_json::from_str(descriptor).map_err(|e| CapgenError::InvalidJob(e.to_string()))
    }
}

impl FromStr for Job {
    type Err = CapgenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_descriptor(s)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Enumerates the catalog restricted to `profiles`, in catalog order.
///
/// Uniform profiles come first (one job per width), followed by each
/// sculpted profile over every width and row.
pub fn enumerate(profiles: &[Profile]) -> Vec<Job> {
    let wanted = |p: &Profile| profiles.contains(p);
    let mut jobs = Vec::new();

    for profile in Profile::ALL.into_iter().filter(|p| p.is_uniform() && wanted(p)) {
        jobs.extend(WIDTHS.iter().map(|&u| Job::uniform(profile, u)));
    }
    for profile in Profile::ALL.into_iter().filter(|p| !p.is_uniform() && wanted(p)) {
        for u in WIDTHS {
            jobs.extend(ROWS.iter().map(|&row| Job::sculpted(profile, u, row)));
        }
    }
    jobs
}
