use std::fmt;

use serde::{Deserialize, Serialize};

/// Keycap profiles known to the generator.
///
/// Uniform profiles have the same shape on every row; sculpted profiles
/// change shape per row and therefore need a row to be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Dsa,
    Xda,
    Choc,
    Mt3,
    Oem,
    Sa,
    Cherry,
    Des,
}

impl Profile {
    /// Every profile, in catalog order.
    pub const ALL: [Profile; 8] = [
        Profile::Dsa,
        Profile::Xda,
        Profile::Choc,
        Profile::Mt3,
        Profile::Oem,
        Profile::Sa,
        Profile::Cherry,
        Profile::Des,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Dsa => "dsa",
            Profile::Xda => "xda",
            Profile::Choc => "choc",
            Profile::Mt3 => "mt3",
            Profile::Oem => "oem",
            Profile::Sa => "sa",
            Profile::Cherry => "cherry",
            Profile::Des => "des",
        }
    }

    /// Whether every row of this profile shares one shape.
    pub fn is_uniform(self) -> bool {
        matches!(self, Profile::Dsa | Profile::Xda | Profile::Choc)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
