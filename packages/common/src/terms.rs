use serde::{Deserialize, Serialize};

/// Commercial terms of a project or proposal: how payment is structured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum Budget {
    /// A single fixed price for the whole engagement.
    Fixed { amount: f64 },
    /// An hourly rate; total depends on hours worked.
    Hourly { rate: f64 },
    /// A negotiable range the client is willing to pay.
    Range { min: f64, max: f64 },
}

impl Budget {
    /// Returns true if all amounts are positive and ranges are ordered.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Fixed { amount } => *amount > 0.0,
            Self::Hourly { rate } => *rate > 0.0,
            Self::Range { min, max } => *min > 0.0 && max >= min,
        }
    }
}

/// Expected duration of the engagement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum Timeline {
    Days { duration: u32 },
    Weeks { duration: u32 },
    Months { duration: u32 },
    /// No fixed deadline.
    Flexible,
}

impl Timeline {
    /// Returns true if the duration, when present, is non-zero.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Days { duration } | Self::Weeks { duration } | Self::Months { duration } => {
                *duration > 0
            }
            Self::Flexible => true,
        }
    }
}
