//! Decision Threshold
//!
//! Maps a fraud probability to the response decision.
//! The cut-off is a fixed design constant, not configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DECISION_THRESHOLD;

/// Action returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Review,
}

impl Decision {
    /// `score < 0.5` approves, anything else goes to review
    pub fn from_score(score: f64) -> Self {
        if score < DECISION_THRESHOLD {
            Decision::Approve
        } else {
            Decision::Review
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Review => "review",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(Decision::from_score(0.0), Decision::Approve);
        assert_eq!(Decision::from_score(0.4999), Decision::Approve);
        assert_eq!(Decision::from_score(0.5), Decision::Review);
        assert_eq!(Decision::from_score(1.0), Decision::Review);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Decision::Review).unwrap(), "\"review\"");
        assert_eq!(Decision::Approve.as_str(), "approve");
    }
}
