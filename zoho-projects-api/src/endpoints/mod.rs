pub mod logs;
pub mod portals;
pub mod projects;
pub mod tasks;
pub mod timers;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! id_type {
    ($name:ident) => {
        /// Numeric Zoho identifier. Serialized transparently.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn inner(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

id_type!(PortalId);
id_type!(ProjectId);
id_type!(TaskId);

/// Billing status attached to a time log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillStatus {
    #[default]
    Billable,
    #[serde(rename = "Non Billable")]
    NonBillable,
}

impl Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillStatus::Billable => f.write_str("Billable"),
            BillStatus::NonBillable => f.write_str("Non Billable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_serde_as_number() {
        let id: TaskId = serde_json::from_str("170876000001234567").unwrap();
        assert_eq!(id, TaskId::from(170876000001234567));
        assert_eq!(serde_json::to_string(&id).unwrap(), "170876000001234567");
    }

    #[test]
    fn bill_status_display_matches_api_values() {
        assert_eq!(BillStatus::Billable.to_string(), "Billable");
        assert_eq!(BillStatus::NonBillable.to_string(), "Non Billable");
    }
}
