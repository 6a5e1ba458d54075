use core::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::ics04_channel::channel::Ordering;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::version::Version;
use crate::core::ics24_host::identifier::ConnectionId;
use crate::prelude::*;
use crate::utils::pretty::PrettySlice;

/// The channel parameters an upgrade proposes to renegotiate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeFields {
    pub ordering: Ordering,
    pub connection_hops: Vec<ConnectionId>,
    pub version: Version,
}

impl UpgradeFields {
    pub fn new(ordering: Ordering, connection_hops: Vec<ConnectionId>, version: Version) -> Self {
        Self {
            ordering,
            connection_hops,
            version,
        }
    }

    /// Stateless checks: a known ordering, a single connection hop and a non-blank version.
    pub fn validate_basic(&self) -> Result<(), Error> {
        if !matches!(self.ordering, Ordering::Ordered | Ordering::Unordered) {
            return Err(Error::invalid_ordering());
        }

        if self.connection_hops.len() != 1 {
            return Err(Error::invalid_connection_hops_length(
                1,
                self.connection_hops.len(),
            ));
        }

        if self.version.is_empty() {
            return Err(Error::empty_version());
        }

        Ok(())
    }

    /// The connection the upgraded channel will be routed over.
    pub fn connection_hop(&self) -> Option<&ConnectionId> {
        self.connection_hops.first()
    }
}

impl Display for UpgradeFields {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "UpgradeFields {{ ordering: {}, connection_hops: {}, version: {} }}",
            self.ordering,
            PrettySlice(&self.connection_hops),
            self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::UpgradeFields;
    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::ConnectionId;
    use crate::prelude::*;

    #[test]
    fn upgrade_fields_validate_basic() {
        struct Test {
            name: String,
            fields: UpgradeFields,
            want_pass: bool,
        }

        let default_fields = UpgradeFields::new(
            Ordering::Unordered,
            vec![ConnectionId::new(2)],
            Version::ics20(),
        );

        let tests: Vec<Test> = vec![
            Test {
                name: "Good parameters".to_string(),
                fields: default_fields.clone(),
                want_pass: true,
            },
            Test {
                name: "Uninitialized ordering".to_string(),
                fields: UpgradeFields {
                    ordering: Ordering::Uninitialized,
                    ..default_fields.clone()
                },
                want_pass: false,
            },
            Test {
                name: "No connection hops".to_string(),
                fields: UpgradeFields {
                    connection_hops: vec![],
                    ..default_fields.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Two connection hops".to_string(),
                fields: UpgradeFields {
                    connection_hops: vec![ConnectionId::new(2), ConnectionId::new(3)],
                    ..default_fields.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Blank version".to_string(),
                fields: UpgradeFields {
                    version: Version::new("  ".to_string()),
                    ..default_fields
                },
                want_pass: false,
            },
        ];

        for test in tests {
            let res = test.fields.validate_basic();

            assert_eq!(
                test.want_pass,
                res.is_ok(),
                "UpgradeFields::validate_basic() failed for test {}, \nfields {:?} with error {:?}",
                test.name,
                test.fields,
                res.err(),
            );
        }
    }
}
