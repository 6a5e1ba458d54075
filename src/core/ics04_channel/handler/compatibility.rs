//! Checks that the upgrades proposed by both ends of a channel can be agreed on.

use crate::core::ics04_channel::context::ChannelReader;
use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::prelude::*;

/// Both ends must propose the same ordering and version, and their proposed
/// connections must be open counterparties of each other.
pub fn check_upgrade_compatibility(
    ctx: &dyn ChannelReader,
    proposed: &UpgradeFields,
    counterparty_proposed: &UpgradeFields,
) -> Result<(), Error> {
    if proposed.ordering != counterparty_proposed.ordering {
        return Err(Error::incompatible_counterparty_upgrade(format!(
            "expected upgrade ordering {} to match counterparty proposed ordering {}",
            proposed.ordering, counterparty_proposed.ordering
        )));
    }

    if proposed.version != counterparty_proposed.version {
        return Err(Error::incompatible_counterparty_upgrade(format!(
            "expected upgrade version {} to match counterparty proposed version {}",
            proposed.version, counterparty_proposed.version
        )));
    }

    let connection_id = proposed
        .connection_hop()
        .ok_or_else(|| Error::invalid_connection_hops_length(1, 0))?;
    let connection_end = ctx.connection_end(connection_id)?;

    if !connection_end.state().is_open() {
        return Err(Error::incompatible_counterparty_upgrade(format!(
            "proposed connection {} is in state {}, expected OPEN",
            connection_id,
            connection_end.state()
        )));
    }

    let counterparty_hop = counterparty_proposed.connection_hop();
    if connection_end.counterparty().connection_id() != counterparty_hop {
        return Err(Error::incompatible_counterparty_upgrade(format!(
            "proposed connection {} does not have counterparty {:?}",
            connection_id, counterparty_hop
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::check_upgrade_compatibility;
    use crate::core::ics03_connection::connection::State as ConnectionState;
    use crate::core::ics04_channel::channel::Ordering;
    use crate::core::ics04_channel::error::ErrorDetail;
    use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
    use crate::core::ics04_channel::version::Version;
    use crate::core::ics24_host::identifier::ConnectionId;
    use crate::mock::context::MockContext;
    use crate::prelude::*;
    use crate::test_utils::{dummy_connection_end, get_dummy_upgrade_fields};

    #[test]
    fn upgrade_compatibility() {
        struct Test {
            name: String,
            ctx: MockContext,
            counterparty_proposed: UpgradeFields,
            want_pass: bool,
        }

        // The local proposal routes over connection-2, whose counterparty is connection-3.
        let proposed = get_dummy_upgrade_fields(ConnectionId::new(2));
        let counterparty_proposed = get_dummy_upgrade_fields(ConnectionId::new(3));
        let ctx = MockContext::default().with_connection(
            ConnectionId::new(2),
            dummy_connection_end(ConnectionState::Open, 0, Some(ConnectionId::new(3))),
        );

        let tests: Vec<Test> = vec![
            Test {
                name: "Compatible proposals".to_string(),
                ctx: ctx.clone(),
                counterparty_proposed: counterparty_proposed.clone(),
                want_pass: true,
            },
            Test {
                name: "Ordering mismatch".to_string(),
                ctx: ctx.clone(),
                counterparty_proposed: UpgradeFields {
                    ordering: Ordering::Unordered,
                    ..counterparty_proposed.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Version mismatch".to_string(),
                ctx: ctx.clone(),
                counterparty_proposed: UpgradeFields {
                    version: Version::new("ics20-3".to_string()),
                    ..counterparty_proposed.clone()
                },
                want_pass: false,
            },
            Test {
                name: "Counterparty connection is not the local connection's counterparty"
                    .to_string(),
                ctx: ctx.clone(),
                counterparty_proposed: get_dummy_upgrade_fields(ConnectionId::new(7)),
                want_pass: false,
            },
            Test {
                name: "Proposed connection not open".to_string(),
                ctx: MockContext::default().with_connection(
                    ConnectionId::new(2),
                    dummy_connection_end(ConnectionState::TryOpen, 0, Some(ConnectionId::new(3))),
                ),
                counterparty_proposed: counterparty_proposed.clone(),
                want_pass: false,
            },
        ];

        for test in tests {
            let res = check_upgrade_compatibility(&test.ctx, &proposed, &test.counterparty_proposed);

            assert_eq!(
                test.want_pass,
                res.is_ok(),
                "check_upgrade_compatibility failed for test {}, with error {:?}",
                test.name,
                res.err(),
            );
        }
    }

    #[test]
    fn missing_connection_is_not_an_incompatibility() {
        let proposed = get_dummy_upgrade_fields(ConnectionId::new(2));
        let counterparty_proposed = get_dummy_upgrade_fields(ConnectionId::new(3));

        let res = check_upgrade_compatibility(
            &MockContext::default(),
            &proposed,
            &counterparty_proposed,
        );
        match res {
            Err(e) => assert!(matches!(e.detail(), ErrorDetail::Ics03Connection(_))),
            Ok(_) => panic!("an unknown connection must be reported as such"),
        }
    }
}
