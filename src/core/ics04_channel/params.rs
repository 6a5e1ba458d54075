//! Host-configured parameters of the channel upgrade handshake.

use core::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::timeout::{TimeoutHeight, UpgradeTimeout};
use crate::prelude::*;
use crate::signer::Signer;
use crate::timestamp::Timestamp;
use crate::Height;

pub mod default {
    use super::*;

    pub fn upgrade_timestamp_offset() -> Duration {
        Duration::from_secs(600)
    }

    pub fn upgrade_height_offset() -> u64 {
        0
    }
}

/// How far in the future, relative to the host chain, the deadline set when an
/// upgrade starts flushing lies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeTimeoutParams {
    #[serde(default = "default::upgrade_height_offset")]
    pub height_offset: u64,

    #[cfg_attr(
        feature = "std",
        serde(default = "default::upgrade_timestamp_offset", with = "humantime_serde")
    )]
    #[cfg_attr(
        not(feature = "std"),
        serde(default = "default::upgrade_timestamp_offset")
    )]
    pub timestamp_offset: Duration,
}

impl Default for UpgradeTimeoutParams {
    fn default() -> Self {
        Self {
            height_offset: default::upgrade_height_offset(),
            timestamp_offset: default::upgrade_timestamp_offset(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    pub upgrade_timeout: UpgradeTimeoutParams,

    /// The account allowed to cancel an upgrade without proving a counterparty error
    /// receipt. No account has that right when unset.
    pub authority: Option<Signer>,
}

impl Params {
    pub fn validate(&self) -> Result<(), Error> {
        if self.upgrade_timeout.height_offset == 0
            && self.upgrade_timeout.timestamp_offset.is_zero()
        {
            return Err(Error::invalid_params(
                "upgrade timeout height and timestamp offsets cannot both be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The absolute deadline for an upgrade that starts flushing at the given host height and time.
    pub fn upgrade_timeout_at(
        &self,
        host_height: Height,
        host_timestamp: Timestamp,
    ) -> Result<UpgradeTimeout, Error> {
        let height = if self.upgrade_timeout.height_offset == 0 {
            TimeoutHeight::Never
        } else {
            TimeoutHeight::At(host_height.add(self.upgrade_timeout.height_offset))
        };

        let timestamp = if self.upgrade_timeout.timestamp_offset.is_zero() {
            Timestamp::none()
        } else {
            (host_timestamp + self.upgrade_timeout.timestamp_offset)
                .map_err(Error::timestamp_overflow)?
        };

        UpgradeTimeout::new(height, timestamp)
    }

    pub fn is_authority(&self, signer: &Signer) -> bool {
        self.authority.as_ref() == Some(signer)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use test_log::test;

    use super::{Params, UpgradeTimeoutParams};
    use crate::core::ics04_channel::timeout::TimeoutHeight;
    use crate::prelude::*;
    use crate::signer::Signer;
    use crate::timestamp::Timestamp;
    use crate::Height;

    #[test]
    fn params_parse_from_toml() {
        let params: Params = toml::from_str(
            r#"
            authority = "cosmos1authority"

            [upgrade_timeout]
            height_offset = 100
            timestamp_offset = "5m"
            "#,
        )
        .unwrap();

        assert_eq!(params.upgrade_timeout.height_offset, 100);
        assert_eq!(
            params.upgrade_timeout.timestamp_offset,
            Duration::from_secs(300)
        );
        assert!(params.is_authority(&"cosmos1authority".parse::<Signer>().unwrap()));
        assert!(params.validate().is_ok());

        let defaults: Params = toml::from_str("").unwrap();
        assert_eq!(defaults, Params::default());
        assert!(defaults.authority.is_none());
    }

    #[test]
    fn zero_offsets_are_rejected() {
        let params = Params {
            upgrade_timeout: UpgradeTimeoutParams {
                height_offset: 0,
                timestamp_offset: Duration::ZERO,
            },
            authority: None,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn upgrade_timeout_is_relative_to_the_host() {
        let params = Params {
            upgrade_timeout: UpgradeTimeoutParams {
                height_offset: 10,
                timestamp_offset: Duration::from_secs(60),
            },
            authority: None,
        };
        let host_height = Height::new(0, 5).unwrap();
        let host_time = Timestamp::from_nanoseconds(1_000_000_000).unwrap();

        let timeout = params.upgrade_timeout_at(host_height, host_time).unwrap();
        assert_eq!(
            timeout.height,
            TimeoutHeight::At(Height::new(0, 15).unwrap())
        );
        assert_eq!(timeout.timestamp.as_nanoseconds(), 61_000_000_000);
    }
}
