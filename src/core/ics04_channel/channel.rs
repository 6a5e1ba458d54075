use core::fmt::{Display, Error as FmtError, Formatter};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ics04_channel::error::Error;
use crate::core::ics04_channel::packet::Sequence;
use crate::core::ics04_channel::upgrade_fields::UpgradeFields;
use crate::core::ics04_channel::version::Version;
use crate::core::ics24_host::identifier::{ChannelId, ConnectionId, PortId};
use crate::prelude::*;
use crate::utils::pretty::PrettySlice;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedChannelEnd {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub channel_end: ChannelEnd,
}

impl IdentifiedChannelEnd {
    pub fn new(port_id: PortId, channel_id: ChannelId, channel_end: ChannelEnd) -> Self {
        IdentifiedChannelEnd {
            port_id,
            channel_id,
            channel_end,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEnd {
    pub state: State,
    pub ordering: Ordering,
    pub remote: Counterparty,
    pub connection_hops: Vec<ConnectionId>,
    pub version: Version,
    pub upgrade_sequence: Sequence,
}

impl Display for ChannelEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "ChannelEnd {{ state: {}, ordering: {}, remote: {}, connection_hops: {}, version: {}, upgrade_sequence: {} }}",
            self.state,
            self.ordering,
            self.remote,
            PrettySlice(&self.connection_hops),
            self.version,
            self.upgrade_sequence,
        )
    }
}

impl Default for ChannelEnd {
    fn default() -> Self {
        ChannelEnd {
            state: State::Uninitialized,
            ordering: Default::default(),
            remote: Counterparty::default(),
            connection_hops: Vec::new(),
            version: Version::default(),
            upgrade_sequence: Sequence::from(0), // The value of 0 indicates the channel has never been upgraded
        }
    }
}

impl ChannelEnd {
    pub fn new(
        state: State,
        ordering: Ordering,
        remote: Counterparty,
        connection_hops: Vec<ConnectionId>,
        version: Version,
        upgrade_sequence: Sequence,
    ) -> Self {
        Self {
            state,
            ordering,
            remote,
            connection_hops,
            version,
            upgrade_sequence,
        }
    }

    pub fn set_state(&mut self, s: State) {
        self.state = s;
    }

    pub fn set_version(&mut self, v: Version) {
        self.version = v;
    }

    pub fn set_upgrade_sequence(&mut self, sequence: Sequence) {
        self.upgrade_sequence = sequence;
    }

    pub fn is_open(&self) -> bool {
        self.state_matches(&State::Open)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    pub fn counterparty(&self) -> &Counterparty {
        &self.remote
    }

    pub fn connection_hops(&self) -> &Vec<ConnectionId> {
        &self.connection_hops
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn upgrade_sequence(&self) -> Sequence {
        self.upgrade_sequence
    }

    /// The fields an upgrade may renegotiate, as currently set on this end.
    pub fn upgrade_fields(&self) -> UpgradeFields {
        UpgradeFields::new(
            self.ordering,
            self.connection_hops.clone(),
            self.version.clone(),
        )
    }

    /// Replaces the negotiable fields with the ones of a completed upgrade.
    pub fn apply_upgrade_fields(&mut self, fields: &UpgradeFields) {
        self.ordering = fields.ordering;
        self.connection_hops = fields.connection_hops.clone();
        self.version = fields.version.clone();
    }

    pub fn validate_basic(&self) -> Result<(), Error> {
        if self.connection_hops.len() != 1 {
            return Err(Error::invalid_connection_hops_length(
                1,
                self.connection_hops.len(),
            ));
        }
        self.counterparty().validate_basic()
    }

    pub fn state_matches(&self, other: &State) -> bool {
        self.state() == other
    }

    pub fn order_matches(&self, other: &Ordering) -> bool {
        self.ordering() == other
    }

    #[allow(clippy::ptr_arg)]
    pub fn connection_hops_matches(&self, other: &Vec<ConnectionId>) -> bool {
        self.connection_hops() == other
    }

    pub fn counterparty_matches(&self, other: &Counterparty) -> bool {
        self.counterparty() == other
    }

    pub fn version_matches(&self, other: &Version) -> bool {
        self.version() == other
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub port_id: PortId,
    pub channel_id: Option<ChannelId>,
}

impl Counterparty {
    pub fn new(port_id: PortId, channel_id: Option<ChannelId>) -> Self {
        Self {
            port_id,
            channel_id,
        }
    }

    pub fn port_id(&self) -> &PortId {
        &self.port_id
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.channel_id.as_ref()
    }

    /// An open channel always knows the channel identifier of its counterparty.
    pub fn validate_basic(&self) -> Result<(), Error> {
        match self.channel_id {
            Some(_) => Ok(()),
            None => Err(Error::missing_counterparty()),
        }
    }
}

impl Display for Counterparty {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match &self.channel_id {
            Some(channel_id) => write!(
                f,
                "Counterparty(port_id: {}, channel_id: {})",
                self.port_id, channel_id
            ),
            None => write!(
                f,
                "Counterparty(port_id: {}, channel_id: None)",
                self.port_id
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Ordering {
    Uninitialized = 0,
    Unordered = 1,
    Ordered = 2,
}

impl Default for Ordering {
    fn default() -> Self {
        Self::Unordered
    }
}

impl Display for Ordering {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.as_str())
    }
}

impl Ordering {
    /// Yields the Ordering as a string, also the name of the connection feature
    /// that allows channels with this ordering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Unordered => "ORDER_UNORDERED",
            Self::Ordered => "ORDER_ORDERED",
        }
    }

    pub fn from_i32(nr: i32) -> Result<Self, Error> {
        match nr {
            0 => Ok(Self::Uninitialized),
            1 => Ok(Self::Unordered),
            2 => Ok(Self::Ordered),

            _ => Err(Error::unknown_order_type(nr.to_string())),
        }
    }
}

impl FromStr for Ordering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_start_matches("order_") {
            "uninitialized" => Ok(Self::Uninitialized),
            "unordered" => Ok(Self::Unordered),
            "ordered" => Ok(Self::Ordered),
            _ => Err(Error::unknown_order_type(s.to_string())),
        }
    }
}

/// The lifecycle state of a channel end. `Flushing` and `Flushcomplete` are only
/// reachable from `Open`, while an upgrade handshake is in progress.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Uninitialized,
    Init,
    TryOpen,
    Open,
    Closed,
    Flushing,
    Flushcomplete,
}

impl State {
    pub fn as_string(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Init => "INIT",
            Self::TryOpen => "TRYOPEN",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Flushing => "FLUSHING",
            Self::Flushcomplete => "FLUSHCOMPLETE",
        }
    }

    pub fn from_i32(s: i32) -> Result<Self, Error> {
        match s {
            0 => Ok(Self::Uninitialized),
            1 => Ok(Self::Init),
            2 => Ok(Self::TryOpen),
            3 => Ok(Self::Open),
            4 => Ok(Self::Closed),
            5 => Ok(Self::Flushing),
            6 => Ok(Self::Flushcomplete),
            _ => Err(Error::unknown_state(s)),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            State::Uninitialized => 0,
            State::Init => 1,
            State::TryOpen => 2,
            State::Open => 3,
            State::Closed => 4,
            State::Flushing => 5,
            State::Flushcomplete => 6,
        }
    }

    pub fn is_open(self) -> bool {
        self == State::Open
    }

    pub fn is_closed(self) -> bool {
        self == State::Closed
    }

    /// Whether the channel is part-way through an upgrade handshake.
    pub fn is_upgrading(self) -> bool {
        matches!(self, State::Flushing | State::Flushcomplete)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;
    use test_log::test;

    use crate::core::ics04_channel::channel::{Ordering, State};
    use crate::prelude::*;

    #[test]
    fn parse_channel_ordering_type() {
        struct Test {
            ordering: &'static str,
            want_res: Ordering,
            want_err: bool,
        }

        impl Test {
            fn new(ordering: &'static str, want_res: Ordering, want_err: bool) -> Self {
                Self {
                    ordering,
                    want_res,
                    want_err,
                }
            }
        }

        let tests: Vec<Test> = vec![
            Test::new("UNINITIALIZED", Ordering::Uninitialized, false),
            Test::new("UNORDERED", Ordering::Unordered, false),
            Test::new("ORDERED", Ordering::Ordered, false),
            Test::new("ORDER_UNORDERED", Ordering::Unordered, false),
            Test::new("ORDER_ORDERED", Ordering::Ordered, false),
            Test::new("UNKNOWN_ORDER", Ordering::Uninitialized, true),
        ];

        for test in tests {
            match Ordering::from_str(test.ordering) {
                Ok(res) => {
                    assert!(!test.want_err);
                    assert_eq!(test.want_res, res);
                }
                Err(_) => assert!(test.want_err, "parse failed"),
            }
        }
    }

    #[test]
    fn state_round_trips_through_its_numeric_form() {
        for i in 0..7 {
            let state = State::from_i32(i).unwrap();
            assert_eq!(state.as_i32(), i);
        }
        assert!(State::from_i32(7).is_err());

        assert!(State::Flushing.is_upgrading());
        assert!(State::Flushcomplete.is_upgrading());
        assert!(!State::Open.is_upgrading());
    }
}
