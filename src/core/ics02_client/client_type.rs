use core::fmt::{Display, Error as FmtError, Formatter};
use core::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use super::error::Error;
use crate::prelude::*;

/// Type of the client, depending on the specific consensus algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum ClientType {
    Tendermint = 1,
    Solomachine = 2,
    Wasm = 3,

    #[cfg(any(test, feature = "mocks"))]
    Mock = 9999,
}

impl ClientType {
    const TENDERMINT_STR: &'static str = "07-tendermint";
    const SOLOMACHINE_STR: &'static str = "06-solomachine";
    const WASM_STR: &'static str = "08-wasm";

    #[cfg_attr(not(any(test, feature = "mocks")), allow(dead_code))]
    const MOCK_STR: &'static str = "9999-mock";

    /// Yields the identifier of this client type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tendermint => Self::TENDERMINT_STR,
            Self::Solomachine => Self::SOLOMACHINE_STR,
            Self::Wasm => Self::WASM_STR,

            #[cfg(any(test, feature = "mocks"))]
            Self::Mock => Self::MOCK_STR,
        }
    }
}

impl Display for ClientType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "ClientType({})", self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::TENDERMINT_STR => Ok(Self::Tendermint),
            Self::SOLOMACHINE_STR => Ok(Self::Solomachine),
            Self::WASM_STR => Ok(Self::Wasm),

            #[cfg(any(test, feature = "mocks"))]
            Self::MOCK_STR => Ok(Self::Mock),

            _ => Err(Error::unknown_client_type(s.to_string())),
        }
    }
}
