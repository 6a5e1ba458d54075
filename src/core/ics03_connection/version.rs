use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::ics03_connection::error::Error;
use crate::core::ics04_channel::channel::Ordering;
use crate::prelude::*;
use crate::utils::pretty::PrettyVec;

/// Stores the identifier and the features supported by a version
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// unique version identifier
    identifier: String,
    /// list of features compatible with the specified identifier
    features: Vec<String>,
}

impl Version {
    pub fn new(identifier: String, features: Vec<String>) -> Result<Self, Error> {
        if identifier.trim().is_empty() {
            return Err(Error::empty_versions());
        }
        if features.iter().any(|feature| feature.trim().is_empty()) {
            return Err(Error::empty_features());
        }

        Ok(Self {
            identifier,
            features,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Checks whether or not the given feature is supported in this version
    pub fn is_supported_feature(&self, feature: String) -> bool {
        self.features.contains(&feature)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version {
            identifier: "1".to_string(),
            features: vec![
                Ordering::Ordered.as_str().to_owned(),
                Ordering::Unordered.as_str().to_owned(),
            ],
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Version {{ identifier: {}, features: {} }}",
            self.identifier,
            PrettyVec(&self.features)
        )
    }
}
