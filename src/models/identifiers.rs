use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! impl_id_type {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_id_type!(EpisodeId);
impl_id_type!(SeriesAlias);

/// Key of a persisted watch-progress entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub series_external_id: u64,
    pub episode_number: u32,
}

impl ProgressKey {
    pub fn new(series_external_id: u64, episode_number: u32) -> Self {
        Self {
            series_external_id,
            episode_number,
        }
    }

    /// Keys with a zero component come from sessions that never learned
    /// which episode they were playing.
    pub fn is_identified(&self) -> bool {
        self.series_external_id != 0 && self.episode_number != 0
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.series_external_id, self.episode_number)
    }
}
