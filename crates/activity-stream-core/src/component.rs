use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the fixed subsystems whose activity log is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Cognitive,
    Sensory,
    Ml,
    Browser,
    Terminal,
    Personality,
    Emergency,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Cognitive,
        Component::Sensory,
        Component::Ml,
        Component::Browser,
        Component::Terminal,
        Component::Personality,
        Component::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cognitive => "cognitive",
            Self::Sensory => "sensory",
            Self::Ml => "ml",
            Self::Browser => "browser",
            Self::Terminal => "terminal",
            Self::Personality => "personality",
            Self::Emergency => "emergency",
        }
    }

    pub fn is_emergency(&self) -> bool {
        matches!(self, Self::Emergency)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownComponent(s.to_string()))
    }
}

/// Which components a view or tail session follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFilter {
    #[default]
    All,
    Only(Component),
}

impl StreamFilter {
    pub fn components(&self) -> Vec<Component> {
        match self {
            Self::All => Component::ALL.to_vec(),
            Self::Only(c) => vec![*c],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(c) => c.as_str(),
        }
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StreamFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}
