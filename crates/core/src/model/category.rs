use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("unknown category: {0:?}")]
    Unknown(String),
}

/// Subject-matter grouping used for both selection and reporting.
///
/// The set is closed: a bank row naming anything else is rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Rules,
    Systems,
    Operations,
    Risk,
}

impl Category {
    /// Every category, in reporting order.
    pub const ALL: [Category; 4] = [
        Category::Rules,
        Category::Systems,
        Category::Operations,
        Category::Risk,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Rules => "Rules",
            Category::Systems => "Systems",
            Category::Operations => "Operations",
            Category::Risk => "Risk",
        }
    }

    /// Label used by the Japanese question banks this trainer was first built for.
    #[must_use]
    pub fn local_name(self) -> &'static str {
        match self {
            Category::Rules => "規則",
            Category::Systems => "システム",
            Category::Operations => "運航",
            Category::Risk => "リスク",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed) || c.local_name() == trimmed)
            .ok_or_else(|| CategoryError::Unknown(trimmed.to_string()))
    }
}
