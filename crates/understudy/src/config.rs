use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DoubleError;

/// Switches that change how doubles are resolved and verified.
///
/// Session-wide values are copied into every builder; a builder may override
/// them for the one double it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleConfig {
    /// Double final types (and reach final methods) through a stripped clone.
    pub allow_final_doubles:      bool,
    /// Allow `alias` doubles of types that are not loaded.
    pub allow_non_existent_types: bool,
    /// Generate forwarding methods for protected methods.
    pub allow_protected_methods:  bool,
    /// Report calls to methods that have no expectation.
    pub test_unexpected_methods:  bool,
}

impl Default for DoubleConfig {
    fn default() -> Self {
        Self {
            allow_final_doubles: true,
            allow_non_existent_types: true,
            allow_protected_methods: false,
            test_unexpected_methods: false,
        }
    }
}

impl DoubleConfig {
    pub fn set(&mut self, option: ConfigOption, value: bool) {
        match option {
            ConfigOption::AllowFinalDoubles     => self.allow_final_doubles = value,
            ConfigOption::AllowNonExistentTypes => self.allow_non_existent_types = value,
            ConfigOption::AllowProtectedMethods => self.allow_protected_methods = value,
            ConfigOption::TestUnexpectedMethods => self.test_unexpected_methods = value,
        }
    }

    pub fn get(&self, option: ConfigOption) -> bool {
        match option {
            ConfigOption::AllowFinalDoubles     => self.allow_final_doubles,
            ConfigOption::AllowNonExistentTypes => self.allow_non_existent_types,
            ConfigOption::AllowProtectedMethods => self.allow_protected_methods,
            ConfigOption::TestUnexpectedMethods => self.test_unexpected_methods,
        }
    }

    pub fn with(mut self, option: ConfigOption, value: bool) -> Self {
        self.set(option, value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOption {
    AllowFinalDoubles,
    AllowNonExistentTypes,
    AllowProtectedMethods,
    TestUnexpectedMethods,
}

impl ConfigOption {
    pub const ALL: [ConfigOption; 4] = [
        ConfigOption::AllowFinalDoubles,
        ConfigOption::AllowNonExistentTypes,
        ConfigOption::AllowProtectedMethods,
        ConfigOption::TestUnexpectedMethods,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigOption::AllowFinalDoubles     => "allow_final_doubles",
            ConfigOption::AllowNonExistentTypes => "allow_non_existent_types",
            ConfigOption::AllowProtectedMethods => "allow_protected_methods",
            ConfigOption::TestUnexpectedMethods => "test_unexpected_methods",
        }
    }
}

impl fmt::Display for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigOption {
    type Err = DoubleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| {
                let known = ConfigOption::ALL.map(|o| o.as_str()).join(", ");
                DoubleError::InvalidArgument(format!("unknown config option `{s}` (expected one of: {known})"))
            })
    }
}
