/*! Configuration for the regexp engine.

The limits in [`Config`] can be set programmatically, or loaded from a TOML
file with [`load_config_from_file`]. Keys missing in the file keep their
default values. For instance:

```toml
step_limit = 1000000
max_repetitions = 500
max_nesting = 64
max_program_size = 20000
```
*/

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::re::{
    DEFAULT_MAX_NESTING, DEFAULT_MAX_PROGRAM_SIZE, DEFAULT_MAX_REPETITIONS,
    DEFAULT_MAX_VISITED_BITS,
};

/// Limits applied while compiling and executing regexps.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Maximum number of VM instructions executed by a single search
    /// before giving up with [`crate::Error::StepLimitExceeded`]. `None`
    /// means no limit.
    pub step_limit: Option<u64>,
    /// Maximum value accepted in the bounds of a repetition like `{n,m}`.
    pub max_repetitions: u32,
    /// Maximum number of nested groups in a pattern.
    pub max_nesting: u32,
    /// Maximum number of instructions in a compiled regexp. Larger regexps
    /// fail with [`crate::Error::TooLarge`].
    pub max_program_size: usize,
    /// Maximum size in bits of the set of states visited by a search. A
    /// search that needs more doesn't keep track of visited states. It
    /// finds the same matches, but it may take longer.
    pub max_visited_bits: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            step_limit: None,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            max_nesting: DEFAULT_MAX_NESTING,
            max_program_size: DEFAULT_MAX_PROGRAM_SIZE,
            max_visited_bits: DEFAULT_MAX_VISITED_BITS,
        }
    }
}

/// Load config file from a given path. Path must contain a valid TOML file or
/// this function will propagate the error.
#[cfg(feature = "config-file")]
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, figment::Error> {
    let config: Config =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(config_file))
            .extract()?;
    Ok(config)
}
