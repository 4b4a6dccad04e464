//! Layered configuration loading.
//!
//! Sources are applied in order, later ones overriding earlier ones:
//!
//! 1. `/etc/description-bot/service.yaml` for system-wide defaults
//! 2. `./config/service.yaml` for deployment-local overrides
//! 3. The file named by `DESCRIPTION_BOT_CONFIG_FILE`, which must exist when set
//! 4. Environment variables prefixed `DESCRIPTION_BOT__`, with `__` between
//!    nesting levels, e.g. `DESCRIPTION_BOT__SERVER__PORT=8080`; the
//!    allow-lists take comma separated values
//!
//! Every field has a default, so no source is mandatory. A file that cannot
//! be parsed or a value of the wrong type is a hard error.

use config::{Config, ConfigError, Environment, File, FileFormat};
use description_bot_api::ServiceConfig;

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "DESCRIPTION_BOT_CONFIG_FILE";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "DESCRIPTION_BOT";

const SYSTEM_CONFIG_FILE: &str = "/etc/description-bot/service";
const LOCAL_CONFIG_FILE: &str = "config/service";

/// Environment source reading the process environment.
///
/// Values stay strings; the allow-lists accept comma separated text when
/// deserialized, so numeric-looking secrets are never converted.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

/// Build the service configuration from files and `environment`.
pub fn load(
    explicit_path: Option<&str>,
    environment: Environment,
) -> Result<ServiceConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(
            File::with_name(SYSTEM_CONFIG_FILE)
                .required(false)
                .format(FileFormat::Yaml),
        )
        .add_source(
            File::with_name(LOCAL_CONFIG_FILE)
                .required(false)
                .format(FileFormat::Yaml),
        );

    if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
        builder = builder.add_source(File::with_name(path).required(true).format(FileFormat::Yaml));
    }

    builder
        .add_source(environment)
        .build()?
        .try_deserialize()
}

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;
