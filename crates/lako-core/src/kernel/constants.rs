/// Application name used when neither the builder nor the config sets one
pub const APP_NAME: &str = "Lako";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Listen address used by the bundled HTTP server
pub const DEFAULT_LISTEN_ADDR: &str = ":8080";

/// Config file loaded by the binary when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "config/app.toml";

/// Config key holding the application name
pub const CONFIG_KEY_NAME: &str = "name";

/// Config key holding the listen address
pub const CONFIG_KEY_LISTEN: &str = "listen";

/// Config key holding the debug switch
pub const CONFIG_KEY_DEBUG: &str = "debug";
