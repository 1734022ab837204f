/// Where ifcwise keeps its configuration file and default outbox
///
/// Base directories follow the platform convention: the XDG variables on
/// Linux, `~/Library/Application Support` on macOS, `%APPDATA%` and
/// `%LOCALAPPDATA%` on Windows.
use std::path::PathBuf;

const APP_DIR: &str = "ifcwise";

pub struct PlatformPaths;

impl PlatformPaths {
    /// Root for chunk messages written by the directory transmitter
    ///
    /// Returns: {data_dir}/ifcwise/outbox
    pub fn default_outbox_dir() -> PathBuf {
        base_dir(&DATA_DIR, env_var).join(APP_DIR).join("outbox")
    }

    /// Returns: {config_dir}/ifcwise/config.toml
    pub fn default_config_path() -> PathBuf {
        base_dir(&CONFIG_DIR, env_var).join(APP_DIR).join("config.toml")
    }
}

/// Environment lookups that locate one kind of base directory
struct BaseDir {
    windows_var: &'static str,
    xdg_var: &'static str,
    home_suffix: &'static str,
}

const DATA_DIR: BaseDir = BaseDir {
    windows_var: "LOCALAPPDATA",
    xdg_var: "XDG_DATA_HOME",
    home_suffix: ".local/share",
};

const CONFIG_DIR: BaseDir = BaseDir {
    windows_var: "APPDATA",
    xdg_var: "XDG_CONFIG_HOME",
    home_suffix: ".config",
};

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Falls back to the working directory when the environment names nothing
fn base_dir(kind: &BaseDir, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    let under_home = |suffix: &str| env("HOME").map(|home| PathBuf::from(home).join(suffix));
    let dir = if cfg!(target_os = "windows") {
        env(kind.windows_var).map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        under_home("Library/Application Support")
    } else {
        env(kind.xdg_var)
            .map(PathBuf::from)
            .or_else(|| under_home(kind.home_suffix))
    };
    dir.unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_outbox_and_config_live_under_app_dir() {
        assert!(PlatformPaths::default_outbox_dir().ends_with("ifcwise/outbox"));
        assert!(PlatformPaths::default_config_path().ends_with("ifcwise/config.toml"));
    }

    #[test]
    fn test_empty_environment_uses_working_dir() {
        assert_eq!(base_dir(&DATA_DIR, env_of(&[])), PathBuf::from("."));
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_xdg_variable_wins_over_home() {
        let env = env_of(&[("XDG_CONFIG_HOME", "/etc/xdg-user"), ("HOME", "/home/bim")]);
        assert_eq!(base_dir(&CONFIG_DIR, &env), PathBuf::from("/etc/xdg-user"));
        assert_eq!(base_dir(&DATA_DIR, &env), PathBuf::from("/home/bim/.local/share"));
    }
}
