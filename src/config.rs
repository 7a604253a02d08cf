use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;

pub const CONFIG_FILE_NAME: &str = "tapebf.toml";
pub const MAX_STEPS_ENV: &str = "TAPEBF_MAX_STEPS";
pub const TIMEOUT_MS_ENV: &str = "TAPEBF_TIMEOUT_MS";

/// Execution limits. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_steps: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Limits {
    /// Resolve limits: flags -> env -> config file -> unbounded.
    pub fn resolve(max_steps: Option<usize>, timeout_ms: Option<u64>) -> Self {
        let file = load_from_toml().unwrap_or_default();
        Self {
            max_steps: max_steps
                .or_else(|| env_number(MAX_STEPS_ENV))
                .or(file.max_steps),
            timeout_ms: timeout_ms
                .or_else(|| env_number(TIMEOUT_MS_ENV))
                .or(file.timeout_ms),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn config_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(CONFIG_FILE_NAME);
    Some(path)
}

fn load_from_toml() -> Option<Limits> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_limits(&content))
}

/// Very small hand-rolled reader: the `[limits]` section with integer
/// `max_steps` and `timeout_ms` keys. Unknown keys and bad values are ignored.
fn parse_limits(content: &str) -> Limits {
    let mut in_limits = false;
    let mut map: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_limits = line[1..line.len() - 1].trim() == "limits";
            continue;
        }
        if !in_limits { continue; }
        if let Some((key, value)) = line.split_once('=') {
            // Drop trailing comments and optional quotes
            let value = value.split('#').next().unwrap_or_default().trim();
            map.insert(key.trim(), value.trim_matches('"'));
        }
    }

    Limits {
        max_steps: map.get("max_steps").and_then(|v| v.replace('_', "").parse().ok()),
        timeout_ms: map.get("timeout_ms").and_then(|v| v.replace('_', "").parse().ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_limits_section() {
        let limits = parse_limits(
            "# tapebf settings\n[limits]\nmax_steps = 1_000_000\ntimeout_ms = \"250\" # quarter second\n",
        );
        assert_eq!(limits.max_steps, Some(1_000_000));
        assert_eq!(limits.timeout_ms, Some(250));
    }

    #[test]
    fn ignores_other_sections_and_bad_values() {
        let limits = parse_limits("[colors]\nmax_steps = 5\n[limits]\ntimeout_ms = soon\n");
        assert_eq!(limits, Limits::default());
    }

    #[test]
    fn empty_config_is_unbounded() {
        assert_eq!(parse_limits(""), Limits { max_steps: None, timeout_ms: None });
    }

    #[test]
    fn flags_win_over_everything() {
        let limits = Limits::resolve(Some(7), Some(9));
        assert_eq!(limits, Limits { max_steps: Some(7), timeout_ms: Some(9) });
    }
}
