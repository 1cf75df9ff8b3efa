use std::path::{Path, PathBuf};

use litscript::ParseOptions;

/// Config file looked up next to the script when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "litscript.toml";

/// Load parse options from an explicit config path, or from `litscript.toml`
/// beside the script if one exists. Without either, defaults apply.
pub fn load_options(explicit: Option<&Path>, script: &Path) -> Result<ParseOptions, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match sibling_config(script) {
            Some(path) => path,
            None => {
                log::debug!("no {} found, using default options", DEFAULT_CONFIG_FILE);
                return Ok(ParseOptions::default());
            }
        },
    };

    log::info!("loading config from {}", path.display());
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    parse_options(&content).map_err(|e| format!("invalid config '{}': {}", path.display(), e))
}

/// Parse the TOML text of a config file.
pub fn parse_options(content: &str) -> Result<ParseOptions, toml::de::Error> {
    toml::from_str(content)
}

fn sibling_config(script: &Path) -> Option<PathBuf> {
    let dir = script.parent().unwrap_or_else(|| Path::new("."));
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}
