use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024; // 10MB
const MAX_HISTORY_PAGE_SIZE: u8 = 100;

/// Typed configuration for the export bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Files
    pub work_dir: PathBuf,
    pub max_attachment_bytes: u64,

    // History pagination
    pub history_page_size: u8,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let command_prefix = env_str("COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!".to_string());

        let work_dir = env_path("EXPORT_WORK_DIR")
            .unwrap_or_else(|| env::temp_dir().join("discord-export"));
        fs::create_dir_all(&work_dir)?;

        let max_attachment_bytes =
            env_u64("MAX_ATTACHMENT_BYTES").unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES);

        let history_page_size = env_u64("HISTORY_PAGE_SIZE")
            .map(|n| n.clamp(1, MAX_HISTORY_PAGE_SIZE as u64) as u8)
            .unwrap_or(MAX_HISTORY_PAGE_SIZE);

        Ok(Self {
            discord_token: discord_token.trim().to_string(),
            command_prefix,
            work_dir,
            max_attachment_bytes,
            history_page_size,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}
