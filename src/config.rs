use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::client::{ClientConfig, DEFAULT_BASE_URL};

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

/// Resolves client settings: explicit values, then `CLIMACELL_URL` /
/// `CLIMACELL_KEY`, then the first `.climacellrc` found.
pub(crate) fn load_config(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("CLIMACELL_URL").ok());
    let mut key = key.or_else(|| std::env::var("CLIMACELL_KEY").ok());
    let mut file_verify: Option<bool> = None;

    let rc_candidates = rc_candidates();

    if url.is_none() || key.is_none() || verify.is_none() {
        if let Some(rc_path) = rc_candidates.iter().find(|p| p.exists()) {
            log::debug!("reading ClimaCell settings from {}", rc_path.display());
            let text = std::fs::read_to_string(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;
            let cfg = parse_rc(&text);
            url = url.or(cfg.url);
            key = key.or(cfg.key);
            file_verify = cfg.verify;
        }
    }

    let Some(key) = key else {
        let searched = rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        if searched.is_empty() {
            bail!("Missing configuration: key (set CLIMACELL_KEY or create .climacellrc)");
        }
        bail!(
            "Missing configuration: key (set CLIMACELL_KEY or put `key:` in one of: {})",
            searched.join(", ")
        );
    };

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        key,
        verify: verify.or(file_verify).unwrap_or(true),
    })
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();
    // `key:` may be left empty with the value on the next line.
    let mut pending: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, value) = match (pending.take(), line.split_once(':')) {
            (Some(name), _) if !line.contains(':') => (name, line),
            // URLs contain a colon, so only split on the first one.
            (_, Some((k, v))) => (k.trim(), v.trim()),
            (_, None) => continue,
        };
        let value = strip_quotes(value);

        if value.is_empty() {
            pending = Some(name);
            continue;
        }
        match name {
            "url" => cfg.url = Some(value.to_string()),
            "key" => cfg.key = Some(value.to_string()),
            "verify" => cfg.verify = Some(value != "0"),
            _ => {}
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted { &s[1..s.len() - 1] } else { s }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) CLIMACELL_RC  2) ./.climacellrc  3) ~/.climacellrc
    if let Ok(p) = std::env::var("CLIMACELL_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".climacellrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".climacellrc"));
    }
    v
}
