//! `redis-brain target`

use super::report;
use anyhow::Result;
use redis_brain_core::{BrainConfig, ProcessEnv};

/// Print where the brain would be stored
pub fn run() -> Result<()> {
    let config = BrainConfig::from_env(&ProcessEnv).map_err(report)?;
    print!("{}", describe(&config));
    Ok(())
}

fn describe(config: &BrainConfig) -> String {
    let target = &config.target;
    let on_off = |enabled: bool| if enabled { "yes" } else { "no" };

    let mut out = String::new();
    out.push_str(&format!("Source:       {}\n", config.source));
    out.push_str(&format!("URL:          {}\n", config.display_url));
    out.push_str(&format!("Address:      {}\n", target.addr()));
    out.push_str(&format!("Storage key:  {}\n", target.storage_key()));
    out.push_str(&format!("Password:     {}\n", on_off(target.password().is_some())));
    out.push_str(&format!("Ready check:  {}\n", on_off(!config.skip_ready_check())));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis_brain_core::UrlSource;

    #[test]
    fn test_describe_masks_password() {
        let config = BrainConfig::from_url(
            "redis://:s3cret@cache.internal:6380/bot",
            UrlSource::Env("REDIS_URL"),
            false,
        )
        .unwrap();

        let out = describe(&config);
        assert!(!out.contains("s3cret"));
        assert!(out.contains("Source:       $REDIS_URL"));
        assert!(out.contains("Storage key:  bot:storage"));
        assert!(out.contains("Password:     yes"));
        assert!(out.contains("Ready check:  no"));
    }

    #[test]
    fn test_describe_default() {
        let config =
            BrainConfig::from_url("redis://localhost:6379", UrlSource::Default, false).unwrap();

        let out = describe(&config);
        assert!(out.contains("Address:      localhost:6379"));
        assert!(out.contains("Storage key:  hubot:storage"));
        assert!(out.contains("Ready check:  yes"));
    }
}
