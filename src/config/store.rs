use anyhow::{Context, bail};

use super::structure::{ChatBotConfigInner, ChatBotConfigTOML};
use std::{
    ops::{Deref, DerefMut},
    path::PathBuf,
};

#[derive(Debug, Clone)]
pub struct ChatBotConfig {
    pub path: PathBuf,
    cached: ChatBotConfigTOML,
}

impl ChatBotConfig {
    /// Reads the config at `path` (or `path/config.toml` for directories),
    /// writing a default file first if nothing exists there yet.
    pub fn read(path: PathBuf) -> anyhow::Result<Self> {
        let path = match path.is_dir() {
            true => path.join("config.toml"),
            false => path,
        };

        if !path.exists() {
            return Self::new(path);
        }

        if !path.is_file() {
            bail!(
                "Given path exists and is not a file... either change the path or delete the file."
            );
        }

        let config_str = std::fs::read_to_string(&path)?;

        Ok(Self {
            cached: toml::from_str(&config_str)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            path,
        })
    }

    fn new(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config = Self {
            path,
            cached: ChatBotConfigTOML::default(),
        };

        config.save()?;
        log::warn!(
            "no config found, wrote a default one to {}",
            config.path.display()
        );

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        std::fs::write(&self.path, toml::to_string(&self.cached)?)?;

        Ok(())
    }
}

impl Deref for ChatBotConfig {
    type Target = ChatBotConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.cached.config
    }
}

impl DerefMut for ChatBotConfig {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cached.config
    }
}

impl PartialEq for ChatBotConfig {
    fn eq(&self, other: &Self) -> bool {
        self.cached.config == other.cached.config
    }
}
