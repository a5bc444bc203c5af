pub mod commands;
pub mod progress;

use camino::Utf8PathBuf;
use clap::Args;
use themekit_config::{clamp_batch_size, DEFAULT_API_HOST};
use themekit_core::ThemeTarget;

/// Connection settings shared by every subcommand.
#[derive(Args, Clone, Debug)]
pub struct ApiArgs {
    #[arg(long, global = true, env = "THEMEKIT_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[arg(long, global = true, env = "THEMEKIT_API_HOST", default_value = DEFAULT_API_HOST)]
    pub api_host: String,
}

#[derive(Args, Clone, Debug)]
pub struct ThemeArgs {
    #[arg(long, default_value = ".")]
    pub theme_dir: Utf8PathBuf,
    #[arg(long)]
    pub site_id: String,
    #[arg(long)]
    pub theme_id: String,
}

impl ThemeArgs {
    pub fn target(&self) -> ThemeTarget {
        ThemeTarget::new(self.site_id.clone(), self.theme_id.clone())
    }
}

/// Accepts any non-negative integer and clamps it into the supported range.
pub fn parse_batch_size(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map(clamp_batch_size)
        .map_err(|e| format!("invalid batch size `{s}`: {e}"))
}
