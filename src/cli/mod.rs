use clap::{Parser, Subcommand};

use crate::config::{split_file_list, RunConfig, DEFAULT_ORDER, DEFAULT_PREFIX, DEFAULT_SUFFIX};
use crate::logging::LogFormat;
use crate::secrets::{OrderPolicy, SourceOptions};

/// Command-line values take precedence over environment variables.
#[derive(Parser)]
#[command(
    name = "secret-getter",
    version,
    about = "Inject secrets from Vault or a key file into files, then exec a command",
    after_help = "Example:\n  secret-getter vault --path secret/app --files /etc/app,/etc/app/conf.d \\\n    --prefix '\\$\\{' --suffix '\\}' --order env -- /usr/bin/app --serve"
)]
pub struct Cli {
    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read secrets from a HashiCorp Vault server
    Vault(VaultOpts),
    /// Read secrets from a local key=value file
    File(FileOpts),
}

#[derive(clap::Args)]
pub struct VaultOpts {
    /// Vault address
    #[arg(long, env = "VAULT_ADDR")]
    pub addr: Option<String>,
    /// Vault token, or a file containing it
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Vault path to list secrets under
    #[arg(long, env = "VAULT_PATH", default_value = "")]
    pub path: String,
    #[command(flatten)]
    pub template: TemplateOpts,
}

#[derive(clap::Args)]
pub struct FileOpts {
    /// Key file to read secrets from
    #[arg(long, default_value = "")]
    pub path: String,
    #[command(flatten)]
    pub template: TemplateOpts,
}

#[derive(clap::Args)]
pub struct TemplateOpts {
    /// Placeholder prefix (regular expression)
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,
    /// Placeholder suffix (regular expression)
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
    /// Comma-separated list of files and directories to template
    #[arg(long, default_value = "")]
    pub files: String,
    /// Order of precedence: vault, env, override
    #[arg(long, default_value = DEFAULT_ORDER)]
    pub order: OrderPolicy,
    /// Exit with an error, before running the command, if any file fails
    #[arg(long)]
    pub strict: bool,
    /// Command to exec once secrets are in place
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl Cli {
    pub fn into_run_config(self) -> RunConfig {
        match self.command {
            Commands::Vault(opts) => {
                let options = SourceOptions {
                    path: opts.path,
                    address: opts.addr,
                    token: opts.token,
                };
                opts.template.apply_to(RunConfig::new("vault", options))
            }
            Commands::File(opts) => {
                let options = SourceOptions {
                    path: opts.path,
                    ..Default::default()
                };
                opts.template.apply_to(RunConfig::new("file", options))
            }
        }
    }
}

impl TemplateOpts {
    fn apply_to(self, mut config: RunConfig) -> RunConfig {
        config.prefix = self.prefix;
        config.suffix = self.suffix;
        config.files = split_file_list(&self.files);
        config.order = self.order;
        config.strict = self.strict;
        config.command = self.command;
        config
    }
}
