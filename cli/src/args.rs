use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use orgwiki_core::config::{CredentialSource, DEFAULT_REGION, Secret};
use orgwiki_core::model::OutputFormat;
use orgwiki_core::service::RunOptions;

use crate::logger::LogLevel;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Publish AWS Organization account and IAM user inventories to an Outline wiki"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true, env = "LOG_LEVEL", ignore_case = true)]
    pub log_level: Option<LogLevel>,
    #[arg(long, global = true)]
    pub json_output: bool,
    #[arg(long, global = true)]
    pub json_only: bool,
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
    #[command(flatten)]
    pub build: BuildArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Not `version`: that id belongs to clap's generated `--version` flag.
    #[arg(long = "build-version", env = "VERSION", hide = true)]
    pub build_version: Option<String>,
    #[arg(long = "build-commit", env = "COMMIT_SHA", hide = true)]
    pub commit_sha: Option<String>,
    #[arg(long = "build-timestamp", env = "BUILD_TIMESTAMP", hide = true)]
    pub build_timestamp: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate every credential set and replace the wiki page's children.
    Publish(PublishArgs),
    /// Enumerate and print the markdown without touching the wiki.
    Render(RenderArgs),
    Config(ConfigCommandArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// `{"accounts":[{"name","access_key","secret_key"}]}`
    #[arg(long, env = "AWS_CREDENTIALS_JSON", hide_env_values = true)]
    pub credentials_json: Option<String>,
    /// Same JSON shape, read from a file. Takes precedence over the inline value.
    #[arg(long)]
    pub credentials_file: Option<PathBuf>,
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub aws_region: String,
}

impl CredentialArgs {
    pub fn source(&self) -> Option<CredentialSource> {
        if let Some(path) = &self.credentials_file {
            return Some(CredentialSource::File(path.clone()));
        }
        self.credentials_json
            .as_ref()
            .map(|json| CredentialSource::Inline(Secret::new(json.clone())))
    }
}

#[derive(Args, Debug, Clone)]
pub struct WikiArgs {
    #[arg(long, env = "GETOUTLINE_DOCUMENT_ID")]
    pub document_id: Option<String>,
    #[arg(long, env = "GETOUTLINE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    #[arg(long, env = "GETOUTLINE_API_URL")]
    pub api_url: Option<String>,
}

impl WikiArgs {
    pub fn is_empty(&self) -> bool {
        self.document_id.is_none() && self.api_token.is_none() && self.api_url.is_none()
    }
}

#[derive(Parser, Debug, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
    #[command(flatten)]
    pub wiki: WikiArgs,
    /// Publish one merged page instead of one page per credential set.
    #[arg(long)]
    pub aggregate: bool,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub pretty: bool,
}

impl PublishArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            aggregate: self.aggregate,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
    #[arg(long)]
    pub aggregate: bool,
    /// Write `<label>.md` files here instead of printing to stdout.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommandArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Check credentials and wiki settings without calling AWS.
    Validate(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
    #[command(flatten)]
    pub wiki: WikiArgs,
    #[arg(long)]
    pub format: Option<OutputFormatArg>,
    #[arg(long)]
    pub pretty: bool,
}

impl ConfigCommand {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Validate(args) => args.format.map(Into::into).unwrap_or(OutputFormat::Text),
        }
    }

    pub fn pretty(&self) -> bool {
        match self {
            Self::Validate(args) => args.pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}
