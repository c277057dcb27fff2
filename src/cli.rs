//! The CLI for `deploy-commit`.

use crate::{
    config::{ConfigFile, DeployArgs, DeployConfig},
    deploy::{DeployOutcome, Deployer},
    errors::DeployResult,
    git::GitRepository,
    prompt::InquireConfirm,
};
use anyhow::{anyhow, Result};
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    ArgAction, CommandFactory, Parser,
};
use nu_ansi_term::Color::Blue;
use tracing::{debug, info, Level};

const ABOUT: &str = "deploy-commit cuts a deploy branch that pins a merged pull request's DAG \
                     to its merge commit in the deploy manifest.";

/// The CLI application for `deploy-commit`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-2)
    #[arg(short, action = ArgAction::Count)]
    pub v: u8,
    /// The deploy to prepare
    #[command(flatten)]
    pub deploy: DeployArgs,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub fn run(self) -> Result<()> {
        let file = ConfigFile::discover(self.deploy.config_file.as_deref())?;
        let config = self
            .deploy
            .resolve(file)
            .unwrap_or_else(|e| e.format(&mut Cli::command()).exit());
        info!(?config, "args");

        let repository = open_repository(&config)?;
        let mut confirm = InquireConfirm;
        let mut deployer = Deployer::new(&config, &repository, &mut confirm);
        let outcome = deployer.run()?;
        debug!(stage = %deployer.stage(), "deploy finished");

        match outcome {
            DeployOutcome::Pushed {
                branch,
                commit_hash,
            } => println!(
                "Pushed `{}` pinning `{}` to `{}`.",
                Blue.paint(branch),
                Blue.paint(config.dag_name.as_str()),
                Blue.paint(commit_hash)
            ),
            DeployOutcome::Aborted => {}
        }

        Ok(())
    }

    /// Initializes the tracing subscriber
    ///
    /// # Returns
    /// - `Result<()>` - Ok if successful, Err otherwise.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match self.v {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }
}

/// Opens the repository of `config`, after checking that it holds the manifest to update.
fn open_repository(config: &DeployConfig) -> DeployResult<GitRepository> {
    config.ensure_manifest()?;
    GitRepository::open(&config.repo_path)
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}
