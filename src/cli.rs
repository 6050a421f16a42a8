//! Command-line front end
//!
//! Argument definitions live here, separate from the binary, so parsing and
//! the command handlers can be exercised from tests.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::clipboard::{read_trimmed, ClipboardAccess, ClipboardError, SystemClipboard};
use crate::hotkey::display_hotkey;
use crate::rewriter::{
    Backend, ChatClient, HttpChatClient, PresetTone, RewriteError, RewriteOutcome, Rewriter, Tone,
};
use crate::settings::{mask_key, Settings, SettingsError, SettingsStore};
use crate::updates::{self, AppInfo, UpdateError, UpdateStatus};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Usage(String),
}

/// Lexia: rewrite text with an LLM and pick from several alternatives
#[derive(Debug, Parser)]
#[command(name = "lexia-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file to use instead of the per-user default
    #[arg(long, global = true, env = "LEXIA_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite text and print the alternatives
    Rewrite(RewriteArgs),

    /// Inspect or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// List the preset tones
    Tones,

    /// Look for a newer release
    CheckUpdates,
}

#[derive(Debug, Args)]
pub struct RewriteArgs {
    /// Text to rewrite; read from stdin when omitted
    pub text: Option<String>,

    /// Preset tone name or a free-form instruction
    #[arg(short, long, default_value = "Neutral")]
    pub tone: String,

    /// Backend to use (gpt-4 or llama-4-scout)
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Number of alternatives (1-5)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub count: Option<u8>,

    /// Sampling temperature (0.0-1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Take the text from the clipboard
    #[arg(long, conflicts_with = "text")]
    pub clipboard: bool,

    /// Copy alternative N (1-based) to the clipboard
    #[arg(long)]
    pub pick: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print current settings with keys masked
    Show,

    /// Change one or more values
    Set {
        #[arg(long)]
        hotkey: Option<String>,
        #[arg(long)]
        backend: Option<Backend>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        count: Option<usize>,
    },

    /// Store an API key (empty string removes it)
    SetKey { backend: Backend, key: String },
}

/// `env_logger` with `RUST_LOG` taking precedence over `-v`
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<i32, CliError> {
    let store = match cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::open_default()?,
    };

    match cli.command {
        Command::Rewrite(args) => {
            let text = match (&args.text, args.clipboard) {
                (Some(text), _) => text.clone(),
                (None, true) => read_trimmed(&mut SystemClipboard::new()?)?,
                (None, false) => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let settings = apply_overrides(store.load(), &args)?;
            let rewriter = Rewriter::new(HttpChatClient::new()?, settings);
            let outcome = rewrite(&rewriter, &args, &text, out).await?;

            if let (Some(pick), RewriteOutcome::Alternatives(list)) = (args.pick, &outcome) {
                let mut clipboard = SystemClipboard::new()?;
                copy_pick(&mut clipboard, list, pick)?;
                writeln!(out, "Copied v{} to the clipboard.", pick)?;
            }
            Ok(exit_code(&outcome))
        }
        Command::Settings { action } => {
            settings_command(&store, action, out)?;
            Ok(0)
        }
        Command::Tones => {
            for tone in PresetTone::ALL {
                writeln!(out, "{}", tone.label())?;
            }
            Ok(0)
        }
        Command::CheckUpdates => {
            let client = updates::http_client()?;
            let info = AppInfo::current();
            let status =
                updates::check_for_updates(&client, updates::RELEASE_API_URL, info.version).await?;
            match status {
                UpdateStatus::UpToDate { current } => {
                    writeln!(out, "{} {} is up to date.", info.name, current)?
                }
                UpdateStatus::UpdateAvailable { current, latest, url } => writeln!(
                    out,
                    "A new version ({}) is available. Current version: {}.\n{}",
                    latest, current, url
                )?,
            }
            Ok(0)
        }
    }
}

/// Per-run overrides on top of the persisted settings
pub fn apply_overrides(mut settings: Settings, args: &RewriteArgs) -> Result<Settings, CliError> {
    if let Some(backend) = args.backend {
        settings.model = backend;
    }
    if let Some(count) = args.count {
        settings.num_alternatives = count as usize;
    }
    if let Some(temperature) = args.temperature {
        settings.temperature = temperature;
    }
    settings.validate()?;
    Ok(settings)
}

/// Run one rewrite with the effective settings and print the result
pub async fn rewrite<C: ChatClient>(
    rewriter: &Rewriter<C>,
    args: &RewriteArgs,
    text: &str,
    out: &mut dyn Write,
) -> Result<RewriteOutcome, CliError> {
    let settings = rewriter.settings();
    let outcome = rewriter
        .rewrite_text(text, Tone::parse(&args.tone), settings.num_alternatives, settings.model)
        .await;
    print_outcome(&outcome, out)?;
    Ok(outcome)
}

pub fn print_outcome(outcome: &RewriteOutcome, out: &mut dyn Write) -> io::Result<()> {
    match outcome {
        RewriteOutcome::Alternatives(list) => {
            for (i, alternative) in list.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "v{}: {}", i + 1, alternative)?;
            }
        }
        RewriteOutcome::Notice(message) | RewriteOutcome::Failed(message) => {
            writeln!(out, "{}", message)?;
        }
    }
    Ok(())
}

pub fn exit_code(outcome: &RewriteOutcome) -> i32 {
    match outcome {
        RewriteOutcome::Failed(_) => 1,
        _ => 0,
    }
}

pub fn copy_pick(
    clipboard: &mut dyn ClipboardAccess,
    alternatives: &[String],
    pick: usize,
) -> Result<(), CliError> {
    let chosen = pick
        .checked_sub(1)
        .and_then(|i| alternatives.get(i))
        .ok_or_else(|| {
            CliError::Usage(format!(
                "--pick must be between 1 and {}, got {}",
                alternatives.len(),
                pick
            ))
        })?;
    clipboard.write_text(chosen)?;
    Ok(())
}

pub fn settings_command(
    store: &SettingsStore,
    action: SettingsCommand,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match action {
        SettingsCommand::Show => {
            let settings = store.load();
            writeln!(out, "file:         {}", store.path().display())?;
            let shown = display_hotkey(&settings.hotkey);
            writeln!(out, "hotkey:       {} ({})", settings.hotkey, shown)?;
            writeln!(out, "backend:      {} ({})", settings.model.id(), settings.model)?;
            writeln!(out, "temperature:  {}", settings.temperature)?;
            writeln!(out, "alternatives: {}", settings.num_alternatives)?;
            for backend in Backend::ALL {
                let key = settings
                    .api_keys
                    .get(backend)
                    .map(mask_key)
                    .unwrap_or_else(|| "(not set)".to_string());
                writeln!(out, "{:<13} {}", format!("{} key:", backend.credential_key()), key)?;
            }
        }
        SettingsCommand::Set {
            hotkey,
            backend,
            temperature,
            count,
        } => {
            if hotkey.is_none() && backend.is_none() && temperature.is_none() && count.is_none() {
                return Err(CliError::Usage(
                    "Nothing to change. Pass --hotkey, --backend, --temperature or --count"
                        .to_string(),
                ));
            }
            store.update(|s| {
                if let Some(hotkey) = hotkey {
                    s.hotkey = hotkey;
                }
                if let Some(backend) = backend {
                    s.model = backend;
                }
                if let Some(temperature) = temperature {
                    s.temperature = temperature;
                }
                if let Some(count) = count {
                    s.num_alternatives = count;
                }
            })?;
            writeln!(out, "Settings saved to {}", store.path().display())?;
        }
        SettingsCommand::SetKey { backend, key } => {
            let cleared = key.trim().is_empty();
            store.update(|s| s.api_keys.set(backend, Some(key)))?;
            if cleared {
                writeln!(out, "Removed {} key.", backend.credential_key())?;
            } else {
                writeln!(out, "Saved {} key.", backend.credential_key())?;
            }
        }
    }
    Ok(())
}
