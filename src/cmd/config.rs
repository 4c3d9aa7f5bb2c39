use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};

use crate::config::{DEFAULT_DEPLOY_API_URL, StoredConfig, config_file_path};
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring autotriage.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    let mut delay = cfg.batch_delay_ms.map(|ms| ms.to_string());
    let mut fields = [
        Field::new("Tracker base URL", FieldKind::Url, &mut cfg.tracker_api_url),
        Field::new("Tracker API key", FieldKind::Secret, &mut cfg.tracker_api_key),
        Field::new("Tracker workspace slug", FieldKind::Text, &mut cfg.tracker_workspace),
        Field::new("Tracker project id", FieldKind::Text, &mut cfg.tracker_project_id),
        Field::new("Deployment GraphQL endpoint", FieldKind::Url, &mut cfg.deploy_api_url),
        Field::new("Deployment API token", FieldKind::Secret, &mut cfg.deploy_api_token),
        Field::new("Batch delay in milliseconds", FieldKind::Millis, &mut delay),
    ];

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    for field in &mut fields {
        field.ask(&mut input, &mut output)?;
    }

    cfg.batch_delay_ms = delay
        .map(|raw| {
            raw.parse::<u64>().map_err(|err| {
                AppError::Configuration(format!("invalid batch delay '{raw}': {err}"))
            })
        })
        .transpose()?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Tracker base URL: {}", display_value(&cfg.tracker_api_url));
    println!("Tracker API key: {}", mask_secret(&cfg.tracker_api_key));
    println!("Tracker workspace: {}", display_value(&cfg.tracker_workspace));
    println!("Tracker project: {}", display_value(&cfg.tracker_project_id));
    println!(
        "Deployment endpoint: {}",
        cfg.deploy_api_url.as_deref().unwrap_or(DEFAULT_DEPLOY_API_URL)
    );
    println!("Deployment API token: {}", mask_secret(&cfg.deploy_api_token));
    println!(
        "Batch delay (ms): {}",
        display_value(&cfg.batch_delay_ms.map(|ms| ms.to_string()))
    );

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Secret,
    Url,
    Millis,
}

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Keep,
    Clear,
    Set(String),
}

/// One stored setting the wizard asks about. Answers are validated for the
/// field's kind and re-asked until they pass.
struct Field<'a> {
    label: &'static str,
    kind: FieldKind,
    value: &'a mut Option<String>,
}

impl<'a> Field<'a> {
    fn new(label: &'static str, kind: FieldKind, value: &'a mut Option<String>) -> Self {
        Self { label, kind, value }
    }

    fn ask(&mut self, input: &mut impl BufRead, output: &mut impl Write) -> AppResult<()> {
        loop {
            match (self.value.as_deref(), self.kind) {
                (Some(_), FieldKind::Secret) => write!(output, "{} [****]: ", self.label)?,
                (Some(current), _) => write!(output, "{} [{current}]: ", self.label)?,
                (None, _) => write!(output, "{} (Enter to skip): ", self.label)?,
            }
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }

            match interpret(line.trim(), self.kind) {
                Ok(Answer::Keep) => return Ok(()),
                Ok(Answer::Clear) => {
                    *self.value = None;
                    return Ok(());
                }
                Ok(Answer::Set(value)) => {
                    *self.value = Some(value);
                    return Ok(());
                }
                Err(reason) => writeln!(output, "  {reason}")?,
            }
        }
    }
}

fn interpret(answer: &str, kind: FieldKind) -> Result<Answer, String> {
    match answer {
        "" => return Ok(Answer::Keep),
        "-" => return Ok(Answer::Clear),
        _ => {}
    }

    match kind {
        FieldKind::Text | FieldKind::Secret => Ok(Answer::Set(answer.to_string())),
        FieldKind::Url => {
            if answer.starts_with("https://") || answer.starts_with("http://") {
                Ok(Answer::Set(answer.trim_end_matches('/').to_string()))
            } else {
                Err(format!("'{answer}' is not an http(s) URL"))
            }
        }
        FieldKind::Millis => answer
            .parse::<u64>()
            .map(|ms| Answer::Set(ms.to_string()))
            .map_err(|_| format!("'{answer}' is not a whole number of milliseconds")),
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
