use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use teaser_core::{
    ClientConfig, GenerationRequest, LoginRequest, Method, SessionStore, SignupRequest,
    SourceKind, TeaserClient, TeaserError, VideoFile, format_history_readable,
    format_result_readable, get_config_path, get_session_path,
};

/// CLI wrapper for Method enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliMethod {
    #[default]
    LearningA,
    LearningB,
    CinematicA,
    Gemini,
}

impl From<CliMethod> for Method {
    fn from(cli: CliMethod) -> Self {
        match cli {
            CliMethod::LearningA => Method::LearningA,
            CliMethod::LearningB => Method::LearningB,
            CliMethod::CinematicA => Method::CinematicA,
            CliMethod::Gemini => Method::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "teaser")]
#[command(about = "Generate short video teasers from YouTube URLs or local video files")]
struct Cli {
    /// Base URL of the teaser service
    #[arg(long, global = true, env = "TEASER_API_URL")]
    api_url: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session file (defaults to the platform data dir)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a teaser from a YouTube URL or an uploaded file
    Generate {
        /// YouTube video URL
        #[arg(short, long)]
        youtube: Option<String>,

        /// Local video file to upload
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Excerpt selection method
        #[arg(short, long, value_enum, default_value = "learning-a")]
        method: CliMethod,

        /// Maximum teaser length in seconds (10-300)
        #[arg(long, default_value_t = 70)]
        max_length: u32,

        /// Minimum teaser length in seconds (5-120)
        #[arg(long, default_value_t = 60)]
        min_length: u32,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "TEASER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "TEASER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show previously generated teasers, newest first
    History {
        /// Print the raw entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the saved session
    Logout,
    /// Check that the service is up
    Health,
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "teaser_core=debug,teaser=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => {
            let term = Term::stderr();
            term.write_str("Password: ")?;
            Ok(term.read_secure_line()?)
        }
    }
}

fn done(msg: impl std::fmt::Display) -> String {
    format!("{} {}", style("✓").green().bold(), msg)
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(get_config_path);
    let config = ClientConfig::load(&config_path)
        .await?
        .with_base_url(cli.api_url);
    debug!(path = %config_path.display(), base_url = %config.base_url, "config loaded");

    let client = TeaserClient::from_config(&config)?;
    let sessions = SessionStore::new(cli.session_file.unwrap_or_else(get_session_path));

    match cli.command {
        Command::Generate {
            youtube,
            file,
            method,
            max_length,
            min_length,
            json,
        } => {
            let video_file = match &file {
                Some(path) => Some(
                    VideoFile::from_path(path, client.max_upload_bytes())
                        .await
                        .with_context(|| format!("cannot upload {}", path.display()))?,
                ),
                None => None,
            };
            let request = GenerationRequest {
                source: if file.is_some() {
                    SourceKind::Upload
                } else {
                    SourceKind::Youtube
                },
                youtube_url: youtube,
                video_file,
                method: method.into(),
                max_length,
                min_length,
            };
            let session = sessions.load().await?;

            println!(
                "\n{}  {}\n",
                style("teaser").cyan().bold(),
                style("Teaser Generator").dim()
            );

            let started = Instant::now();
            let method: Method = method.into();
            let spinner = create_spinner(&format!(
                "Generating teaser with {}...",
                method.display_name()
            ))?;
            let result = match client.submit(request, session.as_ref()).await {
                Ok(result) => result,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            spinner.finish_with_message(done(format!(
                "Teaser generated {}",
                style(format!("[{}]", format_duration(started.elapsed()))).dim()
            )));

            println!("{}", style("─".repeat(60)).dim());
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", format_result_readable(&result));
            }
        }
        Command::Login { email, password } => {
            let password = read_password(password)?;
            let outcome = client.login(&LoginRequest::new(email, password)).await?;
            sessions.save(&outcome.session).await?;
            println!(
                "{}",
                done(outcome.message.as_deref().unwrap_or("Logged in"))
            );
            println!(
                "{} {}",
                style("Session saved:").dim(),
                style(sessions.path().display()).cyan()
            );
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let password = read_password(password)?;
            client
                .signup(&SignupRequest::new(username, email, password))
                .await?;
            println!("{}", done("Account created, you can now log in"));
        }
        Command::History { json } => {
            let session = sessions
                .load()
                .await?
                .context("not logged in, run `teaser login` first")?;
            let spinner = create_spinner("Loading history...")?;
            let history = client.fetch_history(&session).await;
            spinner.finish_and_clear();
            let history = history?;

            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                println!("{}", format_history_readable(&history));
            }
        }
        Command::Logout => {
            if sessions.clear().await? {
                println!("{}", done("Logged out"));
            } else {
                println!("{}", style("No saved session").dim());
            }
        }
        Command::Health => {
            let status = client.health().await?;
            println!("{}", done(format!("{} is {}", client.base_url(), status)));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        let message = match e.downcast_ref::<TeaserError>() {
            Some(TeaserError::RequestRejected { status, detail }) => {
                format!("{detail} {}", style(format!("(HTTP {status})")).dim())
            }
            _ => format!("{e:#}"),
        };
        eprintln!("{} {}", style("Error:").red().bold(), message);
        std::process::exit(1);
    }
}
