use agent_recorder::agents::Agent;
use agent_recorder::cast::{format_duration, format_file_size, inspect_file};
use agent_recorder::config::Config;
use agent_recorder::proxy::{ProxyOptions, ProxyWrapper, DEFAULT_PROXY_PORT};
use agent_recorder::pty::{select_shell, PtySize};
use agent_recorder::recorder::{setup_ctrlc_handler, RecordOptions, Session};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Parse and validate a terminal dimension (rows or columns)
fn parse_dimension(s: &str) -> Result<u16, String> {
    let value: u16 = s.parse().map_err(|_| format!("'{}' is not a valid size", s))?;
    if value == 0 {
        return Err("Terminal size must be greater than 0".to_string());
    }
    Ok(value)
}

/// Parse and validate the idle time limit (seconds, > 0)
fn parse_idle_limit(s: &str) -> Result<f64, String> {
    let limit: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !limit.is_finite() || limit <= 0.0 {
        return Err(format!("Idle limit must be greater than 0, got {}", s));
    }
    Ok(limit)
}

/// agent-recorder: Terminal session recorder for AI coding agents
#[derive(Parser)]
#[command(name = "agent-recorder")]
#[command(version, about = "Record agent terminal sessions as asciicast v3")]
#[command(long_about = "Spawn a command under a pseudo-terminal, capture its output \
    with sub-second timing, and save the session in asciicast v3 format for replay. \
    The wrap mode additionally routes a supported AI agent through a mitmproxy \
    capture proxy while recording.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a command's terminal session to a .cast file
    #[command(after_help = "EXAMPLES:
    # Record a command with defaults (session.cast, 80x24 or probed size)
    agent-recorder record -c \"npm test\"

    # Custom output, title and idle cap
    agent-recorder record -c \"cargo build\" -o build.cast -t \"Build\" -i 1.0

    # Fixed geometry
    agent-recorder record -c \"htop\" --cols 120 --rows 40")]
    Record {
        /// Command to record (run as `<shell> -c <command>`)
        #[arg(long, short = 'c')]
        command: String,

        /// Output file path
        #[arg(long, short = 'o', default_value = "session.cast")]
        output: PathBuf,

        /// Recording title
        /// Default: "Agent Session" (or from config file)
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Terminal width in columns
        /// Default: probed from the current terminal, else 80
        #[arg(long, value_parser = parse_dimension)]
        cols: Option<u16>,

        /// Terminal height in rows
        /// Default: probed from the current terminal, else 24
        #[arg(long, value_parser = parse_dimension)]
        rows: Option<u16>,

        /// Maximum recorded interval between events, in seconds
        /// Default: 2.0 (or from config file)
        #[arg(long, short = 'i', value_parser = parse_idle_limit)]
        idle_limit: Option<f64>,

        /// Shell used to run the command (default: $SHELL, else /bin/bash)
        #[arg(long)]
        shell: Option<String>,

        /// Path to a config file (default: ~/.config/agent-recorder/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run an AI agent through the capture proxy while recording its session
    #[command(after_help = "EXAMPLES:
    agent-recorder wrap claude \"Fix the login bug\"
    agent-recorder wrap auggie \"Add user authentication\"

Supported agents: claude, auggie, cursor, copilot, codeium, chatgpt

ENVIRONMENT:
    VERBOSE=1    Show mitmproxy output instead of suppressing it")]
    Wrap {
        /// Agent to run (e.g. claude, auggie, cursor)
        agent: String,

        /// Instruction passed to the agent
        #[arg(required = true, trailing_var_arg = true)]
        instruction: Vec<String>,

        /// Output .cast file (default: <logs-dir>/<agent>-<timestamp>.cast)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Proxy listen port
        #[arg(long)]
        port: Option<u16>,

        /// Path to a config file (default: ~/.config/agent-recorder/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a .cast file and print its metadata
    #[command(after_help = "EXAMPLES:
    agent-recorder inspect session.cast")]
    Inspect {
        /// The .cast file to inspect
        file: PathBuf,
    },
}

/// Load the config file: an explicit --config must exist, the default path
/// falls back to built-in defaults with a warning if unreadable.
fn load_config(explicit: Option<PathBuf>) -> Result<Config, String> {
    match explicit {
        Some(path) => Config::load_from_explicit(path).map_err(|e| e.to_string()),
        None => match Config::load() {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Ok(Config::default())
            }
        },
    }
}

/// Merge geometry: CLI args > config file > probed terminal > built-in defaults
fn resolve_size(
    cols: Option<u16>,
    rows: Option<u16>,
    cfg: &Config,
    probed: Option<PtySize>,
) -> PtySize {
    let defaults = PtySize::default();
    let probed = probed.unwrap_or(defaults);
    PtySize::new(
        rows.or(cfg.recording.rows).unwrap_or(probed.rows),
        cols.or(cfg.recording.cols).unwrap_or(probed.cols),
    )
}

fn print_stats(stats: &agent_recorder::cast::CastStats) {
    println!("\nRecording saved to {}", stats.path.display());
    println!("  Duration: {}", format_duration(stats.duration));
    println!("  File size: {}", format_file_size(stats.size_bytes));
    println!("  Events: {}", stats.events);
    println!("  Format: asciicast v3");
}

#[allow(clippy::too_many_arguments)]
fn run_record(
    command: String,
    output: PathBuf,
    title: Option<String>,
    cols: Option<u16>,
    rows: Option<u16>,
    idle_limit: Option<f64>,
    shell: Option<String>,
    config: Option<PathBuf>,
) -> Result<i32, String> {
    let cfg = load_config(config)?;

    // Probe the invoking terminal once; everything downstream works from values
    let probed = PtySize::probe();
    let size = resolve_size(cols, rows, &cfg, probed);
    let title = title
        .or(cfg.recording.title.clone())
        .unwrap_or_else(|| "Agent Session".to_string());
    let idle_limit = idle_limit.or(cfg.recording.idle_limit).unwrap_or(2.0);
    let shell = select_shell(shell.as_deref().or(cfg.shell.command.as_deref()));

    let mut session = Session::new(RecordOptions {
        output,
        title: title.clone(),
        size,
        idle_limit,
        shell,
        extra_env: Vec::new(),
    });

    println!("Recording: {}", command);
    println!("Output: {}", session.output_path().display());
    println!("Title: {}", title);
    println!("Press Ctrl+C to stop recording\n");

    let exit_code = session.record(&command).map_err(|e| e.to_string())?;
    let stats = session.save().map_err(|e| e.to_string())?;
    print_stats(&stats);

    Ok(exit_code as i32)
}

fn run_wrap(
    agent_name: String,
    instruction: Vec<String>,
    output: Option<PathBuf>,
    port: Option<u16>,
    config: Option<PathBuf>,
) -> Result<i32, String> {
    let agent = Agent::from_name(&agent_name).ok_or_else(|| {
        format!(
            "Unsupported agent '{}'. Supported agents: {}",
            agent_name,
            Agent::supported_list()
        )
    })?;
    let instruction = instruction.join(" ");
    let cfg = load_config(config)?;

    let logs_dir = cfg
        .recording
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("agent-recorder-logs"));
    std::fs::create_dir_all(&logs_dir)
        .map_err(|e| format!("Failed to create logs directory '{}': {}", logs_dir.display(), e))?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let log_file = logs_dir.join(format!("{}-{}.flows", agent.name(), stamp));
    let cast_file =
        output.unwrap_or_else(|| logs_dir.join(format!("{}-{}.cast", agent.name(), stamp)));

    println!("Running {} through the capture proxy", agent.name());
    println!("Instruction: \"{}\"", instruction);
    println!("Recording: {}\n", cast_file.display());

    let proxy = ProxyWrapper::start(ProxyOptions {
        port: port.or(cfg.proxy.port).unwrap_or(DEFAULT_PROXY_PORT),
        log_file,
        verbose: std::env::var("VERBOSE").map(|v| v == "1").unwrap_or(false),
    })
    .map_err(|e| e.to_string())?;
    println!("Network log: {}", proxy.log_file().display());
    let network_log = proxy.log_file().to_path_buf();

    let probed = PtySize::probe();
    let size = resolve_size(None, None, &cfg, probed);
    let shell = select_shell(cfg.shell.command.as_deref());
    let mut session = Session::new(RecordOptions {
        output: cast_file,
        title: format!("{}: {}", agent.name(), instruction),
        size,
        idle_limit: cfg.recording.idle_limit.unwrap_or(2.0),
        shell,
        extra_env: proxy.proxy_env(),
    });

    let record_result = session.record(&agent.command_for(&instruction));

    // The proxy is stopped whether or not the agent ran, so the flow dump
    // is flushed before we report anything
    if let Err(e) = proxy.stop() {
        log::warn!("Failed to stop capture proxy: {}", e);
    }

    let exit_code = record_result.map_err(|e| e.to_string())?;
    let stats = session.save().map_err(|e| e.to_string())?;
    print_stats(&stats);
    println!("  Network capture: {}", network_log.display());

    Ok(exit_code as i32)
}

fn run_inspect(file: &PathBuf) -> Result<(), String> {
    let meta = inspect_file(file).map_err(|e| e.to_string())?;
    println!("{}: valid asciicast v{}", file.display(), meta.version);
    println!("  Terminal: {}x{}", meta.cols, meta.rows);
    if let Some(title) = &meta.title {
        println!("  Title: {}", title);
    }
    if let Some(limit) = meta.idle_time_limit {
        println!("  Idle limit: {}s", limit);
    }
    println!("  Events: {}", meta.events);
    println!("  Duration: {}", format_duration(meta.duration));
    println!("  File size: {}", format_file_size(meta.size_bytes));
    Ok(())
}

fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn main() {
    // Load .env file before anything else
    load_env();

    let cli = Cli::parse();

    if let Err(e) = setup_ctrlc_handler() {
        eprintln!("Warning: Failed to install Ctrl+C handler: {}", e);
    }

    let exit_code = match cli.command {
        Commands::Record {
            command,
            output,
            title,
            cols,
            rows,
            idle_limit,
            shell,
            config,
        } => match run_record(command, output, title, cols, rows, idle_limit, shell, config) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Wrap {
            agent,
            instruction,
            output,
            port,
            config,
        } => match run_wrap(agent, instruction, output, port, config) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Inspect { file } => match run_inspect(&file) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension_valid() {
        assert_eq!(parse_dimension("80"), Ok(80));
    }

    #[test]
    fn test_parse_dimension_rejects_zero() {
        assert!(parse_dimension("0").is_err());
        assert!(parse_dimension("abc").is_err());
    }

    #[test]
    fn test_parse_idle_limit_valid() {
        assert_eq!(parse_idle_limit("2.0"), Ok(2.0));
        assert_eq!(parse_idle_limit("0.5"), Ok(0.5));
    }

    #[test]
    fn test_parse_idle_limit_rejects_nonpositive() {
        assert!(parse_idle_limit("0").is_err());
        assert!(parse_idle_limit("-1").is_err());
        assert!(parse_idle_limit("inf").is_err());
    }

    #[test]
    fn test_resolve_size_cli_wins() {
        let cfg = Config::default();
        let probed = Some(PtySize::new(50, 200));
        let size = resolve_size(Some(100), Some(30), &cfg, probed);
        assert_eq!(size.cols, 100);
        assert_eq!(size.rows, 30);
    }

    #[test]
    fn test_resolve_size_probe_beats_defaults() {
        let cfg = Config::default();
        let size = resolve_size(None, None, &cfg, Some(PtySize::new(50, 200)));
        assert_eq!(size.cols, 200);
        assert_eq!(size.rows, 50);
    }

    #[test]
    fn test_resolve_size_falls_back_to_defaults() {
        let cfg = Config::default();
        let size = resolve_size(None, None, &cfg, None);
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
    }
}
