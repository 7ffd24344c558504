use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8000/api/aircraft";
pub const DEFAULT_CONFIG_FILE: &str = "aircraft-panel.toml";
pub const DEFAULT_AUTO_REFRESH_SECS: u64 = 0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 0;
pub const DEFAULT_ALLOW_HTTP: bool = true;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "aircraft-panel.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub auto_refresh: Duration,
    pub timeout: Option<Duration>,
    pub insecure: bool,
    pub allow_http: bool,
    pub allow_insecure: bool,
    pub config_path: PathBuf,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            auto_refresh: Duration::from_secs(DEFAULT_AUTO_REFRESH_SECS),
            timeout: timeout_from_secs(DEFAULT_TIMEOUT_SECS),
            insecure: false,
            allow_http: DEFAULT_ALLOW_HTTP,
            allow_insecure: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            log_enabled: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    url: Option<String>,
    auto_refresh_secs: Option<u64>,
    timeout_secs: Option<u64>,
    insecure: Option<bool>,
    allow_http: Option<bool>,
    allow_insecure: Option<bool>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

/// Resolves the configuration from defaults, the config file, the
/// environment and the command line, in that order.
pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        std::process::exit(0);
    }
    resolve(&args, |key| env::var(key).ok())
}

fn resolve<F>(args: &[String], env_var: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let config_path = explicit_config
        .clone()
        .or_else(|| env_var("AIRPANEL_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config::default();
    if config_path.exists() {
        apply_file_config(&mut config, load_file_config(&config_path)?);
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }
    config.config_path = config_path;

    apply_env(&mut config, &env_var)?;
    apply_args(&mut config, args)?;

    validate(&config)?;
    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(cfg)
}

fn apply_file_config(target: &mut Config, file: FileConfig) {
    if let Some(url) = file.url {
        target.url = url;
    }
    if let Some(secs) = file.auto_refresh_secs {
        target.auto_refresh = Duration::from_secs(secs);
    }
    if let Some(secs) = file.timeout_secs {
        target.timeout = timeout_from_secs(secs);
    }
    if let Some(insecure) = file.insecure {
        target.insecure = insecure;
    }
    if let Some(allow_http) = file.allow_http {
        target.allow_http = allow_http;
    }
    if let Some(allow_insecure) = file.allow_insecure {
        target.allow_insecure = allow_insecure;
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
}

fn apply_env<F>(config: &mut Config, env_var: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env_var("AIRPANEL_URL") {
        config.url = url;
    }
    if let Some(value) = env_var("AIRPANEL_AUTO_REFRESH") {
        let secs = value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid AIRPANEL_AUTO_REFRESH: {value}"))?;
        config.auto_refresh = Duration::from_secs(secs);
    }
    if let Some(value) = env_var("AIRPANEL_TIMEOUT") {
        let secs = value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid AIRPANEL_TIMEOUT: {value}"))?;
        config.timeout = timeout_from_secs(secs);
    }
    if let Some(value) = env_var("AIRPANEL_INSECURE") {
        config.insecure = parse_flag(&value);
    }
    if let Some(value) = env_var("AIRPANEL_ALLOW_HTTP") {
        config.allow_http = parse_flag(&value);
    }
    if let Some(value) = env_var("AIRPANEL_ALLOW_INSECURE") {
        config.allow_insecure = parse_flag(&value);
    }
    if let Some(value) = env_var("AIRPANEL_LOG_ENABLED") {
        config.log_enabled = parse_flag(&value);
    }
    if let Some(value) = env_var("AIRPANEL_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Some(value) = env_var("AIRPANEL_LOG_FILE") {
        config.log_file = value;
    }
    Ok(())
}

fn apply_args(config: &mut Config, args: &[String]) -> Result<()> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                // consumed while locating the config file
                iter.next();
            }
            "--url" => {
                config.url = iter
                    .next()
                    .ok_or_else(|| anyhow!("--url needs a value"))?
                    .to_string();
            }
            "--auto-refresh" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--auto-refresh needs a value"))?;
                config.auto_refresh = Duration::from_secs(value.parse::<u64>()?);
            }
            "--timeout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--timeout needs a value"))?;
                config.timeout = timeout_from_secs(value.parse::<u64>()?);
            }
            "--insecure" => {
                config.insecure = true;
            }
            "--allow-http" => {
                config.allow_http = true;
            }
            "--deny-http" => {
                config.allow_http = false;
            }
            "--allow-insecure" => {
                config.allow_insecure = true;
            }
            "--log" => {
                config.log_enabled = true;
            }
            "--no-log" => {
                config.log_enabled = false;
            }
            "--log-level" => {
                config.log_level = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-level needs a value"))?
                    .to_string();
            }
            "--log-file" => {
                config.log_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file needs a value"))?
                    .to_string();
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

fn print_help() {
    println!("aircraft-panel");
    println!("Usage: aircraft-panel [--url URL] [--auto-refresh SECONDS] [--timeout SECONDS]");
    println!("       [--insecure] [--allow-insecure] [--allow-http] [--deny-http]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH] [--config PATH]");
    println!("Environment: AIRPANEL_URL overrides the aircraft endpoint");
    println!("Environment: AIRPANEL_AUTO_REFRESH sets the auto refresh interval (0 = off)");
    println!("Environment: AIRPANEL_TIMEOUT sets the request timeout (0 = none)");
    println!("Environment: AIRPANEL_INSECURE/ALLOW_INSECURE control TLS verification");
    println!("Environment: AIRPANEL_ALLOW_HTTP allows http:// URLs");
    println!("Environment: AIRPANEL_LOG_ENABLED/LEVEL/FILE configure logging");
    println!("Environment: AIRPANEL_CONFIG overrides config path");
    println!("Keys: r/Enter refresh | up/down scroll | PgUp/PgDn page | q quit");
}

fn validate(config: &Config) -> Result<()> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(anyhow!("No aircraft URL configured"));
    }
    if url.to_ascii_lowercase().starts_with("http://") && !config.allow_http {
        return Err(anyhow!(
            "Refusing insecure http URL (set allow_http=true or AIRPANEL_ALLOW_HTTP=1 to override)"
        ));
    }
    if config.insecure && !config.allow_insecure {
        return Err(anyhow!(
            "Refusing --insecure without explicit allow_insecure=true or AIRPANEL_ALLOW_INSECURE=1"
        ));
    }
    Ok(())
}
