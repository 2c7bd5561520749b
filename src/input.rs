//! Provides a means to read, parse and hold configuration options for scans.
use clap::Parser;
use serde_derive::Deserialize;
use std::fs;
use std::path::PathBuf;

const LOWEST_PORT_NUMBER: u16 = 1;
const TOP_PORT_NUMBER: u16 = 65535;

/// The port range scanned when no `--ports` specification is given.
pub const DEFAULT_PORT_SPEC: &str = "1-1024";

/// A deduplicated, ascending sequence of ports to scan.
pub type Ports = Vec<u16>;

/// Parses a port specification string into an ascending, deduplicated port
/// sequence.
///
/// The grammar accepts a single port (`"80"`), an inclusive range
/// (`"8000-8010"`), and comma-separated combinations of both
/// (`"22,80,8000-8010"`). Duplicates across tokens merge silently.
///
/// Fails, naming the offending token, on non-numeric tokens, inverted ranges
/// and any value outside 1-65535. No network activity happens before this
/// validation.
pub fn parse_port_spec(spec: &str) -> Result<Ports, String> {
    let mut ports = Vec::new();

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((lo, hi)) => {
                let lo: u16 = lo.trim().parse().map_err(|_| {
                    format!("invalid start port '{}' in range '{token}'", lo.trim())
                })?;
                let hi: u16 = hi.trim().parse().map_err(|_| {
                    format!("invalid end port '{}' in range '{token}'", hi.trim())
                })?;

                if lo < LOWEST_PORT_NUMBER {
                    return Err(format!(
                        "ports in range '{token}' must be between {LOWEST_PORT_NUMBER} and {TOP_PORT_NUMBER}",
                    ));
                }
                if lo > hi {
                    return Err(format!(
                        "start port {lo} is greater than end port {hi} in range '{token}'",
                    ));
                }

                ports.extend(lo..=hi);
            }
            None => {
                let port: u16 = token
                    .parse()
                    .map_err(|_| format!("invalid port number '{token}'"))?;

                if port < LOWEST_PORT_NUMBER {
                    return Err(format!(
                        "port {port} must be between {LOWEST_PORT_NUMBER} and {TOP_PORT_NUMBER}",
                    ));
                }

                ports.push(port);
            }
        }
    }

    if ports.is_empty() {
        return Err(String::from("no valid ports or ranges provided"));
    }

    ports.sort_unstable();
    ports.dedup();

    Ok(ports)
}

fn parse_timeout_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("invalid seconds value '{value}'"))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("timeout '{value}' must be greater than zero"));
    }

    Ok(seconds)
}

fn parse_delay_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("invalid seconds value '{value}'"))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("delay '{value}' must not be negative"));
    }

    Ok(seconds)
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "portsweep",
    version = env!("CARGO_PKG_VERSION"),
    max_term_width = 120,
    help_template = "{bin} {version}\n{about}\n\nUSAGE:\n    {usage}\n\nOPTIONS:\n{options}",
)]
/// Concurrent TCP connect port scanner.
/// Only scan hosts you are authorized to scan, and keep the pacing delay
/// nonzero to stay polite toward the target.
///
/// Exits 0 when the scan ran to completion, 2 on invalid arguments
/// (including a malformed port specification) and 3 when the target host
/// cannot be resolved.
pub struct Opts {
    /// The host to be scanned: a hostname or an IP literal.
    #[arg(long)]
    pub host: String,

    /// A list of ports and/or inclusive port ranges to be scanned.
    /// Examples: 80 or 22,80,443 or 1-1024 or 22,8000-8010.
    #[arg(short, long, value_parser = parse_port_spec)]
    pub ports: Option<Ports>,

    /// The timeout in seconds before a connection attempt is abandoned.
    #[arg(short, long, default_value = "0.5", value_parser = parse_timeout_seconds)]
    pub timeout: f64,

    /// The maximum number of connection attempts in flight at once.
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Seconds to pause after each completed probe, throttling the scan rate.
    #[arg(short, long, default_value = "0.01", value_parser = parse_delay_seconds)]
    pub delay: f64,

    /// Greppable mode. Only output the final open-port line, no per-probe
    /// progress. Useful for grep or outputting to a file.
    #[arg(short, long)]
    pub greppable: bool,

    /// Accessible mode. Turns off colored output.
    #[arg(long)]
    pub accessible: bool,

    /// A comma-delimited list of DNS resolver IPs used when the system
    /// resolver cannot answer.
    #[arg(long)]
    pub resolver: Option<String>,

    /// Whether to ignore the configuration file or not.
    #[arg(short, long)]
    pub no_config: bool,

    /// Custom path to config file.
    #[arg(short, long, value_parser)]
    pub config_path: Option<PathBuf>,
}

impl Opts {
    /// Reads the command line arguments into an `Opts` struct, filling in the
    /// default port range when none was specified.
    pub fn read() -> Self {
        let mut opts = Self::parse();

        if opts.ports.is_none() {
            opts.ports = parse_port_spec(DEFAULT_PORT_SPEC).ok();
        }

        opts
    }

    /// Merges values found within the user configuration file into the
    /// command line arguments.
    pub fn merge(&mut self, config: &Config) {
        if !self.no_config {
            self.merge_required(config);
            self.merge_optional(config);
        }
    }

    fn merge_required(&mut self, config: &Config) {
        macro_rules! merge_required {
            ($($field: ident),+) => {
                $(
                    if let Some(e) = &config.$field {
                        self.$field = e.clone();
                    }
                )+
            }
        }

        merge_required!(host, timeout, threads, delay, greppable, accessible);
    }

    fn merge_optional(&mut self, config: &Config) {
        macro_rules! merge_optional {
            ($($field: ident),+) => {
                $(
                    if config.$field.is_some() {
                        self.$field = config.$field.clone();
                    }
                )+
            }
        }

        merge_optional!(ports, resolver);
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            host: String::new(),
            ports: None,
            timeout: 0.5,
            threads: 50,
            delay: 0.01,
            greppable: false,
            accessible: false,
            resolver: None,
            no_config: true,
            config_path: None,
        }
    }
}

/// Struct used to deserialize the options specified within our config file.
/// These will be further merged with our command line arguments in order to
/// generate the final `Opts` struct.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    host: Option<String>,
    ports: Option<Vec<u16>>,
    timeout: Option<f64>,
    threads: Option<u16>,
    delay: Option<f64>,
    greppable: Option<bool>,
    accessible: Option<bool>,
    resolver: Option<String>,
}

impl Config {
    /// Reads the configuration file with TOML format and parses it into a
    /// `Config` struct.
    ///
    /// # Format
    ///
    /// host = "127.0.0.1"
    /// ports = [80, 443, 8080]
    /// timeout = 0.5
    /// threads = 50
    /// delay = 0.01
    /// greppable = true
    pub fn read(custom_config_path: Option<PathBuf>) -> Self {
        let mut content = String::new();
        let config_path = custom_config_path.unwrap_or_else(default_config_path);
        if config_path.exists() {
            content = fs::read_to_string(config_path).unwrap_or_default();
        }

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                println!("Found {e} in configuration file.\nAborting scan.\n");
                std::process::exit(1);
            }
        }
    }
}

/// Constructs the default path to the config toml.
pub fn default_config_path() -> PathBuf {
    let Some(mut config_path) = dirs::home_dir() else {
        panic!("Could not infer config file path.");
    };
    config_path.push(".portsweep.toml");
    config_path
}
