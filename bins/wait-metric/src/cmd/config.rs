use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use serde::Deserialize;

use bench_engine::config::DEFAULT_RESULT_TOPIC;
use bench_engine::RunConfig;

use super::error::WaitError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";
pub const DEFAULT_REST_PROXY_URL: &str = "http://localhost:8082";
pub const DEFAULT_SCHEMA_DIR: &str = "schemas";
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LogKind {
    /// Kafka REST proxy (durable)
    RestProxy,
    /// JSON lines under --log-dir
    File,
    /// In-process only, lost on exit
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub benchmark_id: Option<String>,
    pub query: Option<String>,
    pub expected_value: Option<f64>,
    pub timeout: Option<u64>,
    pub prometheus_url: Option<String>,
    pub schema_dir: Option<PathBuf>,
    pub dashboard_url: Option<String>,
    pub result_topic: Option<String>,
    pub log: Option<LogKind>,
    pub rest_proxy_url: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub http_timeout_secs: Option<u64>,
}

pub fn load_config(path: &str) -> Result<Config, WaitError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| WaitError::Config(format!("cannot read config {path}: {e}")))?;
    parse_config(&content).map_err(|e| WaitError::Config(format!("bad config {path}: {e}")))
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct WaitArgs {
    /// Путь к TOML-конфигу
    #[arg(long, default_value = "wait-metric.toml", env = "WAIT_METRIC_CONFIG")]
    pub config: String,

    /// Идентификатор прогона бенчмарка (ключ записи результата)
    #[arg(long, env = "WAIT_METRIC_BENCHMARK_ID")]
    pub benchmark_id: Option<String>,

    /// PromQL instant query
    #[arg(long, env = "WAIT_METRIC_QUERY")]
    pub query: Option<String>,

    /// Значение, которого должна достичь метрика (точное сравнение)
    #[arg(long, env = "WAIT_METRIC_EXPECTED_VALUE")]
    pub expected_value: Option<f64>,

    /// Таймаут ожидания в секундах
    #[arg(long, env = "WAIT_METRIC_TIMEOUT")]
    pub timeout: Option<u64>,

    #[arg(long, env = "WAIT_METRIC_PROMETHEUS_URL")]
    pub prometheus_url: Option<String>,

    /// Каталог схем: одна поддиректория на топик
    #[arg(long, env = "WAIT_METRIC_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,

    #[arg(long, env = "WAIT_METRIC_DASHBOARD_URL")]
    pub dashboard_url: Option<String>,

    #[arg(long, env = "WAIT_METRIC_RESULT_TOPIC")]
    pub result_topic: Option<String>,

    /// Бэкенд журнала событий
    #[arg(long, value_enum, env = "WAIT_METRIC_LOG")]
    pub log: Option<LogKind>,

    #[arg(long, env = "WAIT_METRIC_REST_PROXY_URL")]
    pub rest_proxy_url: Option<String>,

    /// Каталог для --log file
    #[arg(long, env = "WAIT_METRIC_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Логировать каждый ответ метрики на уровне info
    #[arg(long)]
    pub verbose: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Effective (merged config)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum LogBackend {
    RestProxy { url: String },
    File { dir: PathBuf },
    Memory,
}

/// Итоговая конфигурация после мержа: config.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub run: RunConfig,
    pub prometheus_url: String,
    pub schema_dir: PathBuf,
    pub log: LogBackend,
    pub http_timeout: Duration,
}

impl Effective {
    pub fn new(args: &WaitArgs) -> Result<Self, WaitError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(args, cfg)
    }

    pub fn merge(args: &WaitArgs, cfg: Config) -> Result<Self, WaitError> {
        let benchmark_id = args
            .benchmark_id
            .clone()
            .or(cfg.benchmark_id)
            .ok_or_else(|| missing("benchmark-id"))?;
        let query = args.query.clone().or(cfg.query).ok_or_else(|| missing("query"))?;
        let expected_value = args
            .expected_value
            .or(cfg.expected_value)
            .ok_or_else(|| missing("expected-value"))?;

        let timeout = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(WaitError::Config("--timeout must be greater than zero".into()));
        }

        let log = match args.log.or(cfg.log).unwrap_or(LogKind::RestProxy) {
            LogKind::RestProxy => LogBackend::RestProxy {
                url: args
                    .rest_proxy_url
                    .clone()
                    .or(cfg.rest_proxy_url)
                    .unwrap_or_else(|| DEFAULT_REST_PROXY_URL.into()),
            },
            LogKind::File => LogBackend::File {
                dir: args
                    .log_dir
                    .clone()
                    .or(cfg.log_dir)
                    .ok_or_else(|| WaitError::Config("--log file requires --log-dir".into()))?,
            },
            LogKind::Memory => LogBackend::Memory,
        };

        Ok(Self {
            run: RunConfig {
                benchmark_id,
                query,
                expected_value,
                timeout: Duration::from_secs(timeout),
                result_topic: args
                    .result_topic
                    .clone()
                    .or(cfg.result_topic)
                    .unwrap_or_else(|| DEFAULT_RESULT_TOPIC.into()),
                dashboard_url: args
                    .dashboard_url
                    .clone()
                    .or(cfg.dashboard_url)
                    .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.into()),
                verbose: args.verbose || cfg.verbose.unwrap_or(false),
            },
            prometheus_url: args
                .prometheus_url
                .clone()
                .or(cfg.prometheus_url)
                .unwrap_or_else(|| DEFAULT_PROMETHEUS_URL.into()),
            schema_dir: args
                .schema_dir
                .clone()
                .or(cfg.schema_dir)
                .unwrap_or_else(|| DEFAULT_SCHEMA_DIR.into()),
            log,
            http_timeout: Duration::from_secs(
                cfg.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        })
    }
}

fn missing(flag: &str) -> WaitError {
    WaitError::Config(format!("--{flag} is required (flag, env or config file)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> WaitArgs {
        WaitArgs {
            config: "wait-metric.toml".into(),
            benchmark_id: Some("bench-1".into()),
            query: Some("sum(rows)".into()),
            expected_value: Some(1_000.0),
            ..WaitArgs::default()
        }
    }

    #[test]
    fn defaults_apply() {
        let eff = Effective::merge(&args(), Config::default()).unwrap();
        assert_eq!(eff.run.timeout, Duration::from_secs(600));
        assert_eq!(eff.run.result_topic, "benchmarks.results.v0");
        assert_eq!(eff.run.dashboard_url, DEFAULT_DASHBOARD_URL);
        assert_eq!(eff.prometheus_url, DEFAULT_PROMETHEUS_URL);
        assert_eq!(eff.schema_dir, PathBuf::from("schemas"));
        assert_eq!(eff.log, LogBackend::RestProxy { url: DEFAULT_REST_PROXY_URL.into() });
        assert_eq!(eff.http_timeout, Duration::from_secs(30));
        assert!(!eff.run.verbose);
    }

    #[test]
    fn cli_overrides_file() {
        let cfg = parse_config(
            r#"
            benchmark_id = "from-file"
            timeout = 30
            prometheus_url = "http://prom:9090"
            log = "memory"
            verbose = true
            http_timeout_secs = 5
            "#,
        )
        .unwrap();
        let args = WaitArgs { timeout: Some(60), ..args() };

        let eff = Effective::merge(&args, cfg).unwrap();
        assert_eq!(eff.run.benchmark_id, "bench-1");
        assert_eq!(eff.run.timeout, Duration::from_secs(60));
        assert_eq!(eff.prometheus_url, "http://prom:9090");
        assert_eq!(eff.log, LogBackend::Memory);
        assert!(eff.run.verbose);
        assert_eq!(eff.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn required_values_are_reported() {
        let args = WaitArgs { query: None, ..args() };
        let err = Effective::merge(&args, Config::default()).unwrap_err();
        assert!(err.to_string().contains("--query"), "{err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = WaitArgs { timeout: Some(0), ..args() };
        assert!(matches!(Effective::merge(&args, Config::default()), Err(WaitError::Config(_))));
    }

    #[test]
    fn file_log_needs_a_directory() {
        let args = WaitArgs { log: Some(LogKind::File), ..args() };
        assert!(Effective::merge(&args, Config::default()).is_err());

        let args = WaitArgs { log_dir: Some("/var/lib/bench".into()), ..args };
        let eff = Effective::merge(&args, Config::default()).unwrap();
        assert_eq!(eff.log, LogBackend::File { dir: "/var/lib/bench".into() });
    }

    #[test]
    fn missing_default_file_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = WaitArgs {
            config: dir.path().join("absent.toml").display().to_string(),
            ..args()
        };
        Effective::new(&args).unwrap();
    }

    #[test]
    fn malformed_existing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wait-metric.toml");
        std::fs::write(&path, "timeout = \"soon\"").unwrap();
        let args = WaitArgs { config: path.display().to_string(), ..args() };
        assert!(matches!(Effective::new(&args), Err(WaitError::Config(_))));
    }
}
