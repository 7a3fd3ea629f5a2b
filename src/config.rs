use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// 設定ファイルのパスを指定する環境変数
pub const CONFIG_FILE_ENV: &str = "WATCH_CONFIG_FILE";

/// Webhookサーバー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// バインドするアドレス
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// ポート番号
    #[serde(default = "default_port")]
    pub port: u16,

    /// Webhookを受け付けるパス
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/pull-requests".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// GitHub API設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// APIベースURL（省略可、デフォルト: https://api.github.com）
    #[serde(default = "default_github_api_url")]
    pub api_base_url: String,

    /// リクエストのタイムアウト（秒）
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: u64,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout_sec() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_github_api_url(),
            request_timeout_sec: default_request_timeout_sec(),
        }
    }
}

/// メール送信設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTPサーバーのホスト名
    #[serde(default = "default_mail_server")]
    pub server: String,

    /// SMTPサーバーのポート番号
    #[serde(default = "default_mail_port")]
    pub port: u16,

    /// STARTTLSを使うかどうか
    #[serde(default)]
    pub use_tls: bool,

    /// 送信元アドレス
    #[serde(default)]
    pub default_sender: Option<String>,

    /// SMTP送信のタイムアウト（秒）
    #[serde(default = "default_mail_timeout_sec")]
    pub timeout_sec: u64,
}

fn default_mail_server() -> String {
    "localhost".to_string()
}

fn default_mail_port() -> u16 {
    25
}

fn default_mail_timeout_sec() -> u64 {
    30
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: default_mail_server(),
            port: default_mail_port(),
            use_tls: false,
            default_sender: None,
            timeout_sec: default_mail_timeout_sec(),
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル（省略可、デフォルト: info）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルのパス（省略時は標準エラー出力）
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

/// リポジトリごとの監視ルール
///
/// ```toml
/// [[watch]]
/// repo = "org/*"
/// patterns = ["docs/*"]
/// exclude = ["org/private-*"]
/// recipients = ["docs@example.com"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRuleConfig {
    /// 対象リポジトリ（owner/name 形式、globも可）
    pub repo: String,

    /// 監視するファイルパスのglob
    #[serde(default)]
    pub patterns: Vec<String>,

    /// このルールから除外するリポジトリのglob
    #[serde(default)]
    pub exclude: Vec<String>,

    /// 通知先アドレス（文字列1つ、またはリスト）
    #[serde(deserialize_with = "one_or_many")]
    pub recipients: Vec<String>,

    /// 件名テンプレート（{repo} や {title} などを置換）
    #[serde(default = "default_subject")]
    pub subject: String,

    /// 本文テンプレートファイルのパス（省略時は組み込みの本文）
    #[serde(default)]
    pub body_template: Option<PathBuf>,

    /// ワイルドカードで一致したプライベートリポジトリにも通知するかどうか
    #[serde(default)]
    pub notify_for_private_repos: bool,
}

fn default_subject() -> String {
    "Change in {repo}: {title}".to_string()
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(address) => vec![address],
        OneOrMany::Many(addresses) => addresses,
    })
}

/// メイン設定構造体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Webhookサーバー設定
    #[serde(default)]
    pub server: ServerConfig,

    /// GitHub API設定
    #[serde(default)]
    pub github: GitHubConfig,

    /// メール送信設定
    #[serde(default)]
    pub mail: MailConfig,

    /// ログ設定
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 監視ルール（記述順が優先順位に影響する）
    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

impl Config {
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn webhook_path(&self) -> &str {
        &self.server.webhook_path
    }

    /// 環境変数による上書きを適用
    ///
    /// 元の値より環境変数が優先される（MAIL_SERVER, MAIL_PORT, MAIL_USE_TLS,
    /// MAIL_DEFAULT_SENDER）。
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("MAIL_SERVER").filter(|v| !v.is_empty()) {
            self.mail.server = server;
        }
        if let Some(port) = lookup("MAIL_PORT").filter(|v| !v.is_empty()) {
            self.mail.port = port.parse().map_err(|_| ConfigError::ValidationError {
                reason: format!("MAIL_PORT is not a valid port: {}", port),
            })?;
        }
        if let Some(use_tls) = lookup("MAIL_USE_TLS").filter(|v| !v.is_empty()) {
            self.mail.use_tls = parse_flag(&use_tls);
        }
        if let Some(sender) = lookup("MAIL_DEFAULT_SENDER").filter(|v| !v.is_empty()) {
            self.mail.default_sender = Some(sender);
        }
        Ok(())
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.github.api_base_url).map_err(|e| ConfigError::ValidationError {
            reason: format!("invalid github.api_base_url {:?}: {}", self.github.api_base_url, e),
        })?;

        if !self.server.webhook_path.starts_with('/') {
            return Err(ConfigError::ValidationError {
                reason: format!(
                    "server.webhook_path must start with '/': {:?}",
                    self.server.webhook_path
                ),
            });
        }

        if self.github.request_timeout_sec == 0 || self.mail.timeout_sec == 0 {
            return Err(ConfigError::ValidationError {
                reason: "timeouts must be greater than zero".to_string(),
            });
        }

        for rule in &self.watch {
            if rule.repo.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    reason: "watch rule with an empty repo key".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 環境変数から読み込む秘密情報
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Webhook署名用の共有シークレット
    pub webhook_secret: SecretString,
    /// GitHub APIのアクセストークン
    pub github_token: SecretString,
    /// SMTP認証のユーザー名
    pub mail_username: Option<String>,
    /// SMTP認証のパスワード
    pub mail_password: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .map(SecretString::new)
                .ok_or(ConfigError::MissingEnv { name })
        };

        Ok(Self {
            webhook_secret: required("GITHUB_WEBHOOK_SECRET")?,
            github_token: required("GITHUB_ACCESS_TOKEN")?,
            mail_username: lookup("MAIL_USERNAME").filter(|v| !v.is_empty()),
            mail_password: lookup("MAIL_PASSWORD")
                .filter(|v| !v.is_empty())
                .map(SecretString::new),
        })
    }
}

/// 設定ファイルのパスを決定
///
/// 優先順位: 引数 > WATCH_CONFIG_FILE > 設定ディレクトリ
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("pr-watcher");
    path.push("config.toml");
    path
}

/// 設定ファイルを読み込む
///
/// 環境変数による上書きと検証まで行う。ファイルが無い場合はエラー
/// （監視ルールの無いサービスは意味が無いため）。
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = config_file_path(explicit);

    let contents = fs::read_to_string(&config_path).map_err(|source| ConfigError::LoadError {
        path: config_path.display().to_string(),
        source,
    })?;

    let mut config = parse_config(&contents)?;
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

/// TOML文字列から設定をパース
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(contents)?)
}
