use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug)]
pub enum AppError {
    /// GitHub API関連エラー
    #[error("GitHub API error: {0}")]
    GitHub(#[from] GitHubError),

    /// 設定関連エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// メール送信関連エラー
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Webhook処理エラー
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// ログ初期化エラー
    #[error("Failed to initialize logging: {reason}")]
    Logging { reason: String },

    /// HTTPサーバーエラー
    #[error("Server error: {source}")]
    Server {
        #[source]
        source: std::io::Error,
    },
}

/// GitHub API関連エラー
#[derive(Error, Debug)]
pub enum GitHubError {
    /// HTTPリクエストエラー
    #[error("HTTP request failed: {source}")]
    RequestError {
        #[source]
        source: reqwest::Error,
    },

    /// JSONパースエラー
    #[error("Response parsing failed: {source}")]
    ParseError {
        #[source]
        source: serde_json::Error,
    },

    /// 認証エラー
    #[error("Authentication failed. Please check your GitHub token.")]
    AuthenticationError,

    /// リソースが見つからない
    #[error("Resource not found: {resource_type} {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    /// サーバーエラー
    #[error("GitHub server error: {status} {message}")]
    ServerError { status: u16, message: String },

    /// ネットワークエラー（タイムアウトを含む）
    #[error("Network error: {source}")]
    NetworkError {
        #[source]
        source: reqwest::Error,
    },

    /// APIレスポンスエラー
    #[error("API response error: {message}")]
    ApiError { message: String },
}

/// 設定関連エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定ファイル読み込みエラー
    #[error("Failed to load config file {path}: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 設定ファイルパースエラー
    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    /// 不正なglobパターン
    #[error("Invalid glob pattern {pattern:?} in watch rule {repo:?}: {source}")]
    InvalidPattern {
        repo: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// 必須の環境変数が未設定
    #[error("Required environment variable {name} is not set")]
    MissingEnv { name: &'static str },

    /// 設定バリデーションエラー
    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },
}

/// メール送信関連エラー
#[derive(Error, Debug)]
pub enum MailError {
    /// メールアドレスの形式エラー
    #[error("Invalid email address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// メッセージ組み立てエラー
    #[error("Failed to build email message: {source}")]
    BuildError {
        #[source]
        source: lettre::error::Error,
    },

    /// SMTP送信エラー
    #[error("Failed to send email: {source}")]
    SendError {
        #[source]
        source: lettre::transport::smtp::Error,
    },

    /// 本文テンプレートの読み込みエラー
    #[error("Failed to read body template {path}: {source}")]
    TemplateError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Webhook処理エラー
#[derive(Error, Debug)]
pub enum WebhookError {
    /// 必須ヘッダーが無い
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// 署名が不正
    #[error("invalid request signature")]
    InvalidSignature,

    /// リクエストボディがJSONではない
    #[error("invalid JSON in the request body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// ペイロードに必須フィールドが無い
    #[error("payload is missing required fields: {0}")]
    MissingField(String),

    /// 通知メールの送信に失敗
    #[error("failed to deliver notification: {0}")]
    Delivery(#[from] MailError),
}

impl From<reqwest::Error> for GitHubError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            GitHubError::RequestError { source: error }
        } else {
            GitHubError::NetworkError { source: error }
        }
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(error: serde_json::Error) -> Self {
        GitHubError::ParseError { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(error: lettre::error::Error) -> Self {
        MailError::BuildError { source: error }
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        MailError::SendError { source: error }
    }
}
