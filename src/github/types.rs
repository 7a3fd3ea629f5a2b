use serde::{Deserialize, Serialize};

use crate::errors::WebhookError;
use crate::models::{PullRequestAction, PullRequestEvent};

/// GitHubユーザー情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// ユーザー名
    pub login: String,
}

/// ブランチ情報（base / head）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    /// ブランチ名
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// コミットSHA
    #[serde(default)]
    pub sha: Option<String>,
}

/// プルリクエスト情報（GET /repos/{repo}/pulls/{number}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// プルリクエスト番号
    pub number: u64,
    /// プルリクエストタイトル
    pub title: String,
    /// プルリクエスト作成者
    pub user: User,
    /// プルリクエスト状態（open, closed）
    pub state: String,
    /// マージ済みかどうか
    #[serde(default)]
    pub merged: Option<bool>,
    /// プルリクエストURL
    pub html_url: String,
    /// マージ先ブランチ
    pub base: BranchRef,
}

/// 変更ファイル（pulls/{number}/files と compare の両方で使われる）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    /// ファイルパス
    pub filename: String,
    /// 変更種別（added, modified, removed, renamed ...）
    #[serde(default)]
    pub status: Option<String>,
}

/// 2つのコミット間の比較結果（GET /repos/{repo}/compare/{base}...{head}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// 比較ステータス（ahead, behind, diverged, identical）
    #[serde(default)]
    pub status: Option<String>,
    /// 変更されたファイル
    #[serde(default)]
    pub files: Vec<ChangedFile>,
}

/// Webhookペイロード中のリポジトリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRepository {
    /// リポジトリ名（owner/repo形式）
    pub full_name: String,
    /// プライベートリポジトリかどうか
    pub private: bool,
}

/// `pull_request` イベントのWebhookペイロード
///
/// 必須フィールドのみ型で表現し、それ以外は無視する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestPayload {
    /// アクション（opened, closed, synchronize ...）
    pub action: String,
    /// プルリクエスト番号
    pub number: u64,
    /// リポジトリ
    pub repository: WebhookRepository,
    /// 更新前のHEAD（synchronize のみ）
    #[serde(default)]
    pub before: Option<String>,
    /// イベントを起こしたユーザー
    #[serde(default)]
    pub sender: Option<User>,
}

impl TryFrom<PullRequestPayload> for PullRequestEvent {
    type Error = WebhookError;

    fn try_from(payload: PullRequestPayload) -> Result<Self, Self::Error> {
        let action = match payload.action.as_str() {
            "opened" => PullRequestAction::Opened,
            "closed" => PullRequestAction::Closed,
            "reopened" => PullRequestAction::Reopened,
            "synchronize" => PullRequestAction::Synchronize {
                previous_head: payload
                    .before
                    .ok_or_else(|| WebhookError::MissingField("before".to_string()))?,
            },
            other => PullRequestAction::Other(other.to_string()),
        };

        Ok(PullRequestEvent {
            action,
            repo: payload.repository.full_name,
            number: payload.number,
            is_private: payload.repository.private,
            sender: payload.sender.map(|user| user.login),
        })
    }
}

/// 生のJSONからイベントを組み立てる（必須フィールド欠落は MissingField）
pub fn parse_pull_request_event(
    value: serde_json::Value,
) -> Result<PullRequestEvent, WebhookError> {
    let payload: PullRequestPayload = serde_json::from_value(value)
        .map_err(|e| WebhookError::MissingField(e.to_string()))?;
    payload.try_into()
}
