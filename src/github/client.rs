use crate::config::GitHubConfig;
use crate::errors::GitHubError;
use crate::github::types::*;
use crate::models::PullRequestDetails;
use crate::traits::CodeHost;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// pulls/{number}/files の1ページあたりの件数
const FILES_PER_PAGE: usize = 100;

/// GitHubが返すファイル一覧の上限（3000件 = 30ページ）
const MAX_FILE_PAGES: usize = 30;

/// GitHub APIクライアント
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    token: SecretString,
}

impl GitHubClient {
    /// 新しいGitHubクライアントを作成
    ///
    /// タイムアウトは設定値を使い、リトライは行わない。
    pub fn new(config: GitHubConfig, token: SecretString) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .user_agent(format!("pr-watcher/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .build()
            .map_err(|e| GitHubError::NetworkError { source: e })?;

        Ok(GitHubClient {
            client,
            config,
            token,
        })
    }

    /// APIベースURLを取得
    pub fn get_api_base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    /// プルリクエストを取得
    pub async fn fetch_pull_request(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        let url = format!("{}/repos/{}/pulls/{}", self.get_api_base_url(), repo, number);
        self.get_json(&url, "pull_request", &format!("{}#{}", repo, number))
            .await
    }

    /// プルリクエストの変更ファイルをすべて取得（ページング対応）
    pub async fn fetch_pull_request_files(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        let mut files = Vec::new();

        for page in 1..=MAX_FILE_PAGES {
            let url = format!(
                "{}/repos/{}/pulls/{}/files?per_page={}&page={}",
                self.get_api_base_url(),
                repo,
                number,
                FILES_PER_PAGE,
                page
            );
            let batch: Vec<ChangedFile> = self
                .get_json(&url, "pull_request_files", &format!("{}#{}", repo, number))
                .await?;
            let last_page = batch.len() < FILES_PER_PAGE;
            files.extend(batch);
            if last_page {
                break;
            }
        }

        debug!("{}#{} changes {} files", repo, number, files.len());
        Ok(files)
    }

    /// 2つのコミット（またはブランチ）を比較
    pub async fn compare(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Comparison, GitHubError> {
        let url = format!(
            "{}/repos/{}/compare/{}...{}",
            self.get_api_base_url(),
            repo,
            base,
            head
        );
        self.get_json(&url, "comparison", &format!("{}:{}...{}", repo, base, head))
            .await
    }

    /// GETしてJSONとしてデシリアライズ
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<T, GitHubError> {
        let response = self
            .client
            .get(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let text = response.text().await?;
                Ok(serde_json::from_str(&text)?)
            }
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound {
                resource_type: resource_type.to_string(),
                resource_id: resource_id.to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(GitHubError::AuthenticationError),
            StatusCode::FORBIDDEN => {
                let text = response.text().await?;
                if text.contains("Bad credentials") || text.contains("Invalid token") {
                    Err(GitHubError::AuthenticationError)
                } else {
                    Err(GitHubError::ApiError { message: text })
                }
            }
            _ => Err(self.handle_error_response(response).await),
        }
    }

    /// エラーレスポンスを処理
    async fn handle_error_response(&self, response: Response) -> GitHubError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        GitHubError::ServerError {
            status: status.as_u16(),
            message: text,
        }
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn get_pull_request(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestDetails, GitHubError> {
        let pr = self.fetch_pull_request(repo, number).await?;
        let files = self.fetch_pull_request_files(repo, number).await?;

        Ok(PullRequestDetails {
            title: pr.title,
            files: files.into_iter().map(|f| f.filename).collect(),
            base_branch: pr.base.ref_name,
            merged: pr.merged.unwrap_or(false),
            creator: pr.user.login,
            html_url: pr.html_url,
        })
    }

    async fn get_files_changed_between(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, GitHubError> {
        let comparison = self.compare(repo, base, head).await?;
        Ok(comparison.files.into_iter().map(|f| f.filename).collect())
    }
}
