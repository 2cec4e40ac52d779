//! プロビジョニングオプション
//!
//! 環境変数などのグローバル状態はここで一度だけ読み取り、
//! 以降は `ProvisionOptions` として明示的に受け渡します。

use super::stage::ResetMode;
use crate::error::{PipelineError, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// DATABASE_URL 未設定時に使われるローカルDB
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///db.sqlite3";

/// collectstatic の最大 verbosity
pub const MAX_COLLECT_VERBOSITY: u8 = 3;

/// 管理者アカウントの初期値
#[derive(Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

/// パイプライン実行時の構成
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// 全ステージの作業ディレクトリ
    pub project_root: PathBuf,
    /// Pythonインタプリタ
    pub python: String,
    /// 依存パッケージのマニフェスト
    pub requirements: PathBuf,
    /// collectstatic の出力先
    pub static_root: PathBuf,
    /// static_root のリセット方式
    pub asset_reset: ResetMode,
    /// collectstatic の verbosity (0-3)
    pub collect_verbosity: u8,
    /// 管理者アカウント（None の場合は作成ステージを追加しない）
    pub admin: Option<AdminAccount>,
    /// 接続先DB（None の場合はローカル SQLite）
    pub database_url: Option<String>,
    /// 全ステージに渡す追加の環境変数（`arbor provision --env KEY=VALUE`）
    ///
    /// 継承した環境変数より優先され、ステージ固有の env より劣後します。
    pub env: BTreeMap<String, String>,
}

impl ProvisionOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            python: "python".to_string(),
            requirements: PathBuf::from("requirements.txt"),
            static_root: PathBuf::from("staticfiles"),
            asset_reset: ResetMode::Remove,
            collect_verbosity: 1,
            admin: None,
            database_url: None,
            env: BTreeMap::new(),
        }
    }

    /// プロセスの環境変数から構成を読み込む
    pub fn from_env(project_root: impl Into<PathBuf>) -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(project_root, &vars)
    }

    /// 与えられた変数テーブルから構成を読み込む
    ///
    /// 読み取るキー:
    /// - ARBOR_PYTHON, ARBOR_REQUIREMENTS, ARBOR_STATIC_ROOT
    /// - ARBOR_ASSET_RESET (remove | clear), ARBOR_COLLECT_VERBOSITY
    /// - DATABASE_URL
    /// - ADMIN_USERNAME, ADMIN_EMAIL, ADMIN_PASSWORD
    pub fn from_vars(
        project_root: impl Into<PathBuf>,
        vars: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut options = Self::new(project_root);
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty());

        if let Some(python) = get("ARBOR_PYTHON") {
            options.python = python.clone();
        }
        if let Some(requirements) = get("ARBOR_REQUIREMENTS") {
            options.requirements = PathBuf::from(requirements);
        }
        if let Some(static_root) = get("ARBOR_STATIC_ROOT") {
            options.static_root = PathBuf::from(static_root);
        }
        if let Some(mode) = get("ARBOR_ASSET_RESET") {
            options.asset_reset = match mode.as_str() {
                "remove" => ResetMode::Remove,
                "clear" => ResetMode::Clear,
                other => {
                    return Err(PipelineError::InvalidConfig(format!(
                        "ARBOR_ASSET_RESET は remove または clear を指定してください: {}",
                        other
                    )));
                }
            };
        }
        if let Some(verbosity) = get("ARBOR_COLLECT_VERBOSITY") {
            options.collect_verbosity = verbosity
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= MAX_COLLECT_VERBOSITY)
                .ok_or_else(|| {
                    PipelineError::InvalidConfig(format!(
                        "ARBOR_COLLECT_VERBOSITY は 0-{} の整数で指定してください: {}",
                        MAX_COLLECT_VERBOSITY, verbosity
                    ))
                })?;
        }

        options.database_url = get("DATABASE_URL").cloned();

        if let Some(password) = get("ADMIN_PASSWORD") {
            options.admin = Some(AdminAccount {
                username: get("ADMIN_USERNAME")
                    .cloned()
                    .unwrap_or_else(|| "admin".to_string()),
                email: get("ADMIN_EMAIL")
                    .cloned()
                    .unwrap_or_else(|| "admin@example.com".to_string()),
                password: password.clone(),
            });
        }

        Ok(options)
    }

    /// ログ表示用のDB接続先（パスワードは伏せ字）
    pub fn database_display(&self) -> String {
        match &self.database_url {
            Some(url) => redact_url(url),
            None => format!("{} (local)", DEFAULT_DATABASE_URL),
        }
    }
}

/// `KEY=VALUE` 形式の環境変数指定を分解
///
/// 値には `=` を含められます。キーは空にできません。
pub fn parse_env_assignment(assignment: &str) -> Result<(String, String)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(PipelineError::InvalidConfig(format!(
            "環境変数は KEY=VALUE 形式で指定してください: {}",
            assignment
        ))),
    }
}

fn redact_url(url: &str) -> String {
    static CREDENTIALS: OnceLock<Regex> = OnceLock::new();
    CREDENTIALS
        .get_or_init(|| Regex::new(r"^([^:/]+://[^:@/]+:)[^@]*(@.*)$").unwrap())
        .replace(url, "${1}****${2}")
        .to_string()
}
