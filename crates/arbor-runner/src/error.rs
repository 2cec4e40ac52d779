use thiserror::Error;

/// スポーン自体に失敗したときの終了コード（シェルの慣例）
pub const SPAWN_FAILURE_CODE: i32 = 127;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("ステージ '{label}' ({id}) が失敗しました (exit {code}){}", reason_suffix(.reason))]
    StageFailed {
        id: String,
        label: String,
        code: i32,
        reason: Option<String>,
    },

    #[error(
        "ステージ '{skipped}' はスキップできません: '{required_by}' が requires で指定しています\nヒント: --skip に '{required_by}' も追加するか、'{skipped}' をスキップ対象から外してください"
    )]
    SkipBreaksRequirement {
        skipped: String,
        required_by: String,
    },

    #[error("ステージ '{id}' は存在しません\n利用可能なステージ: {available}")]
    UnknownStage { id: String, available: String },
}

impl RunError {
    /// プロセスの終了コードとして使う値
    ///
    /// ステージ失敗時はそのステージの終了コード、それ以外は 1
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!("\n理由: {}", r))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, RunError>;
