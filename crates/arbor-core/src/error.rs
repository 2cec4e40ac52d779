use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("無効なステージ定義: {0}")]
    InvalidStage(String),

    #[error("ステージ '{0}' が重複して定義されています")]
    DuplicateStage(String),

    #[error("ステージ '{stage}' が未定義のステージ '{requirement}' を requires に指定しています")]
    UnknownRequirement { stage: String, requirement: String },

    #[error(
        "ステージ '{stage}' は '{requirement}' より後に配置する必要があります\nヒント: requires で指定したステージはパイプライン上で先に定義してください"
    )]
    OrderViolation { stage: String, requirement: String },

    #[error("ステージ '{0}' にコマンドが指定されていません (run または shell が必要です)")]
    MissingCommand(String),

    #[error("ステージ '{0}' に run と shell が両方指定されています")]
    ConflictingCommand(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
