use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "指定されたパイプラインファイルが見つかりません: {0}\nヒント: --file または ARBOR_PIPELINE のパスを確認してください（未指定なら provision.kdl を自動検出します）"
    )]
    PipelineFileNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
