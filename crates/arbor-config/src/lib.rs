pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};
use tracing::debug;

/// パイプラインファイルを直接指定する環境変数
pub const PIPELINE_ENV: &str = "ARBOR_PIPELINE";

/// 検索するファイル名（優先順）
const CANDIDATES: [&str; 2] = ["provision.local.kdl", "provision.kdl"];

/// Arborの設定ディレクトリ (~/.config/arbor)
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("arbor"))
}

/// パイプラインファイルを決定する
///
/// `explicit` (--file) が指定されていればそれを使い、
/// なければ [`find_pipeline_file`] で自動検出します。
pub fn resolve_pipeline_file(
    explicit: Option<&Path>,
    project_root: &Path,
) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::PipelineFileNotFound(path.to_path_buf())),
        None => find_pipeline_file(project_root),
    }
}

/// プロジェクトの provision.kdl を探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 ARBOR_PIPELINE (直接パス指定、存在しなければエラー)
/// 2. プロジェクトルート: provision.local.kdl, provision.kdl
/// 3. <project_root>/.arbor/ ディレクトリ内: 同様の順序
/// 4. ~/.config/arbor/provision.kdl (グローバル設定)
///
/// どれも見つからなければ `None`（組み込みのデフォルトパイプラインを使う）
pub fn find_pipeline_file(project_root: &Path) -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(pipeline_path) = std::env::var(PIPELINE_ENV)
        && !pipeline_path.is_empty()
    {
        let path = PathBuf::from(pipeline_path);
        if path.exists() {
            debug!(path = %path.display(), "Using pipeline file from ARBOR_PIPELINE");
            return Ok(Some(path));
        }
        return Err(ConfigError::PipelineFileNotFound(path));
    }

    // 2. プロジェクトルートで検索
    if let Some(path) = find_in_dir(project_root) {
        return Ok(Some(path));
    }

    // 3. ./.arbor/ ディレクトリで検索
    let arbor_dir = project_root.join(".arbor");
    if arbor_dir.is_dir()
        && let Some(path) = find_in_dir(&arbor_dir)
    {
        return Ok(Some(path));
    }

    // 4. グローバル設定ファイル (~/.config/arbor/provision.kdl)
    if let Ok(dir) = config_dir() {
        let global = dir.join("provision.kdl");
        if global.exists() {
            debug!(path = %global.display(), "Using global pipeline file");
            return Ok(Some(global));
        }
    }

    debug!("No pipeline file found, falling back to built-in pipeline");
    Ok(None)
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
