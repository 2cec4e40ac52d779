//! プロジェクトルート検出
//!
//! manage.py または provision.kdl を目印にプロジェクトルートを探します。

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// プロジェクトルートの目印となるファイル
const ROOT_MARKERS: [&str; 3] = ["manage.py", "provision.kdl", ".arbor/provision.kdl"];

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 ARBOR_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって目印ファイルを探す
/// 3. 見つからなければカレントディレクトリ
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    // 1. 環境変数
    if let Ok(root) = std::env::var("ARBOR_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking ARBOR_PROJECT_ROOT");
        if path.is_dir() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "ARBOR_PROJECT_ROOT is set but is not a directory");
    }

    // 2. カレントディレクトリから上に向かって探す
    let start_dir = std::env::current_dir()?;
    if let Some(root) = find_project_root_from(&start_dir) {
        return Ok(root);
    }

    // 3. カレントディレクトリをそのまま使う
    debug!(start_dir = %start_dir.display(), "No project marker found, using current directory");
    Ok(start_dir)
}

/// 指定ディレクトリから上方向にプロジェクトルートを探す
pub fn find_project_root_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for project root");

    loop {
        for marker in ROOT_MARKERS {
            if current.join(marker).exists() {
                info!(project_root = %current.display(), marker, "Found project root");
                return Some(current);
            }
        }

        // 親ディレクトリへ
        if !current.pop() {
            break;
        }
    }

    None
}
