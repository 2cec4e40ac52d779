//! ステージ前後のファイルシステム操作

use arbor_core::{FsEffect, ResetMode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// エフェクトをプロジェクトルート基準で適用
///
/// 相対パスは `project_root` からの相対として解決します。
/// 何度適用しても同じ結果になります。
pub fn apply_effect(effect: &FsEffect, project_root: &Path) -> io::Result<()> {
    match effect {
        FsEffect::CreateDir { path } => {
            let target = project_root.join(path);
            debug!(path = %target.display(), "Creating directory");
            fs::create_dir_all(&target)
        }
        FsEffect::Reset { path, mode } => {
            let target = project_root.join(path);
            guard_reset_target(&target, project_root)?;
            debug!(path = %target.display(), mode = %mode, "Resetting directory");
            match mode {
                ResetMode::Remove => reset_remove(&target),
                ResetMode::Clear => reset_clear(&target),
                ResetMode::Selective(patterns) => reset_selective(&target, patterns),
            }
        }
    }
}

/// プロジェクトルート自身やその親をリセット対象にしない
fn guard_reset_target(target: &Path, project_root: &Path) -> io::Result<()> {
    let target = normalize(target);
    let root = normalize(project_root);
    if root.starts_with(&target) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "プロジェクトルートを含むディレクトリはリセットできません: {}",
                target.display()
            ),
        ));
    }
    Ok(())
}

/// `.` と `..` を字句的に解決（ファイルシステムには触れない）
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn reset_remove(target: &Path) -> io::Result<()> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(target)?,
        Ok(_) => fs::remove_file(target)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(target)
}

fn reset_clear(target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(target)? {
        remove_entry(&entry?.path())?;
    }
    Ok(())
}

fn reset_selective(target: &Path, patterns: &[String]) -> io::Result<()> {
    fs::create_dir_all(target)?;

    let base = target.to_str().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("UTF-8 ではないパスです: {}", target.display()),
        )
    })?;
    let base = glob::Pattern::escape(base);

    let mut matched = Vec::new();
    for pattern in patterns {
        let full = format!("{}/{}", base, pattern);
        let paths = glob::glob(&full).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("無効なパターン '{}': {}", pattern, e),
            )
        })?;
        for path in paths {
            matched.push(path.map_err(io::Error::from)?);
        }
    }

    // 深い階層から削除して、親ディレクトリ削除後の二重削除を避ける
    matched.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    matched.dedup();
    for path in matched {
        debug!(path = %path.display(), "Removing matched entry");
        remove_entry(&path)?;
    }
    Ok(())
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
