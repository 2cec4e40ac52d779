//! ステージのコマンド実行
//!
//! `CommandRunner` はシーケンサと実プロセスの境界です。
//! テストでは記録用の実装に差し替えます。

use crate::error::{Result, RunError, SPAWN_FAILURE_CODE};
use arbor_core::{CommandSpec, ProvisionOptions, Stage};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

/// ステージのコマンドを実行するトレイト
///
/// 戻り値はコマンドの終了コード。0 以外はシーケンサがステージ失敗として扱います。
/// 起動自体に失敗した場合は `RunError::StageFailed` を返します。
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, stage: &Stage, options: &ProvisionOptions) -> Result<i32>;
}

/// 子プロセスとしてコマンドを起動するランナー
///
/// 標準入出力は端末をそのまま共有し、出力はバッファしません。
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(stage: &Stage, options: &ProvisionOptions) -> Command {
        let mut cmd = match &stage.command {
            CommandSpec::Exec { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            CommandSpec::Shell { script } => shell_command(script),
        };

        cmd.current_dir(&options.project_root)
            .envs(&options.env)
            .envs(&stage.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, stage: &Stage, options: &ProvisionOptions) -> Result<i32> {
        debug!(
            stage = %stage.id,
            command = %stage.command,
            cwd = %options.project_root.display(),
            "Spawning stage command"
        );

        let status = Self::build_command(stage, options)
            .status()
            .await
            .map_err(|e| {
                warn!(stage = %stage.id, error = %e, "Failed to spawn stage command");
                RunError::StageFailed {
                    id: stage.id.clone(),
                    label: stage.label.clone(),
                    code: SPAWN_FAILURE_CODE,
                    reason: Some(format!("コマンドを起動できません: {}: {}", stage.command, e)),
                }
            })?;

        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[cfg(windows)]
fn shell_command(script: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

/// 終了ステータスを終了コードに変換
///
/// シグナルで終了した場合は 128 + シグナル番号
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
