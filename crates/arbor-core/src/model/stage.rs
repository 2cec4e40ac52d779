//! ステージ定義

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// ステージ定義
///
/// KDL形式：
/// ```kdl
/// stage "collect-static" label="静的ファイル収集" {
///     reset "staticfiles" mode="clear"
///     run "python" "manage.py" "collectstatic" "--noinput"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// ステージID（--skip や requires で使用）
    pub id: String,
    /// 表示用ラベル
    pub label: String,
    /// 実行するコマンド
    pub command: CommandSpec,
    /// 失敗時にパイプラインを中断するか（常に true）
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
    /// コマンド実行前のファイルシステム操作
    #[serde(default)]
    pub before: Vec<FsEffect>,
    /// コマンド実行後のファイルシステム操作
    #[serde(default)]
    pub after: Vec<FsEffect>,
    /// ステージ固有の環境変数（継承した環境に上書き）
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// 先に成功している必要があるステージ
    #[serde(default)]
    pub requires: Vec<String>,
    /// --no-admin 等で除外できる末尾ステージか
    #[serde(default)]
    pub optional: bool,
}

fn default_fail_fast() -> bool {
    true
}

impl Stage {
    pub fn new(id: impl Into<String>, label: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            command,
            fail_fast: true,
            before: Vec::new(),
            after: Vec::new(),
            env: BTreeMap::new(),
            requires: Vec::new(),
            optional: false,
        }
    }

    pub fn before(mut self, effect: FsEffect) -> Self {
        self.before.push(effect);
        self
    }

    pub fn after(mut self, effect: FsEffect) -> Self {
        self.after.push(effect);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn requires(mut self, stage_id: impl Into<String>) -> Self {
        self.requires.push(stage_id.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommandSpec {
    /// シェルを介さずに直接起動
    Exec {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// `sh -c` (Windowsでは `cmd /C`) で実行
    Shell { script: String },
}

impl CommandSpec {
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(script: impl Into<String>) -> Self {
        Self::Shell {
            script: script.into(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
                    } else {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
            Self::Shell { script } => write!(f, "sh -c '{}'", script.replace('\'', "'\\''")),
        }
    }
}

/// ステージ前後のファイルシステム操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum FsEffect {
    /// ディレクトリ作成（mkdir -p）
    CreateDir { path: PathBuf },
    /// 出力ディレクトリを初期化して古い成果物を残さない
    Reset {
        path: PathBuf,
        #[serde(default)]
        mode: ResetMode,
    },
}

impl fmt::Display for FsEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path } => write!(f, "mkdir {}", path.display()),
            Self::Reset { path, mode } => write!(f, "reset {} ({})", path.display(), mode),
        }
    }
}

/// 出力ディレクトリのリセット方式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// ディレクトリごと再帰削除して作り直す
    #[default]
    Remove,
    /// ディレクトリは残して中身だけ削除
    Clear,
    /// パターンに一致するエントリのみ削除
    Selective(Vec<String>),
}

impl ResetMode {
    /// `mode="..."` の値からリセット方式を決定
    ///
    /// `selective` の場合はパターンが1つ以上必要
    pub fn parse(name: &str, patterns: Vec<String>) -> Result<Self> {
        match name {
            "remove" => Ok(Self::Remove),
            "clear" => Ok(Self::Clear),
            "selective" if !patterns.is_empty() => Ok(Self::Selective(patterns)),
            "selective" => Err(PipelineError::InvalidStage(
                "mode=\"selective\" には削除対象のパターンが必要です".to_string(),
            )),
            other => Err(PipelineError::InvalidStage(format!(
                "不明なリセット方式: {} (remove, clear, selective のいずれか)",
                other
            ))),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Clear => write!(f, "clear"),
            Self::Selective(patterns) => write!(f, "selective: {}", patterns.join(", ")),
        }
    }
}
