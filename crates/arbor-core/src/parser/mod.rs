//! KDLパーサー
//!
//! provision.kdl をパースして Pipeline を生成します。
//! stage ノードのパース処理はモジュールに分離されています。

mod stage;

use stage::parse_stage;

use crate::error::{PipelineError, Result};
use crate::model::Pipeline;
use crate::template::Variables;
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// KDLファイルをパースしてPipelineを生成
///
/// `{{ env.NAME }}` はプロセスの環境変数から展開されます。
pub fn parse_pipeline_file<P: AsRef<Path>>(path: P) -> Result<Pipeline> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PipelineError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let env: HashMap<String, String> = std::env::vars().collect();
    parse_pipeline_str_with_env(&content, name, env)
}

/// KDL文字列をパース
pub fn parse_pipeline_str(content: &str, default_name: String) -> Result<Pipeline> {
    let env: HashMap<String, String> = std::env::vars().collect();
    parse_pipeline_str_with_env(content, default_name, env)
}

/// 環境変数テーブルを指定してKDL文字列をパース
pub fn parse_pipeline_str_with_env(
    content: &str,
    default_name: String,
    env: HashMap<String, String>,
) -> Result<Pipeline> {
    let doc: KdlDocument = content.parse()?;

    let mut name = default_name;
    let mut variables = Variables::new(env);

    // stage より先に project / variables を確定させる
    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(project_name) = first_string(node) {
                    name = project_name.to_string();
                }
            }
            "variables" => {
                if let Some(vars) = node.children() {
                    for var in vars.nodes() {
                        let key = var.name().value().to_string();
                        let value = positional(var)
                            .first()
                            .and_then(|v| value_to_string(v))
                            .unwrap_or_default();
                        variables.insert(key, value);
                    }
                }
            }
            _ => {}
        }
    }

    let mut stages = Vec::new();
    for node in doc.nodes() {
        match node.name().value() {
            "stage" => {
                let stage = parse_stage(node, &variables)?;
                debug!(stage = %stage.id, "Parsed stage");
                stages.push(stage);
            }
            "project" | "variables" => {}
            other => {
                warn!(node = %other, "Unknown top-level node ignored");
            }
        }
    }

    Pipeline::new(name, stages)
}

/// 位置引数（名前なしエントリ）を取得
pub(crate) fn positional(node: &KdlNode) -> Vec<&KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
        .collect()
}

/// プロパティ（key=value）を取得
pub(crate) fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

pub(crate) fn first_string(node: &KdlNode) -> Option<&str> {
    positional(node).into_iter().next().and_then(|v| v.as_string())
}

/// スカラー値を文字列化（null は None）
pub(crate) fn value_to_string(value: &KdlValue) -> Option<String> {
    if let Some(s) = value.as_string() {
        Some(s.to_string())
    } else if let Some(i) = value.as_integer() {
        Some(i.to_string())
    } else if let Some(f) = value.as_float() {
        Some(f.to_string())
    } else {
        value.as_bool().map(|b| b.to_string())
    }
}

#[cfg(test)]
mod tests;
