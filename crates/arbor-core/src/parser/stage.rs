//! ステージノードのパース

use super::{first_string, positional, property, value_to_string};
use crate::error::{PipelineError, Result};
use crate::model::{CommandSpec, FsEffect, ResetMode, Stage};
use crate::template::Variables;
use kdl::KdlNode;
use std::path::PathBuf;
use tracing::warn;

/// stage ノードをパース
///
/// 子ノード:
/// - `run "program" "arg"...` / `shell "script"`（どちらか一方が必須）
/// - `reset "path" mode="remove|clear|selective" "pattern"...`
/// - `mkdir "path"`
/// - `requires "stage-id"...`
/// - `env { KEY "value" }`
/// - `label "..."`
///
/// reset / mkdir は `when="after"` でコマンド実行後に適用されます。
pub fn parse_stage(node: &KdlNode, variables: &Variables) -> Result<Stage> {
    let id = first_string(node)
        .ok_or_else(|| PipelineError::InvalidStage("stage にはIDが必要です".to_string()))?
        .to_string();

    let mut label = property(node, "label")
        .and_then(|v| v.as_string())
        .map(|s| variables.expand(s));
    let optional = bool_property(node, "optional", &id)?.unwrap_or(false);
    let fail_fast = bool_property(node, "fail-fast", &id)?.unwrap_or(true);

    let mut command: Option<CommandSpec> = None;
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut stage_env = Vec::new();
    let mut requires = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "label" => {
                    label = first_string(child).map(|s| variables.expand(s));
                }
                "run" => {
                    if command.is_some() {
                        return Err(PipelineError::ConflictingCommand(id));
                    }
                    let mut argv = string_args(child, &id, variables)?.into_iter();
                    let program = argv.next().ok_or_else(|| {
                        PipelineError::InvalidStage(format!(
                            "ステージ '{}' の run にはプログラム名が必要です",
                            id
                        ))
                    })?;
                    command = Some(CommandSpec::Exec {
                        program,
                        args: argv.collect(),
                    });
                }
                "shell" => {
                    if command.is_some() {
                        return Err(PipelineError::ConflictingCommand(id));
                    }
                    let script = first_string(child).ok_or_else(|| {
                        PipelineError::InvalidStage(format!(
                            "ステージ '{}' の shell にはコマンド文字列が必要です",
                            id
                        ))
                    })?;
                    command = Some(CommandSpec::shell(variables.expand(script)));
                }
                "reset" | "mkdir" => {
                    let effect = parse_effect(child, &id, variables)?;
                    match property(child, "when").and_then(|v| v.as_string()) {
                        None | Some("before") => before.push(effect),
                        Some("after") => after.push(effect),
                        Some(other) => {
                            return Err(PipelineError::InvalidStage(format!(
                                "ステージ '{}': when には before か after を指定してください ({})",
                                id, other
                            )));
                        }
                    }
                }
                "requires" => {
                    requires.extend(string_args(child, &id, variables)?);
                }
                "env" => {
                    if let Some(vars) = child.children() {
                        for var in vars.nodes() {
                            let key = var.name().value().to_string();
                            let value = positional(var)
                                .into_iter()
                                .next()
                                .and_then(value_to_string)
                                .map(|v| variables.expand(&v))
                                .unwrap_or_default();
                            stage_env.push((key, value));
                        }
                    }
                }
                other => {
                    warn!(stage = %id, node = %other, "Unknown stage child ignored");
                }
            }
        }
    }

    let command = command.ok_or_else(|| PipelineError::MissingCommand(id.clone()))?;

    let mut stage = Stage::new(id.clone(), label.unwrap_or(id), command);
    stage.fail_fast = fail_fast;
    stage.optional = optional;
    stage.before = before;
    stage.after = after;
    stage.env.extend(stage_env);
    stage.requires = requires;

    Ok(stage)
}

/// reset / mkdir ノードを FsEffect に変換
fn parse_effect(node: &KdlNode, stage_id: &str, variables: &Variables) -> Result<FsEffect> {
    let kind = node.name().value();
    let mut args = string_args(node, stage_id, variables)?.into_iter();
    let path = args.next().map(PathBuf::from).ok_or_else(|| {
        PipelineError::InvalidStage(format!(
            "ステージ '{}' の {} にはパスが必要です",
            stage_id, kind
        ))
    })?;

    if kind == "mkdir" {
        return Ok(FsEffect::CreateDir { path });
    }

    let patterns: Vec<String> = args.collect();
    let mode_name = match property(node, "mode").and_then(|v| v.as_string()) {
        Some(mode) => mode,
        None if !patterns.is_empty() => "selective",
        None => "remove",
    };
    let mode = ResetMode::parse(mode_name, patterns)
        .map_err(|e| PipelineError::InvalidStage(format!("ステージ '{}': {}", stage_id, e)))?;

    Ok(FsEffect::Reset { path, mode })
}

/// 位置引数をすべて文字列として取得し、プレースホルダを展開
fn string_args(node: &KdlNode, stage_id: &str, variables: &Variables) -> Result<Vec<String>> {
    positional(node)
        .into_iter()
        .map(|v| {
            value_to_string(v)
                .map(|s| variables.expand(&s))
                .ok_or_else(|| {
                    PipelineError::InvalidStage(format!(
                        "ステージ '{}' の {} に null は指定できません",
                        stage_id,
                        node.name().value()
                    ))
                })
        })
        .collect()
}

fn bool_property(node: &KdlNode, key: &str, stage_id: &str) -> Result<Option<bool>> {
    match property(node, key) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).ok_or_else(|| {
            PipelineError::InvalidStage(format!(
                "ステージ '{}' の {} には #true か #false を指定してください",
                stage_id, key
            ))
        }),
    }
}
