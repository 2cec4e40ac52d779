//! パイプライン定義

use super::stage::Stage;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Pipeline - 順序付きステージ列
///
/// 構築時に以下を検証します:
/// - ステージIDが一意であること
/// - requires で参照するステージが必ず先に並んでいること
///
/// 検証済みのステージ列は変更できません。
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self> {
        let pipeline = Self {
            name: name.into(),
            stages,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id.as_str()).collect()
    }

    /// optional なステージを取り除いたパイプラインを返す
    ///
    /// 必須ステージが optional ステージに依存している場合はエラー
    pub fn without_optional(self) -> Result<Self> {
        let stages = self.stages.into_iter().filter(|s| !s.optional).collect();
        Self::new(self.name, stages)
    }

    fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for stage in &self.stages {
            if stage.id.trim().is_empty() {
                return Err(PipelineError::InvalidStage(format!(
                    "ステージIDが空です (label: {})",
                    stage.label
                )));
            }
            if !stage.fail_fast {
                return Err(PipelineError::InvalidStage(format!(
                    "ステージ '{}' の fail-fast は無効にできません",
                    stage.id
                )));
            }

            for requirement in &stage.requires {
                if seen.contains(requirement.as_str()) {
                    continue;
                }
                if self.stages.iter().any(|s| &s.id == requirement) {
                    return Err(PipelineError::OrderViolation {
                        stage: stage.id.clone(),
                        requirement: requirement.clone(),
                    });
                }
                return Err(PipelineError::UnknownRequirement {
                    stage: stage.id.clone(),
                    requirement: requirement.clone(),
                });
            }

            if !seen.insert(stage.id.as_str()) {
                return Err(PipelineError::DuplicateStage(stage.id.clone()));
            }
        }

        Ok(())
    }
}
