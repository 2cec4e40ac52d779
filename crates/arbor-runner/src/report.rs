//! 実行結果

use serde::Serialize;
use std::time::Duration;

/// 各ステージの結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageOutcome {
    Succeeded { duration: Duration },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub id: String,
    pub label: String,
    pub outcome: StageOutcome,
}

/// パイプライン全体の実行結果（成功時のみ生成される）
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub stages: Vec<StageReport>,
    pub total: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Succeeded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Skipped { .. }))
            .count()
    }
}
