//! Fail-fast シーケンサ
//!
//! ステージを定義順に1つずつ実行し、最初の失敗で残りをすべて打ち切ります。
//! リトライやロールバックは行いません。

use crate::effect::apply_effect;
use crate::error::{Result, RunError};
use crate::report::{RunReport, StageOutcome, StageReport};
use crate::runner::CommandRunner;
use arbor_core::{FsEffect, Pipeline, ProvisionOptions, Stage};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// 進捗の通知先（CLI のロガーなど）
pub trait PipelineObserver {
    fn stage_started(&mut self, _index: usize, _total: usize, _stage: &Stage) {}
    fn stage_succeeded(&mut self, _stage: &Stage, _duration: Duration) {}
    fn stage_failed(&mut self, _stage: &Stage, _error: &RunError) {}
    fn stage_skipped(&mut self, _stage: &Stage, _reason: &str) {}
}

/// 何もしないオブザーバー
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

const SKIP_REASON: &str = "--skip で指定";

#[derive(Debug, Default, Clone)]
pub struct Sequencer {
    skip: BTreeSet<String>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 実行しないステージを指定
    pub fn skip<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn is_skipped(&self, id: &str) -> bool {
        self.skip.contains(id)
    }

    /// 実行前チェック
    ///
    /// - スキップ指定されたIDがパイプラインに存在すること
    /// - スキップしないステージの requires 先がスキップされていないこと
    pub fn check(&self, pipeline: &Pipeline) -> Result<()> {
        for id in &self.skip {
            if pipeline.get(id).is_none() {
                return Err(RunError::UnknownStage {
                    id: id.clone(),
                    available: pipeline.stage_ids().join(", "),
                });
            }
        }

        for stage in pipeline.stages() {
            if self.is_skipped(&stage.id) {
                continue;
            }
            if let Some(required) = stage.requires.iter().find(|r| self.is_skipped(r)) {
                return Err(RunError::SkipBreaksRequirement {
                    skipped: required.clone(),
                    required_by: stage.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// パイプラインを実行
    ///
    /// すべてのステージが成功した場合のみ `RunReport` を返します。
    /// 失敗したステージ以降は一切実行されません。
    pub async fn run<R, O>(
        &self,
        pipeline: &Pipeline,
        options: &ProvisionOptions,
        runner: &R,
        observer: &mut O,
    ) -> Result<RunReport>
    where
        R: CommandRunner,
        O: PipelineObserver,
    {
        self.check(pipeline)?;

        let started = Instant::now();
        let total = pipeline.len();
        let mut stages = Vec::with_capacity(total);

        info!(
            pipeline = pipeline.name(),
            stages = total,
            project_root = %options.project_root.display(),
            "Pipeline started"
        );

        for (index, stage) in pipeline.stages().iter().enumerate() {
            if self.is_skipped(&stage.id) {
                info!(stage = %stage.id, "Stage skipped");
                observer.stage_skipped(stage, SKIP_REASON);
                stages.push(StageReport {
                    id: stage.id.clone(),
                    label: stage.label.clone(),
                    outcome: StageOutcome::Skipped {
                        reason: SKIP_REASON.to_string(),
                    },
                });
                continue;
            }

            observer.stage_started(index + 1, total, stage);
            info!(stage = %stage.id, label = %stage.label, "Stage started");
            let stage_start = Instant::now();

            if let Err(e) = run_stage(stage, options, runner).await {
                error!(stage = %stage.id, code = e.exit_code(), "Stage failed");
                observer.stage_failed(stage, &e);
                return Err(e);
            }

            let duration = stage_start.elapsed();
            info!(stage = %stage.id, elapsed_ms = duration.as_millis() as u64, "Stage succeeded");
            observer.stage_succeeded(stage, duration);
            stages.push(StageReport {
                id: stage.id.clone(),
                label: stage.label.clone(),
                outcome: StageOutcome::Succeeded { duration },
            });
        }

        Ok(RunReport {
            pipeline: pipeline.name().to_string(),
            stages,
            total: started.elapsed(),
        })
    }
}

async fn run_stage<R: CommandRunner>(
    stage: &Stage,
    options: &ProvisionOptions,
    runner: &R,
) -> Result<()> {
    apply_effects(stage, &stage.before, options)?;

    let code = runner.run(stage, options).await?;
    if code != 0 {
        return Err(RunError::StageFailed {
            id: stage.id.clone(),
            label: stage.label.clone(),
            code,
            reason: None,
        });
    }

    apply_effects(stage, &stage.after, options)
}

fn apply_effects(stage: &Stage, effects: &[FsEffect], options: &ProvisionOptions) -> Result<()> {
    for effect in effects {
        apply_effect(effect, &options.project_root).map_err(|e| RunError::StageFailed {
            id: stage.id.clone(),
            label: stage.label.clone(),
            code: 1,
            reason: Some(format!("{}: {}", effect, e)),
        })?;
    }
    Ok(())
}
