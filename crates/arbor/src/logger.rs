//! プロビジョニングの進捗表示
//!
//! 各ステージの開始・完了・所要時間をタイムスタンプ付きで表示し、
//! 最後にサマリーを出力します。

use arbor_core::Stage;
use arbor_runner::{PipelineObserver, RunError};
use chrono::Local;
use colored::Colorize;
use std::time::{Duration, Instant};

/// ステージの実行結果
#[derive(Debug, Clone)]
pub enum StageResult {
    /// 成功
    Success { duration: Duration },
    /// スキップ（--skip で指定）
    Skipped { reason: String },
    /// 失敗
    Failed { error: String, duration: Duration },
}

impl StageResult {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Success { duration } => Some(*duration),
            Self::Failed { duration, .. } => Some(*duration),
            Self::Skipped { .. } => None,
        }
    }
}

/// プロビジョニングログ出力器
pub struct ProvisionLogger {
    start_time: Instant,
    stage_results: Vec<(String, StageResult)>,
    current_stage: Option<Instant>,
}

impl ProvisionLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            stage_results: Vec::new(),
            current_stage: None,
        }
    }

    /// 詳細メッセージをログ出力
    pub fn log_detail(&self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!("[{}]   → {}", timestamp.dimmed(), message.cyan());
    }

    /// サマリーを出力
    pub fn print_summary(&self, pipeline_name: &str) {
        let total_duration = self.start_time.elapsed();

        let skipped_count = self
            .stage_results
            .iter()
            .filter(|(_, result)| matches!(result, StageResult::Skipped { .. }))
            .count();

        let error_count = self
            .stage_results
            .iter()
            .filter(|(_, result)| matches!(result, StageResult::Failed { .. }))
            .count();

        let slowest_stage = self
            .stage_results
            .iter()
            .filter_map(|(label, result)| result.duration().map(|d| (label, d)))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Provision Summary: {}", pipeline_name.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total_duration).green());

        if let Some((label, duration)) = slowest_stage {
            println!("Slowest stage: {} ({})", label, format_duration(duration));
        }

        if skipped_count > 0 {
            println!("Skipped:       {}", skipped_count.to_string().yellow());
            for (label, result) in &self.stage_results {
                if let StageResult::Skipped { reason } = result {
                    println!("  {} {} ({})", "⏭".yellow(), label, reason.dimmed());
                }
            }
        } else {
            println!("Skipped:       0");
        }

        if error_count > 0 {
            println!("Errors:        {}", error_count.to_string().red().bold());
            for (label, result) in &self.stage_results {
                if let StageResult::Failed { error, .. } = result {
                    let first_line = error.lines().next().unwrap_or_default();
                    println!("  {} {}: {}", "✗".red(), label, first_line.dimmed());
                }
            }
        } else {
            println!("Errors:        {}", "0".green());
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for ProvisionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ProvisionLogger {
    fn stage_started(&mut self, index: usize, total: usize, stage: &Stage) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!(
            "[{}] {} {} {}",
            timestamp.dimmed(),
            "▶".cyan(),
            format!("[{}/{}]", index, total).dimmed(),
            stage.label
        );
        for effect in &stage.before {
            self.log_detail(&effect.to_string());
        }
        self.log_detail(&stage.command.to_string());
        self.current_stage = Some(Instant::now());
    }

    fn stage_succeeded(&mut self, stage: &Stage, duration: Duration) {
        self.current_stage = None;
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!(
            "[{}] {} {} 完了 ({})",
            timestamp.dimmed(),
            "✓".green().bold(),
            stage.label,
            format_duration(duration).dimmed()
        );
        self.stage_results
            .push((stage.label.clone(), StageResult::Success { duration }));
    }

    fn stage_failed(&mut self, stage: &Stage, error: &RunError) {
        let duration = self
            .current_stage
            .take()
            .map(|start| start.elapsed())
            .unwrap_or_default();
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!(
            "[{}] {} {}: {}",
            timestamp.dimmed(),
            "✗".red().bold(),
            stage.label,
            format!("exit {}", error.exit_code()).red()
        );
        self.stage_results.push((
            stage.label.clone(),
            StageResult::Failed {
                error: error.to_string(),
                duration,
            },
        ));
    }

    fn stage_skipped(&mut self, stage: &Stage, reason: &str) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!(
            "[{}] {} {} ({})",
            timestamp.dimmed(),
            "⏭".yellow(),
            stage.label,
            reason.dimmed()
        );
        self.stage_results.push((
            stage.label.clone(),
            StageResult::Skipped {
                reason: reason.to_string(),
            },
        ));
    }
}

/// Duration を読みやすい形式にフォーマット
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let minutes = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", minutes, secs)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}

/// --skip の値をステージIDのリストに分解
pub fn parse_skip_stages(skip_arg: Option<&str>) -> Vec<String> {
    let Some(skip_str) = skip_arg else {
        return Vec::new();
    };

    skip_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
