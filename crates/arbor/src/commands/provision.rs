//! provision コマンドの実装
//!
//! パイプラインを読み込み、定義順にステージを実行する。
//! 最初に失敗したステージの終了コードで終了します。

use crate::commands::plan;
use crate::logger::{ProvisionLogger, parse_skip_stages};
use crate::utils;
use arbor_runner::{Sequencer, ShellRunner};
use colored::Colorize;
use std::path::PathBuf;

pub struct ProvisionArgs {
    pub file: Option<PathBuf>,
    pub skip: Option<String>,
    pub no_admin: bool,
    pub dry_run: bool,
    /// `--env KEY=VALUE` で指定された追加の環境変数
    pub env: Vec<(String, String)>,
}

pub async fn handle(args: ProvisionArgs) -> anyhow::Result<()> {
    let mut options = utils::load_options()?;
    options.env.extend(args.env);
    let (pipeline, source) = utils::load_pipeline(args.file.as_deref(), &options, args.no_admin)?;

    let sequencer = Sequencer::new().skip(parse_skip_stages(args.skip.as_deref()));
    // 実行前にスキップ指定を検証（何も実行しないうちに失敗させる）
    sequencer.check(&pipeline)?;

    println!(
        "{} {}",
        "🌱 プロビジョニング:".green().bold(),
        pipeline.name().cyan().bold()
    );
    utils::print_pipeline_source(&source, &options);
    println!();

    if args.dry_run {
        plan::print_plan(&pipeline, &sequencer);
        println!();
        println!("{}", "(dry-run: コマンドは実行されていません)".dimmed());
        return Ok(());
    }

    let mut logger = ProvisionLogger::new();
    let result = sequencer
        .run(&pipeline, &options, &ShellRunner::new(), &mut logger)
        .await;
    logger.print_summary(pipeline.name());

    let report = result?;
    println!();
    println!(
        "{} ({}ステージ完了, {}スキップ)",
        "✓ プロビジョニングが完了しました！".green().bold(),
        report.succeeded(),
        report.skipped()
    );

    Ok(())
}
