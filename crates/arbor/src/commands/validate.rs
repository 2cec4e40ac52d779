use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(file: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "パイプラインを検証中...".blue());

    let options = utils::load_options()?;
    println!(
        "プロジェクトルート: {}",
        options.project_root.display().to_string().cyan()
    );

    let (pipeline, source) = utils::load_pipeline(file, &options, false)?;

    println!("{}", "✓ パイプライン定義は正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  読み込み元: {}", source);
    println!("  プロジェクト: {}", pipeline.name().cyan());
    println!("  ステージ: {}個", pipeline.len());
    for stage in pipeline.stages() {
        let mut notes = Vec::new();
        if stage.optional {
            notes.push("optional".to_string());
        }
        if !stage.requires.is_empty() {
            notes.push(format!("requires: {}", stage.requires.join(", ")));
        }
        if notes.is_empty() {
            println!("    - {}", stage.id.cyan());
        } else {
            println!("    - {} ({})", stage.id.cyan(), notes.join("; "));
        }
    }

    Ok(())
}
