use crate::utils::{self, PipelineSource};
use arbor_core::{Pipeline, Stage};
use arbor_runner::Sequencer;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanOutput<'a> {
    source: String,
    project_root: String,
    #[serde(flatten)]
    pipeline: &'a Pipeline,
}

pub fn handle(file: Option<&Path>, no_admin: bool, json: bool) -> anyhow::Result<()> {
    let options = utils::load_options()?;
    let (pipeline, source) = utils::load_pipeline(file, &options, no_admin)?;

    if json {
        let output = PlanOutput {
            source: match &source {
                PipelineSource::File(path) => path.display().to_string(),
                PipelineSource::BuiltIn => "builtin".to_string(),
            },
            project_root: options.project_root.display().to_string(),
            pipeline: &pipeline,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    utils::print_pipeline_source(&source, &options);
    println!();
    print_plan(&pipeline, &Sequencer::new());
    Ok(())
}

/// ステージ一覧を実行順に表示
pub fn print_plan(pipeline: &Pipeline, sequencer: &Sequencer) {
    println!(
        "{} {} ({}ステージ)",
        "Pipeline:".bold(),
        pipeline.name().cyan().bold(),
        pipeline.len()
    );

    if pipeline.is_empty() {
        println!("  (ステージがありません)");
        return;
    }

    for (index, stage) in pipeline.stages().iter().enumerate() {
        print_stage(index + 1, stage, sequencer.is_skipped(&stage.id));
    }
}

fn print_stage(number: usize, stage: &Stage, skipped: bool) {
    let mut header = format!("{:>2}. {}", number, stage.id.cyan());
    if stage.label != stage.id {
        header.push_str(&format!("  {}", stage.label));
    }
    if stage.optional {
        header.push_str(&format!(" {}", "[optional]".dimmed()));
    }
    if skipped {
        header.push_str(&format!(" {}", "⏭ skip".yellow()));
    }
    println!("{}", header);

    for effect in &stage.before {
        println!("      before: {}", effect);
    }
    println!("      $ {}", stage.command.to_string().green());
    for effect in &stage.after {
        println!("      after:  {}", effect);
    }
    if !stage.requires.is_empty() {
        println!("      requires: {}", stage.requires.join(", "));
    }
    if !stage.env.is_empty() {
        let keys: Vec<&str> = stage.env.keys().map(String::as_str).collect();
        println!("      env: {}", keys.join(", ").dimmed());
    }
}
