use anyhow::Context;
use arbor_core::{Pipeline, ProvisionOptions};
use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};

/// パイプラインの読み込み元
#[derive(Debug, Clone)]
pub enum PipelineSource {
    File(PathBuf),
    BuiltIn,
}

impl fmt::Display for PipelineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => write!(f, "(組み込みのデフォルト)"),
        }
    }
}

/// プロジェクトルートと実行時オプションを決定する（共通ロジック）
///
/// 環境変数の読み取りはここで一度だけ行います。
pub fn load_options() -> anyhow::Result<ProvisionOptions> {
    let project_root = arbor_core::find_project_root()?;
    let options = ProvisionOptions::from_env(&project_root)?;
    Ok(options)
}

/// パイプラインを読み込む
///
/// provision.kdl が見つかればそれを、無ければ組み込みの手順を使います。
/// `no_admin` が true の場合は optional なステージを取り除きます。
pub fn load_pipeline(
    explicit: Option<&Path>,
    options: &ProvisionOptions,
    no_admin: bool,
) -> anyhow::Result<(Pipeline, PipelineSource)> {
    let (pipeline, source) =
        match arbor_config::resolve_pipeline_file(explicit, &options.project_root)? {
            Some(path) => {
                let pipeline = arbor_core::parse_pipeline_file(&path).with_context(|| {
                    format!("パイプラインファイルを読み込めません: {}", path.display())
                })?;
                (pipeline, PipelineSource::File(path))
            }
            None => (
                arbor_core::default_pipeline(options)?,
                PipelineSource::BuiltIn,
            ),
        };

    let pipeline = if no_admin {
        pipeline.without_optional()?
    } else {
        pipeline
    };

    tracing::info!(
        source = %source,
        pipeline = pipeline.name(),
        stages = pipeline.len(),
        "Pipeline loaded"
    );

    Ok((pipeline, source))
}

/// 読み込んだパイプラインの情報を表示
pub fn print_pipeline_source(source: &PipelineSource, options: &ProvisionOptions) {
    println!("📄 パイプライン: {}", source.to_string().cyan());
    println!(
        "📁 プロジェクトルート: {}",
        options.project_root.display().to_string().cyan()
    );
    println!("🗄  データベース: {}", options.database_display().dimmed());
}
