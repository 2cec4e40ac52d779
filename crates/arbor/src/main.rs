mod commands;
mod logger;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Arbor Market のデプロイ手順を、順番どおりに、止まるべきところで止める。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// パイプラインを実行（依存インストール → CSSビルド → 静的ファイル収集 → マイグレーション → 管理者作成）
    Provision {
        /// パイプラインファイル（省略時は provision.kdl を自動検出、無ければ組み込みの手順）
        #[arg(short, long, env = "ARBOR_PIPELINE")]
        file: Option<PathBuf>,
        /// スキップするステージ（カンマ区切り: install-deps,tailwind-install）
        #[arg(long)]
        skip: Option<String>,
        /// optional なステージ（管理者作成など）を実行しない
        #[arg(long)]
        no_admin: bool,
        /// 実行せずに手順だけ表示
        #[arg(long)]
        dry_run: bool,
        /// 全ステージに渡す環境変数（KEY=VALUE、複数指定可）
        #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = arbor_core::parse_env_assignment)]
        env: Vec<(String, String)>,
    },
    /// 実行されるステージの一覧を表示
    Plan {
        /// パイプラインファイル
        #[arg(short, long, env = "ARBOR_PIPELINE")]
        file: Option<PathBuf>,
        /// optional なステージを除外して表示
        #[arg(long)]
        no_admin: bool,
        /// JSON形式で出力
        #[arg(long)]
        json: bool,
    },
    /// パイプライン定義を検証
    Validate {
        /// パイプラインファイル
        #[arg(short, long, env = "ARBOR_PIPELINE")]
        file: Option<PathBuf>,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // 進捗表示は stdout、診断ログは stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli).await {
        let code = e
            .downcast_ref::<arbor_runner::RunError>()
            .map(arbor_runner::RunError::exit_code)
            .unwrap_or(1);

        eprintln!();
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Provision {
            file,
            skip,
            no_admin,
            dry_run,
            env,
        } => {
            commands::provision::handle(commands::provision::ProvisionArgs {
                file,
                skip,
                no_admin,
                dry_run,
                env,
            })
            .await?;
        }
        Commands::Plan {
            file,
            no_admin,
            json,
        } => {
            commands::plan::handle(file.as_deref(), no_admin, json)?;
        }
        Commands::Validate { file } => {
            commands::validate::handle(file.as_deref())?;
        }
        Commands::Version => {
            println!("arbor {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
