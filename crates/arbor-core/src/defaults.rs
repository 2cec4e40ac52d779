//! 組み込みのデフォルトパイプライン
//!
//! provision.kdl が無い場合に使用される、マーケットプレイスの標準デプロイ手順。

use crate::error::Result;
use crate::model::{CommandSpec, FsEffect, Pipeline, ProvisionOptions, Stage};

/// デフォルトパイプラインのプロジェクト名
pub const DEFAULT_PIPELINE_NAME: &str = "arbor-market";

/// 管理者アカウントを作成する `manage.py shell` スクリプト
///
/// 資格情報は ADMIN_USERNAME / ADMIN_EMAIL / ADMIN_PASSWORD から読み取り、
/// 同名のユーザーが既に存在する場合は何もしません。
pub const CREATE_ADMIN_SCRIPT: &str = "\
import os
from django.contrib.auth import get_user_model
User = get_user_model()
username = os.environ['ADMIN_USERNAME']
if User.objects.filter(username=username).exists():
    print(f'Superuser {username} already exists. Skipping creation.')
else:
    User.objects.create_superuser(username, os.environ['ADMIN_EMAIL'], os.environ['ADMIN_PASSWORD'])
    print(f'Superuser {username} created.')
";

/// 依存インストール → CSSビルド → 静的ファイル収集 → マイグレーション → 管理者作成
///
/// 管理者作成ステージは `options.admin` が設定されている場合のみ追加され、
/// 必ず migrate の後に実行されます。
pub fn default_pipeline(options: &ProvisionOptions) -> Result<Pipeline> {
    let python = options.python.as_str();
    let manage = |args: &[&str]| {
        CommandSpec::exec(
            python,
            std::iter::once("manage.py").chain(args.iter().copied()),
        )
    };

    let mut stages = vec![
        Stage::new(
            "install-deps",
            "依存パッケージのインストール",
            CommandSpec::exec(
                python,
                [
                    "-m".to_string(),
                    "pip".to_string(),
                    "install".to_string(),
                    "-r".to_string(),
                    options.requirements.display().to_string(),
                ],
            ),
        ),
        Stage::new(
            "tailwind-install",
            "Tailwind 依存のインストール",
            manage(&["tailwind", "install"]),
        ),
        Stage::new(
            "tailwind-build",
            "Tailwind CSS のビルド",
            manage(&["tailwind", "build"]),
        ),
        Stage::new(
            "collect-static",
            "静的ファイルの収集",
            manage(&[
                "collectstatic",
                "--noinput",
                "--verbosity",
                &options.collect_verbosity.to_string(),
            ]),
        )
        .before(FsEffect::Reset {
            path: options.static_root.clone(),
            mode: options.asset_reset.clone(),
        }),
        Stage::new(
            "migrate",
            "データベースマイグレーション",
            manage(&["migrate", "--noinput"]),
        ),
    ];

    if let Some(admin) = &options.admin {
        stages.push(
            Stage::new(
                "create-admin",
                "管理者アカウントの作成",
                manage(&["shell", "-c", CREATE_ADMIN_SCRIPT]),
            )
            .requires("migrate")
            .optional()
            .env("ADMIN_USERNAME", admin.username.as_str())
            .env("ADMIN_EMAIL", admin.email.as_str())
            .env("ADMIN_PASSWORD", admin.password.as_str()),
        );
    }

    if let Some(url) = &options.database_url {
        for stage in &mut stages {
            stage.env.insert("DATABASE_URL".to_string(), url.clone());
        }
    }

    Pipeline::new(DEFAULT_PIPELINE_NAME, stages)
}
