use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 環境変数の影響を受けないよう隔離したテスト用プロジェクト
pub struct TestProject {
    pub root: TempDir,
    config_home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        fs::write(root.path().join("manage.py"), "# django entrypoint\n").unwrap();
        Self { root, config_home }
    }

    pub fn write_provision_kdl(&self, content: &str) {
        fs::write(self.root.path().join("provision.kdl"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn exists(&self, relative: &str) -> bool {
        self.root.path().join(relative).exists()
    }

    #[allow(dead_code)]
    pub fn entries(&self, relative: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root.path().join(relative))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    /// プロジェクトルートで arbor を実行するコマンド
    #[allow(deprecated)]
    pub fn arbor(&self) -> Command {
        let mut cmd = Command::cargo_bin("arbor").unwrap();
        cmd.current_dir(self.root.path())
            .env("ARBOR_PROJECT_ROOT", self.root.path())
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("ARBOR_PIPELINE")
            .env_remove("ADMIN_PASSWORD")
            .env_remove("ADMIN_USERNAME")
            .env_remove("ADMIN_EMAIL")
            .env_remove("DATABASE_URL")
            .env_remove("ARBOR_ASSET_RESET")
            .env_remove("ARBOR_COLLECT_VERBOSITY")
            .env_remove("ARBOR_PYTHON")
            .env_remove("RUST_LOG");
        cmd
    }

    #[allow(dead_code)]
    pub fn config_home(&self) -> &Path {
        self.config_home.path()
    }
}
