//! プレースホルダ展開
//!
//! パイプラインファイル内の `{{ NAME }}` / `{{ env.NAME }}` を展開します。

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*(env\.)?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap()
    })
}

/// 変数テーブル
///
/// 優先順位:
/// 1. `{{ env.NAME }}` は環境変数のみを参照
/// 2. `{{ NAME }}` は variables ブロック → 環境変数の順で参照
///
/// 解決できないプレースホルダはそのまま残します。
#[derive(Debug, Clone, Default)]
pub struct Variables {
    vars: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl Variables {
    pub fn new(env: HashMap<String, String>) -> Self {
        Self {
            vars: HashMap::new(),
            env,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn expand(&self, value: &str) -> String {
        placeholder_pattern()
            .replace_all(value, |caps: &Captures| {
                let from_env_only = caps.get(1).is_some();
                let name = &caps[2];

                let resolved = if from_env_only {
                    self.env.get(name)
                } else {
                    self.vars.get(name).or_else(|| self.env.get(name))
                };

                match resolved {
                    Some(v) => v.clone(),
                    None => {
                        warn!(placeholder = %&caps[0], "Unresolved placeholder left as-is");
                        caps[0].to_string()
                    }
                }
            })
            .to_string()
    }
}
