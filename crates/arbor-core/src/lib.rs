//! Arbor provisioning core
//!
//! デプロイ手順をステージの順序付きリストとして表現し、
//! KDL ファイル (provision.kdl) または組み込みのデフォルトから読み込みます。

pub mod defaults;
pub mod discovery;
pub mod error;
pub mod model;
pub mod parser;
pub mod template;

pub use defaults::{CREATE_ADMIN_SCRIPT, DEFAULT_PIPELINE_NAME, default_pipeline};
pub use discovery::{find_project_root, find_project_root_from};
pub use error::{PipelineError, Result};
pub use model::*;
pub use parser::{parse_pipeline_file, parse_pipeline_str, parse_pipeline_str_with_env};
pub use template::Variables;
