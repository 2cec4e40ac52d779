//! モデル定義
//!
//! プロビジョニングパイプラインで使用されるデータモデルを定義します。

mod options;
mod pipeline;
mod stage;

// Re-exports
pub use options::*;
pub use pipeline::*;
pub use stage::*;
