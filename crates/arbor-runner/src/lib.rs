//! Arbor pipeline runner
//!
//! パイプラインを定義順に実行し、最初の失敗で打ち切ります。

pub mod effect;
pub mod error;
pub mod report;
pub mod runner;
pub mod sequencer;

pub use effect::apply_effect;
pub use error::{Result, RunError, SPAWN_FAILURE_CODE};
pub use report::{RunReport, StageOutcome, StageReport};
pub use runner::{CommandRunner, ShellRunner};
pub use sequencer::{NoopObserver, PipelineObserver, Sequencer};
