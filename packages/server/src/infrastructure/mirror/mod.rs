//! Persistence Mirror の実装
//!
//! ミラーはライブプロトコルの正しさに寄与しない write-through。
//! ここでは耐久ストアなしのデプロイ向けのログ実装のみを提供する。

pub mod logging;

pub use logging::LoggingMirror;
