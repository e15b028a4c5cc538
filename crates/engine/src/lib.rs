// In crates/engine/src/lib.rs

pub mod cancel;
pub mod scanner;
pub mod task;

pub use cancel::{CancelHandle, CancelToken, cancellation};
pub use scanner::Scanner;
pub use task::{Evaluation, FetchWindow, SymbolTask};
