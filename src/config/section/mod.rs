//! Configuration section definitions.
//!
//! | Module    | TOML Section | Purpose                               |
//! |-----------|--------------|---------------------------------------|
//! | `compile` | `[compile]`  | Compiler command and compile policy   |
//! | `storage` | `[storage]`  | Where documents and artifacts live    |

mod compile;
mod storage;

pub use compile::CompileConfig;
pub use storage::StorageConfig;
