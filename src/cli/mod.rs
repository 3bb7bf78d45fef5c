//! CLI front-ends for the two binaries
//!
//! This module is only available when the "cli" feature is enabled.

mod args;
pub mod batch;
mod config;
pub mod single;

pub use args::{CliMatteBackend, CliModelKind, MatteArgs, NormalizeArgs};
pub use batch::BatchCli;
pub use single::SingleCli;

/// Parse arguments; usage errors exit with status 1, `--help` and `--version` with 0
fn parse_or_exit<T: clap::Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let code = i32::from(err.use_stderr());
        let _ = err.print();
        std::process::exit(code);
    })
}
