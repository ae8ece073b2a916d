pub mod encode;
pub mod inspect;
pub mod power;
pub mod timeline;

use anyhow::Context;
use std::path::Path;

use checkpoint_kernel::replay::{decode_log, LogHeader};
use checkpoint_kernel::Command;

/// Reads and decodes a command log from disk.
pub(crate) fn read_log(path: &Path) -> anyhow::Result<(LogHeader, Vec<Command>)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let decoded = decode_log(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    Ok(decoded)
}
