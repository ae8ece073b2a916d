use anyhow::Context;
use std::path::Path;

use checkpoint_kernel::replay::encode_log;
use checkpoint_kernel::verify::{hex, log_hash};

use crate::script::load_script;

/// Compiles a JSON command script into a binary command log.
pub fn run(script_path: &Path, out_path: &Path) -> anyhow::Result<()> {
    let commands = load_script(script_path)?;
    let bytes = encode_log(&commands)?;
    std::fs::write(out_path, &bytes).with_context(|| format!("writing {}", out_path.display()))?;

    tracing::info!(commands = commands.len(), bytes = bytes.len(), "command log written");
    println!("\nEncoded {} commands ({} bytes)", commands.len(), bytes.len());
    println!("Log Hash: {}\n", hex(&log_hash(&bytes)));
    Ok(())
}
