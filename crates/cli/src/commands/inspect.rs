use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use checkpoint_kernel::replay::{decode_log, replay, LogHeader};
use checkpoint_kernel::verify::{hex, kernel_state_hash, log_hash};
use checkpoint_kernel::KernelConfig;

/// Prints the status of a command log. Fails if the log does not decode.
pub fn run(log_path: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(log_path)?;

    println!("\nCommand Log Report");
    println!("------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Item", "Status", "Details"]);

    table.add_row(vec!["File".to_string(), "FOUND".to_string(), format!("{} bytes", bytes.len())]);
    table.add_row(vec!["Log Hash".to_string(), "-".to_string(), hex(&log_hash(&bytes))]);

    match LogHeader::read(&bytes) {
        Ok((header, _)) => table.add_row(vec![
            "Header".to_string(),
            "OK".to_string(),
            format!(
                "Ver: {}, Stake slots: {}, Commands: {}",
                header.version, header.stake_slots, header.command_count
            ),
        ]),
        Err(e) => table.add_row(vec!["Header".to_string(), "CORRUPT".to_string(), e.to_string()]),
    };

    let result = decode_log(&bytes);
    match &result {
        Ok((_, commands)) => {
            table.add_row(vec!["Body".to_string(), "VERIFIED".to_string(), format!("{} commands", commands.len())]);
            match replay(commands, KernelConfig::default()) {
                Ok(kernel) => table.add_row(vec![
                    "State Hash".to_string(),
                    format!("POSITION {}", kernel.position()),
                    hex(&kernel_state_hash(&kernel)),
                ]),
                Err(e) => table.add_row(vec!["State Hash".to_string(), "REPLAY FAILED".to_string(), e.to_string()]),
            };
        }
        Err(e) => {
            table.add_row(vec!["Body".to_string(), "CORRUPT".to_string(), e.to_string()]);
        }
    }

    println!("{table}\n");
    result?;
    Ok(())
}
