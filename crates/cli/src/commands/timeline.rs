use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use checkpoint_kernel::Command;

use super::read_log;

/// Lists every command with the position it applies at.
pub fn run(log_path: &Path) -> anyhow::Result<()> {
    let (_, commands) = read_log(log_path)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Position", "Command", "Addresses"]);

    let mut position = 0;
    for (i, cmd) in commands.iter().enumerate() {
        if let Command::AdvanceTo { position: p } = cmd {
            position = *p;
        }
        let addresses: Vec<String> = cmd.addresses().iter().map(|a| a.to_string()).collect();
        table.add_row(vec![
            i.to_string(),
            position.to_string(),
            cmd.command_type().to_string(),
            addresses.join(" -> "),
        ]);
    }

    println!("\nCommand Timeline\n");
    println!("{table}\n");
    Ok(())
}
