//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use serde_json::json;
use std::io;
use zi_catalog::PresenceOracle;
use zi_solver::{FetchPlan, SelectionChange, Selections};
use zi_types::pretty_size;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render a solve result, with the changes against a previous run if known
    pub fn render_selections(
        self,
        selections: &Selections,
        changes: Option<&[SelectionChange]>,
        oracle: &dyn PresenceOracle,
    ) -> io::Result<()> {
        if self.json_output {
            let value = match changes {
                Some(changes) => json!({ "selections": selections, "changes": changes }),
                None => json!(selections),
            };
            return print_json(&value);
        }

        let mut table = new_table(&["Interface", "Version", "Stability", "Commands", "Status"]);
        for selection in selections.all() {
            let implementation = &selection.implementation;
            let status = if oracle.is_present(implementation) {
                Cell::new("cached").fg(Color::Green)
            } else {
                Cell::new("download").fg(Color::Yellow)
            };
            let commands = if selection.commands.is_empty() {
                "-".to_string()
            } else {
                selection.commands.join(", ")
            };
            table.add_row(vec![
                Cell::new(selection.interface.as_str()),
                Cell::new(implementation.version.to_string()),
                Cell::new(implementation.stability.as_str()),
                Cell::new(commands),
                status,
            ]);
        }
        println!("{table}");

        if let Some(changes) = changes {
            render_changes(changes);
        }
        Ok(())
    }

    pub fn render_fetch_plan(self, plan: &FetchPlan<'_>) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({
                "items": plan
                    .items
                    .iter()
                    .map(|item| json!({
                        "interface": item.selection.interface,
                        "id": item.selection.id(),
                        "version": item.selection.version(),
                        "expected_size": item.expected_size,
                        "estimate": item.is_estimate(),
                    }))
                    .collect::<Vec<_>>(),
                "total_bytes": plan.total_bytes,
            }));
        }

        if !plan.is_empty() {
            let mut table = new_table(&["Interface", "Version", "Size"]);
            for item in &plan.items {
                let size = if item.is_estimate() {
                    "?".to_string()
                } else {
                    pretty_size(Some(item.expected_size))
                };
                table.add_row(vec![
                    Cell::new(item.selection.interface.as_str()),
                    Cell::new(item.selection.version().to_string()),
                    Cell::new(size),
                ]);
            }
            println!("{table}");
        }
        println!("{}", plan.summary());
        Ok(())
    }

    pub fn render_settings(self, entries: &[(&str, String)]) -> io::Result<()> {
        if self.json_output {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(name, value)| ((*name).to_string(), json!(value)))
                .collect();
            return print_json(&serde_json::Value::Object(map));
        }

        let mut table = new_table(&["Setting", "Value"]);
        for (name, value) in entries {
            table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        println!("{table}");
        Ok(())
    }

    pub fn render_value(self, name: &str, value: &str) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({ name: value }));
        }
        println!("{value}");
        Ok(())
    }

    pub fn render_success_message(self, message: &str) -> io::Result<()> {
        if self.json_output {
            return print_json(&json!({ "message": message }));
        }
        println!("{message}");
        Ok(())
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|header| Cell::new(header).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn render_changes(changes: &[SelectionChange]) {
    if changes.is_empty() {
        println!("No changes since the previous selection.");
        return;
    }
    println!("Changes since the previous selection:");
    for change in changes {
        let line = match change {
            SelectionChange::Added { .. } => style(change.to_string()).green(),
            SelectionChange::Removed { .. } => style(change.to_string()).red(),
            SelectionChange::Changed { .. } => style(change.to_string()).yellow(),
        };
        println!("  {line}");
    }
}

fn print_json(value: &serde_json::Value) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}
