//! What the user sees on the terminal
//!
//! Data (release bodies, tables, paths) goes to stdout uncolored so it can be
//! piped. Diagnostics go to stderr. `colored` honors NO_COLOR and CLICOLOR.

use std::fmt::Display;

use colored::Colorize;

use crate::domain::PluginDescriptor;

/// `Error: <message>` on stderr.
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{} {}", "Warning:".yellow(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().green());
}

/// Indented secondary line, e.g. dry-run actions or `HELM_PATH_*` variables.
pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}

/// Response body from the remote service, verbatim minus trailing whitespace.
pub fn body(body: &str) {
    let body = body.trim_end();
    if !body.is_empty() {
        println!("{}", body);
    }
}

/// `NAME VERSION DESCRIPTION` table of registered plugins.
pub fn plugin_table(plugins: &[PluginDescriptor]) {
    println!(
        "{}",
        plugin_row("NAME", "VERSION", "DESCRIPTION").bold()
    );
    for plugin in plugins {
        println!(
            "{}",
            plugin_row(&plugin.name, &plugin.version, &plugin.short_help)
        );
    }
}

fn plugin_row(name: &str, version: &str, description: &str) -> String {
    format!("{:<20}\t{:<10}\t{}", name, version, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_rows_are_column_aligned() {
        let row = plugin_row("last", "0.1.0", "get the last release name");
        assert_eq!(
            row,
            "last                \t0.1.0     \tget the last release name"
        );
    }
}
