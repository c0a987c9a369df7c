//! Hidden `docs` command: one markdown page per command

use std::path::PathBuf;

use crate::application::IoResultExt;
use crate::cli::error::CliResult;
use crate::cli::node::{CommandNode, Invocation};
use crate::cli::output;
use crate::cli::session::Session;
use crate::domain::{FlagKind, FlagSpec};

pub fn command() -> CommandNode {
    CommandNode::new("docs", "Generate documentation as markdown")
        .long("Generate documentation files for Helm.\n\nThis command can generate documentation for Helm as markdown files.")
        .flag(FlagSpec::value("dir", "DIR", "directory to which documentation is written").with_default("./"))
        .hidden()
        .handler(docs)
}

fn docs(session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    let dir = PathBuf::from(inv.value("dir").unwrap_or("./"));
    let fs = &session.services().fs;
    fs.create_dir_all(&dir)
        .with_path_context("create directory", &dir)?;

    let root = session.router().root();
    let persistent: Vec<&FlagSpec> = root.flags.iter().filter(|f| f.persistent).collect();
    let mut pages = vec![(Vec::new(), root)];
    pages.extend(root.walk());

    for (path, node) in pages.into_iter().filter(|(_, n)| !n.hidden) {
        let file = dir.join(page_name(&path));
        fs.write(&file, &render(&path, node, &persistent))
            .with_path_context("write", &file)?;
    }
    output::success(&format!("Documentation written to {}", dir.display()));
    Ok(())
}

fn page_name(path: &[String]) -> String {
    let mut parts = vec!["helm".to_string()];
    parts.extend(path.iter().cloned());
    format!("{}.md", parts.join("_"))
}

fn render(path: &[String], node: &CommandNode, persistent: &[&FlagSpec]) -> String {
    let full = std::iter::once("helm")
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let mut page = format!("## {}\n\n{}\n\n", full, node.short_help);

    page.push_str("### Synopsis\n\n");
    let long = if node.long_help.is_empty() {
        &node.short_help
    } else {
        &node.long_help
    };
    page.push_str(&format!("{}\n\n", long.trim_end()));
    if node.handler.is_some() {
        page.push_str(&format!("```\n{} {}\n```\n\n", full, node.arity.usage()));
    }
    if let Some(notice) = &node.deprecated {
        page.push_str(&format!("Deprecated: {}\n\n", notice.trim_end()));
    }

    let local: Vec<&FlagSpec> = node.flags.iter().filter(|f| !f.persistent).collect();
    if !local.is_empty() {
        page.push_str(&format!("### Options\n\n```\n{}```\n\n", flag_lines(&local)));
    }
    if !path.is_empty() && !persistent.is_empty() {
        page.push_str(&format!(
            "### Options inherited from parent commands\n\n```\n{}```\n\n",
            flag_lines(persistent)
        ));
    }

    let children: Vec<&CommandNode> = node.children.iter().filter(|c| !c.hidden).collect();
    if !children.is_empty() {
        page.push_str("### SEE ALSO\n\n");
        for child in children {
            let mut child_path = path.to_vec();
            child_path.push(child.name.clone());
            page.push_str(&format!(
                "* [{} {}]({})\t - {}\n",
                full,
                child.name,
                page_name(&child_path),
                child.short_help
            ));
        }
    }
    page
}

fn flag_lines(flags: &[&FlagSpec]) -> String {
    flags
        .iter()
        .map(|flag| {
            let short = flag.short.map(|s| format!("-{}, ", s)).unwrap_or_default();
            let value = match &flag.kind {
                FlagKind::Switch => String::new(),
                FlagKind::Value {
                    value_name,
                    default: Some(d),
                } => format!(" {} (default {:?})", value_name, d),
                FlagKind::Value { value_name, .. } => format!(" {}", value_name),
            };
            format!("  {}--{}{}\t{}\n", short, flag.name, value, flag.help)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Arity;

    #[test]
    fn test_page_name_joins_path() {
        assert_eq!(page_name(&[]), "helm.md");
        assert_eq!(page_name(&["repo".to_string(), "add".to_string()]), "helm_repo_add.md");
    }

    #[test]
    fn given_leaf_command_when_rendering_then_includes_usage_and_flags() {
        let node = CommandNode::new("status", "displays the status")
            .arity(Arity::exact(&["release name"]))
            .flag(FlagSpec::value("revision", "N", "revision to show"))
            .handler(|_, _| Ok(()));
        let debug = FlagSpec::switch("debug", "enable verbose output").persistent();

        let page = render(&["status".to_string()], &node, &[&debug]);

        assert!(page.starts_with("## helm status\n"));
        assert!(page.contains("helm status RELEASE_NAME"));
        assert!(page.contains("--revision N\trevision to show"));
        assert!(page.contains("Options inherited from parent commands"));
        assert!(page.contains("--debug\tenable verbose output"));
    }
}
