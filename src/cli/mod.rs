//! CLI command definitions for task-tree
//!
//! Each invocation runs one synchronizer session for `--owner` against the
//! local SQLite store.

use crate::types::{RootRecord, TaskNode};
use clap::{Parser, Subcommand};
use std::fmt::Write;

/// Nested to-do lists stored one blob per top-level task
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Owner id for this session
    #[arg(short, long, global = true, default_value = "local")]
    pub owner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new top-level task
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List top-level tasks, newest first
    List {
        /// Case-insensitive text filter (also matches nested titles)
        #[arg(long)]
        search: Option<String>,
        /// Leave out completed tasks
        #[arg(long)]
        hide_completed: bool,
    },

    /// Print a task and its subtasks as a tree
    Show { root_id: String },

    /// Mark a task or subtask completed (or open again with --undo)
    Toggle {
        root_id: String,
        target_id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Change the title and description of a task or subtask
    Edit {
        root_id: String,
        target_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a subtask with everything below it, or a whole task
    Delete { root_id: String, target_id: String },

    /// Add a subtask under the task or one of its subtasks
    Add {
        root_id: String,
        parent_id: String,
        title: String,
    },
}

/// Render a root and its tree as indented text.
pub fn render_tree(root: &RootRecord) -> String {
    let mut out = String::new();
    let progress = root.progress();
    let _ = writeln!(
        out,
        "{} {} ({}) [{}/{}]",
        checkbox(root.is_completed),
        root.title,
        root.id,
        progress.completed,
        progress.total
    );
    render_children(&root.children, 1, &mut out);
    out
}

fn render_children(children: &[TaskNode], depth: usize, out: &mut String) {
    for node in children {
        let _ = write!(
            out,
            "{}{} {} ({})",
            "  ".repeat(depth),
            checkbox(node.is_completed),
            node.title,
            node.id
        );
        if !node.children.is_empty() {
            let progress = node.progress();
            let _ = write!(out, " [{}/{}]", progress.completed, progress.total);
        }
        out.push('\n');
        render_children(&node.children, depth + 1, out);
    }
}

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}
