use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use snapgram::{Comment, DocumentList, Post, Reference, ResolutionIssue, SavedPost, User};

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
}

/// Global CLI options that affect output
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub no_color: bool,
}

/// Data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
        }
        Ok(())
    }

    /// Display a warning message on stderr
    pub fn warning(&self, message: &str) {
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.warning)
        } else {
            format!("{} {}", ICONS.warning.color(THEME.warning), message.color(THEME.warning))
        };
        eprintln!("{output}");
    }

    /// Display info message; suppressed for JSON output
    pub fn info(&self, message: &str) {
        if self.options.output_format == OutputFormat::Json {
            return;
        }
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.info)
        } else {
            format!("{} {}", ICONS.info.color(THEME.info), message.color(THEME.info))
        };
        println!("{output}");
    }

    pub fn issue(&self, issue: &ResolutionIssue) {
        self.warning(&format!(
            "{} {}/{} field '{}': {}",
            issue.kind.as_str(),
            issue.collection,
            issue.document_id,
            issue.field,
            issue.message
        ));
    }
}

fn new_table(options: &GlobalOptions, headers: &[&str]) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| {
            let cell = Cell::new(h).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
    table
}

/// Display name of a user reference, marking anything that did not resolve.
pub fn user_label(reference: &Reference<User>) -> String {
    match reference {
        Reference::Resolved(user) => match &user.username {
            Some(username) => format!("{} (@{username})", user.name),
            None => user.name.clone(),
        },
        Reference::Unresolved(id) => format!("{id} (unresolved)"),
        Reference::Malformed(_) => "-".to_string(),
    }
}

fn post_row(post: &Post) -> Vec<Cell> {
    vec![
        Cell::new(&post.id),
        Cell::new(user_label(&post.creator)),
        Cell::new(&post.caption),
        Cell::new(post.tags.join(", ")),
        Cell::new(format!("{} {}", ICONS.heart, post.likes.len())),
    ]
}

const POST_HEADERS: [&str; 5] = ["Id", "Creator", "Caption", "Tags", "Likes"];

impl TableDisplay for DocumentList<Post> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options, &POST_HEADERS);
        if self.is_empty() {
            table.add_row(vec![Cell::new("No posts found")]);
        }
        for post in &self.documents {
            table.add_row(post_row(post));
        }
        table
    }
}

impl TableDisplay for Post {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options, &["Field", "Value"]);
        let posted = self.posted_at.or(self.created_at).map(|at| at.to_rfc3339()).unwrap_or_default();
        table.add_row(vec![Cell::new("Id"), Cell::new(&self.id)]);
        table.add_row(vec![Cell::new("Creator"), Cell::new(user_label(&self.creator))]);
        table.add_row(vec![Cell::new("Caption"), Cell::new(&self.caption)]);
        table.add_row(vec![Cell::new("Location"), Cell::new(self.location.as_deref().unwrap_or("-"))]);
        table.add_row(vec![Cell::new("Tags"), Cell::new(self.tags.join(", "))]);
        table.add_row(vec![Cell::new("Images"), Cell::new(self.image_urls.join("\n"))]);
        table.add_row(vec![Cell::new("Likes"), Cell::new(self.likes.len())]);
        table.add_row(vec![Cell::new("Posted"), Cell::new(posted)]);
        table
    }
}

impl TableDisplay for Vec<SavedPost> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut headers = vec!["Save"];
        headers.extend(POST_HEADERS);
        let mut table = new_table(options, &headers);
        if self.is_empty() {
            table.add_row(vec![Cell::new("No saved posts")]);
        }
        for saved in self {
            let mut row = vec![Cell::new(&saved.save_id)];
            row.extend(post_row(&saved.post));
            table.add_row(row);
        }
        table
    }
}

impl TableDisplay for Vec<Comment> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options, &["Id", "Author", "Comment", "Created"]);
        if self.is_empty() {
            table.add_row(vec![Cell::new("No comments")]);
        }
        for comment in self {
            table.add_row(vec![
                Cell::new(&comment.id),
                Cell::new(user_label(&comment.author)),
                Cell::new(&comment.comment_text),
                Cell::new(comment.created_at.to_rfc3339()),
            ]);
        }
        table
    }
}

impl TableDisplay for User {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = new_table(options, &["Field", "Value"]);
        table.add_row(vec![Cell::new("Id"), Cell::new(&self.id)]);
        table.add_row(vec![Cell::new("Name"), Cell::new(&self.name)]);
        table.add_row(vec![Cell::new("Username"), Cell::new(self.username.as_deref().unwrap_or("-"))]);
        table.add_row(vec![Cell::new("Email"), Cell::new(&self.email)]);
        table.add_row(vec![Cell::new("Bio"), Cell::new(self.bio.as_deref().unwrap_or("-"))]);
        table.add_row(vec![Cell::new("Followers"), Cell::new(self.followers.len())]);
        table.add_row(vec![Cell::new("Following"), Cell::new(self.following.len())]);
        table
    }
}
