use crate::selection::Layout;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagemix")]
#[command(about = "Combine pages from two PDFs into one, in any order, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The two inputs and how to pick and order their pages
#[derive(Args)]
pub struct SelectionArgs {
    /// PDF A
    pub pdf_a: PathBuf,

    /// PDF B
    pub pdf_b: PathBuf,

    /// Pages from A (e.g. "1,3-5", "all", "-4", "7-"); blank selects none
    #[arg(short = 'a', long, default_value = "")]
    pub pages_a: String,

    /// Pages from B (e.g. "2,4")
    #[arg(short = 'b', long, default_value = "")]
    pub pages_b: String,

    /// Final order (e.g. "A1-3,B5,A10"); blank means A's pages, then B's
    #[arg(long, default_value = "")]
    pub order: String,

    /// Arrangement file written by `gallery`; its order overrides --order
    #[arg(long)]
    pub arrangement: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display page count and metadata of a PDF
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Build a new PDF from pages of A and B
    #[command(alias = "generate")]
    Merge {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output layout
        #[arg(short, long, value_enum, default_value_t = Layout::Sequential)]
        layout: Layout,

        /// Output file
        #[arg(short, long, required_unless_present = "dry_run")]
        output: Option<PathBuf>,

        /// Print the resolved page order instead of writing a PDF
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the selected pages with text previews as an arrangement file
    Gallery {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Arrangement file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum preview length in characters
        #[arg(long, default_value = "80")]
        preview_chars: usize,
    },
}
