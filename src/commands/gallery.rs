use super::{build_request, open_documents};
use crate::cli::SelectionArgs;
use crate::gallery::{build_gallery, write_arrangement, TextPreview};
use crate::selection::{derive_selection, Layout};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(args: &SelectionArgs, output: Option<&Path>, preview_chars: usize) -> Result<()> {
    let request = build_request(
        &args.pages_a,
        &args.pages_b,
        &args.order,
        args.arrangement.as_deref(),
        Layout::Sequential,
    )?;
    let documents = open_documents(&args.pdf_a, &args.pdf_b)?;

    let selection = derive_selection(&request, &documents.map(|d| d.page_count()))?;
    let mut renderer = TextPreview::new(preview_chars);
    let entries = build_gallery(&selection, &documents, &mut renderer);

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_arrangement(&entries, file)?;
            println!(
                "Wrote {} entries to {}; reorder them and pass the file back with --arrangement",
                entries.len(),
                path.display()
            );
        }
        None => {
            write_arrangement(&entries, std::io::stdout().lock())?;
            println!();
        }
    }

    Ok(())
}
