use super::{build_request, open_documents};
use crate::cli::SelectionArgs;
use crate::pdf::{generate, save, SourceDocument};
use crate::selection::{derive_selection, GenerationRequest, Layout};
use crate::source::PerSource;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(
    args: &SelectionArgs,
    layout: Layout,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let request = build_request(
        &args.pages_a,
        &args.pages_b,
        &args.order,
        args.arrangement.as_deref(),
        layout,
    )?;
    let documents = open_documents(&args.pdf_a, &args.pdf_b)?;

    if dry_run {
        println!("{}", dry_run_order(&request, &documents)?);
        return Ok(());
    }

    let (selection, mut merged) = generate(&request, &documents)?;

    if selection.is_empty() {
        anyhow::bail!("No pages selected");
    }

    let Some(output) = output else {
        anyhow::bail!("No output file specified");
    };
    save(&mut merged, output)
        .with_context(|| format!("Failed to save PDF: {}", output.display()))?;

    println!(
        "Wrote {} page(s) on {} sheet(s) to {}",
        selection.len(),
        merged.get_pages().len(),
        output.display()
    );

    Ok(())
}

/// The final order as "A1,B2,...", without reading any page
fn dry_run_order(
    request: &GenerationRequest,
    documents: &PerSource<SourceDocument>,
) -> Result<String> {
    let selection = derive_selection(request, &documents.map(SourceDocument::page_count))?;
    if selection.is_empty() {
        anyhow::bail!("No pages selected");
    }
    let order: Vec<String> = selection.pages().iter().map(|p| p.to_string()).collect();
    Ok(order.join(","))
}
