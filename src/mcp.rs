use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::{build_request, open_documents};
use crate::error::MixError;
use crate::gallery::{build_gallery, write_arrangement, TextPreview};
use crate::pdf::{generate, save, SourceDocument};
use crate::selection::{derive_selection, GenerationRequest, Layout};
use crate::source::PerSource;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectionRequest {
    #[schemars(description = "Path to PDF A")]
    pub pdf_a: String,
    #[schemars(description = "Path to PDF B")]
    pub pdf_b: String,
    #[schemars(description = "Pages from A (e.g. '1,3-5', 'all', '-4', '7-'); blank selects none")]
    #[serde(default)]
    pub pages_a: String,
    #[schemars(description = "Pages from B (e.g. '2,4'); blank selects none")]
    #[serde(default)]
    pub pages_b: String,
    #[schemars(description = "Final order (e.g. 'A1-3,B5,A10'); blank means A's pages, then B's")]
    #[serde(default)]
    pub order: String,
    #[schemars(description = "Path to an arrangement file written by pdf_gallery; overrides order")]
    pub arrangement: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[serde(flatten)]
    pub selection: SelectionRequest,
    #[schemars(description = "Place two pages side by side on each sheet (default: false)")]
    #[serde(default)]
    pub two_up: bool,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfGalleryRequest {
    #[serde(flatten)]
    pub selection: SelectionRequest,
    #[schemars(description = "Where to write the arrangement file (optional)")]
    pub output: Option<String>,
}

impl SelectionRequest {
    fn load(&self, layout: Layout) -> Result<(GenerationRequest, PerSource<SourceDocument>)> {
        let request = build_request(
            &self.pages_a,
            &self.pages_b,
            &self.order,
            self.arrangement.as_deref().map(Path::new),
            layout,
        )?;
        let documents = open_documents(&self.pdf_a, &self.pdf_b)?;
        Ok((request, documents))
    }
}

#[derive(Debug, Clone)]
pub struct MixServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl MixServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for MixServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl MixServer {
    #[tool(description = "Get the page count and title, author and producer of a PDF")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match SourceDocument::open(&path) {
            Ok(doc) => {
                let info = doc.get_info();
                let result = PdfInfoResult {
                    path,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    producer: info.producer,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Build a new PDF from pages of PDF A and PDF B. Select pages per source with range syntax like '1,3-5' and order them with tokens like 'A1-3,B5,A10'.")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        let layout = if req.two_up {
            Layout::TwoUp
        } else {
            Layout::Sequential
        };
        let (request, documents) = match req.selection.load(layout) {
            Ok(loaded) => loaded,
            Err(e) => return format!("Error: {:#}", e),
        };

        let (selection, mut merged) = match generate(&request, &documents) {
            Ok(generated) => generated,
            Err(e) => return format!("Error: {}", e),
        };
        if selection.is_empty() {
            return "Error: No pages selected".to_string();
        }

        if let Err(e) = save(&mut merged, &req.output) {
            return format!("Error: {}", e);
        }

        let result = MergeResult {
            output_path: req.output,
            page_count: selection.len() as u32,
            sheet_count: merged.get_pages().len() as u32,
            order: selection.pages().iter().map(|p| p.to_string()).collect(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "List the selected pages of PDF A and PDF B in output order with short text previews. Reorder the entries and pass them back to pdf_merge as an arrangement file.")]
    fn pdf_gallery(&self, Parameters(req): Parameters<PdfGalleryRequest>) -> String {
        let (request, documents) = match req.selection.load(Layout::Sequential) {
            Ok(loaded) => loaded,
            Err(e) => return format!("Error: {:#}", e),
        };

        let selection = match derive_selection(&request, &documents.map(|d| d.page_count())) {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };
        let entries = build_gallery(&selection, &documents, &mut TextPreview::default());

        if let Some(output) = &req.output {
            let written = std::fs::File::create(output)
                .map_err(MixError::from)
                .and_then(|file| write_arrangement(&entries, file));
            if let Err(e) = written {
                return format!("Error: {}", e);
            }
        }

        serde_json::to_string_pretty(&entries).unwrap_or_else(|e| format!("Error: {}", e))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergeResult {
    pub output_path: String,
    pub page_count: u32,
    pub sheet_count: u32,
    pub order: Vec<String>,
}

impl ServerHandler for MixServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Tools for combining pages of two PDFs. Use pdf_info to get page counts, \
                 pdf_gallery to preview the selected pages in output order, and pdf_merge to \
                 write the combined PDF, one page per sheet or two-up."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = MixServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
