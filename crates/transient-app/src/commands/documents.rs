// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local document commands: merge, split, reorder, info.
//
// Results are uploaded to the store as temporary objects and optionally
// written to disk as well.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use transient_core::{DocumentType, StoredObject, TransformSpec};
use transient_document::PdfOutput;

use super::{print_json, read_input, write_output};
use crate::services::app_services::TransientService;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Input PDF files, merged in the order given
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Also write the merged document here
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Page-range groups, one output each (e.g. "1-3" "4,6"); a single
    /// argument may hold several groups separated by ';'
    #[arg(value_name = "RANGES", required = true)]
    pub groups: Vec<String>,

    /// Also write each part into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// New page order, 1-based and comma-separated (e.g. "3,1,2,4")
    #[arg(value_name = "ORDER", allow_hyphen_values = true)]
    pub order: String,

    /// Also write the reordered document here
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

/// Summary printed for each stored result.
#[derive(Debug, Serialize)]
struct StoredResult {
    id: String,
    url: String,
    page_count: usize,
    byte_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<PathBuf>,
}

pub async fn merge(service: &TransientService, args: MergeArgs) -> Result<()> {
    let mut documents = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        documents.push(read_input(path).await?);
    }

    let merged = service.merge_documents(documents).await?;
    let result = store_output(service, merged, args.output).await?;
    print_json(&result)
}

pub async fn split(service: &TransientService, args: SplitArgs) -> Result<()> {
    let document = read_input(&args.input).await?;
    let groups = expand_groups(&args.groups);
    let parts = service.split_document(document, groups).await?;

    if let Some(dir) = &args.output {
        tokio::fs::create_dir_all(dir).await?;
    }

    let stem = file_stem(&args.input);
    let mut results = Vec::with_capacity(parts.len());
    for (number, part) in parts.into_iter().enumerate() {
        let target = args
            .output
            .as_ref()
            .map(|dir| dir.join(format!("{stem}-part{}.pdf", number + 1)));
        let output = PdfOutput {
            bytes: part.bytes,
            page_count: part.page_count,
        };
        let mut result = store_output(service, output, target).await?;
        result.expression = Some(part.source_expression);
        results.push(result);
    }
    print_json(&results)
}

pub async fn reorder(service: &TransientService, args: ReorderArgs) -> Result<()> {
    let document = read_input(&args.input).await?;
    let order = parse_order(&args.order);
    let reordered = service.reorder_document(document, order).await?;
    let result = store_output(service, reordered, args.output).await?;
    print_json(&result)
}

pub async fn info(service: &TransientService, args: InfoArgs) -> Result<()> {
    let document = read_input(&args.input).await?;
    let info = service.document_info(document).await?;
    print_json(&info)
}

/// Upload a finished document and optionally mirror it to disk.
async fn store_output(
    service: &TransientService,
    output: PdfOutput,
    target: Option<PathBuf>,
) -> Result<StoredResult> {
    if let Some(path) = &target {
        write_output(path, &output.bytes).await?;
    }

    let page_count = output.page_count;
    let stored: StoredObject = service
        .upload_temporary(output.bytes, DocumentType::Pdf.resource_kind())
        .await?;
    let url = service.transform_url(&stored.id, stored.kind, &TransformSpec::default())?;

    Ok(StoredResult {
        id: stored.id.to_string(),
        url,
        page_count,
        byte_size: stored.byte_size,
        expression: None,
        written_to: target,
    })
}

/// Page order as typed by the operator.  Entries that are not integers are
/// dropped here; out-of-range pages are dropped by the engine.
fn parse_order(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|entry| entry.trim().parse::<i64>().ok())
        .collect()
}

/// Flatten arguments that carry several `;`-separated groups.
fn expand_groups(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| transient_document::pdf::range::group_segments(arg))
        .map(str::to_string)
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document")
        .to_string()
}
