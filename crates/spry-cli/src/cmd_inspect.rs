/// Implementation of `spry inspect`.
///
/// Parses a runbook (no enrichment) and prints a human-readable summary
/// of every cell: kind, line span, and — for code cells — language, PI
/// bare tokens/flags, and any fence issues raised against it.
use anyhow::Result;

use spry_types::Cell;

use crate::pipeline::read_notebook_source;
use crate::InspectArgs;

pub fn run(args: &InspectArgs) -> Result<()> {
    let source = read_notebook_source(&args.file)?;
    let notebook = spry_parser::parse_notebook(&source);

    println!("cells: {}", notebook.cells.len());
    for (i, cell) in notebook.cells.iter().enumerate() {
        match cell {
            Cell::Markdown(md) => {
                println!("  [{i}] markdown  lines {}-{}", md.start_line, md.end_line);
            }
            Cell::Code(code) => {
                let bare = code.pi.as_ref().map(|pi| pi.bare.join(" ")).unwrap_or_default();
                println!(
                    "  [{i}] code({})  lines {}-{}  info={:?}  pi=[{bare}]  spawnable={}",
                    code.language,
                    code.start_line,
                    code.end_line,
                    code.info,
                    code.is_spawnable(),
                );
                if args.show_source {
                    for line in code.source.lines() {
                        println!("        | {line}");
                    }
                }
            }
        }
    }

    if notebook.has_fence_issues() {
        println!("issues:");
        for issue in &notebook.issues {
            println!("  {:?} (lines {}-{}): {}", issue.kind, issue.start_line, issue.end_line, issue.message);
        }
    }

    Ok(())
}
