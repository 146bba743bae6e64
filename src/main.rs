//! Scriptref CLI binary
//!
//! This is the main entry point for the scriptref command-line interface.
//! The CLI is a thin adapter over existing APIs - NO logic is implemented here.

use scriptref::cli::{CliErrorPayload, CliSuccessPayload, Commands, MatchPayload};
use scriptref::model::TypeTable;
use scriptref::query::{Query, QueryEngine};
use scriptref::search::{LimitTo, QueryDescriptor, SearchAdapter, SearchMatch, WorkspaceScope};
use scriptref::workspace::WorkspaceIndex;
use scriptref::ScriptRefError;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = scriptref::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::init();
    }

    let workspace = WorkspaceIndex::new(cli.config());

    // Execute command
    let result = match cli.command {
        Commands::Index { file, records } => execute_index(&workspace, &file, &records),
        Commands::Refs { type_name, member } => {
            execute_refs(&workspace, type_name.as_deref(), member.as_deref())
        }
        Commands::Search {
            pattern,
            kind,
            ignore_case,
        } => execute_search(
            &workspace,
            Query::Pattern {
                pattern,
                kind: kind.into(),
                case_sensitive: !ignore_case,
            },
        ),
        Commands::Clear {
            file,
            container,
            all,
        } => execute_clear(&workspace, file.as_deref(), container.as_deref(), all),
        Commands::Stats => execute_stats(&workspace),
    };

    // Handle result
    match result {
        Ok(payload) => {
            if cli.json {
                match serde_json::to_string(&payload) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::from(1);
                    }
                }
            } else {
                println!("{}", payload.message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.json {
                let payload = CliErrorPayload::from_error(&e);
                let json = serde_json::to_string(&payload).unwrap_or_else(|_| e.to_string());
                eprintln!("{}", json);
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(1)
        }
    }
}

/// Persist the index or report why it could not be saved.
fn save(workspace: &WorkspaceIndex) -> Result<(), ScriptRefError> {
    if workspace.save() {
        Ok(())
    } else {
        Err(ScriptRefError::Other(format!(
            "Failed to save index to {}",
            workspace.config().index_path.display()
        )))
    }
}

/// Execute the index command.
///
/// Decodes the entries (skipping malformed ones), replaces the file's
/// records and saves the index.
fn execute_index(
    workspace: &WorkspaceIndex,
    file: &str,
    records_path: &std::path::Path,
) -> Result<CliSuccessPayload, ScriptRefError> {
    let entries = scriptref::cli::read_record_entries(records_path, file)?;
    let total = entries.len();
    let records = scriptref::persist::decode_entries(entries);
    let decoded = records.len();

    let index = workspace.index();
    index.replace_file(file, records);
    let stored = index.records_for_file(file).len();
    save(workspace)?;

    Ok(CliSuccessPayload::with_data(
        format!("Indexed {} references in '{}'", stored, file),
        serde_json::json!({
            "file": file,
            "entries": total,
            "decoded": decoded,
            "stored": stored,
        }),
    ))
}

/// Execute the refs command (element query without resolution).
fn execute_refs(
    workspace: &WorkspaceIndex,
    type_name: Option<&str>,
    member: Option<&str>,
) -> Result<CliSuccessPayload, ScriptRefError> {
    let element = match (type_name, member) {
        (Some(type_name), _) => scriptref::model::ProgramElement::type_element(
            scriptref::reference::normalize_class_name(type_name)?,
        ),
        (None, Some(member)) => scriptref::cli::parse_member_element(member)?,
        (None, None) => {
            return Err(ScriptRefError::Other(
                "Specify --type or --member".to_string(),
            ))
        }
    };

    execute_search(
        workspace,
        Query::Element {
            element,
            resolve: false,
        },
    )
}

/// Execute a query through the search adapter and format the matches.
fn execute_search(
    workspace: &WorkspaceIndex,
    query: Query,
) -> Result<CliSuccessPayload, ScriptRefError> {
    // Surface pattern errors instead of the adapter's "no matches".
    if let Query::Pattern { pattern, .. } = &query {
        scriptref::index::pattern::WildcardPattern::new(pattern, true)?;
    }

    let engine = QueryEngine::new(workspace.index(), Arc::new(TypeTable::new()));
    let adapter = SearchAdapter::new(engine);
    let descriptor = QueryDescriptor {
        query,
        limit_to: LimitTo::References,
    };

    let mut matches: Vec<SearchMatch> = Vec::new();
    adapter.search(&descriptor, &WorkspaceScope, &mut matches);

    let payloads: Vec<MatchPayload> = matches.iter().map(MatchPayload::from).collect();
    let mut message = format!("{} matches", payloads.len());
    for found in &payloads {
        message.push_str(&format!(
            "\n{}:{}:{}  {}",
            found.file, found.offset, found.length, found.reference
        ));
    }

    Ok(CliSuccessPayload::with_data(
        message,
        serde_json::to_value(&payloads)?,
    ))
}

/// Execute the clear command.
fn execute_clear(
    workspace: &WorkspaceIndex,
    file: Option<&str>,
    container: Option<&str>,
    all: bool,
) -> Result<CliSuccessPayload, ScriptRefError> {
    let index = workspace.index();
    let message = match (file, container, all) {
        (Some(file), _, _) => {
            index.clear_file(file);
            format!("Cleared '{}'", file)
        }
        (None, Some(container), _) => {
            index.clear_container(container);
            format!("Cleared files under '{}'", container)
        }
        (None, None, true) => {
            index.clear();
            "Cleared index".to_string()
        }
        (None, None, false) => {
            return Err(ScriptRefError::Other(
                "Specify --file, --container or --all".to_string(),
            ))
        }
    };
    save(workspace)?;
    Ok(CliSuccessPayload::message_only(message))
}

/// Execute the stats command.
fn execute_stats(workspace: &WorkspaceIndex) -> Result<CliSuccessPayload, ScriptRefError> {
    let stats = workspace.index().stats();
    let live = workspace.live_size();
    let mut data = serde_json::to_value(stats)?;
    data["live_records"] = serde_json::json!(live);
    Ok(CliSuccessPayload::with_data(
        format!(
            "{} files, {} references ({} in live files), {} element keys",
            stats.files, stats.records, live, stats.element_keys
        ),
        data,
    ))
}
