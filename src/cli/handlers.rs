use std::env;
use std::io;
use std::path::PathBuf;

use tracing::warn;
use uuid::Uuid;

use crate::api::{self, types as validate};
use crate::config::NotemateConfig;
use crate::entity::{Note, NoteStatus};
use crate::error::{NotemateError, Result};
use crate::logging::{init_tracing, LogFormat};
use crate::storage::{NoteStore, NoteUpdate, NOTEMATE_DIR};

/// Find the project root by looking for .notemate/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(NOTEMATE_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<NoteStore> {
    NoteStore::open(&find_project_root())
}

fn invalid(err: api::ApiError) -> NotemateError {
    NotemateError::InvalidInput(err.to_string())
}

fn resolve_note(store: &NoteStore, owner: &str, id: &str) -> Result<Note> {
    store
        .find_note_by_prefix(owner, id)?
        .ok_or_else(|| NotemateError::NoteNotFound(id.to_string()))
}

fn print_note_line(note: &Note) {
    println!(
        "  {:>3}  ({}) [{}] {}",
        note.order,
        note.short_id(),
        note.status,
        note.base.title
    );
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let store = NoteStore::init(&root)?;
    if let Some(dir) = store.notemate_dir() {
        NotemateConfig::default().save(dir)?;
    }

    println!("Initialized notemate project in {}", root.display());
    println!("  Add an API token with: notemate token add <token> <owner>");

    Ok(())
}

pub fn handle_serve(bind: Option<String>) -> Result<()> {
    init_tracing(LogFormat::from_env());

    let root = find_project_root();
    let store = NoteStore::open(&root)?;
    let mut config = NotemateConfig::load(&root.join(NOTEMATE_DIR))?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if config.tokens.is_empty() {
        warn!("No API tokens configured, every /api request will be rejected");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(store, config))
}

pub fn handle_add(
    owner: &str,
    title: String,
    content: String,
    status: String,
    background: Option<String>,
    text_color: Option<String>,
    json: bool,
) -> Result<()> {
    validate::validate_title(&title).map_err(invalid)?;
    validate::validate_content(&content).map_err(invalid)?;

    let mut note = Note::new(owner.to_string(), title.trim().to_string(), content);
    note.status = validate::parse_status(&status).map_err(invalid)?;
    if let Some(background) = background {
        note.theme.background_color = background;
    }
    if let Some(text_color) = text_color {
        note.theme.text_color = text_color;
    }
    validate::validate_theme(&note.theme).map_err(invalid)?;

    let store = open_store()?;
    let note = store.insert_note(&note)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "Created note ({}) at position {} - {}",
            note.short_id(),
            note.order,
            note.base.title
        );
    }

    Ok(())
}

pub fn handle_list(
    owner: &str,
    status: Option<String>,
    search: Option<String>,
    json: bool,
) -> Result<()> {
    let filter = validate::ListQuery { status, q: search }
        .into_filter()
        .map_err(invalid)?;

    let store = open_store()?;
    let notes = store.list_filtered(owner, &filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() && !filter.is_empty() {
        println!("No notes match.");
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes for {}:\n", owner);
        for note in &notes {
            print_note_line(note);
        }
    }

    Ok(())
}

pub fn handle_stats(owner: &str, json: bool) -> Result<()> {
    let store = open_store()?;
    let counts = store.count_by_status(owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Notes for {}:\n", owner);
        println!("  {:<10} {}", NoteStatus::Active.to_string(), counts.active);
        println!("  {:<10} {}", NoteStatus::Archived.to_string(), counts.archived);
        println!("  {:<10} {}", NoteStatus::Completed.to_string(), counts.completed);
        println!("  {:<10} {}", "total", counts.total);
    }

    Ok(())
}

pub fn handle_get(owner: &str, id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = resolve_note(&store, owner, &id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{} ({})", note.base.title, note.base.id);
        println!("Position: {}", note.order);
        println!("Status: {}", note.status);
        println!(
            "Theme: background {} / text {}",
            note.theme.background_color, note.theme.text_color
        );
        println!("Created: {}", note.base.created_at.format("%Y-%m-%d %H:%M:%S"));
        println!("\n{}", note.base.content);
    }

    Ok(())
}

pub fn handle_update(
    owner: &str,
    id: String,
    title: Option<String>,
    content: Option<String>,
    status: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(title) = &title {
        validate::validate_title(title).map_err(invalid)?;
    }
    if let Some(content) = &content {
        validate::validate_content(content).map_err(invalid)?;
    }
    let status: Option<NoteStatus> = status
        .as_deref()
        .map(validate::parse_status)
        .transpose()
        .map_err(invalid)?;

    let updates = NoteUpdate {
        title: title.map(|t| t.trim().to_string()),
        content,
        theme: None,
        status,
    };
    if updates.is_empty() {
        return Err(NotemateError::InvalidInput(
            "nothing to update; pass --title, --content or --status".to_string(),
        ));
    }

    let store = open_store()?;
    let note = resolve_note(&store, owner, &id)?;
    let note = store.update_note(owner, &note.base.id, updates)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Updated note ({}) - {}", note.short_id(), note.base.title);
    }

    Ok(())
}

pub fn handle_delete(owner: &str, id: String, force: bool) -> Result<()> {
    let store = open_store()?;
    let note = resolve_note(&store, owner, &id)?;

    // Confirm deletion unless --force is used
    if !force {
        eprintln!("Delete note ({}) - {}? [y/N] ", note.short_id(), note.base.title);

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(NotemateError::InvalidInput(
                "Use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    store.delete_note(owner, &note.base.id)?;
    println!("Deleted note ({}) - {}", note.short_id(), note.base.title);

    Ok(())
}

pub fn handle_move(owner: &str, id: String, new_order: i64, json: bool) -> Result<()> {
    let mut store = open_store()?;
    let note = resolve_note(&store, owner, &id)?;
    let moved = store.move_note(owner, &note.base.id, new_order)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&moved)?);
    } else {
        println!(
            "Moved note ({}) from position {} to {} - {}",
            moved.short_id(),
            note.order,
            moved.order,
            moved.base.title
        );
    }

    Ok(())
}

pub fn handle_reorder(owner: &str, ids: Vec<String>, json: bool) -> Result<()> {
    let mut store = open_store()?;

    let mut resolved: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in &ids {
        resolved.push(resolve_note(&store, owner, id)?.base.id);
    }
    validate::validate_batch(&resolved).map_err(invalid)?;

    let notes = store.apply_ordering(owner, &resolved)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else {
        println!("Reordered {} notes:\n", notes.len());
        for note in &notes {
            print_note_line(note);
        }
    }

    Ok(())
}

fn config_dir() -> Result<PathBuf> {
    let dir = find_project_root().join(NOTEMATE_DIR);
    if !dir.exists() {
        return Err(NotemateError::NotInitialized);
    }
    Ok(dir)
}

pub fn handle_token_add(token: String, owner: String) -> Result<()> {
    if token.trim().is_empty() || owner.trim().is_empty() {
        return Err(NotemateError::InvalidInput(
            "token and owner must not be empty".to_string(),
        ));
    }

    let dir = config_dir()?;
    let mut config = NotemateConfig::load_file(&dir)?;
    config.tokens.insert(token, owner.clone());
    config.save(&dir)?;

    println!("Token added for owner '{}'", owner);
    Ok(())
}

pub fn handle_token_list() -> Result<()> {
    let config = NotemateConfig::load_file(&config_dir()?)?;

    if config.tokens.is_empty() {
        println!("No tokens configured.");
        return Ok(());
    }

    let mut entries: Vec<_> = config.tokens.iter().collect();
    entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));
    for (token, owner) in entries {
        let visible: String = token.chars().take(4).collect();
        println!("  {}…  -> {}", visible, owner);
    }
    Ok(())
}

pub fn handle_token_remove(token: String) -> Result<()> {
    let dir = config_dir()?;
    let mut config = NotemateConfig::load_file(&dir)?;

    if config.tokens.remove(&token).is_none() {
        return Err(NotemateError::InvalidInput("unknown token".to_string()));
    }
    config.save(&dir)?;

    println!("Token removed");
    Ok(())
}
