use clap::Parser;
use notemate::cli::{
    handle_add, handle_delete, handle_get, handle_init, handle_list, handle_move, handle_reorder,
    handle_serve, handle_stats, handle_token_add, handle_token_list, handle_token_remove,
    handle_update, Cli, Commands, TokenAction,
};

fn main() {
    let cli = Cli::parse();
    let owner = cli.owner.as_str();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Serve { bind } => handle_serve(bind),
        Commands::Add {
            title,
            content,
            status,
            background,
            text_color,
            json,
        } => handle_add(owner, title, content, status, background, text_color, json),
        Commands::List {
            status,
            search,
            json,
        } => handle_list(owner, status, search, json),
        Commands::Stats { json } => handle_stats(owner, json),
        Commands::Get { id, json } => handle_get(owner, id, json),
        Commands::Update {
            id,
            title,
            content,
            status,
            json,
        } => handle_update(owner, id, title, content, status, json),
        Commands::Delete { id, force } => handle_delete(owner, id, force),
        Commands::Move {
            id,
            new_order,
            json,
        } => handle_move(owner, id, new_order, json),
        Commands::Reorder { ids, json } => handle_reorder(owner, ids, json),
        Commands::Token(token_cmd) => match token_cmd.action {
            TokenAction::Add { token, owner } => handle_token_add(token, owner),
            TokenAction::List => handle_token_list(),
            TokenAction::Remove { token } => handle_token_remove(token),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
