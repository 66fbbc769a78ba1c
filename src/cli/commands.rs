use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notemate")]
#[command(version, about = "Personal notes with user-defined ordering")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Owner whose notes are read and written
    #[arg(long, global = true, default_value = "local")]
    pub owner: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new notemate project in the current directory
    Init,

    /// Run the HTTP API server
    Serve {
        /// Address to bind, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Add a note at the end of the owner's list
    Add {
        /// Note title
        title: String,

        /// Note body
        #[arg(long, short = 'c')]
        content: String,

        /// Status (active, archived, completed)
        #[arg(long, default_value = "active")]
        status: String,

        /// Background colour as hex
        #[arg(long)]
        background: Option<String>,

        /// Text colour as hex
        #[arg(long)]
        text_color: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes in display order
    List {
        /// Only notes with this status (active, archived, completed, all)
        #[arg(long, short = 's')]
        status: Option<String>,

        /// Case-insensitive text to find in the title or content
        #[arg(long, short = 'q')]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many notes have each status
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get a single note by ID
    Get {
        /// Note ID (UUID or prefix like "a1b2c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a note's fields; its position is left alone
    Update {
        /// Note ID (UUID or prefix)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'c')]
        content: Option<String>,

        /// Status (active, archived, completed)
        #[arg(long)]
        status: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a note
    Delete {
        /// Note ID (UUID or prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Move one note to a new position, shifting the notes in between
    Move {
        /// Note ID (UUID or prefix)
        id: String,

        /// Target position (0-based, clamped to the list)
        #[arg(allow_negative_numbers = true)]
        new_order: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the whole arrangement with the given ID sequence
    Reorder {
        /// Every note ID in the desired order (UUIDs or prefixes)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage API tokens
    Token(TokenCommand),
}

#[derive(Args, Debug)]
pub struct TokenCommand {
    #[command(subcommand)]
    pub action: TokenAction,
}

#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Allow a bearer token to act as an owner
    Add {
        token: String,
        owner: String,
    },

    /// List configured tokens
    List,

    /// Revoke a token
    Remove { token: String },
}
