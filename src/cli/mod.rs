mod commands;
mod handlers;

pub use commands::{Cli, Commands, TokenAction, TokenCommand};
pub use handlers::{
    handle_add, handle_delete, handle_get, handle_init, handle_list, handle_move, handle_reorder,
    handle_serve, handle_stats, handle_token_add, handle_token_list, handle_token_remove,
    handle_update,
};
