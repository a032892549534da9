//! Subcommands of the `qttt` binary

pub mod inspect;
pub mod play;
pub mod train;
