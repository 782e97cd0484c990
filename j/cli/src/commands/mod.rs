//! One module per `j` subcommand.

pub mod clean;
pub mod install;
pub mod remote;
pub mod run;
pub mod setup;
pub mod skills;
pub mod status;
pub mod sync;
pub mod upgrade;
