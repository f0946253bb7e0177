//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `init`: Create the data directory and database
//! - `event`: Create, show, edit and list events, and change their status
//! - `reserve`: Book tickets (or hold them for review), printing the code
//! - `cancel`: Cancel a reservation
//! - `set_status`: Administrative status override
//! - `show`: Show one reservation by id or code
//! - `list`: List reservations by user, event, or all
//! - `audit`: Check capacity conservation for an event
//! - `completions`: Generate shell completion scripts

pub mod audit;
pub mod cancel;
pub mod completions;
pub mod event;
pub mod init;
pub mod list;
pub mod reserve;
pub mod set_status;
pub mod show;

pub use audit::AuditCommand;
pub use cancel::CancelCommand;
pub use completions::CompletionsCommand;
pub use event::EventCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use reserve::ReserveCommand;
pub use set_status::SetStatusCommand;
pub use show::ShowCommand;
