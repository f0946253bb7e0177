//! Event administration commands.
//!
//! `event create` prints the new event's id, so scripts can capture it:
//!
//! ```sh
//! EVENT=$(ticketbook event create --title Gala --starts-at 2030-05-01T19:00:00Z \
//!     --capacity 100 --price 12.50 --admin)
//! ```

use crate::error::CliError;
use crate::utils::{format_timestamp, open_service, write_json, ActorArgs, GlobalOptions, OutputFormat};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use std::io::Write;
use ticketbook::{EventId, EventInventory, EventStatus, EventUpdate, Money};

/// Manage events.
#[derive(Subcommand)]
pub enum EventCommand {
    /// Create an event (administrators)
    Create(EventCreateCommand),

    /// Show one event
    Show(EventShowCommand),

    /// Edit an event's title, venue, start time or price (administrators)
    Update(EventUpdateCommand),

    /// Change an event's status (administrators)
    Status(EventStatusCommand),

    /// List events
    List(EventListCommand),
}

impl EventCommand {
    /// Execute the selected event subcommand.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        match self {
            Self::Create(cmd) => cmd.execute(global),
            Self::Show(cmd) => cmd.execute(global),
            Self::Update(cmd) => cmd.execute(global),
            Self::Status(cmd) => cmd.execute(global),
            Self::List(cmd) => cmd.execute(global),
        }
    }
}

/// Create an event.
#[derive(Args)]
pub struct EventCreateCommand {
    /// Event title
    #[arg(long)]
    pub title: String,

    /// Start time (RFC 3339, e.g. 2030-05-01T19:00:00Z)
    #[arg(long, value_name = "TIME")]
    pub starts_at: DateTime<Utc>,

    /// Number of tickets
    #[arg(long, value_name = "N")]
    pub capacity: u32,

    /// Price per ticket (e.g. 12.50)
    #[arg(long, value_name = "AMOUNT", default_value = "0.00")]
    pub price: Money,

    /// Venue
    #[arg(long)]
    pub venue: Option<String>,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl EventCreateCommand {
    /// Execute the event create command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let event = EventInventory::builder(self.title, self.starts_at, self.capacity)
            .price(self.price)
            .venue(self.venue)
            .build()
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?;

        let mut service = open_service(global)?;
        let stored = service.create_event(&event, self.actor.actor())?;
        let id = stored
            .id()
            .ok_or_else(|| CliError::SemanticFailure("stored event has no id".into()))?;

        println!("{id}");
        if !global.quiet {
            eprintln!(
                "Created event {id} '{}' with {} ticket(s)",
                stored.title(),
                stored.total_capacity()
            );
        }
        Ok(())
    }
}

/// Show one event.
#[derive(Args)]
pub struct EventShowCommand {
    /// Event id
    pub event: i64,

    /// Output format
    #[arg(long, value_enum, default_value = "table", ignore_case = true)]
    pub format: OutputFormat,
}

impl EventShowCommand {
    /// Execute the event show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let service = open_service(global)?;
        let event = service.get_event(EventId::new(self.event))?;
        print_events(std::slice::from_ref(&event), self.format)
    }
}

/// Edit an event.
#[derive(Args)]
pub struct EventUpdateCommand {
    /// Event id
    pub event: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New start time (RFC 3339)
    #[arg(long, value_name = "TIME")]
    pub starts_at: Option<DateTime<Utc>>,

    /// New price per ticket; existing reservations keep what they paid
    #[arg(long, value_name = "AMOUNT")]
    pub price: Option<Money>,

    /// New venue
    #[arg(long, conflicts_with = "clear_venue")]
    pub venue: Option<String>,

    /// Remove the venue
    #[arg(long)]
    pub clear_venue: bool,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl EventUpdateCommand {
    fn update(&self) -> EventUpdate {
        let mut update = EventUpdate::new();
        if let Some(title) = &self.title {
            update = update.title(title.clone());
        }
        if let Some(starts_at) = self.starts_at {
            update = update.starts_at(starts_at);
        }
        if let Some(price) = self.price {
            update = update.price(price);
        }
        if self.venue.is_some() || self.clear_venue {
            update = update.venue(self.venue.clone());
        }
        update
    }

    /// Execute the event update command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let update = self.update();
        if update.is_empty() {
            return Err(CliError::InvalidArguments(
                "nothing to change (use --title, --starts-at, --price, --venue or --clear-venue)"
                    .into(),
            ));
        }

        let mut service = open_service(global)?;
        let event = service.update_event(EventId::new(self.event), &update, self.actor.actor())?;
        if !global.quiet {
            eprintln!(
                "Event {} '{}' now starts {}",
                self.event,
                event.title(),
                format_timestamp(event.starts_at())
            );
        }
        Ok(())
    }
}

/// Change an event's status.
#[derive(Args)]
pub struct EventStatusCommand {
    /// Event id
    pub event: i64,

    /// New status (active, cancelled, completed, postponed)
    pub status: EventStatus,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl EventStatusCommand {
    /// Execute the event status command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut service = open_service(global)?;
        let event = service.set_event_status(EventId::new(self.event), self.status, self.actor.actor())?;
        if !global.quiet {
            eprintln!("Event {} is now {}", self.event, event.status());
        }
        Ok(())
    }
}

/// List events.
#[derive(Args)]
pub struct EventListCommand {
    /// Only events that can be booked now
    #[arg(long)]
    pub bookable: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table", ignore_case = true)]
    pub format: OutputFormat,
}

impl EventListCommand {
    /// Execute the event list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let service = open_service(global)?;
        let events = if self.bookable {
            service.list_bookable_events()?
        } else {
            service.list_events()?
        };
        print_events(&events, self.format)
    }
}

fn print_events(events: &[EventInventory], format: OutputFormat) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return write_json(events);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "ID\tTITLE\tSTARTS_AT\tPRICE\tAVAILABLE\tTOTAL\tSTATUS")?;
    for e in events {
        writeln!(
            handle,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            e.id().map_or_else(|| "-".to_string(), |id| id.to_string()),
            e.title(),
            format_timestamp(e.starts_at()),
            e.price(),
            e.available_capacity(),
            e.total_capacity(),
            e.status(),
        )?;
    }
    Ok(())
}
