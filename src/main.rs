mod booking;
mod commands;
mod config;
mod error;
mod models;
mod scheduler;
mod slots;
mod store;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Appointment booking for businesses with one or more calendars.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to settings file
    #[arg(short = 'c', long, global = true, default_value = "turnero.toml")]
    config: PathBuf,

    /// Debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Listen address, overrides the settings file (e.g. "0.0.0.0:8000")
        #[arg(short = 'a', long)]
        addr: Option<String>,
    },

    /// List bookable slots for a calendar
    ///
    /// Examples:
    ///   slots peluqueria 1 --fecha 2024-06-03
    ///   slots peluqueria 1 --dia 0          (0 = Monday)
    Slots {
        negocio: String,
        calendario: u32,

        /// Date (YYYY-MM-DD) whose weekday to use
        #[arg(short, long, conflicts_with = "dia")]
        fecha: Option<String>,

        /// Weekday number, 0 = Monday .. 6 = Sunday. Defaults to today.
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=6))]
        dia: Option<u8>,
    },

    /// Book a slot
    Book {
        negocio: String,
        calendario: u32,
        /// Date, YYYY-MM-DD
        fecha: String,
        /// Time, HH:MM
        hora: String,
        usuario: String,
    },

    /// Show reservations stored for a date
    Reservations {
        negocio: String,
        calendario: u32,
        /// Date, YYYY-MM-DD
        fecha: String,
    },

    /// Availability summary for the year ahead
    Availability { negocio: String, calendario: u32 },

    /// Create or update a calendar; only the given fields change
    Calendar {
        negocio: String,
        calendario: u32,

        #[arg(long)]
        nombre: Option<String>,

        /// Opening hour (0-23)
        #[arg(long)]
        inicio: Option<u8>,

        /// Closing hour (0-23), exclusive
        #[arg(long)]
        fin: Option<u8>,

        /// Slot length in minutes
        #[arg(long)]
        duracion: Option<u32>,

        /// Working days, comma-separated numbers (0 = Monday), e.g. "0,1,2,3,4"
        #[arg(long)]
        dias: Option<String>,

        /// Last bookable date, YYYY-MM-DD
        #[arg(long, conflicts_with = "sin_fecha_maxima")]
        fecha_maxima: Option<String>,

        /// Remove the last bookable date
        #[arg(long)]
        sin_fecha_maxima: bool,
    },

    /// Print a business config as stored
    ShowConfig { negocio: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let settings = config::load_settings(&cli.config)?;

    match cli.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| settings.service.addr.clone());
            web::serve(settings, &addr).await?;
        }
        Command::Slots {
            negocio,
            calendario,
            fecha,
            dia,
        } => {
            let engine = config::open_engine(&settings)?;
            commands::run_slots(&engine, &negocio, calendario, fecha.as_deref(), dia)?;
        }
        Command::Book {
            negocio,
            calendario,
            fecha,
            hora,
            usuario,
        } => {
            let engine = config::open_engine(&settings)?;
            commands::run_book(&engine, &negocio, calendario, &fecha, &hora, &usuario)?;
        }
        Command::Reservations {
            negocio,
            calendario,
            fecha,
        } => {
            let engine = config::open_engine(&settings)?;
            commands::run_reservations(&engine, &negocio, calendario, &fecha)?;
        }
        Command::Availability {
            negocio,
            calendario,
        } => {
            let engine = config::open_engine(&settings)?;
            commands::run_availability(&engine, &negocio, calendario, cli.verbose)?;
        }
        Command::Calendar {
            negocio,
            calendario,
            nombre,
            inicio,
            fin,
            duracion,
            dias,
            fecha_maxima,
            sin_fecha_maxima,
        } => {
            let dias_habiles = dias.as_deref().map(commands::parse_days).transpose()?;
            let fecha_maxima_reserva = if sin_fecha_maxima {
                Some(None)
            } else {
                fecha_maxima.map(Some)
            };
            let patch = models::CalendarPatch {
                nombre,
                horario_inicio: inicio,
                horario_fin: fin,
                duracion_turno_min: duracion,
                dias_habiles,
                fecha_maxima_reserva,
            };
            let engine = config::open_engine(&settings)?;
            commands::run_calendar(&engine, &negocio, calendario, patch)?;
        }
        Command::ShowConfig { negocio } => {
            let engine = config::open_engine(&settings)?;
            commands::run_show_config(&engine, &negocio)?;
        }
    }

    Ok(())
}
