//! Error type for booking, slot and storage operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Formato de fecha inválido. Use YYYY-MM-DD.")]
    InvalidDateFormat,

    #[error("El horario seleccionado no es válido o el día no es hábil para este calendario.")]
    InvalidSlot,

    #[error("El horario {hora} del día {fecha} ya está reservado para el calendario {calendario}.")]
    SlotAlreadyBooked {
        fecha: String,
        hora: String,
        calendario: u32,
    },

    #[error("Identificador de negocio inválido: '{0}'")]
    InvalidBusinessId(String),

    #[error("Configuración inválida: {0}")]
    InvalidConfig(String),

    #[error("Calendario no encontrado para este negocio.")]
    CalendarNotFound { negocio: String, calendario: u32 },

    /// Filesystem failure. Propagated as-is, never retried.
    #[error("Error de almacenamiento en '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored document exists but is not valid JSON for its type.
    #[error("Documento corrupto en '{}': {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BookingError {
    /// Errors caused by the caller's input, as opposed to storage failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage { .. } | Self::Corrupt { .. })
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
