use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_START_HOUR: u8 = 9;
pub const DEFAULT_END_HOUR: u8 = 18;
pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const DEFAULT_WORKING_DAYS: [u8; 5] = [0, 1, 2, 3, 4];

/// Service settings read from `turnero.toml`.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub addr: String,
    pub timezone: String,
    pub static_dir: String,
    pub default_horizon_days: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".into(),
            timezone: "America/Montevideo".into(),
            static_dir: "static".into(),
            default_horizon_days: 90,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".into(),
        }
    }
}

/// Per-business document stored under `config_negocios/<id>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusinessConfig {
    pub max_calendarios: u32,
    pub calendarios: BTreeMap<String, CalendarConfig>,
    /// Keys we don't model are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            max_calendarios: 1,
            calendarios: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl BusinessConfig {
    pub fn calendar(&self, calendar_id: u32) -> Option<&CalendarConfig> {
        self.calendarios.get(&calendar_id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub nombre: String,
    pub horario_inicio: u8,
    pub horario_fin: u8,
    pub duracion_turno_min: u32,
    pub dias_habiles: BTreeSet<u8>,
    pub fecha_maxima_reserva: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            horario_inicio: DEFAULT_START_HOUR,
            horario_fin: DEFAULT_END_HOUR,
            duracion_turno_min: DEFAULT_SLOT_MINUTES,
            dias_habiles: DEFAULT_WORKING_DAYS.into_iter().collect(),
            fecha_maxima_reserva: None,
            extra: Map::new(),
        }
    }
}

/// Partial update of a [`CalendarConfig`]. Fields left as `None` keep the
/// value already stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarPatch {
    pub nombre: Option<String>,
    pub horario_inicio: Option<u8>,
    pub horario_fin: Option<u8>,
    pub duracion_turno_min: Option<u32>,
    pub dias_habiles: Option<BTreeSet<u8>>,
    pub fecha_maxima_reserva: Option<Option<String>>,
}

impl CalendarPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(self, cal: &mut CalendarConfig) {
        if let Some(nombre) = self.nombre {
            cal.nombre = nombre;
        }
        if let Some(h) = self.horario_inicio {
            cal.horario_inicio = h;
        }
        if let Some(h) = self.horario_fin {
            cal.horario_fin = h;
        }
        if let Some(m) = self.duracion_turno_min {
            cal.duracion_turno_min = m;
        }
        if let Some(days) = self.dias_habiles {
            cal.dias_habiles = days;
        }
        if let Some(fecha) = self.fecha_maxima_reserva {
            cal.fecha_maxima_reserva = fecha;
        }
    }
}

/// One booked slot. Keys written by other tools ride along in `extra` so a
/// rewrite of the day file keeps them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Reservation {
    pub fecha: String,
    pub hora: String,
    pub usuario: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlotEntry {
    pub hora: String,
}

/// Day-level availability for one calendar, as served to the booking page.
#[derive(Debug, Serialize)]
pub struct Availability {
    pub dias: BTreeMap<String, Vec<Reservation>>,
    pub bloques_por_dia_semana: BTreeMap<String, Vec<SlotEntry>>,
    pub fecha_maxima_reserva: Option<String>,
}
