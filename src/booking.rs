use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::{BookingError, Result};
use crate::models::{Availability, BusinessConfig, CalendarPatch, Reservation, SlotEntry};
use crate::scheduler;
use crate::slots::{self, Slots};
use crate::store::{ConfigStore, KvStore, ReservationStore};

/// Days scanned forward from today when building an availability view.
const AVAILABILITY_WINDOW_DAYS: i64 = 366;

/// Upper bound on calendars per business accepted from admin input.
pub const MAX_CALENDARS: u32 = 50;

#[derive(Clone)]
pub struct BookingEngine {
    configs: ConfigStore,
    reservas: ReservationStore,
    tz: Tz,
}

impl BookingEngine {
    pub fn new(kv: Arc<dyn KvStore>, tz: Tz) -> Self {
        Self {
            configs: ConfigStore::new(Arc::clone(&kv)),
            reservas: ReservationStore::new(kv),
            tz,
        }
    }

    pub fn now(&self) -> DateTime<Tz> {
        scheduler::now(self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn load_config(&self, negocio: &str) -> Result<BusinessConfig> {
        self.configs.load(negocio)
    }

    pub fn save_config(&self, negocio: &str, config: &BusinessConfig) -> Result<()> {
        self.configs.save(negocio, config)
    }

    pub fn slots(&self, negocio: &str, calendario: u32, weekday: u8) -> Result<Slots> {
        let config = self.configs.load(negocio)?;
        Ok(slots::bloques_horarios(&config, calendario, weekday))
    }

    pub fn generate_slots(&self, negocio: &str, calendario: u32, weekday: u8) -> Result<Vec<SlotEntry>> {
        Ok(self.slots(negocio, calendario, weekday)?.collect())
    }

    pub fn create_reservation(
        &self,
        negocio: &str,
        fecha: &str,
        hora: &str,
        usuario: &str,
        calendario: u32,
    ) -> Result<Reservation> {
        self.create_reservation_at(negocio, fecha, hora, usuario, calendario, self.now())
    }

    /// Same as [`create_reservation`](Self::create_reservation) with an explicit
    /// creation instant.
    pub fn create_reservation_at(
        &self,
        negocio: &str,
        fecha: &str,
        hora: &str,
        usuario: &str,
        calendario: u32,
        at: DateTime<Tz>,
    ) -> Result<Reservation> {
        let date = scheduler::parse_fecha(fecha)?;
        let dia_del_anio = scheduler::day_of_year_key(date);
        let weekday = scheduler::weekday_num(date);

        if !self.slots(negocio, calendario, weekday)?.contains(hora) {
            debug!(
                "Rejected {} {} for {}/{}: not a bookable slot",
                fecha, hora, negocio, calendario
            );
            return Err(BookingError::InvalidSlot);
        }

        let mut reservas = self.reservas.load(negocio, &dia_del_anio, calendario)?;
        if reservas.iter().any(|r| r.hora == hora) {
            return Err(BookingError::SlotAlreadyBooked {
                fecha: fecha.to_string(),
                hora: hora.to_string(),
                calendario,
            });
        }

        let nueva = Reservation {
            fecha: fecha.to_string(),
            hora: hora.to_string(),
            usuario: usuario.to_string(),
            timestamp: scheduler::iso_timestamp(&at.with_timezone(&self.tz)),
            extra: Default::default(),
        };
        reservas.push(nueva.clone());
        self.reservas.save(negocio, &dia_del_anio, calendario, &reservas)?;

        info!(
            "Booked {} {} on calendar {} of {} for {}",
            fecha, hora, calendario, negocio, usuario
        );
        Ok(nueva)
    }

    /// Contents of the day partition for `fecha`. Partitions are keyed by
    /// day-of-year only, so entries from another year's same day show up too.
    pub fn list_reservations(&self, negocio: &str, fecha: &str, calendario: u32) -> Result<Vec<Reservation>> {
        let date = scheduler::parse_fecha(fecha)?;
        self.reservas
            .load(negocio, &scheduler::day_of_year_key(date), calendario)
    }

    pub fn availability(&self, negocio: &str, calendario: u32, today: NaiveDate) -> Result<Availability> {
        let config = self.configs.load(negocio)?;
        let cal = config
            .calendar(calendario)
            .ok_or_else(|| BookingError::CalendarNotFound {
                negocio: negocio.to_string(),
                calendario,
            })?;

        let mut dias = BTreeMap::new();
        for offset in 0..AVAILABILITY_WINDOW_DAYS {
            let date = today + Duration::days(offset);
            let reservas = self
                .reservas
                .load(negocio, &scheduler::day_of_year_key(date), calendario)?;
            if !reservas.is_empty() {
                dias.insert(scheduler::format_fecha(date), reservas);
            }
        }

        let bloques_por_dia_semana = (0..7u8)
            .map(|wd| {
                let bloques = slots::bloques_horarios(&config, calendario, wd).collect();
                (wd.to_string(), bloques)
            })
            .collect();

        Ok(Availability {
            dias,
            bloques_por_dia_semana,
            fecha_maxima_reserva: cal.fecha_maxima_reserva.clone(),
        })
    }

    /// Admin save: rebuild `calendarios` with ids `1..=max_calendarios`,
    /// merging each id's patch onto what is stored. Ids above the new
    /// maximum are dropped. Returns the config as re-read from storage.
    pub fn save_calendars(
        &self,
        negocio: &str,
        max_calendarios: u32,
        mut patches: BTreeMap<u32, CalendarPatch>,
    ) -> Result<BusinessConfig> {
        if !(1..=MAX_CALENDARS).contains(&max_calendarios) {
            return Err(BookingError::InvalidConfig(format!(
                "max_calendarios debe estar entre 1 y {MAX_CALENDARS}"
            )));
        }
        for patch in patches.values() {
            validate_patch(patch)?;
        }

        let mut config = self.configs.load(negocio)?;
        let mut previous = std::mem::take(&mut config.calendarios);
        config.max_calendarios = max_calendarios;
        for id in 1..=max_calendarios {
            let key = id.to_string();
            let mut cal = previous.remove(&key).unwrap_or_default();
            if let Some(patch) = patches.remove(&id) {
                patch.apply_to(&mut cal);
            }
            check_hours(cal.horario_inicio, cal.horario_fin)?;
            config.calendarios.insert(key, cal);
        }

        self.configs.save(negocio, &config)?;
        info!(
            "Saved {} calendar(s) for {}",
            config.calendarios.len(),
            negocio
        );
        self.configs.load(negocio)
    }

    /// Merge a partial patch onto one calendar, creating it from defaults
    /// when it does not exist yet.
    pub fn patch_calendar(&self, negocio: &str, calendario: u32, patch: CalendarPatch) -> Result<BusinessConfig> {
        if !(1..=MAX_CALENDARS).contains(&calendario) {
            return Err(BookingError::InvalidConfig(format!(
                "el calendario debe estar entre 1 y {MAX_CALENDARS}"
            )));
        }
        validate_patch(&patch)?;

        let mut config = self.configs.load(negocio)?;
        let cal = config
            .calendarios
            .entry(calendario.to_string())
            .or_default();
        patch.apply_to(cal);
        check_hours(cal.horario_inicio, cal.horario_fin)?;
        config.max_calendarios = config.max_calendarios.max(calendario);

        self.configs.save(negocio, &config)?;
        Ok(config)
    }
}

fn validate_patch(patch: &CalendarPatch) -> Result<()> {
    let invalid = |msg: &str| Err(BookingError::InvalidConfig(msg.to_string()));
    if patch.horario_inicio.is_some_and(|h| h > 23) || patch.horario_fin.is_some_and(|h| h > 23) {
        return invalid("las horas deben estar entre 0 y 23");
    }
    if patch.duracion_turno_min == Some(0) {
        return invalid("la duración del turno debe ser mayor a 0");
    }
    if patch
        .dias_habiles
        .as_ref()
        .is_some_and(|d| d.iter().any(|&n| n > 6))
    {
        return invalid("los días hábiles deben estar entre 0 y 6");
    }
    if let Some(Some(fecha)) = &patch.fecha_maxima_reserva {
        scheduler::parse_fecha(fecha)?;
    }
    Ok(())
}

fn check_hours(inicio: u8, fin: u8) -> Result<()> {
    if fin <= inicio {
        return Err(BookingError::InvalidConfig(
            "el horario de fin debe ser posterior al de inicio".into(),
        ));
    }
    Ok(())
}
