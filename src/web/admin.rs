use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::Duration;
use tracing::{info, warn};

use super::api::ApiError;
use super::views::render_admin_page;
use super::AppState;
use crate::error::{BookingError, Result};
use crate::models::{
    BusinessConfig, CalendarConfig, CalendarPatch, DEFAULT_END_HOUR, DEFAULT_SLOT_MINUTES,
    DEFAULT_START_HOUR,
};
use crate::scheduler;

const SAVED_MESSAGE: &str = "Configuración guardada exitosamente!";

pub(super) struct AdminPage {
    pub(super) negocio: String,
    pub(super) max_calendarios: u32,
    pub(super) calendars: Vec<AdminCalendar>,
    pub(super) mensaje: Option<String>,
    pub(super) error: Option<String>,
}

pub(super) struct AdminCalendar {
    pub(super) id: u32,
    pub(super) nombre: String,
    pub(super) horario_inicio: u8,
    pub(super) horario_fin: u8,
    pub(super) duracion_turno_min: u32,
    pub(super) dias_habiles: BTreeSet<u8>,
    pub(super) fecha_maxima_reserva: String,
}

/// Decoded form pairs in body order. Repeated keys are kept, which the
/// working-day checkboxes rely on.
struct FormFields(Vec<(String, String)>);

impl FormFields {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn number<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| BookingError::InvalidConfig(format!("valor inválido para {key}: '{raw}'"))),
        }
    }
}

/// Turn the admin form into one full patch per calendar. Fields missing
/// from the form take the defaults, as an unchecked form would send.
fn parse_admin_form(form: &FormFields) -> Result<(u32, BTreeMap<u32, CalendarPatch>)> {
    let max_calendarios: u32 = form
        .get("max_calendarios")
        .ok_or_else(|| BookingError::InvalidConfig("falta max_calendarios".into()))?
        .trim()
        .parse()
        .map_err(|_| BookingError::InvalidConfig("max_calendarios debe ser un número".into()))?;

    let mut patches = BTreeMap::new();
    for i in 1..=max_calendarios.min(crate::booking::MAX_CALENDARS) {
        let nombre = form
            .get(&format!("nombre_calendario_{i}"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Calendario {i}"));
        let dias_habiles = form
            .get_all(&format!("dias_habiles_{i}"))
            .map(|d| {
                d.trim()
                    .parse::<u8>()
                    .map_err(|_| BookingError::InvalidConfig(format!("día hábil inválido: '{d}'")))
            })
            .collect::<Result<BTreeSet<u8>>>()?;
        let fecha_maxima_reserva = form
            .get(&format!("fecha_maxima_reserva_{i}"))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        patches.insert(
            i,
            CalendarPatch {
                nombre: Some(nombre),
                horario_inicio: Some(form.number(&format!("horario_inicio_{i}"), DEFAULT_START_HOUR)?),
                horario_fin: Some(form.number(&format!("horario_fin_{i}"), DEFAULT_END_HOUR)?),
                duracion_turno_min: Some(
                    form.number(&format!("duracion_turno_min_{i}"), DEFAULT_SLOT_MINUTES)?,
                ),
                dias_habiles: Some(dias_habiles),
                fecha_maxima_reserva: Some(fecha_maxima_reserva),
            },
        );
    }
    Ok((max_calendarios, patches))
}

fn admin_page(
    state: &AppState,
    negocio: &str,
    config: &BusinessConfig,
    mensaje: Option<String>,
    error: Option<String>,
) -> AdminPage {
    let horizon = state.engine.today() + Duration::days(state.settings.service.default_horizon_days);
    let default_fecha_maxima = scheduler::format_fecha(horizon);

    let max_calendarios = config.max_calendarios.max(1);
    let calendars = (1..=max_calendarios)
        .map(|id| {
            let cal = config.calendar(id).cloned().unwrap_or_else(|| CalendarConfig {
                nombre: format!("Calendario {id}"),
                ..Default::default()
            });
            AdminCalendar {
                id,
                nombre: cal.nombre,
                horario_inicio: cal.horario_inicio,
                horario_fin: cal.horario_fin,
                duracion_turno_min: cal.duracion_turno_min,
                dias_habiles: cal.dias_habiles,
                fecha_maxima_reserva: cal
                    .fecha_maxima_reserva
                    .unwrap_or_else(|| default_fecha_maxima.clone()),
            }
        })
        .collect();

    AdminPage {
        negocio: negocio.to_string(),
        max_calendarios,
        calendars,
        mensaje,
        error,
    }
}

pub(crate) async fn admin_handler(State(state): State<AppState>, Path(negocio): Path<String>) -> Response {
    match state.engine.load_config(&negocio) {
        Ok(config) => {
            let page = admin_page(&state, &negocio, &config, None, None);
            Html(render_admin_page(&page)).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub(crate) async fn save_config_handler(
    State(state): State<AppState>,
    Path(negocio): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let saved = parse_admin_form(&FormFields(pairs))
        .and_then(|(max, patches)| state.engine.save_calendars(&negocio, max, patches));

    match saved {
        Ok(config) => {
            info!("Admin config saved for {}", negocio);
            let page = admin_page(&state, &negocio, &config, Some(SAVED_MESSAGE.into()), None);
            Html(render_admin_page(&page)).into_response()
        }
        Err(e) if e.is_client_error() => {
            warn!("Admin config for {} rejected: {}", negocio, e);
            let config = match state.engine.load_config(&negocio) {
                Ok(c) => c,
                Err(e) => return ApiError::from(e).into_response(),
            };
            let page = admin_page(&state, &negocio, &config, None, Some(e.to_string()));
            (StatusCode::BAD_REQUEST, Html(render_admin_page(&page))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_form_lookups_keep_repeated_keys() {
        let form = fields(&[("a", "1"), ("d", "0"), ("d", "3"), ("empty", "")]);
        assert_eq!(form.get("a"), Some("1"));
        assert_eq!(form.get_all("d").collect::<Vec<_>>(), ["0", "3"]);
        assert_eq!(form.get("empty"), Some(""));
        assert_eq!(form.get("missing"), None);
        assert_eq!(form.number("a", 7u8).unwrap(), 1);
        assert_eq!(form.number("missing", 7u8).unwrap(), 7);
    }

    #[test]
    fn test_admin_form_defaults() {
        let form = fields(&[
            ("max_calendarios", "2"),
            ("dias_habiles_2", "6"),
            ("fecha_maxima_reserva_2", "2025-01-31"),
        ]);
        let (max, patches) = parse_admin_form(&form).unwrap();
        assert_eq!(max, 2);

        let first = &patches[&1];
        assert_eq!(first.nombre.as_deref(), Some("Calendario 1"));
        assert_eq!(first.horario_inicio, Some(9));
        assert_eq!(first.horario_fin, Some(18));
        assert_eq!(first.duracion_turno_min, Some(30));
        assert_eq!(first.dias_habiles, Some(BTreeSet::new()));
        assert_eq!(first.fecha_maxima_reserva, Some(None));

        let second = &patches[&2];
        assert_eq!(second.dias_habiles, Some(BTreeSet::from([6])));
        assert_eq!(second.fecha_maxima_reserva, Some(Some("2025-01-31".into())));
    }

    #[test]
    fn test_admin_form_errors() {
        let cases: [&[(&str, &str)]; 4] = [
            &[],
            &[("max_calendarios", "dos")],
            &[("max_calendarios", "1"), ("duracion_turno_min_1", "-5")],
            &[("max_calendarios", "1"), ("dias_habiles_1", "x")],
        ];
        for pairs in cases {
            assert!(
                matches!(parse_admin_form(&fields(pairs)), Err(BookingError::InvalidConfig(_))),
                "accepted {pairs:?}"
            );
        }
    }
}
