use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use chrono::Duration;
use serde::Deserialize;

use super::api::ApiError;
use super::views::{render_business_page, render_landing};
use super::AppState;
use crate::error::Result;
use crate::scheduler;
use crate::slots;

/// Days shown on the public page, starting today.
const WEEK_VIEW_DAYS: i64 = 7;

pub(super) struct BusinessPage {
    pub(super) negocio: String,
    pub(super) now: String,
    pub(super) calendars: Vec<(u32, String)>,
    pub(super) selected: u32,
    pub(super) fecha_maxima_reserva: Option<String>,
    pub(super) days: Vec<DayRow>,
}

pub(super) struct DayRow {
    pub(super) fecha: String,
    pub(super) dia: &'static str,
    pub(super) beyond_horizon: bool,
    pub(super) slots: Vec<SlotCell>,
}

pub(super) struct SlotCell {
    pub(super) hora: String,
    pub(super) taken: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BusinessQuery {
    calendario: Option<u32>,
}

pub(crate) async fn landing_handler() -> Html<String> {
    Html(render_landing())
}

pub(crate) async fn business_handler(
    State(state): State<AppState>,
    Path(negocio): Path<String>,
    Query(query): Query<BusinessQuery>,
) -> Response {
    match build_business_page(&state, &negocio, query.calendario.unwrap_or(1)) {
        Ok(page) => Html(render_business_page(&page)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn build_business_page(state: &AppState, negocio: &str, selected: u32) -> Result<BusinessPage> {
    let engine = &state.engine;
    let config = engine.load_config(negocio)?;
    let now = engine.now();
    let today = now.date_naive();

    let calendars = (1..=config.max_calendarios.max(1))
        .map(|id| {
            let nombre = config
                .calendar(id)
                .map(|c| c.nombre.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Calendario {id}"));
            (id, nombre)
        })
        .collect();

    let fecha_maxima_reserva = config
        .calendar(selected)
        .and_then(|c| c.fecha_maxima_reserva.clone());
    // An unparseable stored limit is shown but not enforced.
    let horizon = fecha_maxima_reserva
        .as_deref()
        .and_then(|f| scheduler::parse_fecha(f).ok());

    let mut days = Vec::new();
    for offset in 0..WEEK_VIEW_DAYS {
        let date = today + Duration::days(offset);
        let fecha = scheduler::format_fecha(date);
        let weekday = scheduler::weekday_num(date);
        let reservas = engine.list_reservations(negocio, &fecha, selected)?;
        let cells = slots::bloques_horarios(&config, selected, weekday)
            .map(|s| SlotCell {
                taken: reservas.iter().any(|r| r.hora == s.hora),
                hora: s.hora,
            })
            .collect();
        days.push(DayRow {
            fecha,
            dia: scheduler::day_name(weekday),
            beyond_horizon: horizon.is_some_and(|max| date > max),
            slots: cells,
        });
    }

    Ok(BusinessPage {
        negocio: negocio.to_string(),
        now: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        calendars,
        selected,
        fecha_maxima_reserva,
        days,
    })
}
