use leptos::prelude::*;

use super::admin::{AdminCalendar, AdminPage};
use super::pages::{BusinessPage, DayRow};
use crate::scheduler::DAY_NAMES;

const STYLE: &str = include_str!("../style.css");

fn layout(title: String, body_html: String) -> String {
    view! {
        <html lang="es">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body inner_html=body_html />
        </html>
    }
    .to_html()
}

pub(super) fn render_landing() -> String {
    let body = view! {
        <h1>"Reservas"</h1>
        <p>"Ingrese un ID de negocio en la URL para comenzar. Ejemplo: "<code>"/reservas/mi_negocio"</code></p>
    }
    .to_html();
    layout("Reservas".into(), body)
}

pub(super) fn render_business_page(page: &BusinessPage) -> String {
    let negocio = page.negocio.clone();
    let now = page.now.clone();
    let admin_href = format!("/reservas/{}/admin", page.negocio);

    let tabs_html: String = page
        .calendars
        .iter()
        .map(|(id, nombre)| {
            let href = format!("/reservas/{}?calendario={}", page.negocio, id);
            let css = if *id == page.selected { "tab active" } else { "tab" }.to_string();
            let nombre = nombre.clone();
            view! { <a class=css href=href>{nombre}</a> }.to_html()
        })
        .collect();

    let max_html = match &page.fecha_maxima_reserva {
        Some(f) => {
            let text = format!("Reservas hasta el {f}");
            view! { <p class="horizon">{text}</p> }.to_html()
        }
        None => String::new(),
    };

    let days_html: String = page.days.iter().map(render_day_row).collect();

    let body = view! {
        <h1>{negocio}</h1>
        <p class="timestamp">"Hora servidor: " {now}</p>
        <nav inner_html=tabs_html />
        <div inner_html=max_html />
        <table>
            <thead>
                <tr><th>"Fecha"</th><th>"Día"</th><th>"Horarios"</th></tr>
            </thead>
            <tbody inner_html=days_html />
        </table>
        <p class="admin-link"><a href=admin_href>"Administrar"</a></p>
    }
    .to_html();
    layout(format!("Reservas - {}", page.negocio), body)
}

fn render_day_row(day: &DayRow) -> String {
    let fecha = day.fecha.clone();
    let dia = day.dia.to_string();

    let slots_html = if day.beyond_horizon {
        view! { <span class="empty">"Fuera del período de reservas"</span> }.to_html()
    } else if day.slots.is_empty() {
        view! { <span class="empty">"Cerrado"</span> }.to_html()
    } else {
        day.slots
            .iter()
            .map(|s| {
                let hora = s.hora.clone();
                let css = if s.taken { "slot taken" } else { "slot free" }.to_string();
                view! { <span class=css>{hora}</span> }.to_html()
            })
            .collect()
    };

    view! {
        <tr>
            <td>{fecha}</td>
            <td>{dia}</td>
            <td inner_html=slots_html />
        </tr>
    }
    .to_html()
}

pub(super) fn render_admin_page(page: &AdminPage) -> String {
    let negocio = page.negocio.clone();
    let action = format!("/reservas/{}/admin/config", page.negocio);
    let back_href = format!("/reservas/{}", page.negocio);
    let max_calendarios = page.max_calendarios.to_string();

    let notice_html = match (&page.mensaje, &page.error) {
        (_, Some(err)) => {
            let err = err.clone();
            view! { <div class="error">{err}</div> }.to_html()
        }
        (Some(msg), None) => {
            let msg = msg.clone();
            view! { <div class="mensaje">{msg}</div> }.to_html()
        }
        (None, None) => String::new(),
    };

    let calendars_html: String = page.calendars.iter().map(render_calendar_fieldset).collect();

    let body = view! {
        <h1>"Administración - " {negocio}</h1>
        <div inner_html=notice_html />
        <form method="post" action=action>
            <label>
                "Cantidad de calendarios "
                <input type="number" name="max_calendarios" min="1" value=max_calendarios />
            </label>
            <div inner_html=calendars_html />
            <button type="submit">"Guardar configuración"</button>
        </form>
        <p><a href=back_href>"Volver al calendario"</a></p>
    }
    .to_html();
    layout(format!("Administración - {}", page.negocio), body)
}

fn render_calendar_fieldset(cal: &AdminCalendar) -> String {
    let legend = format!("Calendario {}", cal.id);
    let nombre_field = format!("nombre_calendario_{}", cal.id);
    let inicio_field = format!("horario_inicio_{}", cal.id);
    let fin_field = format!("horario_fin_{}", cal.id);
    let duracion_field = format!("duracion_turno_min_{}", cal.id);
    let fecha_field = format!("fecha_maxima_reserva_{}", cal.id);
    let nombre = cal.nombre.clone();
    let inicio = cal.horario_inicio.to_string();
    let fin = cal.horario_fin.to_string();
    let duracion = cal.duracion_turno_min.to_string();
    let fecha = cal.fecha_maxima_reserva.clone();

    let days_html: String = DAY_NAMES
        .iter()
        .enumerate()
        .map(|(n, label)| {
            let field = format!("dias_habiles_{}", cal.id);
            let value = n.to_string();
            let checked = cal.dias_habiles.contains(&(n as u8));
            let label = label.to_string();
            view! {
                <label class="day">
                    <input type="checkbox" name=field value=value checked=checked />
                    {label}
                </label>
            }
            .to_html()
        })
        .collect();

    view! {
        <fieldset>
            <legend>{legend}</legend>
            <label>"Nombre " <input type="text" name=nombre_field value=nombre /></label>
            <label>"Hora de inicio " <input type="number" min="0" max="23" name=inicio_field value=inicio /></label>
            <label>"Hora de fin " <input type="number" min="0" max="23" name=fin_field value=fin /></label>
            <label>"Duración del turno (min) " <input type="number" min="1" name=duracion_field value=duracion /></label>
            <div class="days" inner_html=days_html />
            <label>"Fecha máxima de reserva " <input type="date" name=fecha_field value=fecha /></label>
        </fieldset>
    }
    .to_html()
}
