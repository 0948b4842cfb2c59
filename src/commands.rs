use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::booking::BookingEngine;
use crate::models::CalendarPatch;
use crate::scheduler;

/// Parse a comma-separated weekday list such as "0,2,4".
pub fn parse_days(src: &str) -> Result<BTreeSet<u8>> {
    let mut days = BTreeSet::new();
    for part in src.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let n: u8 = part
            .parse()
            .with_context(|| format!("Invalid weekday '{}'", part))?;
        if n > 6 {
            bail!("Weekday {} out of range (0 = Monday .. 6 = Sunday)", n);
        }
        days.insert(n);
    }
    Ok(days)
}

pub fn run_slots(
    engine: &BookingEngine,
    negocio: &str,
    calendario: u32,
    fecha: Option<&str>,
    dia: Option<u8>,
) -> Result<()> {
    let weekday = match (fecha, dia) {
        (Some(f), _) => scheduler::weekday_num(scheduler::parse_fecha(f)?),
        (None, Some(d)) => d,
        (None, None) => scheduler::weekday_num(engine.today()),
    };

    let slots = engine.generate_slots(negocio, calendario, weekday)?;
    if slots.is_empty() {
        println!(
            "Calendar {} of {} is closed on {}.",
            calendario,
            negocio,
            scheduler::day_name(weekday)
        );
        return Ok(());
    }

    println!(
        "Slots for calendar {} of {} on {}:\n",
        calendario,
        negocio,
        scheduler::day_name(weekday)
    );
    for s in &slots {
        println!("  {}", s.hora);
    }
    Ok(())
}

pub fn run_book(
    engine: &BookingEngine,
    negocio: &str,
    calendario: u32,
    fecha: &str,
    hora: &str,
    usuario: &str,
) -> Result<()> {
    let r = engine.create_reservation(negocio, fecha, hora, usuario, calendario)?;
    println!(
        "Booked {} {} on calendar {} for {} (at {})",
        r.fecha, r.hora, calendario, r.usuario, r.timestamp
    );
    Ok(())
}

pub fn run_reservations(engine: &BookingEngine, negocio: &str, calendario: u32, fecha: &str) -> Result<()> {
    let reservas = engine.list_reservations(negocio, fecha, calendario)?;
    if reservas.is_empty() {
        println!("No reservations for calendar {} on {}.", calendario, fecha);
        return Ok(());
    }

    println!("Reservations for calendar {} on {}:\n", calendario, fecha);
    for r in &reservas {
        print!("  {}  {}", r.hora, r.usuario);
        // Partitions are per day-of-year; flag entries stored under another year.
        if r.fecha != fecha {
            print!("  (fecha {})", r.fecha);
        }
        println!();
    }
    Ok(())
}

pub fn run_availability(engine: &BookingEngine, negocio: &str, calendario: u32, verbose: bool) -> Result<()> {
    let av = engine.availability(negocio, calendario, engine.today())?;

    if verbose {
        println!("{}", serde_json::to_string_pretty(&av)?);
        return Ok(());
    }

    println!("Weekly schedule:\n");
    for (wd, bloques) in &av.bloques_por_dia_semana {
        let wd: u8 = wd.parse().unwrap_or(u8::MAX);
        if bloques.is_empty() {
            println!("  {:<10} closed", scheduler::day_name(wd));
        } else {
            println!(
                "  {:<10} {} slots ({} - {})",
                scheduler::day_name(wd),
                bloques.len(),
                bloques[0].hora,
                bloques[bloques.len() - 1].hora
            );
        }
    }

    if let Some(max) = &av.fecha_maxima_reserva {
        println!("\nBookable until {}", max);
    }

    if av.dias.is_empty() {
        println!("\nNo upcoming reservations.");
    } else {
        println!("\nUpcoming reservations:\n");
        for (fecha, reservas) in &av.dias {
            let horas: Vec<&str> = reservas.iter().map(|r| r.hora.as_str()).collect();
            println!("  {}  {}", fecha, horas.join(", "));
        }
    }
    Ok(())
}

pub fn run_calendar(engine: &BookingEngine, negocio: &str, calendario: u32, patch: CalendarPatch) -> Result<()> {
    if patch.is_empty() {
        warn!("No fields given, calendar {} left as is", calendario);
    }
    let cfg = engine.patch_calendar(negocio, calendario, patch)?;
    let cal = cfg
        .calendar(calendario)
        .context("Calendar missing after save")?;
    let dias: Vec<&str> = cal
        .dias_habiles
        .iter()
        .map(|&d| scheduler::day_name(d))
        .collect();
    println!(
        "Calendar {} of {}: '{}' {:02}:00-{:02}:00 every {} min, {}",
        calendario,
        negocio,
        cal.nombre,
        cal.horario_inicio,
        cal.horario_fin,
        cal.duracion_turno_min,
        dias.join(", ")
    );
    Ok(())
}

pub fn run_show_config(engine: &BookingEngine, negocio: &str) -> Result<()> {
    let cfg = engine.load_config(negocio)?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}
