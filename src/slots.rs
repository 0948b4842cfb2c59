//! Bookable time-of-day blocks for a calendar.

use crate::models::{BusinessConfig, CalendarConfig, SlotEntry};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Lazy sequence of slot start times, in minutes after midnight.
///
/// Cloning gives an independent cursor, so the same schedule can be walked
/// any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots {
    next: u32,
    end: u32,
    step: u32,
}

impl Slots {
    fn closed() -> Self {
        Self {
            next: 0,
            end: 0,
            step: 1,
        }
    }

    pub fn for_calendar(cal: &CalendarConfig, weekday: u8) -> Self {
        if !cal.dias_habiles.contains(&weekday) || cal.duracion_turno_min == 0 {
            return Self::closed();
        }
        Self {
            next: (cal.horario_inicio as u32 * 60).min(MINUTES_PER_DAY),
            end: (cal.horario_fin as u32 * 60).min(MINUTES_PER_DAY),
            step: cal.duracion_turno_min,
        }
    }

    pub fn contains(&self, hora: &str) -> bool {
        self.clone().any(|s| s.hora == hora)
    }
}

impl Iterator for Slots {
    type Item = SlotEntry;

    fn next(&mut self) -> Option<SlotEntry> {
        if self.next >= self.end {
            return None;
        }
        let at = self.next;
        self.next = self.next.saturating_add(self.step);
        Some(SlotEntry {
            hora: format!("{:02}:{:02}", at / 60, at % 60),
        })
    }
}

/// Slots for `calendario` on `weekday` (0 = Monday). Calendars missing
/// from the config fall back to the default schedule.
pub fn bloques_horarios(config: &BusinessConfig, calendario: u32, weekday: u8) -> Slots {
    match config.calendar(calendario) {
        Some(cal) => Slots::for_calendar(cal, weekday),
        None => Slots::for_calendar(&CalendarConfig::default(), weekday),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn horas(slots: Slots) -> Vec<String> {
        slots.map(|s| s.hora).collect()
    }

    fn business(cal: CalendarConfig) -> BusinessConfig {
        let mut cfg = BusinessConfig::default();
        cfg.calendarios.insert("1".into(), cal);
        cfg
    }

    fn monday_only() -> CalendarConfig {
        CalendarConfig {
            horario_inicio: 9,
            horario_fin: 10,
            duracion_turno_min: 30,
            dias_habiles: BTreeSet::from([0]),
            ..Default::default()
        }
    }

    #[test]
    fn test_monday_only_calendar() {
        let cfg = business(monday_only());
        assert_eq!(horas(bloques_horarios(&cfg, 1, 0)), ["09:00", "09:30"]);
        assert!(horas(bloques_horarios(&cfg, 1, 1)).is_empty());
    }

    #[test]
    fn test_missing_calendar_uses_defaults() {
        let cfg = BusinessConfig::default();
        let friday = horas(bloques_horarios(&cfg, 3, 4));
        assert_eq!(friday.len(), 18);
        assert_eq!(friday.first().map(String::as_str), Some("09:00"));
        assert_eq!(friday.last().map(String::as_str), Some("17:30"));
        assert!(horas(bloques_horarios(&cfg, 3, 5)).is_empty());
    }

    #[test]
    fn test_end_hour_is_exclusive_with_uneven_step() {
        let cfg = business(CalendarConfig {
            horario_inicio: 9,
            horario_fin: 11,
            duracion_turno_min: 45,
            dias_habiles: BTreeSet::from([2]),
            ..Default::default()
        });
        assert_eq!(horas(bloques_horarios(&cfg, 1, 2)), ["09:00", "09:45", "10:30"]);
    }

    #[test]
    fn test_slots_within_bounds_and_evenly_spaced() {
        for (inicio, fin, step) in [(0u8, 23u8, 7u32), (8, 20, 15), (13, 14, 60), (6, 22, 50)] {
            let cal = CalendarConfig {
                horario_inicio: inicio,
                horario_fin: fin,
                duracion_turno_min: step,
                dias_habiles: (0..7).collect(),
                ..Default::default()
            };
            let mins: Vec<u32> = Slots::for_calendar(&cal, 3)
                .map(|s| {
                    let (h, m) = s.hora.split_once(':').unwrap();
                    h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap()
                })
                .collect();
            assert!(!mins.is_empty());
            assert_eq!(mins[0], inicio as u32 * 60);
            assert!(mins.iter().all(|&t| t < fin as u32 * 60));
            assert!(mins.windows(2).all(|w| w[1] - w[0] == step));
        }
    }

    #[test]
    fn test_degenerate_configs_are_empty() {
        let zero_step = CalendarConfig {
            duracion_turno_min: 0,
            ..Default::default()
        };
        assert_eq!(Slots::for_calendar(&zero_step, 0).count(), 0);

        let inverted = CalendarConfig {
            horario_inicio: 18,
            horario_fin: 9,
            ..Default::default()
        };
        assert_eq!(Slots::for_calendar(&inverted, 0).count(), 0);
    }

    #[test]
    fn test_restartable_and_deterministic() {
        let cfg = business(monday_only());
        let slots = bloques_horarios(&cfg, 1, 0);
        let first: Vec<_> = slots.clone().collect();
        let second: Vec<_> = slots.collect();
        assert_eq!(first, second);
        assert_eq!(horas(bloques_horarios(&cfg, 1, 0)), horas(bloques_horarios(&cfg, 1, 0)));
    }

    #[test]
    fn test_contains() {
        let slots = bloques_horarios(&business(monday_only()), 1, 0);
        assert!(slots.contains("09:30"));
        assert!(!slots.contains("10:00"));
        assert!(!slots.contains("9:00"));
    }
}
