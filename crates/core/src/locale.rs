//! Day names for the two portal locales.

use serde::{Deserialize, Serialize};

use crate::schedule_preference::{sort_preferences, SchedulePreference};
use crate::types::DayOfWeek;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "pt-BR")]
    PtBr,
}

const ES_DAYS: [&str; 7] = [
    "Domingo", "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado",
];
const ES_DAYS_SHORT: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

const PT_BR_DAYS: [&str; 7] = [
    "Domingo",
    "Segunda-feira",
    "Terça-feira",
    "Quarta-feira",
    "Quinta-feira",
    "Sexta-feira",
    "Sábado",
];
const PT_BR_DAYS_SHORT: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

/// Full day name, or `None` for a day outside `0..=6`.
pub fn get_day_name(day: DayOfWeek, locale: Locale) -> Option<&'static str> {
    let table = match locale {
        Locale::Es => &ES_DAYS,
        Locale::PtBr => &PT_BR_DAYS,
    };
    table.get(usize::from(day)).copied()
}

/// Three-letter day name, or `None` for a day outside `0..=6`.
pub fn get_day_name_short(day: DayOfWeek, locale: Locale) -> Option<&'static str> {
    let table = match locale {
        Locale::Es => &ES_DAYS_SHORT,
        Locale::PtBr => &PT_BR_DAYS_SHORT,
    };
    table.get(usize::from(day)).copied()
}

/// One-line summary such as `"Lun 09:00, Mié 15:00"`, Monday first.
/// Preferences with an unknown day are skipped.
pub fn format_preferences_text(preferences: &[SchedulePreference], locale: Locale) -> String {
    sort_preferences(preferences)
        .into_iter()
        .filter_map(|(_, p)| {
            get_day_name_short(p.day_of_week, locale).map(|day| format!("{day} {}", p.time))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
