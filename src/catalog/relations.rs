//! Relation post-processing for display
//!
//! Upstream relations key dates by location slugs ("new_york-usa") and list
//! dates in no particular order. Processing formats the keys, sorts every
//! date list newest first and records the locations ordered by their most
//! recent date.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::Relation;
use crate::utils::error::CatalogError;

/// Upstream date layout (dd-mm-yyyy)
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Format keys, sort dates and fill `sorted_locations`, in place
pub fn process_relation(relation: &mut Relation) {
    format_locations(relation);
    sort_dates_in_locations(relation);
    sort_locations_by_date(relation);
}

/// Parse an upstream date.
///
/// Accepts `-`, `/` or `.` as separators, surrounding whitespace, and the
/// leading `*` upstream uses to flag some concert dates.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CatalogError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('*')
        .chars()
        .map(|c| if c == '/' || c == '.' { '-' } else { c })
        .collect();

    NaiveDate::parse_from_str(&cleaned, DATE_FORMAT)
        .map_err(|_| CatalogError::InvalidDate(raw.to_string()))
}

/// Newest-first ordering with unparseable dates last, keeping their relative order
fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

/// Capitalize every whitespace-separated word, lower-casing the rest
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn an upstream slug into a display name: "new_york-usa" → "New York, USA"
///
/// The last dash-separated segment is the country; short ones (≤ 3 letters)
/// are acronyms. Names that already contain ", " are returned as-is.
pub fn format_location_name(raw: &str) -> String {
    if raw.contains(", ") {
        return raw.to_string();
    }

    let normalized = raw.replace('_', " ");
    let mut segments: Vec<&str> = normalized.split('-').filter(|s| !s.trim().is_empty()).collect();

    let Some(country) = segments.pop() else {
        return title_case(&normalized);
    };
    if segments.is_empty() {
        return title_case(country);
    }

    let place = title_case(&segments.join(" "));
    let country = if country.trim().chars().count() <= 3 {
        country.trim().to_uppercase()
    } else {
        title_case(country)
    };

    format!("{place}, {country}")
}

fn format_locations(relation: &mut Relation) {
    let raw = std::mem::take(&mut relation.dates_locations);
    let mut formatted: HashMap<String, Vec<String>> = HashMap::with_capacity(raw.len());

    for (location, dates) in raw {
        // two slugs can format to the same name; keep every date
        formatted
            .entry(format_location_name(&location))
            .or_default()
            .extend(dates);
    }

    relation.dates_locations = formatted;
}

fn sort_dates_in_locations(relation: &mut Relation) {
    for dates in relation.dates_locations.values_mut() {
        dates.sort_by(|a, b| newest_first(a, b));
    }
}

fn sort_locations_by_date(relation: &mut Relation) {
    let mut locations: Vec<&String> = relation
        .dates_locations
        .iter()
        .filter(|(_, dates)| !dates.is_empty())
        .map(|(location, _)| location)
        .collect();

    locations.sort_by(|a, b| {
        let newest_a = &relation.dates_locations[*a][0];
        let newest_b = &relation.dates_locations[*b][0];
        newest_first(newest_a, newest_b).then_with(|| a.cmp(b))
    });

    relation.sorted_locations = locations.into_iter().cloned().collect();
}
