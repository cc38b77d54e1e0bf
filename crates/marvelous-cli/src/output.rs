//! Plain-text rendering for the terminal.

use marvelous_api::{Character, Series};
use marvelous_core::route::{document_title, Route};

pub fn header(route: Route) {
    println!("== {} ==", document_title(Some(&route)));
}

pub fn series_list(label: &str, items: &[Series]) {
    if items.is_empty() {
        println!("{label}: none");
        return;
    }
    println!("{label} ({}):", items.len());
    for series in items {
        println!("{:>8}  {}", series.id, series.title.trim());
    }
}

pub fn detail(series: &Series, saved: bool) {
    println!("{}", series.title.trim());
    println!("  id:     {}", series.id);
    match (series.start_year(), series.end_year()) {
        (Some(start), Some(end)) => println!("  years:  {start}-{end}"),
        (Some(start), None) => println!("  years:  {start}-"),
        _ => {}
    }
    if let Some(thumbnail) = &series.thumbnail {
        println!("  cover:  {}", thumbnail.url("portrait_uncanny"));
    }
    println!("  saved:  {}", if saved { "yes" } else { "no" });
    if let Some(description) = series.description().filter(|d| !d.trim().is_empty()) {
        println!();
        println!("{}", description.trim());
    }
}

pub fn character(character: &Character) {
    println!("{}", character.name);
    if let Some(thumbnail) = &character.thumbnail {
        println!("  {}", thumbnail.url("standard_medium"));
    }
}
