use crate::entity::{Entity, Scalar};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().title));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted).to_string()
}

/// A lookup key colored by its kind
pub fn key(entity: &Entity) -> String {
    entity.key_string().style(theme().kind(entity.kind())).to_string()
}

/// One-line summary: icon, lookup key, display name
pub fn entity_line(entity: &Entity) {
    println!(
        "{} {} {}",
        Icons::for_kind(entity.kind()),
        key(entity),
        entity.name().unwrap_or("")
    );
}

pub fn attribute_row(name: &str, value: &Scalar) {
    let value = if value.is_null() { muted("null") } else { value.to_string() };
    println!("  {} {}", format!("{}:", name).style(theme().label), value);
}

pub fn linked(a: &Entity, b: &Entity) {
    println!("{} {} {} {}", Icons::LINK, key(a), muted("<->"), key(b));
}

pub fn unlinked(a: &Entity, b: &Entity) {
    println!("{} {} {} {}", Icons::UNLINK, key(a), muted("-/-"), key(b));
}

pub fn deleted(entity: &Entity) {
    println!("{} {}", Icons::DEL.style(theme().error), key(entity));
}
