use crate::entity::Entity;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Count")]
    count: String,
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Entity> for EntityRow {
    fn from(entity: &Entity) -> Self {
        Self {
            key: entity.key_string(),
            name: entity.name().unwrap_or("").to_string(),
            updated: entity.updated_at().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Per-kind counts; empty input renders nothing
pub fn stats_table(stats: &[(&str, usize)]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let rows: Vec<StatsRow> = stats
        .iter()
        .map(|(kind, count)| StatsRow {
            kind: kind.to_string(),
            count: count.to_string(),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

pub fn entity_table<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> String {
    let rows: Vec<EntityRow> = entities.into_iter().map(EntityRow::from).collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}
