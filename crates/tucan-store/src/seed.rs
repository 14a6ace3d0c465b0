//! Initial smart-category catalog, inserted idempotently at startup.

use rusqlite::{params, Connection};
use tracing::info;

use tucan_core::types::{UNKNOWN_CATEGORY, UNKNOWN_CATEGORY_DESCRIPTION};

use crate::error::Result;

/// (name, description, ignore)
const INITIAL_CATEGORIES: &[(&str, &str, bool)] = &[
    (
        "lifestyle",
        "news related to people's way of life, their choices, values and stories of their life",
        false,
    ),
    (
        "lifestyle/expats",
        "news about Costa Ricans who are achieving significant success and recognition while \
         living and working in other countries",
        false,
    ),
    (
        "entertainment",
        "news and articles related to entertainment such as movies, music, TV and live events",
        false,
    ),
    (
        "entertainment/celebrities",
        "news related to celebrities and prominent figures in the entertainment industry, \
         including their personal lives, events (e.g., births, deaths, weddings, etc.), and \
         achievements",
        false,
    ),
    (
        "crime",
        "news about criminal activities and law enforcement",
        true,
    ),
    (
        "crime/femicide",
        "News related to homicides specifically targeting women, often involving gender-based \
         violence and related legal proceedings",
        true,
    ),
    (
        "government",
        "news related to the actions and decisions of the government at all levels, including \
         municipalities, courts, and other governmental bodies",
        false,
    ),
    (
        "government/public_opinion",
        "News related to the public's sentiment, opinions, and reactions towards government \
         actions, policies, and officials. It includes analysis of public perception and \
         feedback on governmental decisions and their impact",
        false,
    ),
    (
        "government/courts",
        "News related to the actions and decisions of the government at all levels, including \
         decisions and operations of the court system",
        false,
    ),
    (
        "government/party_politics",
        "News related to the internal operations, elections, and decision-making processes \
         within political parties",
        false,
    ),
    (
        "weather",
        "news related to weather conditions, forecasts, and climate-related events",
        false,
    ),
    (
        "culture/arts",
        "news related to artistic endeavors, cultural events, and figures",
        false,
    ),
    (
        "sport/boxing",
        "news related to boxing as a sport, including fights, tournaments, and controversies \
         surrounding the sport",
        true,
    ),
    (
        "sport/baseball",
        "News related to baseball as a sport, including games, tournaments, and events \
         surrounding the sport",
        true,
    ),
    (
        "health/children",
        "news specifically related to the health and well-being of children, including public \
         health issues, medical treatments, and healthcare policies affecting children",
        false,
    ),
    (
        "economy/trade",
        "News related to economic activities, trade, commerce, and their impact on the country. \
         This includes analysis of economic indicators, trade agreements, and issues affecting \
         businesses",
        false,
    ),
    (
        "transportation/aviation",
        "News related to air travel and aviation incidents",
        false,
    ),
    (
        "incidents",
        "News related to accidents, disasters, and other unexpected events that cause harm or \
         disruption",
        false,
    ),
    (
        "incidents/infrastructure",
        "News related to accidents and incidents that cause damage to essential infrastructure, \
         such as power grids, communication networks, roads, and water supply systems, and \
         their resulting impact on services and communities",
        false,
    ),
    (
        "incidents/roads",
        "News related to accidents, collisions, and other road incidents involving injuries, \
         fatalities, or traffic disruptions, highlighting events on highways, streets, and \
         other public thoroughfares.",
        false,
    ),
    (
        "education",
        "News related to educational policies, initiatives, student achievements, and other \
         developments in the education sector",
        false,
    ),
    (
        "education/awards",
        "News related to scholarships, grants, awards, and other forms of recognition within \
         the education sector, covering student achievements and opportunities",
        false,
    ),
    (
        "technology/internet_services",
        "News related to the functioning, outages, and security of internet-based services and \
         platforms",
        false,
    ),
    (
        "environment/parks",
        "News related to the establishment, maintenance, and conservation of parks and \
         protected natural areas, including related policies and community involvement",
        false,
    ),
];

/// Insert the starting catalog, including the reserved sentinel. Existing
/// rows (possibly edited by an operator) are left untouched.
pub fn seed_smart_categories(conn: &Connection) -> Result<()> {
    let mut inserted = 0usize;
    inserted += conn.execute(
        "INSERT OR IGNORE INTO smart_categories (name, description, ignore) VALUES (?1, ?2, 1)",
        params![UNKNOWN_CATEGORY, UNKNOWN_CATEGORY_DESCRIPTION],
    )?;
    for (name, description, ignore) in INITIAL_CATEGORIES {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO smart_categories (name, description, ignore)
             VALUES (?1, ?2, ?3)",
            params![name, description, ignore],
        )?;
    }
    if inserted > 0 {
        info!(count = inserted, "seeded smart categories");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::store::Store;

    #[test]
    fn seed_is_idempotent_and_keeps_edits() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                seed_smart_categories(conn)?;
                conn.execute(
                    "UPDATE smart_categories SET ignore = 1 WHERE name = 'weather'",
                    [],
                )?;
                seed_smart_categories(conn)?;
                let ignored = analysis::ignored_categories(conn)?;
                assert!(ignored.contains("weather"));
                assert!(ignored.contains(UNKNOWN_CATEGORY));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn sentinel_never_appears_in_the_active_catalog() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| -> Result<()> {
                seed_smart_categories(conn)?;
                let catalog = analysis::active_catalog(conn)?;
                assert!(catalog.iter().all(|(name, _)| name != UNKNOWN_CATEGORY));
                assert!(catalog.iter().any(|(name, _)| name == "government"));
                Ok(())
            })
            .unwrap();
    }
}
