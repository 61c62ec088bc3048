//! Persona ↔ keyword matching.

use articlesmith_shared::{KeywordRecord, MatchedTask, PersonaRecord};
use tracing::{debug, warn};

/// Pair every keyword with the first persona sharing its category.
///
/// Output follows keyword order. Keywords whose category has no persona are
/// skipped; a persona without keywords produces nothing.
pub fn match_tasks(personas: &[PersonaRecord], keywords: &[KeywordRecord]) -> Vec<MatchedTask> {
    let mut skipped = 0usize;

    let tasks: Vec<MatchedTask> = keywords
        .iter()
        .filter_map(|keyword| {
            match personas.iter().find(|p| p.category == keyword.category) {
                Some(persona) => Some(MatchedTask {
                    persona: persona.clone(),
                    keyword: keyword.clone(),
                }),
                None => {
                    debug!(keyword = %keyword.id, category = %keyword.category, "no persona for keyword category");
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, matched = tasks.len(), "some keywords have no matching persona");
    }

    tasks
}
