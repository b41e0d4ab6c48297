//! A small filtered-deck search term language (`spec.md` §4.8): enough to
//! drive `rebuild`'s per-term card selection. Supports `deck:NAME`,
//! `tag:NAME`, `is:due`, `is:new`, `is:suspended`, `is:buried`, bare terms
//! combined with implicit `AND`, and `-term` negation.

use crate::model::{CardId, CardQueue, CardType};
use crate::{Error, LibraryError, SearchErrorKind};
use sqlx::SqlitePool;

enum Clause {
    Deck(String),
    Tag(String),
    IsDue,
    IsNew,
    IsSuspended,
    IsBuried,
}

struct Term {
    clause: Clause,
    negated: bool,
}

fn parse(query: &str) -> Result<Vec<Term>, Error> {
    query
        .split_whitespace()
        .map(|token| {
            let (negated, token) = token.strip_prefix('-').map_or((false, token), |rest| (true, rest));
            let clause = if let Some(name) = token.strip_prefix("deck:") {
                Clause::Deck(name.to_string())
            } else if let Some(name) = token.strip_prefix("tag:") {
                Clause::Tag(name.to_string())
            } else {
                match token {
                    "is:due" => Clause::IsDue,
                    "is:new" => Clause::IsNew,
                    "is:suspended" => Clause::IsSuspended,
                    "is:buried" => Clause::IsBuried,
                    other => {
                        return Err(Error::Library(LibraryError::Search(SearchErrorKind::UnknownTerm(
                            other.to_string(),
                        ))));
                    }
                }
            };
            Ok(Term { clause, negated })
        })
        .collect()
}

/// Resolves a search query to matching card ids. Each clause is executed
/// as its own `SELECT` and intersected/subtracted in memory — acceptable
/// at the collection sizes this scheduler targets, and far simpler than
/// compiling to one dynamic `WHERE` clause.
pub async fn search_card_ids(db: &SqlitePool, query: &str) -> Result<Vec<CardId>, Error> {
    let terms = parse(query)?;
    let mut ids: Option<std::collections::HashSet<CardId>> = None;

    for term in terms {
        let matched: std::collections::HashSet<CardId> = match &term.clause {
            Clause::Deck(name) => {
                let rows: Vec<(CardId,)> = sqlx::query_as(
                    "SELECT card.id FROM card JOIN deck ON card.deck_id = deck.id WHERE deck.name = ? OR deck.name LIKE ?",
                )
                .bind(name)
                .bind(format!("{name}::%"))
                .fetch_all(db)
                .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            Clause::Tag(name) => {
                let pattern = format!("% {name} %");
                let rows: Vec<(CardId,)> = sqlx::query_as(
                    "SELECT card.id FROM card JOIN note ON card.note_id = note.id WHERE note.tags LIKE ?",
                )
                .bind(pattern)
                .fetch_all(db)
                .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            Clause::IsDue => {
                let rows: Vec<(CardId,)> =
                    sqlx::query_as("SELECT id FROM card WHERE queue IN (?, ?, ?)")
                        .bind(CardQueue::Review)
                        .bind(CardQueue::Learning)
                        .bind(CardQueue::DayLearning)
                        .fetch_all(db)
                        .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            Clause::IsNew => {
                let rows: Vec<(CardId,)> = sqlx::query_as("SELECT id FROM card WHERE type = ?")
                    .bind(CardType::New)
                    .fetch_all(db)
                    .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            Clause::IsSuspended => {
                let rows: Vec<(CardId,)> = sqlx::query_as("SELECT id FROM card WHERE queue = ?")
                    .bind(CardQueue::Suspended)
                    .fetch_all(db)
                    .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
            Clause::IsBuried => {
                let rows: Vec<(CardId,)> = sqlx::query_as("SELECT id FROM card WHERE queue = ?")
                    .bind(CardQueue::Buried)
                    .fetch_all(db)
                    .await?;
                rows.into_iter().map(|(id,)| id).collect()
            }
        };
        ids = Some(match ids {
            None if term.negated => {
                let all: Vec<(CardId,)> = sqlx::query_as("SELECT id FROM card").fetch_all(db).await?;
                all.into_iter().map(|(id,)| id).filter(|id| !matched.contains(id)).collect()
            }
            None => matched,
            Some(acc) if term.negated => acc.difference(&matched).copied().collect(),
            Some(acc) => acc.intersection(&matched).copied().collect(),
        });
    }

    Ok(ids.unwrap_or_default().into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_term() {
        assert!(parse("is:bogus").is_err());
    }

    #[test]
    fn test_parse_accepts_known_terms() {
        let terms = parse("deck:Main -is:suspended tag:leech").unwrap();
        assert_eq!(terms.len(), 3);
    }
}
