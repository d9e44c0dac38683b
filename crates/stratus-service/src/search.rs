//! Name search over folders and files, own or global.

use sqlx::postgres::PgPool;

use stratus_core::result::AppResult;
use stratus_core::AppError;
use stratus_database::repositories;
use stratus_entity::file::File;
use stratus_entity::folder::Folder;

use crate::context::RequestContext;

/// Whose content a search sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Everything the acting user owns.
    Own,
    /// Public content of every *other* user.
    Global,
}

/// Combined search hits. Finding nothing is a distinct outcome from an
/// error.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResults {
    /// Matching folders, newest first.
    pub folders: Vec<Folder>,
    /// Matching files, newest first.
    pub files: Vec<File>,
}

impl SearchResults {
    /// Whether the search matched nothing at all.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Turn a raw query into ILIKE patterns: whitespace-split, tokens shorter
/// than two characters dropped, each wrapped in wildcards.
pub(crate) fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(|token| format!("%{token}%"))
        .collect()
}

/// Searches folder and file names with keyset pagination.
#[derive(Debug, Clone)]
pub struct SearchService {
    pool: PgPool,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search folder and file names.
    ///
    /// Keyset pagination runs independently per table: pass the smallest id
    /// from the previous page of each to fetch the next one.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        mode: SearchMode,
        last_folder_id: Option<i64>,
        last_file_id: Option<i64>,
        limit: i64,
    ) -> AppResult<SearchResults> {
        if query.trim().is_empty() {
            return Err(AppError::validation("No search query provided"));
        }
        if last_folder_id.is_some_and(|id| id < 0) || last_file_id.is_some_and(|id| id < 0) {
            return Err(AppError::validation("Pagination ids must not be negative"));
        }

        let patterns = tokenize(query);
        if patterns.is_empty() {
            return Err(AppError::validation("Invalid search query"));
        }

        let global = mode == SearchMode::Global;
        let limit = limit.clamp(1, 100);

        let folders = repositories::folder::search(
            &self.pool,
            ctx.user_id(),
            &patterns,
            global,
            last_folder_id,
            limit,
        )
        .await?;
        let files = repositories::file::search(
            &self.pool,
            ctx.user_id(),
            &patterns,
            global,
            last_file_id,
            limit,
        )
        .await?;

        Ok(SearchResults { folders, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_tokens() {
        assert_eq!(tokenize("tax report"), vec!["%tax%", "%report%"]);
        assert_eq!(tokenize("a report"), vec!["%report%"]);
        assert!(tokenize("a b c").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_counts_characters_not_bytes() {
        // One multibyte character is still a one-character token.
        assert!(tokenize("é").is_empty());
        assert_eq!(tokenize("éé café"), vec!["%éé%", "%café%"]);
    }
}
