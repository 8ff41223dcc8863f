use super::*;

use organization::{Category, Organization};
use rust_fuzzy_search::fuzzy_compare;

const MAX_SEARCH_LENGTH: usize = 50;
const MIN_NAME_SIMILARITY: f32 = 0.7;

/// What the organization listing narrows down to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    /// Put organizations with a non-working website on top.
    pub broken_first: bool,
}

/// Organizations matching `filter`, in listing order.
///
/// A search term matches case-insensitively against name, email and
/// category (slug or label). Names also match by fuzzy similarity so that
/// small typos still find the record.
pub fn filter_organizations<'a>(
    organizations: &'a [Organization],
    filter: &OrganizationFilter,
) -> Result<Vec<&'a Organization>, AppError> {
    let term = match &filter.search {
        Some(search) => {
            let term = search.trim().to_lowercase();
            if term.chars().count() > MAX_SEARCH_LENGTH {
                return Err(AppError::Validation("Search string too long".to_string()));
            }
            Some(term).filter(|t| !t.is_empty())
        }
        None => None,
    };

    let mut matches: Vec<&Organization> = organizations
        .iter()
        .filter(|org| filter.category.is_none_or(|category| org.category == category))
        .filter(|org| term.as_deref().is_none_or(|term| matches_term(org, term)))
        .collect();

    if filter.broken_first {
        // stable: keeps listing order inside both groups
        matches.sort_by_key(|org| !org.has_broken_website());
    }

    Ok(matches)
}

fn matches_term(org: &Organization, term: &str) -> bool {
    let name = org.name.to_lowercase();

    name.contains(term)
        || org.email.to_lowercase().contains(term)
        || org.category.as_str().contains(term)
        || org.category.label().to_lowercase().contains(term)
        || fuzzy_compare(&name, term) >= MIN_NAME_SIMILARITY
}
