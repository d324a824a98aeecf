use super::ApiError;

pub const ENGAGEMENT_TYPES: &[&str] = &[
    "networking_event",
    "mentorship",
    "interview",
    "collaboration",
    "donation",
    "other",
];

pub const PARTNER_TYPES: &[&str] = &[
    "corporate",
    "nonprofit",
    "government",
    "educational",
    "other",
];

pub const ENGAGEMENT_LEVELS: &[&str] = &["gold", "silver", "bronze", "prospective"];

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 1000;

    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}

/// Clamps list pagination to the supported window (page >= 1, size 1..=100).
pub fn validate_page_params(page: Option<u64>, page_size: Option<u64>) -> Result<(u64, u64), ApiError> {
    const DEFAULT_PAGE_SIZE: u64 = 20;
    const MAX_PAGE_SIZE: u64 = 100;

    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation("Page numbers start at 1"));
    }

    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page_size: {page_size}. Must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    Ok((page, page_size))
}

pub fn validate_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::field(
            field,
            &format!("Must be one of: {}.", allowed.join(", ")),
        ))
    }
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(12345).is_ok());
        assert!(validate_id(0).is_err());
        assert!(validate_id(-1).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_page_params() {
        assert_eq!(validate_page_params(None, None).unwrap(), (1, 20));
        assert_eq!(validate_page_params(Some(3), Some(50)).unwrap(), (3, 50));
        assert!(validate_page_params(Some(0), None).is_err());
        assert!(validate_page_params(None, Some(101)).is_err());
    }

    #[test]
    fn test_validate_choice() {
        assert!(validate_choice("engagement_type", "mentorship", ENGAGEMENT_TYPES).is_ok());
        assert!(validate_choice("engagement_type", "golf", ENGAGEMENT_TYPES).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("Acme Corp").is_ok());
        assert!(validate_search_query("  trimmed  ").is_ok());
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query("   ").is_err());
    }
}
