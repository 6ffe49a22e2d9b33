use super::{
    DomainError,
    DomainResult,
};

const MIN_COMMIT_ID_LENGTH: usize = 7;

const MAX_COMMIT_ID_LENGTH: usize = 64;

const MAX_REPOSITORY_NAME_LENGTH: usize = 256;

const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Abbreviated or full hex object id
pub fn validate_commit_id(commit_id: &str) -> DomainResult<()> {
    let length_ok = (MIN_COMMIT_ID_LENGTH..=MAX_COMMIT_ID_LENGTH).contains(&commit_id.len());
    if !length_ok || !commit_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DomainError::MalformedEvent(format!(
            "Commit id '{}' is not a {}-{} character hex string",
            commit_id, MIN_COMMIT_ID_LENGTH, MAX_COMMIT_ID_LENGTH
        )));
    }
    Ok(())
}

/// `owner/name` style repository name made of `[A-Za-z0-9._-]` segments
pub fn validate_repository_name(repository_name: &str) -> DomainResult<()> {
    if repository_name.is_empty() {
        return Err(DomainError::MalformedEvent(
            "Repository name cannot be empty".to_string(),
        ));
    }

    if repository_name.len() > MAX_REPOSITORY_NAME_LENGTH {
        return Err(DomainError::MalformedEvent(format!(
            "Repository name exceeds maximum length of {} characters",
            MAX_REPOSITORY_NAME_LENGTH
        )));
    }

    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    };

    if !repository_name.split('/').all(valid_segment) {
        return Err(DomainError::MalformedEvent(format!(
            "Repository name '{}' contains invalid characters",
            repository_name
        )));
    }

    Ok(())
}

/// Database and table names embedded in query text
pub fn validate_identifier(field: &str, identifier: &str) -> DomainResult<()> {
    if identifier.is_empty() || identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DomainError::InvalidConfig(format!(
            "{} must be 1-{} characters",
            field, MAX_IDENTIFIER_LENGTH
        )));
    }

    if !identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::InvalidConfig(format!(
            "{} '{}' contains invalid characters (only alphanumeric and underscore allowed)",
            field, identifier
        )));
    }

    Ok(())
}

/// Single-quoted SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
