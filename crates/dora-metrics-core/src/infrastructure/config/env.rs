//! Overrides read from the flat environment variables older deployments set

use std::collections::BTreeSet;

use super::schema::DoraConfig;

pub const DEFAULT_MAIN_BRANCH_VAR: &str = "default_main_branch";
pub const PROD_STAGE_NAME_VAR: &str = "app_prod_stage_name";
pub const REPO_NAMES_VAR: &str = "app_repo_names";
pub const TOOLING_ACCOUNT_VAR: &str = "tooling_account";
pub const TOOLING_ROLE_ARN_VAR: &str = "tooling_cross_account_role_arn";
pub const OUTPUT_LOCATION_VAR: &str = "github_output_location";
pub const DATABASE_VAR: &str = "github_database";
pub const TABLE_VAR: &str = "github_table";

/// Applies every override that is set and non-empty, returning the names applied
pub fn apply_env_overrides<F>(config: &mut DoraConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let mut applied = Vec::new();

    let string_overrides: [(&'static str, &mut String); 7] = [
        (DEFAULT_MAIN_BRANCH_VAR, &mut config.general.default_branch),
        (PROD_STAGE_NAME_VAR, &mut config.general.prod_stage_name),
        (TOOLING_ACCOUNT_VAR, &mut config.aws.tooling_account),
        (TOOLING_ROLE_ARN_VAR, &mut config.aws.tooling_role_arn),
        (OUTPUT_LOCATION_VAR, &mut config.history.output_location),
        (DATABASE_VAR, &mut config.history.database),
        (TABLE_VAR, &mut config.history.table),
    ];

    for (name, target) in string_overrides {
        if let Some(value) = get(name) {
            *target = value;
            applied.push(name);
        }
    }

    if let Some(raw) = get(REPO_NAMES_VAR) {
        config.general.trunk_based_repositories = parse_repo_names(&raw);
        applied.push(REPO_NAMES_VAR);
    }

    if !applied.is_empty() {
        tracing::debug!(overrides = ?applied, "Applied environment overrides");
    }

    applied
}

pub fn apply_process_env(config: &mut DoraConfig) -> Vec<&'static str> {
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Accepts a JSON array (`["a", "b"]`) or a comma separated list (`a,b`)
pub fn parse_repo_names(raw: &str) -> BTreeSet<String> {
    let trimmed = raw.trim();

    if trimmed.starts_with('[') {
        if let Ok(names) = serde_json::from_str::<Vec<String>>(trimmed) {
            return names
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        tracing::warn!(value = %trimmed, "Repository list is not a JSON array, splitting on commas");
    }

    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|name| {
            name.trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = DoraConfig::default();
        let applied = apply_env_overrides(
            &mut config,
            lookup(&[
                ("default_main_branch", "trunk"),
                ("app_prod_stage_name", "Production"),
                ("app_repo_names", "repo-app-sample-1,amazon/github-dora"),
                ("github_database", "github_db"),
                ("tooling_cross_account_role_arn", "arn:aws:iam::1:role/t"),
            ]),
        );

        assert_eq!(applied.len(), 5);
        assert_eq!(config.general.default_branch, "trunk");
        assert_eq!(config.general.prod_stage_name, "Production");
        assert_eq!(config.history.database, "github_db");
        assert_eq!(config.aws.tooling_role_arn, "arn:aws:iam::1:role/t");
        assert!(config
            .general
            .trunk_based_repositories
            .contains("amazon/github-dora"));
    }

    #[test]
    fn test_blank_values_ignored() {
        let mut config = DoraConfig::default();
        let applied = apply_env_overrides(&mut config, lookup(&[("default_main_branch", "  ")]));
        assert!(applied.is_empty());
        assert_eq!(config.general.default_branch, "main");
    }

    #[test]
    fn test_parse_repo_names_formats() {
        let expected: BTreeSet<String> = ["app1", "amazon/github-dora"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(parse_repo_names(r#"["app1", "amazon/github-dora"]"#), expected);
        assert_eq!(parse_repo_names("app1, amazon/github-dora"), expected);
        assert_eq!(parse_repo_names("['app1', 'amazon/github-dora']"), expected);
        assert!(parse_repo_names("").is_empty());
    }
}
