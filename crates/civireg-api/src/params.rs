// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use civireg_registry::{ListFilters, ListParams, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use std::collections::BTreeMap;

/// Resident directory search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub term: String,
}

/// Advisory duplicate probe for the intake form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateProbeParams {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
}

pub fn parse_list_households_params(
    query: &BTreeMap<String, String>,
) -> Result<ListParams, ApiError> {
    let page = match query.get("page") {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ApiError::invalid_param("page", raw))?,
        None => 1,
    };

    let per_page = match query.get("per_page") {
        Some(raw) => {
            let value = raw
                .parse::<u64>()
                .map_err(|_| ApiError::invalid_param("per_page", raw))?;
            if value == 0 || value > MAX_PER_PAGE {
                return Err(ApiError::invalid_param("per_page", raw));
            }
            value
        }
        None => DEFAULT_PER_PAGE,
    };

    let search = query
        .get("search")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ListParams {
        page,
        per_page,
        search,
        filters: ListFilters {
            four_ps_beneficiary: parse_flag(query, "four_ps_beneficiary")?,
            indigent_family: parse_flag(query, "indigent_family")?,
            has_senior_citizen: parse_flag(query, "has_senior_citizen")?,
            has_pwd_member: parse_flag(query, "has_pwd_member")?,
        },
    })
}

/// Resident search is permissive: a missing or too-short `q` is not a
/// request error. The term is passed through as-is and the directory
/// answers anything under its minimum length with an empty result.
#[must_use]
pub fn parse_search_params(query: &BTreeMap<String, String>) -> SearchParams {
    let term = query.get("q").map(|s| s.trim()).unwrap_or_default();
    SearchParams {
        term: term.to_string(),
    }
}

pub fn parse_duplicate_probe_params(
    query: &BTreeMap<String, String>,
) -> Result<DuplicateProbeParams, ApiError> {
    let field = |name: &str| -> Result<String, ApiError> {
        let value = query
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::invalid_param(name, ""))?;
        Ok(value.to_string())
    };
    Ok(DuplicateProbeParams {
        first_name: field("first_name")?,
        last_name: field("last_name")?,
        birth_date: field("birth_date")?,
    })
}

fn parse_flag(query: &BTreeMap<String, String>, name: &str) -> Result<Option<bool>, ApiError> {
    let Some(raw) = query.get(name) else {
        return Ok(None);
    };
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        Ok(Some(true))
    } else if raw == "0" || raw.eq_ignore_ascii_case("false") {
        Ok(Some(false))
    } else {
        Err(ApiError::invalid_param(name, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorCode;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn list_params_default_to_first_page_of_fifteen() {
        let parsed = parse_list_households_params(&query(&[])).expect("defaults");
        assert_eq!(parsed.page, 1);
        assert_eq!(parsed.per_page, 15);
        assert_eq!(parsed.search, None);
        assert_eq!(parsed.filters, ListFilters::default());
    }

    #[test]
    fn per_page_is_bounded() {
        for bad in ["0", "101", "nope", "-3"] {
            let err = parse_list_households_params(&query(&[("per_page", bad)]))
                .expect_err("out of bounds");
            assert_eq!(err.code, ApiErrorCode::InvalidQueryParameter, "{bad}");
        }
        let parsed =
            parse_list_households_params(&query(&[("per_page", "100")])).expect("at the cap");
        assert_eq!(parsed.per_page, 100);
    }

    #[test]
    fn flag_filters_accept_boolean_spellings_only() {
        let parsed = parse_list_households_params(&query(&[
            ("four_ps_beneficiary", "true"),
            ("has_pwd_member", "0"),
        ]))
        .expect("flags");
        assert_eq!(parsed.filters.four_ps_beneficiary, Some(true));
        assert_eq!(parsed.filters.has_pwd_member, Some(false));
        assert_eq!(parsed.filters.indigent_family, None);

        let err = parse_list_households_params(&query(&[("indigent_family", "yes")]))
            .expect_err("unknown spelling");
        assert_eq!(err.code, ApiErrorCode::InvalidQueryParameter);
    }

    #[test]
    fn blank_search_is_dropped() {
        let parsed =
            parse_list_households_params(&query(&[("search", "   ")])).expect("blank search");
        assert_eq!(parsed.search, None);
    }

    #[test]
    fn short_and_missing_search_terms_pass_through() {
        use civireg_registry::MIN_SEARCH_LEN;

        let parsed = parse_search_params(&query(&[("q", " J ")]));
        assert_eq!(parsed.term, "J");
        assert!(parsed.term.chars().count() < MIN_SEARCH_LEN);

        let parsed = parse_search_params(&query(&[]));
        assert_eq!(parsed.term, "");

        let parsed = parse_search_params(&query(&[("q", "  Juan  ")]));
        assert_eq!(parsed.term, "Juan");
    }

    #[test]
    fn duplicate_probe_requires_all_three_fields() {
        let full = query(&[
            ("first_name", "Juan"),
            ("last_name", "dela Cruz"),
            ("birth_date", "1985-03-20"),
        ]);
        let parsed = parse_duplicate_probe_params(&full).expect("complete probe");
        assert_eq!(parsed.birth_date, "1985-03-20");

        let partial = query(&[("first_name", "Juan"), ("last_name", " ")]);
        assert!(parse_duplicate_probe_params(&partial).is_err());
    }
}
