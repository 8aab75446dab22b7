use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

fn default_page_nr() -> u64 {
    1
}

fn default_page_size() -> u64 {
    25
}

/// Query-string parameters shared by every `paged*` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParameters {
    #[serde(default = "default_page_nr", alias = "PageNr")]
    pub page_nr: u64,
    #[serde(default = "default_page_size", alias = "PageSize")]
    pub page_size: u64,
    #[serde(default, alias = "OrderBy")]
    pub order_by: Option<String>,
    #[serde(default, alias = "SearchText")]
    pub search_text: Option<String>,
}

impl Default for PageParameters {
    fn default() -> Self {
        Self {
            page_nr: default_page_nr(),
            page_size: default_page_size(),
            order_by: None,
            search_text: None,
        }
    }
}

/// Sort state as reported by a UI table header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSortDirection {
    Ascending,
    Descending,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortOrder {
    /// Column name normalised to snake_case.
    pub field: String,
    pub direction: SortDirection,
}

impl PageParameters {
    pub fn new(page_nr: u64, page_size: u64) -> Self {
        Self {
            page_nr,
            page_size,
            ..Default::default()
        }
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Builds parameters the way the table components do. An ascending header
    /// click is sent as `desc` and a descending one as `asc`; existing table
    /// clients depend on this inversion, so it is reproduced as-is.
    pub fn from_table_sort(
        page_nr: u64,
        page_size: u64,
        field: Option<&str>,
        direction: TableSortDirection,
    ) -> Self {
        let order_by = match (field, direction) {
            (Some(field), TableSortDirection::Ascending) => Some(format!("{field} desc")),
            (Some(field), TableSortDirection::Descending) => Some(format!("{field} asc")),
            _ => None,
        };
        Self {
            page_nr,
            page_size,
            order_by,
            search_text: None,
        }
    }

    pub fn validate(&self, max_page_size: u64) -> ServiceResult<()> {
        let mut messages = Vec::new();
        if self.page_nr < 1 {
            messages.push("Page number must be 1 or greater".to_string());
        }
        if self.page_size < 1 {
            messages.push("Page size must be greater than 0".to_string());
        } else if self.page_size > max_page_size {
            messages.push(format!("Page size may not exceed {max_page_size}"));
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(messages))
        }
    }

    /// Parsed `order_by`, or `None` when absent or malformed.
    pub fn sort_order(&self) -> Option<SortOrder> {
        self.order_by.as_deref().and_then(parse_order_by)
    }

    /// Trimmed free-text filter, `None` when blank.
    pub fn search(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Parses `"field"`, `"field asc"` or `"field desc"`.
pub fn parse_order_by(raw: &str) -> Option<SortOrder> {
    let mut parts = raw.split_whitespace();
    let field = parts.next()?;
    let direction = match parts.next() {
        None => SortDirection::Asc,
        Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
        Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    if !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(SortOrder {
        field: to_snake_case(field),
        direction,
    })
}

fn to_snake_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for (i, c) in field.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One page of results plus the total number of matching rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_nr: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_nr: self.page_nr,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_and_direction() {
        assert_eq!(
            parse_order_by("Name desc"),
            Some(SortOrder {
                field: "name".into(),
                direction: SortDirection::Desc
            })
        );
        assert_eq!(
            parse_order_by("firstName").map(|o| (o.field, o.direction)),
            Some(("first_name".into(), SortDirection::Asc))
        );
        assert_eq!(
            parse_order_by("last_name ASC").map(|o| o.field),
            Some("last_name".into())
        );
    }

    #[test]
    fn malformed_order_by_is_ignored() {
        assert_eq!(parse_order_by(""), None);
        assert_eq!(parse_order_by("name sideways"), None);
        assert_eq!(parse_order_by("name asc extra"), None);
        assert_eq!(parse_order_by("name; drop table"), None);
    }

    #[test]
    fn table_sort_keeps_inverted_direction() {
        let asc = PageParameters::from_table_sort(1, 10, Some("Name"), TableSortDirection::Ascending);
        assert_eq!(asc.order_by.as_deref(), Some("Name desc"));

        let desc =
            PageParameters::from_table_sort(1, 10, Some("Name"), TableSortDirection::Descending);
        assert_eq!(desc.order_by.as_deref(), Some("Name asc"));

        let none = PageParameters::from_table_sort(1, 10, Some("Name"), TableSortDirection::None);
        assert_eq!(none.order_by, None);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(PageParameters::new(1, 10).validate(100).is_ok());

        let err = PageParameters::new(0, 0).validate(100).unwrap_err();
        assert_eq!(err.messages().len(), 2);

        assert!(PageParameters::new(1, 101).validate(100).is_err());
    }

    #[test]
    fn blank_search_is_treated_as_absent() {
        assert_eq!(PageParameters::new(1, 10).with_search("   ").search(), None);
        assert_eq!(PageParameters::new(1, 10).with_search(" ada ").search(), Some("ada"));
    }

    #[test]
    fn query_string_accepts_both_casings() {
        let camel: PageParameters =
            serde_json::from_str(r#"{"pageNr":2,"pageSize":5,"orderBy":"name asc"}"#).unwrap();
        let pascal: PageParameters =
            serde_json::from_str(r#"{"PageNr":2,"PageSize":5,"OrderBy":"name asc"}"#).unwrap();
        assert_eq!(camel, pascal);
        assert_eq!(camel.page_nr, 2);
    }
}
