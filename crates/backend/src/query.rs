//! Row selection in PostgREST terms.
//!
//! [`Select`] describes a read; the Supabase client turns it into query
//! parameters (`title=ilike.*tower*&order=created_at.desc`) and the memory
//! backend evaluates it directly.

use serde::Serialize;

/// Content tables in the portfolio schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Artworks,
    BlogPosts,
    Reviews,
}

impl Table {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Artworks => "artworks",
            Self::BlogPosts => "blog_posts",
            Self::Reviews => "reviews",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: &'static str, value: String },
    /// Case-insensitive substring match on `column`.
    ILike { column: &'static str, term: String },
}

impl Filter {
    /// PostgREST `(column, operator.value)` pair.
    #[must_use]
    pub fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq { column, value } => ((*column).to_string(), format!("eq.{value}")),
            Self::ILike { column, term } => (
                (*column).to_string(),
                format!("ilike.*{}*", escape_like(term)),
            ),
        }
    }
}

/// Escape `term` for a PostgREST `ilike` pattern.
///
/// `%`, `_` and `\` are escaped for `LIKE`. PostgREST rewrites every `*` to
/// `%` with no escape, so a literal `*` becomes the one-character wildcard.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: Table,
    filters: Vec<Filter>,
    order: Option<(&'static str, Direction)>,
    limit: Option<usize>,
}

impl Select {
    /// Select every column of `table`.
    #[must_use]
    pub const fn from(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.to_string(),
        });
        self
    }

    /// Case-insensitive substring filter.
    ///
    /// `term` is matched literally; wildcards are escaped when the filter is
    /// rendered. A blank term adds no filter.
    #[must_use]
    pub fn ilike(mut self, column: &'static str, term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() {
            self.filters.push(Filter::ILike {
                column,
                term: term.to_string(),
            });
        }
        self
    }

    #[must_use]
    pub fn order_desc(mut self, column: &'static str) -> Self {
        self.order = Some((column, Direction::Desc));
        self
    }

    #[must_use]
    pub fn order_asc(mut self, column: &'static str) -> Self {
        self.order = Some((column, Direction::Asc));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub const fn ordering(&self) -> Option<(&'static str, Direction)> {
        self.order
    }

    #[must_use]
    pub const fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Query parameters for `GET /rest/v1/{table}`.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().map(Filter::to_param));
        if let Some((column, direction)) = self.order {
            let direction = match direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            pairs.push(("order".to_string(), format!("{column}.{direction}")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
