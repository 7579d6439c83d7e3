//! Branch filter compilation.
//!
//! Branch names are inlined into the SQL text as quoted literals rather than bound as
//! parameters. This is the only place that happens; moving to bound parameters means
//! changing `compile` and the `{branch_filter}` substitution in `queries`.

use crate::models::BRANCH_COLUMN;
use serde::{Deserialize, Serialize};

/// Selection value meaning "no branch restriction".
pub const ALL_BRANCHES: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    branches: Vec<String>,
}

impl FilterSelection {
    pub fn new<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all() -> Self {
        Self::new([ALL_BRANCHES])
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn is_unrestricted(&self) -> bool {
        self.branches.is_empty() || self.branches.iter().any(|branch| branch == ALL_BRANCHES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledPredicate {
    sql: String,
    cache_key: String,
}

impl CompiledPredicate {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Order-insensitive identity of the filter.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn is_unrestricted(&self) -> bool {
        self.sql.is_empty()
    }
}

pub fn compile(selection: &FilterSelection) -> CompiledPredicate {
    if selection.is_unrestricted() {
        return CompiledPredicate::unrestricted();
    }

    let literals = selection
        .branches()
        .iter()
        .map(|branch| quote_literal(branch))
        .collect::<Vec<_>>()
        .join(", ");

    let mut normalized = selection.branches().to_vec();
    normalized.sort();
    normalized.dedup();

    CompiledPredicate {
        sql: format!("AND {} IN ({})", BRANCH_COLUMN, literals),
        cache_key: normalized
            .iter()
            .map(|branch| quote_literal(branch))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Filter options shown to the user: the sentinel first, then the distinct branch names.
pub fn branch_options<I, S>(distinct: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut branches = distinct
        .into_iter()
        .map(Into::into)
        .filter(|branch: &String| !branch.trim().is_empty() && branch != ALL_BRANCHES)
        .collect::<Vec<_>>();
    branches.sort();
    branches.dedup();

    let mut options = Vec::with_capacity(branches.len() + 1);
    options.push(ALL_BRANCHES.to_string());
    options.extend(branches);
    options
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
