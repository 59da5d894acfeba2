use crate::models::{FilterMode, GroupBy};
use serde::{Deserialize, Serialize};

/// Dashboard search parameters as they appear in the URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearch {
    pub mode: Option<String>,
    pub group: Option<String>,
    pub carrier: Option<String>,
    pub status: Option<String>,
}

/// Validated search state. Lives in the URL so views are shareable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub mode: FilterMode,
    pub group: GroupBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Partial update; `Some("")` clears a filter, `None` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPatch {
    pub mode: Option<FilterMode>,
    pub group: Option<GroupBy>,
    pub carrier: Option<String>,
    pub status: Option<String>,
}

impl SearchPatch {
    pub fn mode(mode: FilterMode) -> Self {
        Self {
            mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn group(group: GroupBy) -> Self {
        Self {
            group: Some(group),
            ..Default::default()
        }
    }

    pub fn carrier(carrier: impl Into<String>) -> Self {
        Self {
            carrier: Some(carrier.into()),
            ..Default::default()
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// Resets grouping and both filters.
    pub fn clear_all() -> Self {
        Self {
            mode: None,
            group: Some(GroupBy::None),
            carrier: Some(String::new()),
            status: Some(String::new()),
        }
    }
}

impl From<RawSearch> for SearchState {
    fn from(raw: RawSearch) -> Self {
        Self {
            mode: FilterMode::parse(raw.mode.as_deref()),
            group: GroupBy::parse(raw.group.as_deref()),
            carrier: non_empty(raw.carrier),
            status: non_empty(raw.status),
        }
    }
}

impl SearchState {
    /// Malformed query strings fall back to the default state.
    pub fn parse_query(query: &str) -> Self {
        serde_urlencoded::from_str::<RawSearch>(query.trim_start_matches('?'))
            .unwrap_or_default()
            .into()
    }

    pub fn apply(&self, patch: SearchPatch) -> Self {
        Self {
            mode: patch.mode.unwrap_or(self.mode),
            group: patch.group.unwrap_or(self.group),
            carrier: match patch.carrier {
                Some(carrier) => non_empty(Some(carrier)),
                None => self.carrier.clone(),
            },
            status: match patch.status {
                Some(status) => non_empty(Some(status)),
                None => self.status.clone(),
            },
        }
    }

    pub fn active_filter_count(&self) -> usize {
        usize::from(self.group != GroupBy::None)
            + usize::from(self.carrier.is_some())
            + usize::from(self.status.is_some())
    }

    pub fn to_query(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
