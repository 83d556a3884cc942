use uuid::Uuid;

/// Ordered query-string pairs for list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Accepts `"created_at desc, name"` style order strings and sends them
    /// as `created_at.desc,name.asc`.
    pub fn order(self, order: &str) -> Self {
        let normalized = normalize_order(order);
        if normalized.is_empty() {
            self
        } else {
            self.with("order", normalized)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize_order(order: &str) -> String {
    let mut out = Vec::new();
    for part in order.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut it = trimmed.split_whitespace();
        if let Some(col) = it.next() {
            let dir = it.next().unwrap_or("asc");
            let dir = if dir.eq_ignore_ascii_case("desc") { "desc" } else { "asc" };
            out.push(format!("{}.{}", col, dir));
        }
    }
    out.join(",")
}

/// Common filters accepted by the property list endpoints
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub owner_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order: Option<String>,
}

impl ListQuery {
    pub fn to_params(&self) -> QueryParams {
        let params = QueryParams::new()
            .with_opt("search", self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .with_opt("status", self.status.as_deref())
            .with_opt("owner_id", self.owner_id)
            .with_opt("limit", self.limit)
            .with_opt("offset", self.offset);

        match self.order.as_deref() {
            Some(order) => params.order(order),
            None => params,
        }
    }
}
