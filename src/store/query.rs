/// A parsed search query: whitespace-separated terms, all of which must match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub clauses: Vec<QueryClause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryClause {
    Ip(String),
    Hostname(String),
    ScanId(String),
    Port(u16),
    /// Case-insensitive substring over ip, hostname and nmap output.
    Text(String),
    /// A clause that can never match, e.g. `port:notaport`.
    Never,
}

impl SearchQuery {
    pub fn parse(input: &str) -> Self {
        let clauses = input.split_whitespace().map(parse_term).collect();
        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

fn parse_term(term: &str) -> QueryClause {
    if let Some((field, value)) = term.split_once(':') {
        if !value.is_empty() {
            match field.to_ascii_lowercase().as_str() {
                "ip" => return QueryClause::Ip(value.to_string()),
                "hostname" => return QueryClause::Hostname(value.to_ascii_lowercase()),
                "scan_id" => return QueryClause::ScanId(value.to_string()),
                "port" => {
                    return value.parse::<u16>()
                        .map(QueryClause::Port)
                        .unwrap_or(QueryClause::Never);
                }
                _ => {}
            }
        }
    }
    QueryClause::Text(term.to_lowercase())
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
