use std::net::IpAddr;

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::errors::ScopeError;
use crate::models::{HostResult, HostScreenshots, PortInfo, ScreenshotRef};
use crate::store::query::like_pattern;
use crate::store::{QueryClause, ResultIndex, SearchIndex, SearchQuery};
use super::{canonical_ip, fmt_ts, parse_ts, sql_int, Database};

const RESULT_COLUMNS: &str = "h.scan_id, h.ip, h.hostname, h.ctime, h.agent_version, h.port_count, h.ports_json, h.nmap_data, h.xml_data, h.gnmap_data";

/// Restricts `h` to each host's newest result.
const LATEST_ONLY: &str = "h.scan_id = (SELECT h2.scan_id FROM host_results h2 WHERE h2.ip = h.ip ORDER BY h2.ctime DESC, h2.scan_id DESC LIMIT 1)";

struct ResultRow {
    scan_id: String,
    ip: String,
    hostname: Option<String>,
    ctime: String,
    agent_version: Option<String>,
    port_count: i64,
    ports_json: String,
    nmap_data: Option<String>,
    xml_data: Option<String>,
    gnmap_data: Option<String>,
}

impl ResultRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            scan_id: row.get(0)?,
            ip: row.get(1)?,
            hostname: row.get(2)?,
            ctime: row.get(3)?,
            agent_version: row.get(4)?,
            port_count: row.get(5)?,
            ports_json: row.get(6)?,
            nmap_data: row.get(7)?,
            xml_data: row.get(8)?,
            gnmap_data: row.get(9)?,
        })
    }

    fn into_result(self, conn: &Connection) -> Result<HostResult, ScopeError> {
        let ports: Vec<PortInfo> = serde_json::from_str(&self.ports_json)?;
        let screenshots = screenshots_for_scan(conn, &self.scan_id)?;
        Ok(HostResult {
            scan_id: self.scan_id,
            ip: self.ip,
            hostname: self.hostname,
            ctime: parse_ts(&self.ctime)?,
            agent_version: self.agent_version,
            port_count: self.port_count.max(0) as usize,
            ports,
            nmap_data: self.nmap_data,
            xml_data: self.xml_data,
            gnmap_data: self.gnmap_data,
            screenshots,
        })
    }
}

struct ScreenshotRow {
    scan_id: String,
    target: String,
    service: String,
    port: i64,
    path: String,
    thumb_path: Option<String>,
    ctime: String,
}

impl ScreenshotRow {
    const COLUMNS: &'static str = "scan_id, target, service, port, path, thumb_path, ctime";

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            scan_id: row.get(0)?,
            target: row.get(1)?,
            service: row.get(2)?,
            port: row.get(3)?,
            path: row.get(4)?,
            thumb_path: row.get(5)?,
            ctime: row.get(6)?,
        })
    }

    fn into_ref(self) -> Result<ScreenshotRef, ScopeError> {
        Ok(ScreenshotRef {
            scan_id: self.scan_id,
            target: self.target,
            service: self.service,
            port: u16::try_from(self.port)
                .map_err(|_| ScopeError::Database(format!("Invalid screenshot port {}", self.port)))?,
            path: self.path,
            thumb_path: self.thumb_path,
            ctime: parse_ts(&self.ctime)?,
        })
    }
}

fn screenshots_for_scan(conn: &Connection, scan_id: &str) -> Result<Vec<ScreenshotRef>, ScopeError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM screenshots WHERE scan_id = ?1 ORDER BY id ASC",
        ScreenshotRow::COLUMNS
    ))?;
    let rows = stmt.query_map(rusqlite::params![scan_id], ScreenshotRow::from_row)?;
    let mut shots = Vec::new();
    for row in rows {
        shots.push(row?.into_ref()?);
    }
    Ok(shots)
}

fn query_results(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Vec<HostResult>, ScopeError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), ResultRow::from_row)?;
    let mut raw = Vec::new();
    for row in rows {
        raw.push(row?);
    }
    raw.into_iter().map(|r| r.into_result(conn)).collect()
}

fn count(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<u64, ScopeError> {
    let n: i64 = conn.query_row(sql, rusqlite::params_from_iter(params), |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

/// Translate a parsed query into a WHERE fragment over `host_results h`.
fn where_clause(query: &SearchQuery, index: SearchIndex) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if index == SearchIndex::Latest {
        conditions.push(LATEST_ONLY.to_string());
    }

    for clause in &query.clauses {
        match clause {
            QueryClause::Ip(ip) => {
                conditions.push("h.ip = ?".to_string());
                params.push(Value::Text(canonical_ip(ip)));
            }
            QueryClause::Hostname(host) => {
                conditions.push("lower(h.hostname) = ?".to_string());
                params.push(Value::Text(host.clone()));
            }
            QueryClause::ScanId(id) => {
                conditions.push("h.scan_id = ?".to_string());
                params.push(Value::Text(id.clone()));
            }
            QueryClause::Port(port) => {
                conditions.push(
                    "EXISTS (SELECT 1 FROM json_each(h.ports_json) p WHERE json_extract(p.value, '$.port') = ?)".to_string()
                );
                params.push(Value::Integer(i64::from(*port)));
            }
            QueryClause::Text(text) => {
                conditions.push(
                    "(h.ip LIKE ? ESCAPE '\\' OR lower(COALESCE(h.hostname, '')) LIKE ? ESCAPE '\\' OR lower(COALESCE(h.nmap_data, '')) LIKE ? ESCAPE '\\')".to_string()
                );
                let pattern = like_pattern(text);
                for _ in 0..3 {
                    params.push(Value::Text(pattern.clone()));
                }
            }
            QueryClause::Never => conditions.push("0".to_string()),
        }
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

fn page_params(mut params: Vec<Value>, limit: usize, offset: usize) -> Vec<Value> {
    params.push(Value::Integer(sql_int(limit)));
    params.push(Value::Integer(sql_int(offset)));
    params
}

impl Database {
    fn index_result_sync(&self, result: &HostResult) -> Result<(), ScopeError> {
        let ip = result.ip.trim().parse::<IpAddr>()
            .map_err(|_| ScopeError::Validation(format!("Invalid ip '{}'", result.ip)))?
            .to_canonical()
            .to_string();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists: Option<String> = tx.query_row(
            "SELECT scan_id FROM host_results WHERE scan_id = ?1",
            rusqlite::params![result.scan_id],
            |row| row.get(0),
        ).optional()?;
        if exists.is_some() {
            return Err(ScopeError::Conflict(format!("Scan {} is already indexed", result.scan_id)));
        }

        let port_count = if result.ports.is_empty() { result.port_count } else { result.ports.len() };
        tx.execute(
            "INSERT INTO host_results (scan_id, ip, hostname, ctime, agent_version, port_count, ports_json, nmap_data, xml_data, gnmap_data) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                result.scan_id,
                ip,
                result.hostname,
                fmt_ts(result.ctime),
                result.agent_version,
                port_count as i64,
                serde_json::to_string(&result.ports)?,
                result.nmap_data,
                result.xml_data,
                result.gnmap_data,
            ],
        )?;

        for shot in &result.screenshots {
            tx.execute(
                "INSERT INTO screenshots (scan_id, target, service, port, path, thumb_path, ctime) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    result.scan_id,
                    ip,
                    shot.service,
                    i64::from(shot.port),
                    shot.path,
                    shot.thumb_path,
                    fmt_ts(shot.ctime),
                ],
            )?;
        }

        tx.commit()?;
        debug!(scan_id = %result.scan_id, ip = %ip, screenshots = result.screenshots.len(), "Indexed host result");
        Ok(())
    }
}

#[async_trait]
impl ResultIndex for Database {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        index: SearchIndex,
    ) -> Result<(u64, Vec<HostResult>), ScopeError> {
        let parsed = SearchQuery::parse(query);
        let (filter, params) = where_clause(&parsed, index);
        let conn = self.lock()?;

        let total = count(
            &conn,
            &format!("SELECT COUNT(*) FROM host_results h {}", filter),
            params.clone(),
        )?;
        if total == 0 {
            return Ok((0, Vec::new()));
        }

        let hits = query_results(
            &conn,
            &format!(
                "SELECT {} FROM host_results h {} ORDER BY h.ctime DESC, h.scan_id DESC LIMIT ? OFFSET ?",
                RESULT_COLUMNS, filter
            ),
            page_params(params, limit, offset),
        )?;
        Ok((total, hits))
    }

    async fn get_by_scan_id(&self, scan_id: &str) -> Result<Option<HostResult>, ScopeError> {
        let conn = self.lock()?;
        let mut hits = query_results(
            &conn,
            &format!("SELECT {} FROM host_results h WHERE h.scan_id = ?", RESULT_COLUMNS),
            vec![Value::Text(scan_id.to_string())],
        )?;
        Ok(hits.pop())
    }

    async fn get_latest(&self, ip: &str) -> Result<Option<HostResult>, ScopeError> {
        let conn = self.lock()?;
        let mut hits = query_results(
            &conn,
            &format!(
                "SELECT {} FROM host_results h WHERE h.ip = ? ORDER BY h.ctime DESC, h.scan_id DESC LIMIT 1",
                RESULT_COLUMNS
            ),
            vec![Value::Text(canonical_ip(ip))],
        )?;
        Ok(hits.pop())
    }

    async fn get_history(
        &self,
        ip: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, Vec<HostResult>), ScopeError> {
        let conn = self.lock()?;
        let params = vec![Value::Text(canonical_ip(ip))];
        let total = count(&conn, "SELECT COUNT(*) FROM host_results WHERE ip = ?", params.clone())?;
        if total == 0 {
            return Ok((0, Vec::new()));
        }
        let hits = query_results(
            &conn,
            &format!(
                "SELECT {} FROM host_results h WHERE h.ip = ? ORDER BY h.ctime DESC, h.scan_id DESC LIMIT ? OFFSET ?",
                RESULT_COLUMNS
            ),
            page_params(params, limit, offset),
        )?;
        Ok((total, hits))
    }

    async fn get_screenshots(
        &self,
        ip: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, Vec<ScreenshotRef>), ScopeError> {
        let ip = canonical_ip(ip);
        let conn = self.lock()?;
        let total = count(
            &conn,
            "SELECT COUNT(*) FROM screenshots WHERE target = ?",
            vec![Value::Text(ip.clone())],
        )?;
        if total == 0 {
            return Ok((0, Vec::new()));
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM screenshots WHERE target = ?1 ORDER BY ctime DESC, id DESC LIMIT ?2 OFFSET ?3",
            ScreenshotRow::COLUMNS
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![ip, sql_int(limit), sql_int(offset)],
            ScreenshotRow::from_row,
        )?;
        let mut shots = Vec::new();
        for row in rows {
            shots.push(row?.into_ref()?);
        }
        Ok((total, shots))
    }

    async fn get_current_screenshots(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, u64, Vec<HostScreenshots>), ScopeError> {
        let conn = self.lock()?;
        let with_shots = format!(
            "{} AND EXISTS (SELECT 1 FROM screenshots s WHERE s.scan_id = h.scan_id)",
            LATEST_ONLY
        );

        let total_hosts = count(
            &conn,
            &format!("SELECT COUNT(*) FROM host_results h WHERE {}", with_shots),
            Vec::new(),
        )?;
        if total_hosts == 0 {
            return Ok((0, 0, Vec::new()));
        }
        let total_screenshots = count(
            &conn,
            &format!(
                "SELECT COUNT(*) FROM screenshots s JOIN host_results h ON h.scan_id = s.scan_id WHERE {}",
                LATEST_ONLY
            ),
            Vec::new(),
        )?;

        let hosts = query_results(
            &conn,
            &format!(
                "SELECT {} FROM host_results h WHERE {} ORDER BY h.ctime DESC, h.scan_id DESC LIMIT ? OFFSET ?",
                RESULT_COLUMNS, with_shots
            ),
            page_params(Vec::new(), limit, offset),
        )?;

        let grouped = hosts.into_iter()
            .map(|h| HostScreenshots {
                ip: h.ip,
                scan_id: h.scan_id,
                ctime: h.ctime,
                screenshots: h.screenshots,
            })
            .collect();
        Ok((total_hosts, total_screenshots, grouped))
    }

    async fn total_hosts(&self) -> Result<u64, ScopeError> {
        let conn = self.lock()?;
        count(&conn, "SELECT COUNT(DISTINCT ip) FROM host_results", Vec::new())
    }

    async fn random_host(&self) -> Result<Option<HostResult>, ScopeError> {
        let conn = self.lock()?;
        let ip: Option<String> = conn.query_row(
            "SELECT ip FROM (SELECT DISTINCT ip FROM host_results) ORDER BY RANDOM() LIMIT 1",
            [],
            |row| row.get(0),
        ).optional()?;

        match ip {
            Some(ip) => {
                let mut hits = query_results(
                    &conn,
                    &format!(
                        "SELECT {} FROM host_results h WHERE h.ip = ? ORDER BY h.ctime DESC, h.scan_id DESC LIMIT 1",
                        RESULT_COLUMNS
                    ),
                    vec![Value::Text(ip)],
                )?;
                Ok(hits.pop())
            }
            None => Ok(None),
        }
    }

    async fn index_result(&self, result: &HostResult) -> Result<(), ScopeError> {
        self.index_result_sync(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn make_result(ip: &str, scan_id: &str, minutes_ago: i64, ports: &[u16]) -> HostResult {
        HostResult {
            scan_id: scan_id.to_string(),
            ip: ip.to_string(),
            hostname: Some(format!("host-{}.example.org", ip.replace('.', "-"))),
            ctime: Utc::now() - Duration::minutes(minutes_ago),
            agent_version: Some("0.6.12".to_string()),
            port_count: 0,
            ports: ports.iter().map(|p| PortInfo {
                port: *p,
                protocol: "tcp".to_string(),
                service: Some(if *p == 22 { "ssh" } else { "http" }.to_string()),
                product: if *p == 22 { Some("OpenSSH".to_string()) } else { None },
                banner: None,
            }).collect(),
            nmap_data: Some(format!("Nmap scan report for {}\n{}", ip,
                ports.iter().map(|p| format!("{}/tcp open", p)).collect::<Vec<_>>().join("\n"))),
            xml_data: Some("<nmaprun/>".to_string()),
            gnmap_data: None,
            screenshots: Vec::new(),
        }
    }

    fn with_screenshot(mut result: HostResult, service: &str, port: u16) -> HostResult {
        result.screenshots.push(ScreenshotRef {
            scan_id: result.scan_id.clone(),
            target: result.ip.clone(),
            service: service.to_string(),
            port,
            path: format!("original/{}-{}.png", result.scan_id, port),
            thumb_path: Some(format!("thumbs/{}-{}.png", result.scan_id, port)),
            ctime: result.ctime,
        });
        result
    }

    async fn seeded() -> Database {
        let db = Database::in_memory().unwrap();
        db.index_result(&make_result("10.0.0.5", "a-old", 60, &[22])).await.unwrap();
        db.index_result(&with_screenshot(make_result("10.0.0.5", "a-new", 5, &[22, 80]), "HTTP", 80)).await.unwrap();
        db.index_result(&make_result("10.0.0.6", "b-only", 30, &[443])).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_index_and_get_by_scan_id() {
        let db = seeded().await;
        let hit = db.get_by_scan_id("a-new").await.unwrap().unwrap();
        assert_eq!(hit.ip, "10.0.0.5");
        assert_eq!(hit.port_count, 2);
        assert_eq!(hit.ports[0].product.as_deref(), Some("OpenSSH"));
        assert_eq!(hit.screenshots.len(), 1);
        assert_eq!(hit.screenshots[0].service, "HTTP");
        assert!(db.get_by_scan_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_results_are_immutable() {
        let db = seeded().await;
        let err = db.index_result(&make_result("10.0.0.9", "a-new", 0, &[])).await.unwrap_err();
        assert!(matches!(err, ScopeError::Conflict(_)));
        assert_eq!(db.get_by_scan_id("a-new").await.unwrap().unwrap().ip, "10.0.0.5");
    }

    #[tokio::test]
    async fn test_ipv6_results_are_keyed_canonically() {
        let db = Database::in_memory().unwrap();
        db.index_result(&with_screenshot(make_result("FD00:0:0::1", "v6", 5, &[80]), "HTTP", 80)).await.unwrap();
        db.index_result(&make_result("::ffff:10.0.0.7", "mapped", 5, &[22])).await.unwrap();

        assert_eq!(db.get_latest("fd00::1").await.unwrap().unwrap().scan_id, "v6");
        assert_eq!(db.get_latest("FD00::0001").await.unwrap().unwrap().ip, "fd00::1");
        assert_eq!(db.get_history("fd00::1", 10, 0).await.unwrap().0, 1);
        assert_eq!(db.get_screenshots("fd00::1", 10, 0).await.unwrap().0, 1);
        assert_eq!(db.get_latest("10.0.0.7").await.unwrap().unwrap().scan_id, "mapped");

        let (total, _) = db.search("ip:FD00::1", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 1);

        let err = db.index_result(&make_result("not-an-ip", "bad", 0, &[])).await.unwrap_err();
        assert!(matches!(err, ScopeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_huge_offsets_return_empty_pages() {
        let db = seeded().await;
        let (total, hits) = db.search("", 10, usize::MAX, SearchIndex::History).await.unwrap();
        assert_eq!(total, 3);
        assert!(hits.is_empty());
        let (total, hits) = db.get_history("10.0.0.5", usize::MAX, usize::MAX).await.unwrap();
        assert_eq!(total, 2);
        assert!(hits.is_empty());
        let (_, shots) = db.get_screenshots("10.0.0.5", 10, usize::MAX).await.unwrap();
        assert!(shots.is_empty());
    }

    #[tokio::test]
    async fn test_search_latest_vs_history() {
        let db = seeded().await;

        let (total, hits) = db.search("", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(hits[0].scan_id, "a-new");
        assert_eq!(hits[1].scan_id, "b-only");

        let (total, hits) = db.search("", 10, 0, SearchIndex::History).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_search_total_is_not_page_size() {
        let db = seeded().await;
        let (total, hits) = db.search("", 1, 0, SearchIndex::History).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(hits.len(), 1);

        let (total, hits) = db.search("", 2, 2, SearchIndex::History).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_search_field_terms() {
        let db = seeded().await;

        let (total, hits) = db.search("port:443", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(hits[0].ip, "10.0.0.6");

        // Old result had port 22 only; latest for .5 also has 22
        let (total, _) = db.search("port:22", 10, 0, SearchIndex::History).await.unwrap();
        assert_eq!(total, 2);

        let (total, hits) = db.search("ip:10.0.0.5", 10, 0, SearchIndex::History).await.unwrap();
        assert_eq!(total, 2);
        assert!(hits.iter().all(|h| h.ip == "10.0.0.5"));

        let (total, _) = db.search("hostname:HOST-10-0-0-6.example.org", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_search_text_terms_are_anded() {
        let db = seeded().await;
        let (total, _) = db.search("nmap 80/tcp", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 1);
        let (total, _) = db.search("80/tcp 443/tcp", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty_not_error() {
        let db = seeded().await;
        let (total, hits) = db.search("port:notaport", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 0);
        assert!(hits.is_empty());
        let (total, hits) = db.search("100%_match", 10, 0, SearchIndex::Latest).await.unwrap();
        assert_eq!(total, 0);
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_get_latest_and_history() {
        let db = seeded().await;
        assert_eq!(db.get_latest("10.0.0.5").await.unwrap().unwrap().scan_id, "a-new");
        assert!(db.get_latest("10.9.9.9").await.unwrap().is_none());

        let (count, hits) = db.get_history("10.0.0.5", 1, 1).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].scan_id, "a-old");

        let (count, hits) = db.get_history("10.9.9.9", 10, 0).await.unwrap();
        assert_eq!(count, 0);
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_get_screenshots() {
        let db = seeded().await;
        let (count, shots) = db.get_screenshots("10.0.0.5", 10, 0).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(shots[0].port, 80);
        assert_eq!(shots[0].scan_id, "a-new");

        let (count, shots) = db.get_screenshots("10.0.0.6", 10, 0).await.unwrap();
        assert_eq!(count, 0);
        assert!(shots.is_empty());
    }

    #[tokio::test]
    async fn test_get_current_screenshots() {
        let db = seeded().await;
        db.index_result(&with_screenshot(
            with_screenshot(make_result("10.0.0.7", "c-1", 1, &[80, 5900]), "HTTP", 80),
            "VNC",
            5900,
        )).await.unwrap();

        let (hosts, shots, page) = db.get_current_screenshots(10, 0).await.unwrap();
        assert_eq!(hosts, 2);
        assert_eq!(shots, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].ip, "10.0.0.7");
        assert_eq!(page[0].screenshots.len(), 2);

        let (hosts, _, page) = db.get_current_screenshots(1, 1).await.unwrap();
        assert_eq!(hosts, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].ip, "10.0.0.5");
    }

    #[tokio::test]
    async fn test_total_hosts_and_random_host() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.total_hosts().await.unwrap(), 0);
        assert!(db.random_host().await.unwrap().is_none());

        let db = seeded().await;
        assert_eq!(db.total_hosts().await.unwrap(), 2);
        let host = db.random_host().await.unwrap().unwrap();
        assert!(host.scan_id == "a-new" || host.scan_id == "b-only");
    }
}
