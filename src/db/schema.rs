pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS rescan_tasks (
    id TEXT PRIMARY KEY,
    target TEXT NOT NULL,
    requester_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'dispatched', 'completed', 'failed')),
    created_at TEXT NOT NULL,
    queued_at TEXT NOT NULL,
    queue_seq INTEGER NOT NULL,
    dispatched_at TEXT,
    completed_at TEXT,
    result_ref TEXT,
    failure_reason TEXT
);

-- At most one active task per target
CREATE UNIQUE INDEX IF NOT EXISTS idx_rescan_tasks_active_target
    ON rescan_tasks(target) WHERE status IN ('pending', 'dispatched');
CREATE INDEX IF NOT EXISTS idx_rescan_tasks_status ON rescan_tasks(status, queue_seq);
CREATE INDEX IF NOT EXISTS idx_rescan_tasks_target ON rescan_tasks(target, created_at);

CREATE TABLE IF NOT EXISTS host_results (
    scan_id TEXT PRIMARY KEY,
    ip TEXT NOT NULL,
    hostname TEXT,
    ctime TEXT NOT NULL,
    agent_version TEXT,
    port_count INTEGER NOT NULL DEFAULT 0,
    ports_json TEXT NOT NULL DEFAULT '[]',
    nmap_data TEXT,
    xml_data TEXT,
    gnmap_data TEXT
);

CREATE INDEX IF NOT EXISTS idx_host_results_ip ON host_results(ip, ctime);

CREATE TABLE IF NOT EXISTS screenshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id TEXT NOT NULL REFERENCES host_results(scan_id) ON DELETE CASCADE,
    target TEXT NOT NULL,
    service TEXT NOT NULL,
    port INTEGER NOT NULL,
    path TEXT NOT NULL,
    thumb_path TEXT,
    ctime TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_screenshots_target ON screenshots(target, ctime);
CREATE INDEX IF NOT EXISTS idx_screenshots_scan ON screenshots(scan_id);
";
