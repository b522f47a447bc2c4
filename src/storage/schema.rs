//! Database schema definitions for ScoutBadge.
//!
//! Composite `UNIQUE` keys back the at-most-one invariants: one progress row
//! per (member, requirement), one rollup row and one award per (member, badge),
//! one stock row per badge.

/// SQL schema for creating all version 1 tables.
pub const SCHEMA: &str = r#"
-- Members table
CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    section_id TEXT NOT NULL,
    date_of_birth TEXT,
    total_nights_away INTEGER NOT NULL DEFAULT 0,
    total_hikes_away INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_members_section ON members(section_id, active);

-- Leader accounts table
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member',
    created_at TEXT NOT NULL
);

-- Badge definitions table
CREATE TABLE IF NOT EXISTS badges (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    section TEXT NOT NULL,
    category TEXT NOT NULL,
    completion_rule TEXT NOT NULL DEFAULT 'all_modules',
    badge_family_id TEXT,
    stage_number INTEGER,
    is_chief_scout_award INTEGER NOT NULL DEFAULT 0,
    image_url TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    UNIQUE(badge_family_id, stage_number)
);

CREATE INDEX IF NOT EXISTS idx_badges_section ON badges(section);

-- Badge modules table
CREATE TABLE IF NOT EXISTS badge_modules (
    id TEXT PRIMARY KEY,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    completion_rule TEXT NOT NULL DEFAULT 'all_required',
    required_count INTEGER,
    display_order INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_badge_modules_badge ON badge_modules(badge_id);

-- Badge requirements table
CREATE TABLE IF NOT EXISTS badge_requirements (
    id TEXT PRIMARY KEY,
    module_id TEXT NOT NULL REFERENCES badge_modules(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    required_completions INTEGER NOT NULL DEFAULT 1 CHECK (required_completions >= 1),
    display_order INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_badge_requirements_module ON badge_requirements(module_id);
CREATE INDEX IF NOT EXISTS idx_badge_requirements_badge ON badge_requirements(badge_id);

-- Per-requirement progress table
CREATE TABLE IF NOT EXISTS member_requirement_progress (
    id TEXT PRIMARY KEY,
    member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    requirement_id TEXT NOT NULL REFERENCES badge_requirements(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    completion_count INTEGER NOT NULL CHECK (completion_count > 0),
    completed INTEGER NOT NULL DEFAULT 0,
    completed_date TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(member_id, requirement_id)
);

CREATE INDEX IF NOT EXISTS idx_requirement_progress_member_badge
    ON member_requirement_progress(member_id, badge_id);

-- Per-badge progress rollup table (derived cache)
CREATE TABLE IF NOT EXISTS member_badge_progress (
    id TEXT PRIMARY KEY,
    member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    completion_date TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(member_id, badge_id)
);

-- Badge awards table
CREATE TABLE IF NOT EXISTS member_badge_awards (
    id TEXT PRIMARY KEY,
    member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    award_status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    awarded_date TEXT,
    awarded_by TEXT,
    UNIQUE(member_id, badge_id)
);

CREATE INDEX IF NOT EXISTS idx_badge_awards_status ON member_badge_awards(award_status, badge_id);

-- Badge stock table
CREATE TABLE IF NOT EXISTS badge_stock (
    badge_id TEXT PRIMARY KEY REFERENCES badges(id) ON DELETE CASCADE,
    current_stock INTEGER NOT NULL DEFAULT 0,
    minimum_threshold INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Stock adjustment audit log
CREATE TABLE IF NOT EXISTS stock_adjustments (
    id TEXT PRIMARY KEY,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    delta INTEGER NOT NULL,
    reason TEXT NOT NULL,
    actor TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stock_adjustments_badge ON stock_adjustments(badge_id, created_at);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for migration from v1 to v2 (term programme tables)
pub const MIGRATION_V1_TO_V2: &str = r#"
-- Terms table
CREATE TABLE IF NOT EXISTS terms (
    id TEXT PRIMARY KEY,
    section TEXT NOT NULL,
    title TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    CHECK (end_date >= start_date)
);

CREATE INDEX IF NOT EXISTS idx_terms_section_dates ON terms(section, start_date, end_date);

-- Badges scheduled in a term's programme
CREATE TABLE IF NOT EXISTS term_badges (
    term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    badge_id TEXT NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
    PRIMARY KEY (term_id, badge_id)
);
"#;
