/// `ats.candidates` schema. The fingerprint column is written only through
/// the explicit update path (per-write recompute or backfill); nothing at the
/// storage layer recomputes it.
pub const CANDIDATES_DDL: &str = r#"
CREATE TABLE ats.candidates (
    id BIGSERIAL PRIMARY KEY,
    tenant_id BIGINT NOT NULL,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    phone VARCHAR(50),
    fingerprint VARCHAR(64),
    status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_candidate_status CHECK (status IN ('ACTIVE', 'HIRED', 'LEFT', 'BLACKLISTED'))
);

CREATE INDEX idx_candidates_tenant_fingerprint ON ats.candidates(tenant_id, fingerprint) WHERE fingerprint IS NOT NULL;
CREATE INDEX idx_candidates_tenant_id ON ats.candidates(tenant_id, id);
CREATE INDEX idx_candidates_tenant_status ON ats.candidates(tenant_id, status);
"#;

/// `ats.applications` schema. The flag columns are written by the creating
/// workflow from a detection decision and by operator tooling, never by the
/// detection service.
pub const APPLICATIONS_DDL: &str = r#"
CREATE TABLE ats.applications (
    id BIGSERIAL PRIMARY KEY,
    tenant_id BIGINT NOT NULL,
    candidate_id BIGINT NOT NULL REFERENCES ats.candidates(id),

    flagged_for_review BOOLEAN NOT NULL DEFAULT false,
    flag_reason TEXT,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_applications_tenant_candidate ON ats.applications(tenant_id, candidate_id);
CREATE INDEX idx_applications_flagged ON ats.applications(tenant_id) WHERE flagged_for_review;
"#;
