//! Pattern library: the fixed, hand-curated tables every detector reads.
//!
//! Nothing here is mutated at runtime. Keyword and phrase tables are matched
//! as lower-case substrings; system error codes are matched upper-case.
//! Table order is match priority wherever a table maps to a severity.

use crate::model::Severity;
use Severity::*;

// ─────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────

/// Exact status codes with a known severity. Anything else uses
/// [`http_range_severity`].
pub const HTTP_STATUS_SEVERITY: &[(u16, Severity)] = &[
    (200, Success),
    (201, Success),
    (202, Success),
    (204, Success),
    (301, Info),
    (302, Info),
    (304, Info),
    (400, Warning),
    (401, Error),
    (403, Error),
    (404, Warning),
    (408, Warning),
    (409, Warning),
    (429, Warning),
    (500, Error),
    (501, Error),
    (502, Error),
    (503, Critical),
    (504, Critical),
    (507, Critical),
    (511, Error),
];

pub fn http_range_severity(code: u16) -> Severity {
    match code {
        200..=299 => Success,
        300..=399 => Info,
        400..=499 => Warning,
        500.. => Error,
        _ => Info,
    }
}

// ─────────────────────────────────────────────────────────
// Keyword families
// ─────────────────────────────────────────────────────────

pub const ERROR_KEYWORDS: &[&str] = &[
    "error",
    "failed",
    "failure",
    "exception",
    "crash",
    "fatal",
    "critical",
    "panic",
    "segfault",
    "segmentation fault",
    "oom-kill",
    "oomkill",
    "oom:",
    "out of memory",
    "abort",
    "refused",
    "unreachable",
    "corrupt",
    "broken",
    "unhandled",
    "uncaught",
    "cannot",
    "unable to",
    "could not",
    "couldn't",
    "not responding",
    "stack overflow",
    "rejected",
];

pub const WARNING_KEYWORDS: &[&str] = &[
    "warning",
    "warn",
    "slow",
    "timeout",
    "timed out",
    "deprecated",
    "deprecation",
    "retry",
    "retrying",
    "degraded",
    "high latency",
    "throttl",
    "rate limit",
    "backoff",
    "fallback",
    "insufficient",
    "low disk",
    "nearly full",
    "unstable",
    "caution",
    "skipped",
    "missing",
];

pub const SUCCESS_KEYWORDS: &[&str] = &[
    "success",
    "succeeded",
    "completed",
    "complete",
    "finished",
    "processed",
    "approved",
    "validated",
    "verified",
    "confirmed",
    "healthy",
    "passed",
    "accepted",
    "delivered",
    "created",
    "saved",
    "uploaded",
    "deployed",
    "started",
    "connected",
    "established",
    "resolved",
    "restored",
    "synced",
    "registered",
    "activated",
    "online",
];

pub const DEBUG_KEYWORDS: &[&str] = &[
    "debug",
    "trace",
    "verbose",
    "entering",
    "exiting",
    "dump",
    "inspect",
    "breakpoint",
    "variable",
    "checkpoint",
    "diagnostic",
];

// ─────────────────────────────────────────────────────────
// Structured phrase → severity maps
// ─────────────────────────────────────────────────────────

/// POSIX / network error codes, most severe first. Matched upper-case.
pub const SYSTEM_ERROR_CODES: &[(&str, Severity)] = &[
    ("ENOMEM", Critical),
    ("ENOSPC", Critical),
    ("EDQUOT", Critical),
    ("EMFILE", Critical),
    ("ENFILE", Critical),
    ("EIO", Critical),
    ("ECONNREFUSED", Error),
    ("ETIMEDOUT", Error),
    ("ECONNRESET", Error),
    ("ECONNABORTED", Error),
    ("EHOSTUNREACH", Error),
    ("ENETUNREACH", Error),
    ("EADDRINUSE", Error),
    ("EPIPE", Error),
    ("EACCES", Error),
    ("EPERM", Error),
    ("ENOENT", Warning),
    ("ENOTFOUND", Warning),
    ("EEXIST", Warning),
    ("EAGAIN", Warning),
    ("EBUSY", Warning),
];

pub const DATABASE_PHRASES: &[(&str, Severity)] = &[
    ("deadlock", Critical),
    ("connection pool exhausted", Critical),
    ("pool exhausted", Critical),
    ("too many connections", Critical),
    ("database corrupt", Critical),
    ("data corruption", Critical),
    ("constraint violation", Error),
    ("foreign key violation", Error),
    ("foreign key constraint", Error),
    ("not null constraint", Error),
    ("check constraint", Error),
    ("integrity error", Error),
    ("duplicate key", Warning),
    ("duplicate entry", Warning),
    ("table locked", Warning),
    ("table is locked", Warning),
    ("database is locked", Warning),
    ("lock wait timeout", Warning),
    ("slow query", Warning),
];

/// Presence of any of these is treated as critical.
pub const SECURITY_PHRASES: &[&str] = &[
    "unauthorized",
    "unauthorised",
    "forbidden",
    "sql injection",
    "injection attempt",
    "xss",
    "cross-site scripting",
    "csrf",
    "breach",
    "exploit",
    "brute force",
    "brute-force",
    "malware",
    "ransomware",
    "intrusion",
    "privilege escalation",
    "suspicious activity",
    "suspicious login",
    "access denied",
    "authentication failed",
    "invalid token",
    "token tampering",
    "credential stuffing",
    "security violation",
    "ddos",
];

pub const BUSINESS_PHRASES: &[(&str, Severity)] = &[
    ("payment failed", Error),
    ("payment declined", Error),
    ("payment rejected", Error),
    ("card declined", Error),
    ("insufficient funds", Warning),
    ("payment successful", Success),
    ("payment succeeded", Success),
    ("payment completed", Success),
    ("payment processed", Success),
    ("payment received", Success),
    ("refund issued", Info),
    ("refund processed", Info),
    ("order failed", Error),
    ("order cancelled", Warning),
    ("order canceled", Warning),
    ("order placed", Success),
    ("order confirmed", Success),
    ("order shipped", Success),
    ("order delivered", Success),
    ("checkout failed", Error),
    ("checkout completed", Success),
    ("cart abandoned", Info),
    ("subscription failed", Error),
    ("subscription expired", Warning),
    ("subscription cancelled", Warning),
    ("subscription renewed", Success),
    ("subscription created", Success),
    ("login failed", Warning),
    ("login successful", Success),
    ("login succeeded", Success),
    ("account locked", Error),
    ("account suspended", Warning),
    ("password reset", Info),
    ("user registered", Success),
];

// ─────────────────────────────────────────────────────────
// Stack traces
// ─────────────────────────────────────────────────────────

pub const STACK_TRACE_INDICATORS: &[&str] = &[
    "traceback",
    "panic:",
    "panicked at",
    "goroutine ",
    "caused by:",
    "exception in thread",
    "stack trace:",
    "stacktrace",
    "backtrace:",
    "--- end of stack trace",
    "\tat ",
    "\\tat ",
    "    at ",
    "at java.",
    "at org.",
    "at com.",
    "at node:internal",
    "at object.<anonymous>",
];

/// `File.java:42`, `app.py", line 3`, `server.go:17` ...
pub const FILE_LINE_PATTERN: &str =
    r#"[\w/-]\.(java|py|js|mjs|ts|go|rb|rs|cs|php|kt|scala)(?::\d+|\\?", line \d+)"#;

/// File extension → language-tagged source name.
pub const STACK_TRACE_LANGUAGES: &[(&str, &str)] = &[
    ("java", "java-app"),
    ("kt", "java-app"),
    ("scala", "java-app"),
    ("py", "python-app"),
    ("js", "node-app"),
    ("mjs", "node-app"),
    ("ts", "node-app"),
    ("go", "go-app"),
    ("rs", "rust-app"),
    ("rb", "ruby-app"),
    ("cs", "dotnet-app"),
    ("php", "php-app"),
];

// ─────────────────────────────────────────────────────────
// Performance / resources
// ─────────────────────────────────────────────────────────

/// `(exclusive upper bound in ms, severity)`; beyond the last bound is critical.
pub const DURATION_BUCKETS: &[(f64, Severity)] = &[
    (100.0, Success),
    (1000.0, Info),
    (3000.0, Warning),
    (5000.0, Error),
];

pub fn duration_severity(duration_ms: f64) -> Severity {
    DURATION_BUCKETS
        .iter()
        .find(|(bound, _)| duration_ms < *bound)
        .map(|(_, severity)| *severity)
        .unwrap_or(Critical)
}

pub const RESOURCE_CONTEXTS: &[&str] = &["cpu", "memory", "disk"];
pub const RESOURCE_CRITICAL_PERCENT: u32 = 90;
pub const RESOURCE_WARNING_PERCENT: u32 = 75;

// ─────────────────────────────────────────────────────────
// Source & category
// ─────────────────────────────────────────────────────────

/// Body keys naming the emitting service, in lookup order.
pub const SOURCE_FIELDS: &[&str] = &["service", "source", "component", "app", "module", "origin"];

/// Body keys that carry an explicit level/type.
pub const TYPE_FIELDS: &[&str] = &["type", "level", "severity"];

pub struct SourceFamily {
    /// Word-start alternatives, any of which selects the family
    pub keywords: &'static [&'static str],
    /// When non-empty, one of these must also be present
    pub requires: &'static [&'static str],
    pub service: &'static str,
}

pub const SOURCE_FAMILIES: &[SourceFamily] = &[
    SourceFamily {
        keywords: &["database", "db ", "sql", "query", "postgres", "mysql", "mongo", "redis", "sqlite", "mariadb"],
        requires: &[],
        service: "database-service",
    },
    SourceFamily {
        keywords: &["login", "logout", "auth", "token", "session", "password", "oauth", "jwt", "sso"],
        requires: &[],
        service: "auth-service",
    },
    SourceFamily {
        keywords: &["payment", "stripe", "paypal", "billing", "invoice", "charge"],
        requires: &[],
        service: "payment-service",
    },
    SourceFamily {
        keywords: &["email", "smtp", "notification", "mailer", "sendgrid", "sms"],
        requires: &[],
        service: "notification-service",
    },
    SourceFamily {
        keywords: &["api gateway", "gateway", "endpoint", "route"],
        requires: &[],
        service: "api-gateway",
    },
    SourceFamily {
        keywords: &["user"],
        requires: &["profile", "register", "registration", "account", "signup"],
        service: "user-service",
    },
    SourceFamily {
        keywords: &["order", "cart", "checkout", "inventory"],
        requires: &[],
        service: "order-service",
    },
    SourceFamily {
        keywords: &["file", "upload", "download", "s3", "storage", "bucket"],
        requires: &[],
        service: "storage-service",
    },
    SourceFamily {
        keywords: &["search", "elasticsearch", "solr", "opensearch"],
        requires: &[],
        service: "search-service",
    },
    SourceFamily {
        keywords: &["health", "monitor", "metrics", "heartbeat"],
        requires: &[],
        service: "monitoring-service",
    },
    SourceFamily {
        keywords: &["load balancer", "nginx", "haproxy", "traefik"],
        requires: &[],
        service: "load-balancer",
    },
    SourceFamily {
        keywords: &["cache", "memcached"],
        requires: &[],
        service: "cache-service",
    },
    SourceFamily {
        keywords: &["config", "settings"],
        requires: &[],
        service: "config-service",
    },
    SourceFamily {
        keywords: &["backup", "snapshot", "restore"],
        requires: &[],
        service: "backup-service",
    },
    SourceFamily {
        keywords: &["report", "analytics", "dashboard"],
        requires: &[],
        service: "analytics-service",
    },
    SourceFamily {
        keywords: &["deploy", "build", "pipeline", "docker", "kubernetes", "k8s", "helm"],
        requires: &[],
        service: "deployment-service",
    },
    SourceFamily {
        keywords: &["cdn", "cloudflare", "cloudfront", "akamai", "fastly"],
        requires: &[],
        service: "cdn-service",
    },
];

/// Vendor refinement applied when the database family matched.
pub const DATABASE_VENDORS: &[(&str, &str)] = &[
    ("postgres", "postgresql-db"),
    ("mysql", "mysql-db"),
    ("mariadb", "mysql-db"),
    ("mongo", "mongodb"),
    ("redis", "redis-cache"),
    ("sqlite", "sqlite-db"),
];

pub const BUSINESS_CATEGORY_TERMS: &[&str] = &["payment", "invoice", "subscription"];

pub const CATEGORY_STOPWORDS: &[&str] = &["the", "and", "for", "with", "from", "into"];
