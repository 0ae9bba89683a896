use serde::{Deserialize, Serialize};

/// Closed enumeration of memory kinds. Extensible in principle, but callers
/// should prefer one of these over inventing a new free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Preference,
    Fact,
    Commitment,
    Relationship,
    Event,
    Skill,
    Constraint,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preference => write!(f, "preference"),
            Self::Fact => write!(f, "fact"),
            Self::Commitment => write!(f, "commitment"),
            Self::Relationship => write!(f, "relationship"),
            Self::Event => write!(f, "event"),
            Self::Skill => write!(f, "skill"),
            Self::Constraint => write!(f, "constraint"),
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preference" => Ok(Self::Preference),
            "fact" => Ok(Self::Fact),
            "commitment" => Ok(Self::Commitment),
            "relationship" => Ok(Self::Relationship),
            "event" => Ok(Self::Event),
            "skill" => Ok(Self::Skill),
            "constraint" => Ok(Self::Constraint),
            other => Err(format!("unknown memory type: {other}")),
        }
    }
}

/// The four actions a distillation delta may apply to a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Update,
    Keep,
    Expire,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Update => write!(f, "update"),
            Self::Keep => write!(f, "keep"),
            Self::Expire => write!(f, "expire"),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "keep" => Ok(Self::Keep),
            "expire" => Ok(Self::Expire),
            other => Err(format!("unknown distill action: {other}")),
        }
    }
}

/// Role of a logged turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The central persisted entity. See store invariants for the uniqueness and
/// ordering guarantees that hold across its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub mem_type: MemoryType,
    pub category: String,
    pub key: String,
    pub value: String,
    pub source_turn: i64,
    pub last_used_turn: i64,
    pub confidence: f64,
    pub created_at: f64,
    pub updated_at: f64,
    pub is_active: bool,
}

impl Memory {
    pub fn default_confidence() -> f64 {
        0.9
    }
}

/// Immutable append-only conversation log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: f64,
    pub memories_retrieved: Vec<String>,
}

/// Flat key -> value projection of high-confidence preference memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub key: String,
    pub value: String,
    pub updated_at: f64,
    pub source_turn: i64,
}

/// Transient: one entry of a distillation delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistilledMemory {
    pub action: Action,
    /// Target id for update/keep/expire. Unused for add.
    pub id: Option<String>,
    pub mem_type: Option<MemoryType>,
    pub category: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub confidence: Option<f64>,
    pub source_turn: Option<i64>,
}

/// Transient: a retrieval hit, with enough provenance to explain the ranking.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub memory: Memory,
    pub score: f64,
    pub vector_rank: Option<usize>,
    pub fts_rank: Option<usize>,
}
