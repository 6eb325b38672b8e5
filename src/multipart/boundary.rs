//! Boundary token generation for multipart bodies

use uuid::Uuid;

/// Source of boundary tokens, injected so tests can pin the framing
pub trait BoundarySource: Send + Sync {
    fn boundary(&self) -> String;
}

/// Random, collision-improbable boundaries
#[derive(Debug, Clone)]
pub struct RandomBoundary {
    prefix: String,
}

impl RandomBoundary {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for RandomBoundary {
    fn default() -> Self {
        Self::new("-----StorageStagingBoundary")
    }
}

impl BoundarySource for RandomBoundary {
    fn boundary(&self) -> String {
        format!("{}{}", self.prefix, Uuid::new_v4().simple())
    }
}

/// Always hands out the same boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBoundary(pub String);

impl BoundarySource for FixedBoundary {
    fn boundary(&self) -> String {
        self.0.clone()
    }
}
