use std::collections::HashSet;

use crate::error::{Location, ResolveError};
use crate::registry::ResolutionKey;

/// Nesting limit for resolutions in progress.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Resolutions currently on the stack, threaded through the resolver.
#[derive(Debug)]
pub struct RecursionGuard {
    in_progress: HashSet<ResolutionKey>,
    depth: usize,
    limit: usize,
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::with_limit(DEFAULT_DEPTH_LIMIT)
    }
}

impl RecursionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            in_progress: HashSet::new(),
            depth: 0,
            limit,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_in_progress(&self, key: &ResolutionKey) -> bool {
        self.in_progress.contains(key)
    }

    pub fn enter(&mut self, key: ResolutionKey, location: &Location) -> Result<(), ResolveError> {
        if self.depth >= self.limit {
            return Err(ResolveError::RecursionLimit {
                limit: self.limit,
                location: location.clone(),
            });
        }
        self.in_progress.insert(key);
        self.depth += 1;
        Ok(())
    }

    pub fn exit(&mut self, key: &ResolutionKey) {
        if self.in_progress.remove(key) {
            self.depth -= 1;
        }
    }
}
