//! Per-request projection settings and the recursion depth counter.

use std::collections::HashSet;
use std::sync::Arc;

/// Hard ceiling for reference recursion, whatever the caller asks for.
pub const DEPTH_CEILING: u32 = 10;

/// Immutable settings for one top-level request.
///
/// Recursion state is kept out of this type; see [`Depth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionContext {
    pub recurse: bool,
    pub max_depth: u32,
    pub published_only: bool,
    pub full_image_only: bool,
    /// When set, only these fields are emitted and empty values are omitted.
    pub field_allow_list: Option<Arc<HashSet<String>>>,
}

impl Default for ProjectionContext {
    fn default() -> Self {
        Self {
            recurse: false,
            max_depth: 2,
            published_only: true,
            full_image_only: false,
            field_allow_list: None,
        }
    }
}

impl ProjectionContext {
    #[must_use]
    pub fn new(recurse: bool, max_depth: u32, published_only: bool) -> Self {
        Self {
            recurse,
            max_depth: max_depth.min(DEPTH_CEILING),
            published_only,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    #[must_use]
    pub fn with_full_image_only(mut self, full_image_only: bool) -> Self {
        self.full_image_only = full_image_only;
        self
    }

    #[must_use]
    pub fn with_field_allow_list<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_allow_list = Some(Arc::new(fields.into_iter().map(Into::into).collect()));
        self
    }

    /// Whether a reference met at `depth` is fully projected rather than stubbed.
    #[must_use]
    pub fn should_descend(&self, depth: Depth) -> bool {
        self.recurse && depth.0 < self.max_depth.min(DEPTH_CEILING)
    }

    #[must_use]
    pub fn allows_field(&self, name: &str) -> bool {
        self.field_allow_list
            .as_ref()
            .is_none_or(|allowed| allowed.contains(name))
    }

    #[must_use]
    pub fn omits_empty_values(&self) -> bool {
        self.field_allow_list.is_some()
    }
}

/// Number of reference edges already followed on the current branch.
///
/// Copied, never shared: each descent produces a new value one level deeper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Depth(u32);

impl Depth {
    pub const ROOT: Depth = Depth(0);

    #[must_use]
    pub fn descend(self) -> Depth {
        Depth(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descent_requires_recurse_and_budget() {
        let ctx = ProjectionContext::new(true, 2, true);
        assert!(ctx.should_descend(Depth::ROOT));
        assert!(ctx.should_descend(Depth::ROOT.descend()));
        assert!(!ctx.should_descend(Depth::ROOT.descend().descend()));

        let flat = ProjectionContext::new(false, 5, true);
        assert!(!flat.should_descend(Depth::ROOT));
    }

    #[test]
    fn zero_depth_never_descends() {
        let ctx = ProjectionContext::new(true, 0, true);
        assert!(!ctx.should_descend(Depth::ROOT));
    }

    #[test]
    fn max_depth_is_clamped() {
        let ctx = ProjectionContext::new(true, u32::MAX, false);
        assert_eq!(ctx.max_depth, DEPTH_CEILING);

        let mut forged = ctx;
        forged.max_depth = u32::MAX;
        let mut depth = Depth::ROOT;
        for _ in 0..DEPTH_CEILING {
            depth = depth.descend();
        }
        assert!(!forged.should_descend(depth));
    }

    #[test]
    fn allow_list_filters_fields() {
        let ctx = ProjectionContext::default().with_field_allow_list(["type", "path"]);
        assert!(ctx.allows_field("type"));
        assert!(!ctx.allows_field("field_body"));
        assert!(ctx.omits_empty_values());
        assert!(ProjectionContext::default().allows_field("field_body"));
    }
}
