use crate::{ability::Ability, resource::ResourcePointer};

use super::DelegationSemantics;

/// Path-prefix resources with ordered ability levels.
///
/// Resources are only considered within `scheme`. A parent covers a child
/// with the same hier part or one nested beneath it at a `/` boundary, so
/// `wnfs://alice.fission.name/public` covers
/// `wnfs://alice.fission.name/public/photos` but not
/// `wnfs://alice.fission.name/publicity`. A parent hier part of `*` covers
/// everything in the scheme.
///
/// Abilities are `namespace/LEVEL` with a single segment drawn from
/// `levels`, listed weakest first. A level covers itself and every level
/// before it. [`Ability::Superuser`] covers every level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSemantics {
    scheme: String,
    namespace: String,
    levels: Vec<String>,
}

impl PathSemantics {
    /// Semantics for `scheme` resources and `namespace` abilities, with
    /// `levels` ordered weakest first.
    pub fn new<I, S>(scheme: impl Into<String>, namespace: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scheme: scheme.into(),
            namespace: namespace.into(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    fn level(&self, ability: &Ability) -> Option<usize> {
        let namespace = ability.namespace()?;
        if !namespace.eq_ignore_ascii_case(&self.namespace) {
            return None;
        }
        let [segment] = ability.segments() else {
            return None;
        };
        self.levels
            .iter()
            .position(|level| level.eq_ignore_ascii_case(segment))
    }
}

impl DelegationSemantics for PathSemantics {
    fn can_delegate_resource(&self, parent: &ResourcePointer, child: &ResourcePointer) -> bool {
        if !parent.scheme.eq_ignore_ascii_case(&self.scheme)
            || !child.scheme.eq_ignore_ascii_case(&self.scheme)
        {
            return false;
        }
        if parent.is_wildcard() || parent.hier_part == child.hier_part {
            return true;
        }
        let prefix = parent.hier_part.trim_end_matches('/');
        child
            .hier_part
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    fn can_delegate_ability(&self, parent: &Ability, child: &Ability) -> bool {
        if parent.is_superuser() {
            return true;
        }
        match (self.level(parent), self.level(child)) {
            (Some(parent), Some(child)) => parent >= child,
            _ => false,
        }
    }
}
