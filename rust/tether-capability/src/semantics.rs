//! Rules deciding whether a parent capability covers a child capability.
//!
//! Delegation only ever narrows: a token may re-delegate a capability when
//! one of its proofs holds a capability whose resource and ability both
//! cover the claimed ones. What "covers" means is application specific, so
//! it is abstracted behind [`DelegationSemantics`]. [`EqualCanDelegate`]
//! accepts only exact matches; [`PathSemantics`] adds resource prefixes and
//! ordered ability levels.

mod path;

pub use path::PathSemantics;

use crate::{ability::Ability, resource::ResourcePointer};

/// Pluggable "can parent delegate child" rules.
pub trait DelegationSemantics {
    /// Whether a `parent` resource covers the `child` resource.
    fn can_delegate_resource(&self, parent: &ResourcePointer, child: &ResourcePointer) -> bool;

    /// Whether a `parent` ability covers the `child` ability.
    fn can_delegate_ability(&self, parent: &Ability, child: &Ability) -> bool;
}

/// Delegation by equality.
///
/// A resource delegates only itself. An ability delegates itself, and
/// [`Ability::Superuser`] delegates every ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqualCanDelegate;

impl DelegationSemantics for EqualCanDelegate {
    fn can_delegate_resource(&self, parent: &ResourcePointer, child: &ResourcePointer) -> bool {
        parent == child
    }

    fn can_delegate_ability(&self, parent: &Ability, child: &Ability) -> bool {
        parent.is_superuser() || parent == child
    }
}

impl<T: DelegationSemantics + ?Sized> DelegationSemantics for &T {
    fn can_delegate_resource(&self, parent: &ResourcePointer, child: &ResourcePointer) -> bool {
        (**self).can_delegate_resource(parent, child)
    }

    fn can_delegate_ability(&self, parent: &Ability, child: &Ability) -> bool {
        (**self).can_delegate_ability(parent, child)
    }
}
