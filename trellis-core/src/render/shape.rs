//! Shape flags: a compact description of what a vnode is and what kind of
//! children it carries, so the renderer can dispatch with bit tests.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        const ELEMENT = 1;
        const FUNCTIONAL_COMPONENT = 1 << 1;
        const STATEFUL_COMPONENT = 1 << 2;
        const TEXT_CHILDREN = 1 << 3;
        const ARRAY_CHILDREN = 1 << 4;
        const SLOTS_CHILDREN = 1 << 5;
        const COMPONENT = Self::STATEFUL_COMPONENT.bits() | Self::FUNCTIONAL_COMPONENT.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_covers_both_kinds() {
        assert!(ShapeFlags::COMPONENT.intersects(ShapeFlags::STATEFUL_COMPONENT));
        assert!(ShapeFlags::COMPONENT.intersects(ShapeFlags::FUNCTIONAL_COMPONENT));
        assert!(!ShapeFlags::COMPONENT.intersects(ShapeFlags::ELEMENT));
        assert_eq!(ShapeFlags::COMPONENT.bits(), 6);
    }
}
