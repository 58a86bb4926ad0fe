use crate::compatibility::domain::{Component, ComponentIndex};
use std::collections::HashMap;

/// A parent component and the components that ship inside it, by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentGroup {
    pub parent: usize,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentGroups {
    pub groups: Vec<ComponentGroup>,
    pub standalone: Vec<usize>,
}

/// Groups components by their source package.
pub struct ComponentGrouping;

impl ComponentGrouping {
    /// Links come from a component's source package (or parent component)
    /// and from a parent's `children` list. A source package present in the
    /// list becomes the parent. Siblings whose source package is absent form
    /// a group of their own, led by the first member without a
    /// `parent_component` (else the first member). Nested links collapse onto
    /// the top-most ancestor, and cycles leave their members standalone.
    pub fn group(components: &[Component]) -> ComponentGroups {
        let index = ComponentIndex::build(components);
        let mut parent_of: Vec<Option<usize>> = components
            .iter()
            .enumerate()
            .map(|(position, component)| {
                component
                    .group_key()
                    .and_then(|name| index.position(name))
                    .filter(|parent| *parent != position)
            })
            .collect();

        for members in Self::orphan_siblings(components, &index) {
            let leader = members
                .iter()
                .copied()
                .find(|&member| components[member].parent_component.is_none())
                .unwrap_or(members[0]);
            for &member in members.iter().filter(|&&member| member != leader) {
                parent_of[member] = Some(leader);
            }
        }

        for (position, component) in components.iter().enumerate() {
            for child in &component.children {
                if let Some(child_position) = index.position(child) {
                    if child_position != position && parent_of[child_position].is_none() {
                        parent_of[child_position] = Some(position);
                    }
                }
            }
        }

        let roots: Vec<usize> = (0..components.len())
            .map(|position| Self::root_of(position, &parent_of))
            .collect();

        let mut result = ComponentGroups::default();
        for position in 0..components.len() {
            if roots[position] != position {
                continue;
            }
            let children: Vec<usize> = (0..components.len())
                .filter(|&other| other != position && roots[other] == position)
                .collect();
            if children.is_empty() {
                result.standalone.push(position);
            } else {
                result.groups.push(ComponentGroup {
                    parent: position,
                    children,
                });
            }
        }
        result
    }

    /// Positions sharing a source key that names no listed component, in
    /// first-seen order; only keys with two or more members.
    fn orphan_siblings(components: &[Component], index: &ComponentIndex) -> Vec<Vec<usize>> {
        let mut keys: Vec<&str> = Vec::new();
        let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
        for (position, component) in components.iter().enumerate() {
            let Some(key) = component.group_key().filter(|key| !index.contains(key)) else {
                continue;
            };
            let entry = members.entry(key).or_default();
            if entry.is_empty() {
                keys.push(key);
            }
            entry.push(position);
        }
        keys.into_iter()
            .filter_map(|key| members.remove(key))
            .filter(|positions| positions.len() > 1)
            .collect()
    }

    fn root_of(position: usize, parent_of: &[Option<usize>]) -> usize {
        let mut current = position;
        for _ in 0..parent_of.len() {
            match parent_of[current] {
                Some(parent) if parent == position => return position,
                Some(parent) => current = parent,
                None => return current,
            }
        }
        // a cycle that does not pass through `position`
        position
    }
}
