//! Entity path resolver.
//!
//! A player's items form a forest: top-level items (roots) with attachments
//! and cargo beneath them. Export assigns each root a 0-based index in
//! enumeration order and labels every node with a dotted path such as
//! `"0.cargo.2"` or `"3.attachments.0.cargo.1"`. Resolution walks such a path
//! back to a live item, falling back to a class-name search when the tree
//! changed since the export.

use crate::world::{InventorySnapshot, ItemId, ItemNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Serialized form of one item and everything beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedItem {
    pub class_name: String,
    pub display_name: String,
    pub health: f32,
    pub quantity: f32,
    pub quantity_max: f32,
    /// Attachment slot id, -1 for cargo and loose items
    pub slot: i32,
    pub slot_name: String,
    /// Address of this node for [`ItemPath`]
    pub path: String,
    pub attachments: Vec<ExportedItem>,
    pub cargo: Vec<ExportedItem>,
}

/// Which child list a path hop enters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Attachments,
    Cargo,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Attachments => "attachments",
            Segment::Cargo => "cargo",
        }
    }

    fn children<'a>(&self, node: &'a ItemNode) -> &'a [ItemId] {
        match self {
            Segment::Attachments => &node.attachments,
            Segment::Cargo => &node.cargo,
        }
    }
}

impl FromStr for Segment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attachments" => Ok(Segment::Attachments),
            "cargo" => Ok(Segment::Cargo),
            other => Err(PathError::UnknownSegment(other.to_string())),
        }
    }
}

/// Parsed `<root>(.(attachments|cargo).<index>)*` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    pub root: usize,
    pub hops: Vec<(Segment, usize)>,
}

impl ItemPath {
    pub fn root(index: usize) -> Self {
        Self {
            root: index,
            hops: Vec::new(),
        }
    }

    pub fn child(&self, segment: Segment, index: usize) -> Self {
        let mut hops = self.hops.clone();
        hops.push((segment, index));
        Self {
            root: self.root,
            hops,
        }
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for (segment, index) in &self.hops {
            write!(f, ".{}.{}", segment.as_str(), index)?;
        }
        Ok(())
    }
}

impl FromStr for ItemPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let root = parse_index(parts.next().unwrap_or_default(), s)?;

        let mut hops = Vec::new();
        while let Some(token) = parts.next() {
            let segment: Segment = token.parse()?;
            let index = match parts.next() {
                Some(index) => parse_index(index, s)?,
                None => return Err(PathError::Malformed(s.to_string())),
            };
            hops.push((segment, index));
        }

        Ok(Self { root, hops })
    }
}

fn parse_index(token: &str, path: &str) -> Result<usize, PathError> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| PathError::Malformed(path.to_string()))
}

/// Path parsing and navigation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed item path '{0}'")]
    Malformed(String),
    #[error("index {index} out of range at '{at}' ({len} available)")]
    OutOfRange { at: String, index: usize, len: usize },
    #[error("unknown path segment '{0}'")]
    UnknownSegment(String),
}

impl PathError {
    /// Result code reported back to the management process
    pub fn code(&self) -> &'static str {
        match self {
            PathError::Malformed(_) => "MALFORMED_PATH",
            PathError::OutOfRange { .. } => "OUT_OF_RANGE",
            PathError::UnknownSegment(_) => "UNKNOWN_PATH_SEGMENT",
        }
    }
}

/// Outcome of [`locate`] when no acceptable item was found
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocateError {
    #[error("no item at '{path}': {source}")]
    NotFound { path: String, source: PathError },
    #[error("item at '{path}' is {found}, expected {expected}")]
    Mismatch {
        path: String,
        found: String,
        expected: String,
    },
}

/// Top-level items in enumeration order.
///
/// Anything that appears in another item's attachment or cargo list is a
/// child; everything else is a root.
pub fn roots(snapshot: &InventorySnapshot) -> Vec<ItemId> {
    let children: HashSet<ItemId> = snapshot
        .iter()
        .flat_map(|node| node.attachments.iter().chain(node.cargo.iter()).copied())
        .collect();

    snapshot
        .order
        .iter()
        .copied()
        .filter(|id| !children.contains(id))
        .collect()
}

/// Serialize the whole forest, labelling each node with its path.
pub fn export_tree(snapshot: &InventorySnapshot) -> Vec<ExportedItem> {
    roots(snapshot)
        .into_iter()
        .enumerate()
        .filter_map(|(i, id)| export_node(snapshot, id, ItemPath::root(i), true))
        .collect()
}

fn export_node(
    snapshot: &InventorySnapshot,
    id: ItemId,
    path: ItemPath,
    keep_slot: bool,
) -> Option<ExportedItem> {
    let node = snapshot.node(id)?;

    let attachments = node
        .attachments
        .iter()
        .enumerate()
        .filter_map(|(i, child)| {
            export_node(snapshot, *child, path.child(Segment::Attachments, i), true)
        })
        .collect();
    let cargo = node
        .cargo
        .iter()
        .enumerate()
        .filter_map(|(i, child)| export_node(snapshot, *child, path.child(Segment::Cargo, i), false))
        .collect();

    let (slot, slot_name) = match (&node.slot, keep_slot) {
        (Some(slot), true) => (slot.id, slot.name.clone()),
        _ => (-1, String::new()),
    };

    Some(ExportedItem {
        class_name: node.class_name.clone(),
        display_name: node.display_name.clone(),
        health: node.health,
        quantity: node.kind.quantity(),
        quantity_max: node.kind.quantity_max(),
        slot,
        slot_name,
        path: path.to_string(),
        attachments,
        cargo,
    })
}

/// Walk `path` from the root list, bounds-checking every hop.
pub fn resolve(snapshot: &InventorySnapshot, path: &ItemPath) -> Result<ItemId, PathError> {
    let roots = roots(snapshot);
    let mut current = *roots.get(path.root).ok_or_else(|| PathError::OutOfRange {
        at: "root".to_string(),
        index: path.root,
        len: roots.len(),
    })?;

    let mut walked = ItemPath::root(path.root);
    for (segment, index) in &path.hops {
        let children = snapshot
            .node(current)
            .map(|node| segment.children(node))
            .unwrap_or_default();
        current = *children.get(*index).ok_or_else(|| PathError::OutOfRange {
            at: format!("{}.{}", walked, segment.as_str()),
            index: *index,
            len: children.len(),
        })?;
        walked = walked.child(*segment, *index);
    }

    Ok(current)
}

/// First item of `class_name` in enumeration order.
pub fn find_by_class(snapshot: &InventorySnapshot, class_name: &str) -> Option<ItemId> {
    snapshot
        .iter()
        .find(|node| node.class_name == class_name)
        .map(|node| node.id)
}

/// Resolve a path tolerating staleness.
///
/// When navigation fails, or lands on an item whose class is not
/// `expected_class`, the first item of `expected_class` anywhere in the tree
/// is used instead. An empty `expected_class` accepts whatever the path
/// reaches.
pub fn locate(
    snapshot: &InventorySnapshot,
    path: &str,
    expected_class: &str,
) -> Result<ItemId, LocateError> {
    let resolved = path.parse::<ItemPath>().and_then(|p| resolve(snapshot, &p));

    let fallback = || {
        if expected_class.is_empty() {
            None
        } else {
            find_by_class(snapshot, expected_class)
        }
    };

    match resolved {
        Ok(id) => {
            let found = snapshot
                .node(id)
                .map(|node| node.class_name.as_str())
                .unwrap_or_default();
            if expected_class.is_empty() || found == expected_class {
                return Ok(id);
            }
            fallback().ok_or_else(|| LocateError::Mismatch {
                path: path.to_string(),
                found: found.to_string(),
                expected: expected_class.to_string(),
            })
        }
        Err(source) => fallback().ok_or_else(|| LocateError::NotFound {
            path: path.to_string(),
            source,
        }),
    }
}
