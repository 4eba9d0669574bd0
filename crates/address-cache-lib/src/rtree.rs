//! R-tree spatial index for bbox-keyed values
//!
//! A balanced tree where every node holds either up to `M` child nodes or up to `M`
//! leaf entries, and stores the minimal box enclosing everything below it. Queries
//! descend only into nodes whose box can match, so lookups stay sub-linear as the
//! number of cached regions grows.
//!
//! Insertion follows Guttman's original design: choose the subtree needing the least
//! enlargement, append at the leaf, and resolve overflow with a quadratic split that
//! may propagate up to the root (growing the tree by one level).

use crate::{Bbox, Coordinate};

/// Default branching factor
pub const DEFAULT_MAX_CHILDREN: usize = 8;

/// Smallest branching factor the split algorithm supports
const MIN_MAX_CHILDREN: usize = 2;

/// A stored value with its region and insertion sequence number
#[derive(Debug, Clone)]
struct Entry<T> {
    bbox: Bbox,
    /// Monotonic insertion counter, used to report matches in insertion order
    seq: u64,
    value: T,
}

/// Contents of a node: leaf entries or child nodes, never both
#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(Vec<Entry<T>>),
    Internal(Vec<Node<T>>),
}

/// A single node in the R-tree
#[derive(Debug, Clone)]
struct Node<T> {
    /// Minimal box enclosing all entries or children of this node
    bbox: Bbox,
    kind: NodeKind<T>,
}

/// One half of a node split, with its enclosing box
struct SplitGroup<I> {
    items: Vec<I>,
    bbox: Bbox,
}

/// Balanced R-tree mapping bounding boxes to values
///
/// Overlapping and identical boxes are allowed; all of them remain queryable. Query
/// results are always reported in insertion order.
#[derive(Debug, Clone)]
pub struct RTree<T> {
    /// Root node (`None` while empty)
    root: Option<Node<T>>,
    /// Maximum entries or children per node
    max_children: usize,
    /// Minimum fill of each half produced by a split
    min_children: usize,
    /// Number of stored entries
    len: usize,
    /// Sequence number for the next inserted entry
    next_seq: u64,
}

impl<T> Default for RTree<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHILDREN)
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T> RTree<T> {
    /// Create an empty tree with the given branching factor
    ///
    /// Values below 2 cannot be split and are raised to 2.
    pub fn new(max_children: usize) -> Self {
        let max_children = if max_children < MIN_MAX_CHILDREN {
            tracing::warn!(
                "R-tree branching factor {} is too small, using {}",
                max_children,
                MIN_MAX_CHILDREN
            );
            MIN_MAX_CHILDREN
        } else {
            max_children
        };

        Self {
            root: None,
            max_children,
            min_children: (max_children / 2).max(1),
            len: 0,
            next_seq: 0,
        }
    }

    /// Insert a value valid within `bbox`
    pub fn insert(&mut self, bbox: Bbox, value: T) {
        let entry = Entry {
            bbox,
            seq: self.next_seq,
            value,
        };
        self.next_seq += 1;
        self.len += 1;

        self.root = Some(match self.root.take() {
            None => Node {
                bbox,
                kind: NodeKind::Leaf(vec![entry]),
            },
            Some(mut root) => match root.insert(entry, self.max_children, self.min_children) {
                // Root split: grow the tree by one level
                Some(sibling) => Node {
                    bbox: root.bbox.union(&sibling.bbox),
                    kind: NodeKind::Internal(vec![root, sibling]),
                },
                None => root,
            },
        });
    }

    /// All values whose box contains the point, in insertion order
    pub fn query_point(&self, point: Coordinate) -> Vec<&T> {
        self.collect_matching(|bbox| bbox.contains(point))
    }

    /// All values whose box intersects `region`, in insertion order
    pub fn query_intersecting(&self, region: &Bbox) -> Vec<&T> {
        self.collect_matching(|bbox| bbox.intersects(region))
    }

    /// The earliest-inserted value whose box contains the point
    ///
    /// Equivalent to the first element of [`RTree::query_point`] without sorting.
    pub fn first_containing(&self, point: Coordinate) -> Option<&T> {
        let mut best: Option<&Entry<T>> = None;
        self.visit_matching(
            |bbox| bbox.contains(point),
            |entry| {
                if best.is_none_or(|b| entry.seq < b.seq) {
                    best = Some(entry);
                }
            },
        );
        best.map(|entry| &entry.value)
    }

    /// Remove every entry
    ///
    /// The old tree is dropped as a whole; the insertion counter keeps running so
    /// ordering stays consistent across clears.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (0 when empty, 1 for a single leaf)
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_ref();
        while let Some(n) = node {
            height += 1;
            node = match &n.kind {
                NodeKind::Leaf(_) => None,
                NodeKind::Internal(children) => children.first(),
            };
        }
        height
    }

    /// Configured branching factor
    #[inline]
    pub fn max_children(&self) -> usize {
        self.max_children
    }

    fn collect_matching<F: Fn(&Bbox) -> bool>(&self, matches: F) -> Vec<&T> {
        let mut found: Vec<&Entry<T>> = Vec::new();
        self.visit_matching(matches, |entry| found.push(entry));
        found.sort_unstable_by_key(|entry| entry.seq);
        found.into_iter().map(|entry| &entry.value).collect()
    }

    /// Depth-first traversal pruning every node whose box fails `matches`
    fn visit_matching<'a, F, V>(&'a self, matches: F, mut visit: V)
    where
        F: Fn(&Bbox) -> bool,
        V: FnMut(&'a Entry<T>),
    {
        let Some(root) = &self.root else {
            return;
        };

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !matches(&node.bbox) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    for entry in entries.iter().filter(|e| matches(&e.bbox)) {
                        visit(entry);
                    }
                }
                NodeKind::Internal(children) => stack.extend(children.iter()),
            }
        }
    }
}

impl<T> Node<T> {
    /// Insert an entry below this node
    ///
    /// Returns the new sibling if this node overflowed and had to split.
    fn insert(
        &mut self,
        entry: Entry<T>,
        max_children: usize,
        min_children: usize,
    ) -> Option<Node<T>> {
        self.bbox = self.bbox.union(&entry.bbox);

        let overflow = match &mut self.kind {
            NodeKind::Leaf(entries) => {
                entries.push(entry);
                entries.len() > max_children
            }
            NodeKind::Internal(children) => {
                let idx = choose_subtree(children, &entry.bbox);
                match children[idx].insert(entry, max_children, min_children) {
                    Some(sibling) => {
                        children.insert(idx + 1, sibling);
                        children.len() > max_children
                    }
                    None => false,
                }
            }
        };

        if overflow {
            Some(self.split(min_children))
        } else {
            None
        }
    }

    /// Split an overflowing node in two, keeping one half in place
    fn split(&mut self, min_children: usize) -> Node<T> {
        let (kept_bbox, sibling) = match &mut self.kind {
            NodeKind::Leaf(entries) => {
                let (kept, moved) =
                    quadratic_split(std::mem::take(entries), min_children, |e| e.bbox);
                *entries = kept.items;
                let sibling = Node {
                    bbox: moved.bbox,
                    kind: NodeKind::Leaf(moved.items),
                };
                (kept.bbox, sibling)
            }
            NodeKind::Internal(children) => {
                let (kept, moved) =
                    quadratic_split(std::mem::take(children), min_children, |n| n.bbox);
                *children = kept.items;
                let sibling = Node {
                    bbox: moved.bbox,
                    kind: NodeKind::Internal(moved.items),
                };
                (kept.bbox, sibling)
            }
        };

        self.bbox = kept_bbox;
        sibling
    }
}

/// Pick the child needing the least area enlargement to cover `bbox`
///
/// Ties go to the smaller resulting box, then to the lowest index.
fn choose_subtree<T>(children: &[Node<T>], bbox: &Bbox) -> usize {
    let mut best_idx = 0;
    let mut best_cost = (f64::INFINITY, f64::INFINITY);

    for (i, child) in children.iter().enumerate() {
        let grown = child.bbox.union(bbox).area();
        let cost = (grown - child.bbox.area(), grown);
        if cost < best_cost {
            best_cost = cost;
            best_idx = i;
        }
    }

    best_idx
}

/// Quadratic split: partition `items` into two groups with small total area
///
/// Seeds are the pair that would waste the most area if grouped together. Remaining
/// items are assigned one at a time, strongest preference first, to the group whose
/// box grows least (ties: smaller group area, then fewer items). Each group ends up
/// with at least `min_fill` items.
fn quadratic_split<I, F>(
    mut items: Vec<I>,
    min_fill: usize,
    bbox_of: F,
) -> (SplitGroup<I>, SplitGroup<I>)
where
    F: Fn(&I) -> Bbox,
{
    let (seed_a, seed_b) = pick_seeds(&items, &bbox_of);
    // seed_a < seed_b, remove the later one first so indices stay valid
    let second = items.remove(seed_b);
    let first = items.remove(seed_a);

    let mut a = SplitGroup {
        bbox: bbox_of(&first),
        items: vec![first],
    };
    let mut b = SplitGroup {
        bbox: bbox_of(&second),
        items: vec![second],
    };

    while !items.is_empty() {
        // If one group needs everything left to reach minimum fill, hand it over
        if a.items.len() + items.len() <= min_fill {
            absorb_all(&mut a, &mut items, &bbox_of);
            break;
        }
        if b.items.len() + items.len() <= min_fill {
            absorb_all(&mut b, &mut items, &bbox_of);
            break;
        }

        let next = pick_next(&items, &a.bbox, &b.bbox, &bbox_of);
        let item = items.remove(next);
        let bbox = bbox_of(&item);

        let grow_a = a.bbox.enlargement(&bbox);
        let grow_b = b.bbox.enlargement(&bbox);
        let to_a = if grow_a != grow_b {
            grow_a < grow_b
        } else if a.bbox.area() != b.bbox.area() {
            a.bbox.area() < b.bbox.area()
        } else {
            a.items.len() <= b.items.len()
        };

        let group = if to_a { &mut a } else { &mut b };
        group.bbox = group.bbox.union(&bbox);
        group.items.push(item);
    }

    (a, b)
}

/// Indices `(i, j)` with `i < j` of the pair wasting the most area together
fn pick_seeds<I, F>(items: &[I], bbox_of: &F) -> (usize, usize)
where
    F: Fn(&I) -> Bbox,
{
    let boxes: Vec<Bbox> = items.iter().map(bbox_of).collect();
    let mut best = (0, 1);
    let mut worst_waste = f64::NEG_INFINITY;

    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            let waste = boxes[i].union(&boxes[j]).area() - boxes[i].area() - boxes[j].area();
            if waste > worst_waste {
                worst_waste = waste;
                best = (i, j);
            }
        }
    }

    best
}

/// Index of the item with the strongest preference for one group over the other
fn pick_next<I, F>(items: &[I], a: &Bbox, b: &Bbox, bbox_of: &F) -> usize
where
    F: Fn(&I) -> Bbox,
{
    let mut best_idx = 0;
    let mut best_diff = f64::NEG_INFINITY;

    for (i, item) in items.iter().enumerate() {
        let bbox = bbox_of(item);
        let diff = (a.enlargement(&bbox) - b.enlargement(&bbox)).abs();
        if diff > best_diff {
            best_diff = diff;
            best_idx = i;
        }
    }

    best_idx
}

fn absorb_all<I, F>(group: &mut SplitGroup<I>, items: &mut Vec<I>, bbox_of: &F)
where
    F: Fn(&I) -> Bbox,
{
    for item in items.drain(..) {
        group.bbox = group.bbox.union(&bbox_of(&item));
        group.items.push(item);
    }
}
