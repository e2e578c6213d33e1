//! Weighted A* and IDA* over the implicit state graph (spec.md §6/§7).
//! Grounded on the teacher's `planning/planning/src/classical/search.rs`
//! (`BinaryHeap<Rc<Node>>` with parent backpointers, a node cache keyed by
//! state) for the A* shape, generalized here to a bucket queue per
//! spec.md §7's cost model (small integer edge weights), plus a
//! depth-first iterative-deepening variant for bounded memory.

use crate::enumerator::Transition;
use crate::state::KnittingState;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Instant;

/// A completed search: the action labels along the found path, its total
/// cost, how many nodes were expanded, and wall-clock time taken.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub path: Vec<String>,
    pub path_length: u32,
    pub search_tree_size: usize,
    pub seconds_taken: f64,
}

struct Node {
    state: KnittingState,
    g: u32,
    f: u32,
    parent: Option<(Rc<Node>, String)>,
}

/// A monotone (non-decreasing `f`) priority queue of search nodes, stored
/// as a deque of buckets keyed by `f - base`. Since `base` only ever
/// tracks the minimum `f` seen, pushing a lower `f` than any seen before
/// grows the deque leftward rather than requiring a full reindex.
struct BucketQueue {
    buckets: VecDeque<Vec<Rc<Node>>>,
    base: u32,
    len: usize,
}

impl BucketQueue {
    fn new() -> Self {
        BucketQueue {
            buckets: VecDeque::new(),
            base: 0,
            len: 0,
        }
    }

    fn push(&mut self, node: Rc<Node>) {
        let f = node.f;
        if self.buckets.is_empty() {
            self.base = f;
            self.buckets.push_back(Vec::new());
        } else if f < self.base {
            for _ in 0..(self.base - f) {
                self.buckets.push_front(Vec::new());
            }
            self.base = f;
        }
        let idx = (f - self.base) as usize;
        while self.buckets.len() <= idx {
            self.buckets.push_back(Vec::new());
        }
        self.buckets[idx].push(node);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<Rc<Node>> {
        while let Some(bucket) = self.buckets.front_mut() {
            if let Some(node) = bucket.pop() {
                self.len -= 1;
                return Some(node);
            }
            self.buckets.pop_front();
            self.base += 1;
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn reconstruct(node: Rc<Node>, expanded: usize, seconds_taken: f64) -> SearchResult {
    let path_length = node.g;
    let mut path = Vec::new();
    let mut cur = node;
    while let Some((parent, desc)) = cur.parent.clone() {
        path.push(desc);
        cur = parent;
    }
    path.reverse();
    SearchResult {
        path,
        path_length,
        search_tree_size: expanded,
        seconds_taken,
    }
}

/// Weighted A* from any of `sources` to `target`. Stops and returns
/// `None` once more than `limit` nodes have been expanded.
pub fn a_star<F, H>(
    sources: &[KnittingState],
    target: &KnittingState,
    adjacent_fn: F,
    heuristic_fn: H,
    limit: usize,
) -> Option<SearchResult>
where
    F: Fn(&KnittingState) -> Vec<Transition>,
    H: Fn(&KnittingState) -> u32,
{
    let start_time = Instant::now();
    let mut queue = BucketQueue::new();
    let mut best_g: HashMap<KnittingState, u32> = HashMap::new();
    let mut expanded = 0usize;

    for s in sources {
        best_g.insert(s.clone(), 0);
        let h = heuristic_fn(s);
        queue.push(Rc::new(Node {
            state: s.clone(),
            g: 0,
            f: h,
            parent: None,
        }));
    }

    while let Some(node) = queue.pop() {
        if &node.state == target {
            return Some(reconstruct(node, expanded, start_time.elapsed().as_secs_f64()));
        }
        if best_g.get(&node.state).map_or(false, |&g| node.g > g) {
            continue;
        }
        expanded += 1;
        if expanded > limit {
            return None;
        }
        for (next, w, desc) in adjacent_fn(&node.state) {
            let g2 = node.g + w;
            if best_g.get(&next).map_or(true, |&g| g2 < g) {
                best_g.insert(next.clone(), g2);
                let h = heuristic_fn(&next);
                queue.push(Rc::new(Node {
                    state: next,
                    g: g2,
                    f: g2 + h,
                    parent: Some((node.clone(), desc)),
                }));
            }
        }
    }
    let _ = queue.is_empty();
    None
}

enum DfsOutcome {
    Found,
    Pruned(u32),
    LimitReached,
}

struct IdaCtx<'a, F, H> {
    adjacent_fn: &'a F,
    heuristic_fn: &'a H,
    target: &'a KnittingState,
    expanded: usize,
    limit: usize,
}

fn dfs<F, H>(
    ctx: &mut IdaCtx<F, H>,
    state: &KnittingState,
    g: u32,
    bound: u32,
    path: &mut Vec<String>,
    visited: &mut HashSet<KnittingState>,
) -> DfsOutcome
where
    F: Fn(&KnittingState) -> Vec<Transition>,
    H: Fn(&KnittingState) -> u32,
{
    let f = g + (ctx.heuristic_fn)(state);
    if f > bound {
        return DfsOutcome::Pruned(f);
    }
    if state == ctx.target {
        return DfsOutcome::Found;
    }
    ctx.expanded += 1;
    if ctx.expanded > ctx.limit {
        return DfsOutcome::LimitReached;
    }

    let mut smallest_exceeding = u32::MAX;
    for (next, w, desc) in (ctx.adjacent_fn)(state) {
        if visited.contains(&next) {
            continue;
        }
        visited.insert(next.clone());
        path.push(desc);
        match dfs(ctx, &next, g + w, bound, path, visited) {
            DfsOutcome::Found => return DfsOutcome::Found,
            DfsOutcome::Pruned(f2) => smallest_exceeding = smallest_exceeding.min(f2),
            DfsOutcome::LimitReached => return DfsOutcome::LimitReached,
        }
        path.pop();
        visited.remove(&next);
    }
    DfsOutcome::Pruned(smallest_exceeding)
}

/// Iterative-deepening A* from any of `sources` to `target`: bounded
/// memory at the cost of re-exploring nodes across deepening rounds.
pub fn ida_star<F, H>(
    sources: &[KnittingState],
    target: &KnittingState,
    adjacent_fn: F,
    heuristic_fn: H,
    limit: usize,
) -> Option<SearchResult>
where
    F: Fn(&KnittingState) -> Vec<Transition>,
    H: Fn(&KnittingState) -> u32,
{
    let start_time = Instant::now();
    let mut bound = sources.iter().map(|s| heuristic_fn(s)).min().unwrap_or(0);
    let mut ctx = IdaCtx {
        adjacent_fn: &adjacent_fn,
        heuristic_fn: &heuristic_fn,
        target,
        expanded: 0,
        limit,
    };

    loop {
        let mut path = Vec::new();
        let mut found = false;
        let mut next_bound = u32::MAX;

        for s in sources {
            let mut visited = HashSet::new();
            visited.insert(s.clone());
            path.clear();
            match dfs(&mut ctx, s, 0, bound, &mut path, &mut visited) {
                DfsOutcome::Found => {
                    found = true;
                    break;
                }
                DfsOutcome::Pruned(f2) => next_bound = next_bound.min(f2),
                DfsOutcome::LimitReached => return None,
            }
        }

        if found {
            return Some(SearchResult {
                path_length: bound,
                path,
                search_tree_size: ctx.expanded,
                seconds_taken: start_time.elapsed().as_secs_f64(),
            });
        }
        if next_bound == u32::MAX {
            return None;
        }
        bound = next_bound;
    }
}
