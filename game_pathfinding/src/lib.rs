use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// A trait for graphs that can be searched.
///
/// `Node`: The type of node identifiers (e.g., a territory name).
/// `Ctx`: A context object consulted while expanding nodes (e.g., current ownership).
pub trait Graph<Node, Ctx> {
    /// Return the neighbors of a node that the search may step onto.
    ///
    /// Implementations decide which edges are traversable under `context`,
    /// so a restricted subgraph is expressed by filtering here.
    fn neighbors(&self, node: Node, context: &Ctx) -> Vec<Node>;
}

/// Unweighted breadth-first search.
pub struct Bfs;

impl Bfs {
    /// Every node reachable from `start`, including `start` itself.
    pub fn reachable<Node, Ctx, G>(graph: &G, start: Node, context: &Ctx) -> HashSet<Node>
    where
        Node: Copy + Eq + Hash,
        G: Graph<Node, Ctx>,
    {
        let mut visited: HashSet<Node> = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in graph.neighbors(current, context) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        visited
    }

    /// Whether `goal` can be reached from `start`.
    ///
    /// Stops as soon as the goal is discovered.
    pub fn is_reachable<Node, Ctx, G>(graph: &G, start: Node, goal: Node, context: &Ctx) -> bool
    where
        Node: Copy + Eq + Hash,
        G: Graph<Node, Ctx>,
    {
        Self::find_path(graph, start, goal, context).is_some()
    }

    /// Find a path with the fewest hops from `start` to `goal`.
    ///
    /// The returned path includes both endpoints. `start == goal` yields a
    /// single-node path.
    pub fn find_path<Node, Ctx, G>(
        graph: &G,
        start: Node,
        goal: Node,
        context: &Ctx,
    ) -> Option<Vec<Node>>
    where
        Node: Copy + Eq + Hash,
        G: Graph<Node, Ctx>,
    {
        let mut came_from: HashMap<Node, Node> = HashMap::new();
        let mut visited: HashSet<Node> = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                // Reconstruct path
                let mut path = vec![current];
                let mut curr = current;
                while let Some(&prev) = came_from.get(&curr) {
                    path.push(prev);
                    curr = prev;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in graph.neighbors(current, context) {
                // First discovery is the shortest in an unweighted graph
                if visited.insert(neighbor) {
                    came_from.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }
}
