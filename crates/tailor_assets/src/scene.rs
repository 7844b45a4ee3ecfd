use std::sync::atomic::{AtomicU64, Ordering};

use crate::{material::MaterialInstance, metadata::Metadata};

pub type NodeIndex = usize;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// What a mesh is currently rendered with.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshMaterials {
    Single(MaterialInstance),
    /// One material per primitive, in primitive order
    Multi(Vec<MaterialInstance>),
}

impl MeshMaterials {
    pub fn from_vec(mut materials: Vec<MaterialInstance>) -> Self {
        if materials.len() == 1 {
            MeshMaterials::Single(materials.remove(0))
        } else {
            MeshMaterials::Multi(materials)
        }
    }

    pub fn as_slice(&self) -> &[MaterialInstance] {
        match self {
            MeshMaterials::Single(material) => std::slice::from_ref(material),
            MeshMaterials::Multi(materials) => materials,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Empty,
    Mesh(MeshMaterials),
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub metadata: Metadata,
    pub children: Vec<NodeIndex>,
}

impl SceneNode {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Empty,
            metadata: Metadata::new(),
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, materials: MeshMaterials) -> Self {
        Self {
            kind: NodeKind::Mesh(materials),
            ..Self::empty(name)
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn materials(&self) -> Option<&MeshMaterials> {
        match &self.kind {
            NodeKind::Mesh(materials) => Some(materials),
            NodeKind::Empty => None,
        }
    }
}

/// Arena of nodes plus the root list.
///
/// Children are indices into the arena, so a node can be reachable from
/// several parents (or from itself). Traversal visits each node once.
/// The graph is never cloned by the engine, only visited and patched.
#[derive(Debug)]
pub struct SceneGraph {
    id: SceneId,
    nodes: Vec<SceneNode>,
    roots: Vec<NodeIndex>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            id: SceneId::next(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Adds a detached node. It is only visited once something links to it.
    pub fn add_node(&mut self, node: SceneNode) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_root(&mut self, node: SceneNode) -> NodeIndex {
        let index = self.add_node(node);
        self.roots.push(index);
        index
    }

    /// Returns `None` (and drops the node) when the parent does not exist.
    pub fn add_child(&mut self, parent: NodeIndex, node: SceneNode) -> Option<NodeIndex> {
        if parent >= self.nodes.len() {
            return None;
        }
        let index = self.add_node(node);
        self.nodes[parent].children.push(index);
        Some(index)
    }

    /// Links an existing node under another one. Shared and cyclic links are allowed.
    pub fn link(&mut self, parent: NodeIndex, child: NodeIndex) -> bool {
        if parent >= self.nodes.len() || child >= self.nodes.len() {
            return false;
        }
        self.nodes[parent].children.push(child);
        true
    }

    pub fn set_roots(&mut self, roots: Vec<NodeIndex>) {
        self.roots = roots;
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    pub fn node(&self, index: NodeIndex) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, pre-order, roots in order, each reachable node once.
    pub fn traverse(&self) -> Traverse<'_> {
        let mut stack: Vec<NodeIndex> = self.roots.clone();
        stack.reverse();
        Traverse {
            graph: self,
            stack,
            visited: vec![false; self.nodes.len()],
        }
    }

    pub fn mesh_nodes(&self) -> impl Iterator<Item = (NodeIndex, &SceneNode)> {
        self.traverse().filter(|(_, node)| node.is_mesh())
    }

    /// Points every reachable mesh named `name` at `material`.
    /// Returns how many nodes were rebound.
    pub fn rebind_material(&mut self, name: &str, material: &MaterialInstance) -> usize {
        let targets: Vec<NodeIndex> = self
            .mesh_nodes()
            .filter(|(_, node)| node.name == name)
            .map(|(index, _)| index)
            .collect();

        for &index in &targets {
            self.nodes[index].kind = NodeKind::Mesh(MeshMaterials::Single(material.clone()));
        }

        targets.len()
    }
}

pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeIndex>,
    visited: Vec<bool>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = (NodeIndex, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            // Dangling indices are skipped, same as already visited ones
            match self.visited.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }

            let graph = self.graph;
            let node = &graph.nodes[index];
            self.stack.extend(node.children.iter().rev());
            return Some((index, node));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialFactory;

    fn red() -> MaterialInstance {
        MaterialFactory::from_color("red").unwrap()
    }

    #[test]
    fn traversal_is_preorder_and_visits_shared_nodes_once() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::empty("root"));
        let a = graph.add_child(root, SceneNode::empty("a")).unwrap();
        let b = graph.add_child(root, SceneNode::empty("b")).unwrap();
        let shared = graph.add_child(a, SceneNode::mesh("shared", MeshMaterials::Single(red()))).unwrap();
        assert!(graph.link(b, shared));
        // cycle back to the root
        assert!(graph.link(shared, root));

        let names: Vec<&str> = graph.traverse().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, ["root", "a", "shared", "b"]);
    }

    #[test]
    fn detached_nodes_are_not_reachable() {
        let mut graph = SceneGraph::new();
        graph.add_root(SceneNode::mesh("Seat", MeshMaterials::Single(red())));
        graph.add_node(SceneNode::mesh("Seat", MeshMaterials::Single(red())));

        assert_eq!(graph.mesh_nodes().count(), 1);
        assert!(!graph.link(0, 5));
    }

    #[test]
    fn rebind_touches_only_matching_meshes() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::empty("Seat"));
        graph.add_child(root, SceneNode::mesh("Seat", MeshMaterials::Single(red())));
        graph.add_child(
            root,
            SceneNode::mesh("Seat", MeshMaterials::Multi(vec![red(), red()])),
        );
        let leg = red();
        graph.add_child(root, SceneNode::mesh("Leg", MeshMaterials::Single(leg.clone())));

        let blue = MaterialFactory::from_color("blue").unwrap();
        assert_eq!(graph.rebind_material("Seat", &blue), 2);

        for (_, node) in graph.mesh_nodes() {
            let expected = if node.name == "Seat" { &blue } else { &leg };
            assert_eq!(node.materials().unwrap(), &MeshMaterials::Single(expected.clone()));
        }
        // the empty "Seat" group is not a mesh and stays untouched
        assert_eq!(graph.node(root).unwrap().kind, NodeKind::Empty);
    }

    #[test]
    fn scene_ids_are_unique() {
        assert_ne!(SceneGraph::new().id(), SceneGraph::new().id());
    }
}
