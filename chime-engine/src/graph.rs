//! Mix graph - node storage and the output bus
//!
//! Nodes live in generation-checked slots so a stale `NodeId` held by a
//! background task can never touch a node that replaced it. A node must be
//! detached from the output bus before it can be removed.

use crate::error::EngineError;
use crate::generator::Generator;
use crate::voice::SoundVoice;

/// Stable reference to a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// What a node produces
#[derive(Debug, Clone)]
pub enum NodeKind {
    Generator(Generator),
    Voice(SoundVoice),
}

/// A graph node
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    /// Inactive nodes stay attached but are skipped when mixing
    active: bool,
    attached: bool,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Node storage plus the list of nodes feeding the output
#[derive(Debug, Default)]
pub struct MixGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Attached nodes in mixing order
    bus: Vec<NodeId>,
}

impl MixGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node (detached, with the given active flag)
    pub fn insert(&mut self, kind: NodeKind, active: bool) -> NodeId {
        let node = Node {
            kind,
            active,
            attached: false,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Connect a node to the output bus (no-op if already attached)
    pub fn attach(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.node_mut(id).ok_or(EngineError::UnknownNode)?;
        if !node.attached {
            node.attached = true;
            self.bus.push(id);
        }
        Ok(())
    }

    /// Disconnect a node from the output bus (no-op if not attached)
    pub fn detach(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.node_mut(id).ok_or(EngineError::UnknownNode)?;
        if node.attached {
            node.attached = false;
            self.bus.retain(|&bus_id| bus_id != id);
        }
        Ok(())
    }

    /// Free a detached node, returning what it held
    pub fn remove(&mut self, id: NodeId) -> Result<NodeKind, EngineError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .ok_or(EngineError::UnknownNode)?;

        match &slot.node {
            None => return Err(EngineError::UnknownNode),
            Some(node) if node.attached => return Err(EngineError::NodeAttached),
            Some(_) => {}
        }

        let node = slot.node.take().ok_or(EngineError::UnknownNode)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(node.kind)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.attached)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<(), EngineError> {
        let node = self.node_mut(id).ok_or(EngineError::UnknownNode)?;
        node.active = active;
        Ok(())
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.active)
    }

    pub fn generator(&self, id: NodeId) -> Option<&Generator> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Generator(gen)) => Some(gen),
            _ => None,
        }
    }

    pub fn generator_mut(&mut self, id: NodeId) -> Option<&mut Generator> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Generator(gen)) => Some(gen),
            _ => None,
        }
    }

    pub fn voice(&self, id: NodeId) -> Option<&SoundVoice> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Voice(voice)) => Some(voice),
            _ => None,
        }
    }

    pub fn voice_mut(&mut self, id: NodeId) -> Option<&mut SoundVoice> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Voice(voice)) => Some(voice),
            _ => None,
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes connected to the output
    pub fn bus_len(&self) -> usize {
        self.bus.len()
    }

    /// Add every active attached node into `output` (interleaved stereo)
    pub fn render(&mut self, output: &mut [f32], clock: u64) {
        let Self { slots, bus, .. } = self;
        for id in bus.iter() {
            let Some(node) = slots
                .get_mut(id.index as usize)
                .and_then(|slot| slot.node.as_mut())
            else {
                continue;
            };
            if !node.active {
                continue;
            }
            match &mut node.kind {
                NodeKind::Generator(gen) => gen.render(output),
                NodeKind::Voice(voice) => voice.render(output, clock),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::WaveformKind;

    fn square(amplitude: f32) -> NodeKind {
        NodeKind::Generator(Generator::new(WaveformKind::Square, amplitude, 100.0, 48000))
    }

    #[test]
    fn test_insert_attach_render() {
        let mut graph = MixGraph::new();
        let id = graph.insert(square(0.5), true);
        let mut out = vec![0.0; 4];

        // Detached nodes are not heard
        graph.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));

        graph.attach(id).unwrap();
        graph.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_inactive_nodes_are_skipped() {
        let mut graph = MixGraph::new();
        let id = graph.insert(square(0.5), false);
        graph.attach(id).unwrap();

        let mut out = vec![0.0; 4];
        graph.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));

        graph.set_active(id, true).unwrap();
        graph.render(&mut out, 0);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut graph = MixGraph::new();
        let id = graph.insert(square(0.5), true);
        graph.attach(id).unwrap();
        graph.attach(id).unwrap();
        assert_eq!(graph.bus_len(), 1);

        let mut out = vec![0.0; 2];
        graph.render(&mut out, 0);
        assert_eq!(out, vec![0.5, 0.5]);
    }

    #[test]
    fn test_remove_requires_detach() {
        let mut graph = MixGraph::new();
        let id = graph.insert(square(0.5), true);
        graph.attach(id).unwrap();

        assert!(matches!(graph.remove(id), Err(EngineError::NodeAttached)));
        assert!(graph.contains(id));

        graph.detach(id).unwrap();
        assert!(matches!(graph.remove(id), Ok(NodeKind::Generator(_))));
        assert!(!graph.contains(id));
        assert_eq!(graph.bus_len(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_stale_id_is_rejected() {
        let mut graph = MixGraph::new();
        let old = graph.insert(square(0.5), true);
        graph.remove(old).unwrap();

        // Slot is reused with a new generation
        let new = graph.insert(square(0.25), true);
        assert_ne!(old, new);
        assert!(!graph.contains(old));
        assert!(graph.generator(old).is_none());
        assert!(matches!(graph.attach(old), Err(EngineError::UnknownNode)));
        assert!(matches!(graph.remove(old), Err(EngineError::UnknownNode)));
        assert_eq!(graph.generator(new).map(|g| g.amplitude()), Some(0.25));
    }

    #[test]
    fn test_kind_accessors() {
        let mut graph = MixGraph::new();
        let id = graph.insert(square(0.5), true);
        assert!(graph.generator_mut(id).is_some());
        assert!(graph.voice(id).is_none());
        assert!(graph.voice_mut(id).is_none());
    }
}
