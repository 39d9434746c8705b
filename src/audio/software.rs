//! Software implementation of the audio graph.
//!
//! Renders mono blocks sample by sample: every node is processed once per
//! frame in dependency order, parameters are evaluated from their automation
//! timelines plus any audio-rate modulation routed into them.
//!
//! Finished sources are dropped after each block, and any node that was fed
//! and has lost all of its inputs goes with them, so fire-and-forget voices
//! clean themselves up.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::automation::ParamTimeline;
use super::graph::{
    AudioGraph, Automation, BufferId, ContextState, FilterKind, NodeId, Param, Waveform,
};
use super::voice::{Biquad, BufferPlayer, Oscillator};
use super::AudioError;

#[derive(Clone, Debug)]
enum NodeKind {
    Destination,
    Oscillator(Oscillator),
    Filter(Biquad),
    Gain,
    BufferSource(BufferPlayer),
}

impl NodeKind {
    fn is_source(&self) -> bool {
        matches!(self, Self::Oscillator(_) | Self::BufferSource(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Audio(NodeId),
    Param(NodeId, Param),
}

impl Edge {
    fn target(self) -> NodeId {
        match self {
            Edge::Audio(id) | Edge::Param(id, _) => id,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Playback {
    start: Option<f64>,
    stop: Option<f64>,
    ended: bool,
}

impl Playback {
    fn is_playing(&self, t: f64) -> bool {
        !self.ended
            && self.start.is_some_and(|start| t >= start)
            && self.stop.map_or(true, |stop| t < stop)
    }
}

#[derive(Clone, Debug)]
struct Node {
    id: NodeId,
    kind: NodeKind,
    params: Vec<(Param, ParamTimeline)>,
    outputs: Vec<Edge>,
    playback: Playback,
    /// Something has been connected into this node at some point
    fed: bool,
}

impl Node {
    fn param_mut(&mut self, param: Param) -> Option<&mut ParamTimeline> {
        self.params
            .iter_mut()
            .find(|(p, _)| *p == param)
            .map(|(_, timeline)| timeline)
    }

    fn param(&self, param: Param) -> Option<&ParamTimeline> {
        self.params
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, timeline)| timeline)
    }
}

/// Processing order and incoming connections, rebuilt when the wiring changes
#[derive(Debug, Default)]
struct Routing {
    order: Vec<usize>,
    inputs: Vec<Vec<usize>>,
    modulators: Vec<Vec<(Param, usize)>>,
}

/// Single-threaded software audio graph
pub struct SoftwareGraph {
    sample_rate: f32,
    frames: u64,
    state: ContextState,
    next_id: u32,
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    buffers: HashMap<BufferId, Arc<[f32]>>,
    next_buffer: u32,
    routing: Option<Routing>,
    values: Vec<f32>,
    destination: NodeId,
}

impl SoftwareGraph {
    /// Create a suspended graph containing only the destination node
    pub fn new(sample_rate: f32) -> Self {
        let mut graph = Self {
            sample_rate,
            frames: 0,
            state: ContextState::Suspended,
            next_id: 0,
            nodes: Vec::new(),
            index: HashMap::new(),
            buffers: HashMap::new(),
            next_buffer: 0,
            routing: None,
            values: Vec::new(),
            destination: NodeId(0),
        };
        graph.destination = graph.insert(NodeKind::Destination, Vec::new());
        graph
    }

    /// Number of live nodes, destination included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of sample buffers still held
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    /// Current automation value of a parameter (as of the last rendered frame)
    pub fn param_value(&self, node: NodeId, param: Param) -> Option<f32> {
        self.node(node).ok()?.param(param).map(ParamTimeline::value)
    }

    /// Automation events not yet reached by the renderer
    pub fn pending_automation(&self, node: NodeId, param: Param) -> Vec<Automation> {
        self.node(node)
            .ok()
            .and_then(|n| n.param(param))
            .map(|timeline| timeline.pending().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a source node would sound at the current clock time
    pub fn is_playing(&self, node: NodeId) -> bool {
        self.node(node)
            .map(|n| n.playback.is_playing(self.current_time()))
            .unwrap_or(false)
    }

    /// Render one mono block, advancing the clock while running
    pub fn render_block(&mut self, out: &mut [f32]) {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }

        if self.routing.is_none() {
            self.routing = Some(self.build_routing());
        }
        let Some(routing) = self.routing.take() else {
            return;
        };
        self.values.resize(self.nodes.len(), 0.0);

        let destination = self.index[&self.destination];
        for sample in out.iter_mut() {
            let t = self.frames as f64 / self.sample_rate as f64;
            for &i in &routing.order {
                let value = self.process_node(i, t, &routing);
                self.values[i] = value;
            }
            *sample = self.values[destination];
            self.frames += 1;
        }

        self.routing = Some(routing);
        self.collect_finished();
    }

    fn process_node(&mut self, i: usize, t: f64, routing: &Routing) -> f32 {
        let input: f32 = routing.inputs[i].iter().map(|&j| self.values[j]).sum();
        let modulators = &routing.modulators[i];
        let values = &self.values;
        let node = &mut self.nodes[i];

        let param_at = |node: &mut Node, param: Param| -> f32 {
            let base = node.param_mut(param).map_or(0.0, |timeline| timeline.advance(t));
            let modulation: f32 = modulators
                .iter()
                .filter(|(p, _)| *p == param)
                .map(|&(_, j)| values[j])
                .sum();
            base + modulation
        };

        match node.kind {
            NodeKind::Destination => input,
            NodeKind::Gain => input * param_at(node, Param::Gain),
            NodeKind::Filter(_) => {
                let frequency = param_at(node, Param::Frequency);
                let q = param_at(node, Param::Q);
                let NodeKind::Filter(biquad) = &mut node.kind else {
                    return input;
                };
                biquad.render_sample(input, frequency, q)
            }
            NodeKind::Oscillator(_) => {
                let frequency = param_at(node, Param::Frequency);
                if !node.playback.is_playing(t) {
                    return 0.0;
                }
                let NodeKind::Oscillator(osc) = &mut node.kind else {
                    return 0.0;
                };
                osc.render_sample(frequency)
            }
            NodeKind::BufferSource(_) => {
                if !node.playback.is_playing(t) {
                    return 0.0;
                }
                let NodeKind::BufferSource(player) = &mut node.kind else {
                    return 0.0;
                };
                let value = player.next_sample().unwrap_or(0.0);
                if player.is_finished() {
                    node.playback.ended = true;
                }
                value
            }
        }
    }

    /// Drop ended sources, then cascade through nodes left without inputs
    fn collect_finished(&mut self) {
        let now = self.current_time();
        let mut doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| {
                n.kind.is_source()
                    && (n.playback.ended || n.playback.stop.is_some_and(|stop| now >= stop))
            })
            .map(|n| n.id)
            .collect();

        let mut removed = 0;
        while !doomed.is_empty() {
            for id in doomed.drain(..) {
                self.remove(id);
                removed += 1;
            }

            let fed_now: HashSet<NodeId> = self
                .nodes
                .iter()
                .flat_map(|n| n.outputs.iter().map(|e| e.target()))
                .collect();
            doomed = self
                .nodes
                .iter()
                .filter(|n| {
                    n.fed
                        && !n.kind.is_source()
                        && n.id != self.destination
                        && !fed_now.contains(&n.id)
                })
                .map(|n| n.id)
                .collect();
        }

        if removed > 0 {
            tracing::trace!(removed, remaining = self.nodes.len(), "pruned finished nodes");
        }
    }

    fn build_routing(&self) -> Routing {
        let count = self.nodes.len();
        let mut inputs = vec![Vec::new(); count];
        let mut modulators = vec![Vec::new(); count];
        let mut pending = vec![0usize; count];

        for (from, node) in self.nodes.iter().enumerate() {
            for edge in &node.outputs {
                let Some(&to) = self.index.get(&edge.target()) else {
                    continue;
                };
                match *edge {
                    Edge::Audio(_) => inputs[to].push(from),
                    Edge::Param(_, param) => modulators[to].push((param, from)),
                }
                pending[to] += 1;
            }
        }

        // Kahn's algorithm; anything caught in a cycle runs last on stale inputs
        let mut ready: VecDeque<usize> = (0..count).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        let mut placed = vec![false; count];
        while let Some(i) = ready.pop_front() {
            order.push(i);
            placed[i] = true;
            for edge in &self.nodes[i].outputs {
                if let Some(&to) = self.index.get(&edge.target()) {
                    pending[to] -= 1;
                    if pending[to] == 0 {
                        ready.push_back(to);
                    }
                }
            }
        }
        order.extend((0..count).filter(|&i| !placed[i]));

        Routing {
            order,
            inputs,
            modulators,
        }
    }

    fn insert(&mut self, kind: NodeKind, params: Vec<(Param, f32)>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            params: params
                .into_iter()
                .map(|(param, value)| (param, ParamTimeline::new(value)))
                .collect(),
            outputs: Vec::new(),
            playback: Playback::default(),
            fed: false,
        });
        self.routing = None;
        id
    }

    fn remove(&mut self, id: NodeId) {
        let Some(i) = self.index.remove(&id) else {
            return;
        };
        self.nodes.swap_remove(i);
        if let Some(moved) = self.nodes.get(i) {
            self.index.insert(moved.id, i);
        }
        for node in &mut self.nodes {
            node.outputs.retain(|e| e.target() != id);
        }
        if i < self.values.len() {
            self.values.swap_remove(i);
        }
        self.routing = None;
    }

    fn node(&self, id: NodeId) -> Result<&Node, AudioError> {
        self.index
            .get(&id)
            .map(|&i| &self.nodes[i])
            .ok_or(AudioError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, AudioError> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.nodes[i]),
            None => Err(AudioError::UnknownNode(id)),
        }
    }

    fn link(&mut self, from: NodeId, edge: Edge) -> Result<(), AudioError> {
        if from == self.destination {
            return Err(AudioError::InvalidState("destination has no outputs"));
        }
        self.node(from)?;
        let target = self.node_mut(edge.target())?;
        if target.kind.is_source() {
            return Err(AudioError::InvalidState("source nodes have no inputs"));
        }
        if let Edge::Param(to, param) = edge {
            if target.param(param).is_none() {
                return Err(AudioError::NoSuchParam { node: to, param });
            }
        }
        target.fed = true;

        let source = self.node_mut(from)?;
        if !source.outputs.contains(&edge) {
            source.outputs.push(edge);
        }
        self.routing = None;
        Ok(())
    }
}

impl AudioGraph for SoftwareGraph {
    fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.state = ContextState::Running;
        Ok(())
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId {
        let osc = Oscillator::new(waveform, self.sample_rate);
        self.insert(NodeKind::Oscillator(osc), vec![(Param::Frequency, frequency)])
    }

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> NodeId {
        let biquad = Biquad::new(kind, self.sample_rate);
        self.insert(
            NodeKind::Filter(biquad),
            vec![(Param::Frequency, frequency), (Param::Q, q)],
        )
    }

    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.insert(NodeKind::Gain, vec![(Param::Gain, gain)])
    }

    fn create_buffer(&mut self, samples: Vec<f32>) -> BufferId {
        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(id, samples.into());
        id
    }

    fn create_buffer_source(&mut self, buffer: BufferId) -> Result<NodeId, AudioError> {
        let samples = self
            .buffers
            .get(&buffer)
            .cloned()
            .ok_or(AudioError::UnknownBuffer(buffer))?;
        Ok(self.insert(NodeKind::BufferSource(BufferPlayer::new(samples)), Vec::new()))
    }

    fn release_buffer(&mut self, buffer: BufferId) -> Result<(), AudioError> {
        self.buffers
            .remove(&buffer)
            .map(|_| ())
            .ok_or(AudioError::UnknownBuffer(buffer))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        self.link(from, Edge::Audio(to))
    }

    fn connect_param(
        &mut self,
        from: NodeId,
        to: NodeId,
        param: Param,
    ) -> Result<(), AudioError> {
        self.link(from, Edge::Param(to, param))
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.node_mut(node)?.outputs.clear();
        self.routing = None;
        Ok(())
    }

    fn start(&mut self, node: NodeId, when: f64) -> Result<(), AudioError> {
        let node = self.node_mut(node)?;
        if !node.kind.is_source() {
            return Err(AudioError::InvalidState("only source nodes can start"));
        }
        if node.playback.start.is_some() {
            return Err(AudioError::InvalidState("source already started"));
        }
        node.playback.start = Some(when);
        Ok(())
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<(), AudioError> {
        let node = self.node_mut(node)?;
        if node.playback.start.is_none() {
            return Err(AudioError::InvalidState("source stopped before start"));
        }
        node.playback.stop = Some(when);
        Ok(())
    }

    fn schedule(
        &mut self,
        node: NodeId,
        param: Param,
        automation: Automation,
    ) -> Result<(), AudioError> {
        let now = self.current_time();
        self.node_mut(node)?
            .param_mut(param)
            .ok_or(AudioError::NoSuchParam { node, param })?
            .schedule(automation, now);
        Ok(())
    }

    fn cancel_scheduled_values(
        &mut self,
        node: NodeId,
        param: Param,
        from: f64,
    ) -> Result<(), AudioError> {
        self.node_mut(node)?
            .param_mut(param)
            .ok_or(AudioError::NoSuchParam { node, param })?
            .cancel(from);
        Ok(())
    }
}

/// Software graph shared between the game thread and an output thread
///
/// Every operation locks the graph for its duration, so all graph mutation is
/// serialized no matter which thread issues it.
#[derive(Clone)]
pub struct SharedGraph {
    inner: Arc<Mutex<SoftwareGraph>>,
}

impl SharedGraph {
    pub fn new(graph: SoftwareGraph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Lock the graph (a poisoned lock still yields the graph)
    pub fn lock(&self) -> MutexGuard<'_, SoftwareGraph> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn render_block(&self, out: &mut [f32]) {
        self.lock().render_block(out);
    }
}

impl AudioGraph for SharedGraph {
    fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.lock().sample_rate()
    }

    fn state(&self) -> ContextState {
        self.lock().state()
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.lock().resume()
    }

    fn destination(&self) -> NodeId {
        self.lock().destination()
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId {
        self.lock().create_oscillator(waveform, frequency)
    }

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> NodeId {
        self.lock().create_filter(kind, frequency, q)
    }

    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.lock().create_gain(gain)
    }

    fn create_buffer(&mut self, samples: Vec<f32>) -> BufferId {
        self.lock().create_buffer(samples)
    }

    fn create_buffer_source(&mut self, buffer: BufferId) -> Result<NodeId, AudioError> {
        self.lock().create_buffer_source(buffer)
    }

    fn release_buffer(&mut self, buffer: BufferId) -> Result<(), AudioError> {
        self.lock().release_buffer(buffer)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        self.lock().connect(from, to)
    }

    fn connect_param(
        &mut self,
        from: NodeId,
        to: NodeId,
        param: Param,
    ) -> Result<(), AudioError> {
        self.lock().connect_param(from, to, param)
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), AudioError> {
        self.lock().disconnect(node)
    }

    fn start(&mut self, node: NodeId, when: f64) -> Result<(), AudioError> {
        self.lock().start(node, when)
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<(), AudioError> {
        self.lock().stop(node, when)
    }

    fn schedule(
        &mut self,
        node: NodeId,
        param: Param,
        automation: Automation,
    ) -> Result<(), AudioError> {
        self.lock().schedule(node, param, automation)
    }

    fn cancel_scheduled_values(
        &mut self,
        node: NodeId,
        param: Param,
        from: f64,
    ) -> Result<(), AudioError> {
        self.lock().cancel_scheduled_values(node, param, from)
    }
}
