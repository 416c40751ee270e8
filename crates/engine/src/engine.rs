//! The execution engine
//!
//! `Engine` is the public handle. It owns the worker pool and an
//! `Arc<EngineCore>` shared with the workers; the core holds the
//! registries, the ready queue, the diagnostics sink and the counters.
//!
//! ## Turns
//!
//! A worker that pops a contract holds its lease for one turn. The turn
//! takes deliveries in arrival order, steps the addressed agent's policy
//! and applies the effects, until no delivery is left, the contract is
//! terminal, or the step or time budget is spent. Leftover work puts the
//! contract back at the end of the ready queue.
//!
//! ## Failure handling
//!
//! Nothing that happens inside a turn is returned to a caller. Refused
//! transitions, unroutable messages, expired messages, work for terminal
//! contracts and policy panics go to the `DiagnosticSink`. A panicking
//! policy aborts its contract; the worker keeps running.

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
use crate::registry::{ContractSlot, Delivery, DeliveryKind, Registry};
use crate::scheduler::{panic_message, ReadyQueue, TurnRunner, WorkerPool};
use crate::stats::{Counters, EngineStats};
use parking_lot::RwLock;
use scaf_agent::{Agent, AgentPolicy, Effect, Message, OutboundMessage};
use scaf_contract::{Contract, ContractView};
use scaf_core::{
    AgentId, ContractId, Document, EngineError, Limits, Performative, PostError, SubmitError,
    Timestamp,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

pub(crate) struct EngineCore {
    config: EngineConfig,
    registry: Registry,
    ready: ReadyQueue,
    sink: Arc<dyn DiagnosticSink>,
    counters: Counters,
    accepting: AtomicBool,
    // Held shared by submit and post, exclusively while intake closes
    intake: RwLock<()>,
}

/// Concurrent engine running agents against contracts
///
/// Dropping the engine shuts it down.
pub struct Engine {
    core: Arc<EngineCore>,
    pool: WorkerPool,
}

impl Engine {
    /// Start an engine with `worker_count` workers and default settings
    ///
    /// `0` starts one worker per available core.
    pub fn new(worker_count: usize) -> Self {
        let config = EngineConfig {
            workers: Some(worker_count),
            ..EngineConfig::default()
        };
        Self::start(config, Arc::new(TracingSink))
    }

    /// Start an engine from a configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::start(config, Arc::new(TracingSink)))
    }

    /// Start an engine from a `scaf.toml` file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let config = EngineConfig::from_file(path.as_ref())?;
        Ok(Self::start(config, Arc::new(TracingSink)))
    }

    /// Configure an engine step by step
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn start(config: EngineConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let workers = config.resolved_workers();
        let core = Arc::new(EngineCore {
            config,
            registry: Registry::new(),
            ready: ReadyQueue::new(),
            sink,
            counters: Counters::default(),
            accepting: AtomicBool::new(true),
            intake: RwLock::new(()),
        });
        let pool = WorkerPool::spawn(workers, Arc::clone(&core));
        info!(
            workers,
            mailbox_capacity = core.config.mailbox_capacity,
            max_steps_per_turn = core.config.max_steps_per_turn,
            turn_budget_ms = core.config.turn_budget_ms,
            "engine started"
        );
        Engine { core, pool }
    }

    /// Settings the engine runs with
    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Register an agent under a generated name
    pub fn register_agent(&self, policy: impl AgentPolicy + 'static) -> AgentId {
        let id = AgentId::new();
        let name = format!("agent-{}", &id.to_string()[..8]);
        self.insert_agent(id, name, Arc::new(policy))
    }

    /// Register an agent with a display name
    pub fn register_agent_named(
        &self,
        name: impl Into<String>,
        policy: impl AgentPolicy + 'static,
    ) -> AgentId {
        self.insert_agent(AgentId::new(), name.into(), Arc::new(policy))
    }

    /// Register an agent whose policy is already shared
    pub fn register_shared_agent(
        &self,
        name: impl Into<String>,
        policy: Arc<dyn AgentPolicy>,
    ) -> AgentId {
        self.insert_agent(AgentId::new(), name.into(), policy)
    }

    fn insert_agent(&self, id: AgentId, name: String, policy: Arc<dyn AgentPolicy>) -> AgentId {
        debug!(agent = %id, name = %name, "agent registered");
        let agent = Agent::new(id, name, policy, self.core.config.mailbox_capacity);
        self.core.registry.insert_agent(agent)
    }

    /// Display name of an agent
    pub fn agent_name(&self, id: AgentId) -> Option<String> {
        self.core.registry.agent(id).map(|a| a.name().to_string())
    }

    /// Submit a contract
    ///
    /// The contract starts in `Proposed`; every participant gets an opening
    /// step with no message.
    ///
    /// # Errors
    ///
    /// Fails without side effects when there are no participants, a
    /// participant is not registered, the terms exceed the document limits
    /// or the engine is shut down.
    pub fn submit(
        &self,
        terms: impl Into<Document>,
        participants: impl IntoIterator<Item = AgentId>,
    ) -> Result<ContractId, SubmitError> {
        let _intake = self.core.intake.read();
        if !self.core.accepting.load(Ordering::Acquire) {
            return Err(SubmitError::ShutDown);
        }
        let terms = terms.into();
        let participants: Vec<AgentId> = participants.into_iter().collect();
        if participants.is_empty() {
            return Err(SubmitError::NoParticipants);
        }
        if let Some(unknown) = participants
            .iter()
            .find(|agent| !self.core.registry.has_agent(**agent))
        {
            return Err(SubmitError::UnknownAgent(*unknown));
        }
        self.core.config.limits.validate(&terms)?;

        let id = ContractId::new();
        let slot = self
            .core
            .registry
            .insert_contract(ContractSlot::new(Contract::propose(id, terms, participants)));
        debug!(contract = %id, participants = slot.participants().len(), "contract submitted");

        for &agent in slot.participants() {
            slot.push_delivery(
                Delivery {
                    agent,
                    kind: DeliveryKind::Opening,
                },
                &self.core.ready,
            );
        }
        Ok(id)
    }

    /// Post a directive
    ///
    /// Sends an `inform` carrying `payload` from `sender` to itself. The
    /// sender's policy acts on it when the contract is next stepped.
    pub fn post(
        &self,
        contract: ContractId,
        sender: AgentId,
        payload: impl Into<Document>,
    ) -> Result<(), PostError> {
        let message =
            OutboundMessage::new(Performative::Inform, sender, contract).with_payload(payload);
        self.post_message(sender, message)
    }

    /// Post an arbitrary message on behalf of `sender`
    ///
    /// # Errors
    ///
    /// Fails without side effects when the contract or an agent is unknown,
    /// sender or recipient does not take part in the contract, the contract
    /// is terminal, the recipient's mailbox is full or the engine is shut
    /// down.
    pub fn post_message(&self, sender: AgentId, message: OutboundMessage) -> Result<(), PostError> {
        let _intake = self.core.intake.read();
        if !self.core.accepting.load(Ordering::Acquire) {
            return Err(PostError::ShutDown);
        }
        self.core.route(sender, message)
    }

    /// Consistent copy of a contract
    pub fn snapshot(&self, contract: ContractId) -> Result<ContractView, EngineError> {
        self.core
            .registry
            .contract(contract)
            .map(|slot| slot.view())
            .ok_or(EngineError::UnknownContract(contract))
    }

    /// Ids of every submitted contract
    pub fn contract_ids(&self) -> Vec<ContractId> {
        self.core.registry.contract_ids()
    }

    /// Block until no contract has pending work and no turn is running
    pub fn drain(&self) {
        self.core.ready.drain();
    }

    /// Stop intake, finish pending work and join the workers
    ///
    /// Work accepted before intake closes is processed; anything posted
    /// afterwards is refused with `ShutDown`. Later calls return immediately.
    pub fn shutdown(&self) {
        let was_accepting = {
            let _intake = self.core.intake.write();
            self.core.accepting.swap(false, Ordering::AcqRel)
        };
        if was_accepting {
            self.core.ready.drain();
        }
        self.core.ready.signal_shutdown();
        self.pool.join();
        if was_accepting {
            info!(
                turns = Counters::read(&self.core.counters.turns),
                transitions = Counters::read(&self.core.counters.transitions),
                "engine shut down"
            );
        }
    }

    /// Check whether the engine still accepts work
    pub fn is_running(&self) -> bool {
        self.core.accepting.load(Ordering::Acquire)
    }

    /// Current metrics
    pub fn stats(&self) -> EngineStats {
        let counters = &self.core.counters;
        EngineStats {
            ready_depth: self.core.ready.depth(),
            active_turns: self.core.ready.active(),
            turns: Counters::read(&counters.turns),
            steps: Counters::read(&counters.steps),
            transitions: Counters::read(&counters.transitions),
            diagnostics: Counters::read(&counters.diagnostics),
            exclusion_violations: Counters::read(&counters.exclusion_violations),
            workers: self.pool.num_threads(),
            contracts: self.core.registry.contract_count(),
            agents: self.core.registry.agent_count(),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Holds a contract's lease for the length of a turn
struct Lease<'a> {
    slot: &'a ContractSlot,
    ready: &'a ReadyQueue,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if self.slot.release(self.ready) {
            trace!(contract = %self.slot.id(), "contract re-queued");
        }
    }
}

impl TurnRunner for EngineCore {
    fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    fn run_turn(&self, contract: ContractId) {
        let Some(slot) = self.registry.contract(contract) else {
            return;
        };

        if slot.acquire() != 0 {
            Counters::bump(&self.counters.exclusion_violations);
            error!(contract = %contract, "contract leased by more than one worker");
        }
        let _lease = Lease {
            slot: &slot,
            ready: &self.ready,
        };

        let started = Instant::now();
        let budget = self.config.turn_budget();
        let mut steps = 0;
        loop {
            if slot.is_terminal() {
                self.discard_remaining(&slot);
                break;
            }
            if steps >= self.config.max_steps_per_turn || started.elapsed() >= budget {
                trace!(contract = %contract, steps, "turn budget spent");
                break;
            }
            let Some(delivery) = slot.pop_delivery() else {
                break;
            };
            steps += 1;
            self.step(&slot, delivery);
        }
        Counters::bump(&self.counters.turns);
    }
}

impl EngineCore {
    fn step(&self, slot: &ContractSlot, delivery: Delivery) {
        let Some(agent) = self.registry.agent(delivery.agent) else {
            return;
        };
        let message = match delivery.kind {
            DeliveryKind::Opening => None,
            DeliveryKind::Mailbox => match agent.mailbox().dequeue(slot.id()) {
                Some(message) => Some(message),
                None => return,
            },
        };

        if let Some(message) = &message {
            if message.is_expired(Timestamp::now()) {
                self.report(Diagnostic::new(
                    DiagnosticKind::ExpiredMessage,
                    Some(slot.id()),
                    Some(agent.id()),
                    format!(
                        "{} from {} (seq {}) expired before delivery",
                        message.performative(),
                        message.sender(),
                        message.seq()
                    ),
                ));
                return;
            }
        }

        let view = slot.view();
        Counters::bump(&self.counters.steps);
        debug!(
            contract = %slot.id(),
            agent = %agent.id(),
            state = %view.state,
            performative = ?message.as_ref().map(|m| m.performative()),
            "step"
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            agent.step(&view, message.as_ref())
        }));
        match outcome {
            Ok(effects) => self.apply_effects(slot, &agent, effects),
            Err(payload) => self.abort_after_panic(slot, &agent, panic_message(payload.as_ref())),
        }
    }

    fn apply_effects(&self, slot: &ContractSlot, agent: &Agent, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Transition(event) => match slot.apply(event, Some(agent.id())) {
                    Ok(entry) => {
                        Counters::bump(&self.counters.transitions);
                        debug!(
                            contract = %slot.id(),
                            agent = %agent.id(),
                            event = %event,
                            state = %entry.to,
                            "transition applied"
                        );
                    }
                    Err(err) => self.report(Diagnostic::new(
                        DiagnosticKind::TransitionRejected,
                        Some(slot.id()),
                        Some(agent.id()),
                        err.to_string(),
                    )),
                },
                Effect::Emit(outbound) => {
                    let target = outbound.contract;
                    let recipient = outbound.recipient;
                    if let Err(err) = self.route(agent.id(), outbound) {
                        self.report(Diagnostic::new(
                            DiagnosticKind::UndeliverableMessage,
                            Some(target),
                            Some(agent.id()),
                            format!("message to {recipient} not delivered: {err}"),
                        ));
                    }
                }
            }
        }
    }

    fn abort_after_panic(&self, slot: &ContractSlot, agent: &Agent, reason: String) {
        error!(
            contract = %slot.id(),
            agent = %agent.id(),
            "policy panicked: {}",
            reason
        );
        let note = format!("policy of agent {} panicked: {}", agent.id(), reason);
        if slot.force_abort(note.clone()).is_ok() {
            Counters::bump(&self.counters.transitions);
        }
        self.report(Diagnostic::new(
            DiagnosticKind::WorkerPanic,
            Some(slot.id()),
            Some(agent.id()),
            note,
        ));
    }

    fn discard_remaining(&self, slot: &ContractSlot) {
        let deliveries = slot.take_deliveries();
        if deliveries.is_empty() {
            return;
        }
        let state = slot.state();
        let mut drained: Vec<AgentId> = Vec::new();
        for delivery in deliveries {
            if delivery.kind == DeliveryKind::Opening || drained.contains(&delivery.agent) {
                continue;
            }
            drained.push(delivery.agent);
            let Some(agent) = self.registry.agent(delivery.agent) else {
                continue;
            };
            for message in agent.mailbox().drain_contract(slot.id()) {
                self.report(Diagnostic::new(
                    DiagnosticKind::PostToTerminalContract,
                    Some(slot.id()),
                    Some(agent.id()),
                    format!(
                        "discarded {} from {} (seq {}): contract is {}",
                        message.performative(),
                        message.sender(),
                        message.seq(),
                        state
                    ),
                ));
            }
        }
    }

    /// Validate, stamp and enqueue a message, then schedule its contract
    fn route(&self, sender: AgentId, outbound: OutboundMessage) -> Result<(), PostError> {
        let contract = outbound.contract;
        let slot = self
            .registry
            .contract(contract)
            .ok_or(PostError::UnknownContract(contract))?;
        let from = self
            .registry
            .agent(sender)
            .ok_or(PostError::UnknownAgent(sender))?;
        let to = self
            .registry
            .agent(outbound.recipient)
            .ok_or(PostError::UnknownAgent(outbound.recipient))?;

        for agent in [sender, outbound.recipient] {
            if !slot.is_participant(agent) {
                return Err(PostError::NotParticipant { contract, agent });
            }
        }
        if slot.is_terminal() {
            return Err(PostError::TerminalContract {
                contract,
                state: slot.state(),
            });
        }

        let message: Message = from.stamp(outbound);
        trace!(
            contract = %contract,
            sender = %sender,
            recipient = %to.id(),
            seq = message.seq(),
            "message routed"
        );
        to.mailbox().enqueue(message)?;
        slot.push_delivery(
            Delivery {
                agent: to.id(),
                kind: DeliveryKind::Mailbox,
            },
            &self.ready,
        );
        Ok(())
    }

    fn report(&self, diagnostic: Diagnostic) {
        Counters::bump(&self.counters.diagnostics);
        self.sink.handle(&diagnostic);
    }
}

/// Step-by-step engine configuration
///
/// ```no_run
/// use scaf_engine::Engine;
/// use std::time::Duration;
///
/// let engine = Engine::builder()
///     .workers(4)
///     .mailbox_capacity(256)
///     .turn_budget(Duration::from_millis(5))
///     .build()
///     .unwrap();
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl EngineBuilder {
    fn new() -> Self {
        EngineBuilder {
            config: EngineConfig::default(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Start from a loaded configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Worker threads (`0` means one per core)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    /// Mailbox capacity of agents registered afterwards
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    /// Deliveries per turn
    pub fn max_steps_per_turn(mut self, steps: usize) -> Self {
        self.config.max_steps_per_turn = steps;
        self
    }

    /// Wall-clock budget per turn, millisecond precision
    pub fn turn_budget(mut self, budget: Duration) -> Self {
        self.config.turn_budget_ms = budget.as_millis() as u64;
        self
    }

    /// Document limits for submitted terms
    pub fn limits(mut self, limits: Limits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Where diagnostics go
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate the settings and start the engine
    pub fn build(self) -> Result<Engine, EngineError> {
        self.config.validate()?;
        Ok(Engine::start(self.config, self.sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use scaf_agent::DirectivePolicy;
    use scaf_core::{ContractState, Fields};

    fn engine(sink: &Arc<MemorySink>) -> Engine {
        Engine::builder()
            .workers(2)
            .diagnostics(Arc::clone(sink) as Arc<dyn DiagnosticSink>)
            .build()
            .unwrap()
    }

    fn action(name: &str) -> Document {
        Document::Mapping(Fields::new().with("action", name))
    }

    #[test]
    fn test_submit_validation() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        assert_eq!(
            engine.submit(Document::Null, Vec::new()),
            Err(SubmitError::NoParticipants)
        );
        let stranger = AgentId::new();
        assert_eq!(
            engine.submit(Document::Null, [stranger]),
            Err(SubmitError::UnknownAgent(stranger))
        );
        assert!(engine.contract_ids().is_empty());
    }

    #[test]
    fn test_terms_checked_against_limits() {
        let sink = Arc::new(MemorySink::new());
        let engine = Engine::builder()
            .workers(1)
            .limits(Limits::with_small_limits())
            .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
            .build()
            .unwrap();
        let a = engine.register_agent(DirectivePolicy);
        let terms = Document::from("x".repeat(100));
        assert!(matches!(
            engine.submit(terms, [a]),
            Err(SubmitError::TermsTooLarge(_))
        ));

        let mut at_limit = Document::Int(1);
        for _ in 0..4 {
            at_limit = Document::Sequence(vec![at_limit]);
        }
        let c = engine.submit(at_limit.clone(), [a]).unwrap();
        let bytes = engine.snapshot(c).unwrap().encode();
        let restored = ContractView::decode(&bytes, &engine.config().limits).unwrap();
        assert_eq!(restored.terms.as_ref(), &at_limit);

        let too_deep = Document::Sequence(vec![at_limit]);
        assert!(matches!(
            engine.submit(too_deep, [a]),
            Err(SubmitError::TermsTooLarge(_))
        ));
    }

    #[test]
    fn test_post_validation() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let a = engine.register_agent(DirectivePolicy);
        let outsider = engine.register_agent(DirectivePolicy);
        let c = engine.submit(Document::Null, [a]).unwrap();

        let missing = ContractId::new();
        assert_eq!(
            engine.post(missing, a, Document::Null),
            Err(PostError::UnknownContract(missing))
        );
        let ghost = AgentId::new();
        assert_eq!(
            engine.post(c, ghost, Document::Null),
            Err(PostError::UnknownAgent(ghost))
        );
        assert_eq!(
            engine.post(c, outsider, Document::Null),
            Err(PostError::NotParticipant {
                contract: c,
                agent: outsider
            })
        );
    }

    #[test]
    fn test_directive_moves_contract() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let a = engine.register_agent_named("alice", DirectivePolicy);
        let c = engine.submit(Fields::new().with("price", 100), [a]).unwrap();

        engine.post(c, a, action("Accept")).unwrap();
        engine.drain();

        let view = engine.snapshot(c).unwrap();
        assert_eq!(view.state, ContractState::Accepted);
        assert_eq!(view.last_entry().and_then(|e| e.actor), Some(a));
        assert_eq!(engine.agent_name(a).as_deref(), Some("alice"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_snapshot_unknown_contract() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let id = ContractId::new();
        assert_eq!(
            engine.snapshot(id).unwrap_err(),
            EngineError::UnknownContract(id)
        );
    }

    #[test]
    fn test_shutdown_is_idempotent_and_stops_intake() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let a = engine.register_agent(DirectivePolicy);
        let c = engine.submit(Document::Null, [a]).unwrap();

        engine.shutdown();
        engine.shutdown();
        assert!(!engine.is_running());
        assert_eq!(engine.post(c, a, action("Accept")), Err(PostError::ShutDown));
        assert_eq!(engine.submit(Document::Null, [a]), Err(SubmitError::ShutDown));
        assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);
    }

    #[test]
    fn test_terminal_contract_leaves_no_mail_behind() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let a = engine.register_agent(DirectivePolicy);
        let c = engine.submit(Document::Null, [a]).unwrap();
        engine.post(c, a, action("Reject")).unwrap();
        engine.drain();

        // two messages queued behind a single scheduled delivery
        let agent = engine.core.registry.agent(a).unwrap();
        for seq in [101, 102] {
            let outbound = OutboundMessage::new(Performative::Inform, a, c);
            agent.mailbox().enqueue(Message::stamp(a, seq, 0, outbound)).unwrap();
        }
        let slot = engine.core.registry.contract(c).unwrap();
        slot.push_delivery(
            Delivery {
                agent: a,
                kind: DeliveryKind::Mailbox,
            },
            &engine.core.ready,
        );
        engine.drain();

        assert_eq!(agent.mailbox().pending_for(c), 0);
        assert_eq!(sink.of_kind(DiagnosticKind::PostToTerminalContract).len(), 2);
        assert_eq!(engine.snapshot(c).unwrap().log.len(), 2);
    }

    #[test]
    fn test_invalid_builder_settings() {
        assert!(Engine::builder().mailbox_capacity(0).build().is_err());
        assert!(Engine::builder()
            .turn_budget(Duration::from_micros(10))
            .build()
            .is_err());
    }

    #[test]
    fn test_stats_after_work() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(&sink);
        let a = engine.register_agent(DirectivePolicy);
        let c = engine.submit(Document::Null, [a]).unwrap();
        engine.post(c, a, action("Reject")).unwrap();
        engine.drain();

        let stats = engine.stats();
        assert_eq!(stats.workers, 2);
        assert_eq!(stats.contracts, 1);
        assert_eq!(stats.agents, 1);
        assert_eq!(stats.steps, 2);
        assert_eq!(stats.transitions, 1);
        assert_eq!(stats.exclusion_violations, 0);
        assert_eq!(stats.ready_depth, 0);
        assert_eq!(stats.active_turns, 0);
        assert!(stats.turns >= 1);
    }
}
