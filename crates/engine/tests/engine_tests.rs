//! Engine Integration Tests
//!
//! Drives the engine through its public API: contract lifecycles, message
//! ordering, per-contract exclusion, fault isolation and the bounded
//! resources (mailboxes, turn budgets).

use parking_lot::Mutex;
use scaf_agent::{DirectivePolicy, Effect, Message, OutboundMessage};
use scaf_contract::ContractView;
use scaf_core::{
    AgentId, ContractEvent, ContractId, ContractState, Document, EngineError, Fields, Performative,
    PostError, Timestamp,
};
use scaf_engine::{DiagnosticKind, DiagnosticSink, Engine, EngineConfig, MemorySink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn action(name: &str) -> Document {
    Document::Mapping(Fields::new().with("action", name))
}

fn idle(_: &ContractView, _: Option<&Message>) -> Vec<Effect> {
    Vec::new()
}

fn engine(workers: usize, sink: &Arc<MemorySink>) -> Engine {
    Engine::builder()
        .workers(workers)
        .diagnostics(Arc::clone(sink) as Arc<dyn DiagnosticSink>)
        .build()
        .unwrap()
}

/// Policy whose opening step blocks until the test releases it.
///
/// With a single worker this holds the whole pool, so work queued in the
/// meantime stays queued.
struct Gate {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl Gate {
    fn new() -> Self {
        Gate {
            entered: Arc::new(Barrier::new(2)),
            release: Arc::new(Barrier::new(2)),
        }
    }

    fn register(&self, engine: &Engine) -> AgentId {
        let entered = Arc::clone(&self.entered);
        let release = Arc::clone(&self.release);
        engine.register_agent_named(
            "gate",
            move |_: &ContractView, message: Option<&Message>| -> Vec<Effect> {
                if message.is_none() {
                    entered.wait();
                    release.wait();
                }
                Vec::new()
            },
        )
    }

    /// Submit a contract for the gate agent and wait until a worker is stuck in it
    fn close(&self, engine: &Engine) {
        let gate = self.register(engine);
        engine.submit(Document::Null, [gate]).unwrap();
        self.entered.wait();
    }

    fn open(&self) {
        self.release.wait();
    }
}

// ============================================================================
// Lifecycle Scenarios
// ============================================================================

#[test]
fn test_accept_begin_complete_settles() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(4, &sink);
    let a = engine.register_agent_named("buyer", DirectivePolicy);
    let b = engine.register_agent_named("seller", DirectivePolicy);

    let c = engine
        .submit(Fields::new().with("price", 100), [a, b])
        .unwrap();
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);

    engine.post(c, a, action("Accept")).unwrap();
    engine.drain();
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Accepted);

    // second accept is refused: Accepted does not take Accept
    engine.post(c, b, action("Accept")).unwrap();
    engine.drain();
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Accepted);

    engine.post(c, a, action("Begin")).unwrap();
    engine.post(c, a, action("Complete")).unwrap();
    engine.drain();

    let view = engine.snapshot(c).unwrap();
    assert_eq!(view.state, ContractState::Settled);
    assert_eq!(view.log.len(), 4);
    let events: Vec<_> = view.log.iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            ContractEvent::Propose,
            ContractEvent::Accept,
            ContractEvent::Begin,
            ContractEvent::Complete
        ]
    );
    assert_eq!(view.log[1].actor, Some(a));
    assert_eq!(view.terms.get("price"), Some(&Document::Int(100)));

    let rejected = sink.of_kind(DiagnosticKind::TransitionRejected);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].agent, Some(b));
    assert_eq!(rejected[0].contract, Some(c));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_reject_is_terminal() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(2, &sink);
    let a = engine.register_agent(DirectivePolicy);
    let b = engine.register_agent(DirectivePolicy);
    let c = engine.submit(Document::Null, [a, b]).unwrap();

    engine.post(c, a, action("Reject")).unwrap();
    engine.drain();

    let view = engine.snapshot(c).unwrap();
    assert_eq!(view.state, ContractState::Rejected);
    assert!(view.is_terminal());
    assert_eq!(view.log.len(), 2);

    for agent in [a, b] {
        assert_eq!(
            engine.post(c, agent, action("Accept")),
            Err(PostError::TerminalContract {
                contract: c,
                state: ContractState::Rejected
            })
        );
    }
    assert_eq!(engine.snapshot(c).unwrap().log.len(), 2);
}

#[test]
fn test_agents_negotiate_through_messages() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(2, &sink);
    let seller = engine.register_agent_named("seller", DirectivePolicy);

    // the buyer accepts the seller's terms as soon as the contract opens
    let buyer = engine.register_agent_named(
        "buyer",
        move |view: &ContractView, message: Option<&Message>| -> Vec<Effect> {
            match message {
                None => vec![Effect::Emit(
                    OutboundMessage::new(Performative::AcceptProposal, seller, view.id)
                        .with_protocol("fipa-contract-net"),
                )],
                Some(_) => Vec::new(),
            }
        },
    );

    let c = engine.submit(Document::Null, [seller, buyer]).unwrap();
    engine.drain();

    let view = engine.snapshot(c).unwrap();
    assert_eq!(view.state, ContractState::Accepted);
    assert_eq!(view.last_entry().and_then(|e| e.actor), Some(seller));
    assert!(sink.is_empty());
}

#[test]
fn test_unknown_action_answered_with_not_understood() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(2, &sink);
    let a = engine.register_agent(DirectivePolicy);
    let c = engine.submit(Document::Null, [a]).unwrap();

    engine.post(c, a, action("Explode")).unwrap();
    engine.drain();

    // opening, the directive, and the not_understood reply to itself
    assert_eq!(engine.stats().steps, 3);
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);
    assert!(sink.is_empty());
}

// ============================================================================
// Ordering and Exclusion
// ============================================================================

#[test]
fn test_fifo_per_sender() {
    const SENDERS: usize = 4;
    const PER_SENDER: i64 = 50;

    let sink = Arc::new(MemorySink::new());
    let engine = Arc::new(engine(4, &sink));

    let seen: Arc<Mutex<Vec<(AgentId, u64, i64)>>> = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let receiver = engine.register_agent_named(
        "receiver",
        move |_: &ContractView, message: Option<&Message>| -> Vec<Effect> {
            if let Some(m) = message {
                let n = m.payload().as_int().unwrap_or(-1);
                record.lock().push((m.sender(), m.seq(), n));
            }
            Vec::new()
        },
    );
    let senders: Vec<AgentId> = (0..SENDERS)
        .map(|_| engine.register_agent(idle))
        .collect();

    let mut participants = senders.clone();
    participants.push(receiver);
    let c = engine.submit(Document::Null, participants).unwrap();

    let barrier = Arc::new(Barrier::new(SENDERS));
    let handles: Vec<_> = senders
        .iter()
        .map(|&sender| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_SENDER {
                    let message =
                        OutboundMessage::new(Performative::Inform, receiver, c).with_payload(i);
                    engine.post_message(sender, message).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    engine.drain();

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), SENDERS * PER_SENDER as usize);
    for sender in senders {
        let from_sender: Vec<_> = seen.iter().filter(|(s, _, _)| *s == sender).collect();
        let payloads: Vec<i64> = from_sender.iter().map(|(_, _, n)| *n).collect();
        assert_eq!(payloads, (0..PER_SENDER).collect::<Vec<_>>());
        assert!(from_sender.windows(2).all(|w| w[0].1 < w[1].1));
    }
}

#[test]
fn test_one_worker_per_contract_under_load() {
    const CONTRACTS: usize = 16;
    const POSTERS: usize = 4;
    const POSTS_PER_THREAD: usize = 100;

    let sink = Arc::new(MemorySink::new());
    let engine = Arc::new(engine(8, &sink));

    let in_flight: Arc<Mutex<HashMap<ContractId, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let policy = {
        let in_flight = Arc::clone(&in_flight);
        let overlaps = Arc::clone(&overlaps);
        Arc::new(
            move |view: &ContractView, _: Option<&Message>| -> Vec<Effect> {
                {
                    let mut map = in_flight.lock();
                    let count = map.entry(view.id).or_insert(0);
                    *count += 1;
                    if *count > 1 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                }
                thread::yield_now();
                *in_flight.lock().entry(view.id).or_insert(1) -= 1;
                Vec::new()
            },
        )
    };

    let mut contracts = Vec::new();
    for i in 0..CONTRACTS {
        let a = engine.register_shared_agent(format!("a{i}"), policy.clone());
        let b = engine.register_shared_agent(format!("b{i}"), policy.clone());
        let c = engine.submit(Document::Null, [a, b]).unwrap();
        contracts.push((c, a, b));
    }
    let contracts = Arc::new(contracts);

    let barrier = Arc::new(Barrier::new(POSTERS));
    let handles: Vec<_> = (0..POSTERS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let contracts = Arc::clone(&contracts);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..POSTS_PER_THREAD {
                    let (c, a, b) = contracts[(t + i) % contracts.len()];
                    let sender = if i % 2 == 0 { a } else { b };
                    engine.post(c, sender, i as i64).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    engine.drain();

    let stats = engine.stats();
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(stats.exclusion_violations, 0);
    assert_eq!(
        stats.steps as usize,
        CONTRACTS * 2 + POSTERS * POSTS_PER_THREAD
    );
    assert_eq!(stats.contracts, CONTRACTS);
    assert_eq!(stats.agents, CONTRACTS * 2);
    assert!(sink.is_empty());
}

// ============================================================================
// Fault Isolation
// ============================================================================

#[test]
fn test_panicking_policy_aborts_only_its_contract() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(2, &sink);
    let faulty = engine.register_agent_named(
        "faulty",
        |_: &ContractView, message: Option<&Message>| -> Vec<Effect> {
            if message.is_some() {
                panic!("policy bug");
            }
            Vec::new()
        },
    );
    let healthy = engine.register_agent(DirectivePolicy);

    let broken = engine.submit(Document::Null, [faulty]).unwrap();
    let fine = engine.submit(Document::Null, [healthy]).unwrap();

    engine.post(broken, faulty, Document::Null).unwrap();
    engine.drain();

    let view = engine.snapshot(broken).unwrap();
    assert_eq!(view.state, ContractState::Aborted);
    let last = view.last_entry().unwrap();
    assert_eq!(last.event, ContractEvent::Fail);
    assert!(last.note.as_deref().unwrap_or_default().contains("policy bug"));

    let panics = sink.of_kind(DiagnosticKind::WorkerPanic);
    assert_eq!(panics.len(), 1);
    assert_eq!(panics[0].contract, Some(broken));
    assert_eq!(panics[0].agent, Some(faulty));

    // workers survived
    engine.post(fine, healthy, action("Accept")).unwrap();
    engine.drain();
    assert_eq!(engine.snapshot(fine).unwrap().state, ContractState::Accepted);
}

#[test]
fn test_emit_to_non_participant_is_undeliverable() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(2, &sink);
    let outsider = engine.register_agent(DirectivePolicy);
    let chatty = engine.register_agent(
        move |view: &ContractView, message: Option<&Message>| -> Vec<Effect> {
            match message {
                None => vec![Effect::Emit(OutboundMessage::new(
                    Performative::Inform,
                    outsider,
                    view.id,
                ))],
                Some(_) => Vec::new(),
            }
        },
    );

    let c = engine.submit(Document::Null, [chatty]).unwrap();
    engine.drain();

    let undeliverable = sink.of_kind(DiagnosticKind::UndeliverableMessage);
    assert_eq!(undeliverable.len(), 1);
    assert_eq!(undeliverable[0].contract, Some(c));
    assert_eq!(undeliverable[0].agent, Some(chatty));
    assert!(undeliverable[0].detail.contains(&outsider.to_string()));
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);
}

#[test]
fn test_expired_message_discarded() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(1, &sink);
    let a = engine.register_agent(DirectivePolicy);
    let c = engine.submit(Document::Null, [a]).unwrap();

    let stale = OutboundMessage::new(Performative::Inform, a, c)
        .with_payload(action("Accept"))
        .with_reply_by(Timestamp::from_micros(1));
    engine.post_message(a, stale).unwrap();
    engine.drain();

    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);
    assert_eq!(sink.of_kind(DiagnosticKind::ExpiredMessage).len(), 1);
}

// ============================================================================
// Bounded Resources
// ============================================================================

#[test]
fn test_mailbox_overflow_rejects_post() {
    let sink = Arc::new(MemorySink::new());
    let engine = Engine::builder()
        .workers(1)
        .mailbox_capacity(2)
        .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build()
        .unwrap();
    let gate = Gate::new();
    gate.close(&engine);

    let a = engine.register_agent(DirectivePolicy);
    let c = engine.submit(Document::Null, [a]).unwrap();
    engine.post(c, a, Document::Null).unwrap();
    engine.post(c, a, Document::Null).unwrap();
    assert_eq!(
        engine.post(c, a, action("Accept")),
        Err(PostError::MailboxOverflow { agent: a, capacity: 2 })
    );

    gate.open();
    engine.drain();

    // the rejected directive never ran
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Proposed);
    engine.post(c, a, action("Accept")).unwrap();
    engine.drain();
    assert_eq!(engine.snapshot(c).unwrap().state, ContractState::Accepted);
}

#[test]
fn test_work_after_terminal_is_discarded() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(1, &sink);
    let gate = Gate::new();
    gate.close(&engine);

    let a = engine.register_agent(DirectivePolicy);
    let c = engine.submit(Document::Null, [a]).unwrap();
    engine.post(c, a, action("Reject")).unwrap();
    engine.post(c, a, action("Accept")).unwrap();
    engine.post(c, a, action("CounterOffer")).unwrap();

    gate.open();
    engine.drain();

    let view = engine.snapshot(c).unwrap();
    assert_eq!(view.state, ContractState::Rejected);
    assert_eq!(view.log.len(), 2);
    let discarded = sink.of_kind(DiagnosticKind::PostToTerminalContract);
    assert_eq!(discarded.len(), 2);
    assert!(discarded.iter().all(|d| d.contract == Some(c)));
    assert_eq!(sink.of_kind(DiagnosticKind::TransitionRejected).len(), 0);
}

#[test]
fn test_step_budget_requeues_contract() {
    let sink = Arc::new(MemorySink::new());
    let engine = Engine::builder()
        .workers(1)
        .max_steps_per_turn(2)
        .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build()
        .unwrap();
    let a = engine.register_agent(idle);
    let c = engine.submit(Document::Null, [a]).unwrap();
    for i in 0..10 {
        engine.post(c, a, i).unwrap();
    }
    engine.drain();

    let stats = engine.stats();
    assert_eq!(stats.steps, 11);
    assert!(stats.turns >= 6, "turns = {}", stats.turns);
    assert_eq!(stats.ready_depth, 0);
}

#[test]
fn test_time_budget_requeues_contract() {
    let sink = Arc::new(MemorySink::new());
    let engine = Engine::builder()
        .workers(1)
        .turn_budget(Duration::from_millis(1))
        .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build()
        .unwrap();
    let slow = engine.register_agent(|_: &ContractView, _: Option<&Message>| -> Vec<Effect> {
        thread::sleep(Duration::from_millis(3));
        Vec::new()
    });
    let c = engine.submit(Document::Null, [slow]).unwrap();
    for i in 0..3 {
        engine.post(c, slow, i).unwrap();
    }
    engine.drain();

    let stats = engine.stats();
    assert_eq!(stats.steps, 4);
    assert!(stats.turns >= 4, "turns = {}", stats.turns);
}

#[test]
fn test_contracts_progress_round_robin() {
    let sink = Arc::new(MemorySink::new());
    let engine = Engine::builder()
        .workers(1)
        .max_steps_per_turn(1)
        .diagnostics(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build()
        .unwrap();
    let gate = Gate::new();
    gate.close(&engine);

    let order: Arc<Mutex<Vec<ContractId>>> = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&order);
    let a = engine.register_agent(
        move |view: &ContractView, _: Option<&Message>| -> Vec<Effect> {
            record.lock().push(view.id);
            Vec::new()
        },
    );
    let first = engine.submit(Document::Null, [a]).unwrap();
    let second = engine.submit(Document::Null, [a]).unwrap();
    for _ in 0..2 {
        engine.post(first, a, Document::Null).unwrap();
        engine.post(second, a, Document::Null).unwrap();
    }

    gate.open();
    engine.drain();

    assert_eq!(
        *order.lock(),
        vec![first, second, first, second, first, second]
    );
}

// ============================================================================
// Configuration and Lifecycle
// ============================================================================

#[test]
fn test_engine_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(scaf_engine::CONFIG_FILE_NAME);
    std::fs::write(&path, "workers = 2\nmailbox_capacity = 3\n").unwrap();

    let engine = Engine::from_config_file(&path).unwrap();
    assert_eq!(engine.stats().workers, 2);
    assert_eq!(engine.config().mailbox_capacity, 3);
    assert_eq!(engine.config().max_steps_per_turn, 64);
}

#[test]
fn test_engine_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "max_steps_per_turn = 0\n").unwrap();
    assert!(matches!(
        Engine::from_config_file(&path),
        Err(EngineError::Config(_))
    ));
    assert!(Engine::from_config_file(dir.path().join("missing.toml")).is_err());

    let config = EngineConfig {
        log_level: "loud".into(),
        ..EngineConfig::default()
    };
    assert!(Engine::with_config(config).is_err());
}

#[test]
fn test_drop_finishes_pending_work() {
    let sink = Arc::new(MemorySink::new());
    let steps = Arc::new(AtomicUsize::new(0));
    {
        let engine = engine(2, &sink);
        let counter = Arc::clone(&steps);
        let a = engine.register_agent(move |_: &ContractView, _: Option<&Message>| -> Vec<Effect> {
            counter.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        });
        let c = engine.submit(Document::Null, [a]).unwrap();
        for i in 0..20 {
            engine.post(c, a, i).unwrap();
        }
    }
    assert_eq!(steps.load(Ordering::SeqCst), 21);
}

#[test]
fn test_post_racing_shutdown_is_processed_or_refused() {
    for _ in 0..20 {
        let sink = Arc::new(MemorySink::new());
        let engine = engine(2, &sink);
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&processed);
        let a = engine.register_agent(move |_: &ContractView, m: Option<&Message>| -> Vec<Effect> {
            if m.is_some() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Vec::new()
        });
        let c = engine.submit(Document::Null, [a]).unwrap();

        let accepted = thread::scope(|scope| {
            let poster = scope.spawn(|| {
                let mut accepted: usize = 0;
                loop {
                    match engine.post(c, a, accepted as i64) {
                        Ok(()) => accepted += 1,
                        Err(PostError::ShutDown) => break accepted,
                        Err(PostError::MailboxOverflow { .. }) => thread::yield_now(),
                        Err(other) => panic!("unexpected post error: {other}"),
                    }
                }
            });
            thread::sleep(Duration::from_millis(2));
            engine.shutdown();
            poster.join().unwrap()
        });

        // everything accepted before intake closed ran; nothing slipped in after
        assert_eq!(processed.load(Ordering::SeqCst), accepted);
        assert_eq!(engine.stats().ready_depth, 0);
        assert_eq!(engine.post(c, a, Document::Null), Err(PostError::ShutDown));
        drop(engine);
        assert_eq!(processed.load(Ordering::SeqCst), accepted);
    }
}
