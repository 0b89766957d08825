//! Simulation loop and the collaborators it drives: timing gate, response
//! sources, and the JSONL interaction log.

use ansprache_core::{Context, ConversationGate, InteractionRecord, Proposal, ProposalPolicy, ResponseSource};
use ansprache_scores::ProactiveAgent;
use anyhow::{Context as _, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{BufRead, Write};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};

/// Initiates a conversation iff a uniform draw reaches `threshold`.
#[derive(Debug)]
pub struct RandomGate<R> {
    threshold: f64,
    rng: R,
}

impl<R: Rng> RandomGate<R> {
    pub fn new(threshold: f64, rng: R) -> Self {
        Self { threshold, rng }
    }
}

impl<R: Rng> ConversationGate for RandomGate<R> {
    fn should_initiate(&mut self, ctx: &Context) -> bool {
        let timing: f64 = self.rng.gen();
        let go = timing >= self.threshold;
        debug!(%ctx, timing, threshold = self.threshold, go, "timing gate");
        go
    }
}

/// Bernoulli user: accepts with a fixed probability.
#[derive(Debug)]
pub struct SimulatedResponder<R> {
    accept_probability: f64,
    rng: R,
}

impl<R: Rng> SimulatedResponder<R> {
    pub fn new(accept_probability: f64, rng: R) -> Result<Self> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&accept_probability),
            "accept probability {accept_probability} is outside [0, 1]"
        );
        Ok(Self {
            accept_probability,
            rng,
        })
    }
}

impl<R: Rng> ResponseSource for SimulatedResponder<R> {
    fn respond(&mut self, _proposal: &Proposal) -> Option<bool> {
        Some(self.rng.gen_bool(self.accept_probability))
    }
}

/// Replays the `accepted` flags of a recorded log, in order.
#[derive(Debug)]
pub struct ReplayResponder {
    answers: std::vec::IntoIter<bool>,
}

impl ReplayResponder {
    pub fn from_records(records: &[InteractionRecord]) -> Self {
        let answers: Vec<bool> = records.iter().map(|r| r.accepted).collect();
        Self {
            answers: answers.into_iter(),
        }
    }
}

impl ResponseSource for ReplayResponder {
    fn respond(&mut self, _proposal: &Proposal) -> Option<bool> {
        self.answers.next()
    }
}

/// Asks on a terminal; `y` accepts, anything else rejects, EOF stops.
pub struct InteractiveResponder<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> InteractiveResponder<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }
}

impl<I: BufRead, O: Write> ResponseSource for InteractiveResponder<I, O> {
    fn respond(&mut self, proposal: &Proposal) -> Option<bool> {
        let _ = write!(self.output, "user (accept: y / decline: n): ");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let accepted = line.trim().eq_ignore_ascii_case("y");
                debug!(ability = %proposal.ability, accepted, "interactive response");
                Some(accepted)
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub cycles: usize,
    pub held_back: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// The response source ran dry before all cycles were done.
    pub exhausted: bool,
}

impl SimulationSummary {
    #[must_use]
    pub fn proposals(&self) -> usize {
        self.accepted + self.rejected
    }
}

/// Runs up to `cycles` rounds of context sampling, gating, proposing and
/// learning. Narration goes to `out`; one [`InteractionRecord`] per answered
/// proposal goes to `log`.
#[allow(clippy::too_many_arguments)]
pub fn run_simulation<A, G, S, R>(
    agent: &mut ProactiveAgent<A>,
    gate: &mut G,
    responses: &mut S,
    contexts: &[Context],
    sampler: &mut R,
    cycles: usize,
    out: &mut dyn Write,
    mut log: Option<&mut dyn Write>,
) -> Result<SimulationSummary>
where
    A: Rng,
    G: ConversationGate,
    S: ResponseSource + ?Sized,
    R: Rng,
{
    let mut summary = SimulationSummary::default();

    for _ in 0..cycles {
        let ctx = contexts
            .choose(sampler)
            .context("no contexts configured")?;
        summary.cycles += 1;

        if !gate.should_initiate(ctx) {
            summary.held_back += 1;
            writeln!(out, "[{ctx}] robot held back.")?;
            continue;
        }

        let proposal = agent.propose(ctx)?;
        writeln!(
            out,
            "[{ctx}] robot: \"Shall I help you with {}?\" ({})",
            proposal.ability, proposal.why
        )?;

        let Some(accepted) = responses.respond(&proposal) else {
            agent.abandon();
            summary.cycles -= 1;
            summary.exhausted = true;
            info!("response source exhausted, stopping");
            break;
        };

        agent.feedback(ctx, &proposal.ability, accepted)?;
        if accepted {
            summary.accepted += 1;
        } else {
            summary.rejected += 1;
            writeln!(out, "[{ctx}] declined.")?;
        }

        let score_after = agent.store().get(ctx, &proposal.ability)?.score;
        writeln!(out, "[{ctx}] scores: {}", format_scores(agent, ctx))?;

        if let Some(log) = log.as_deref_mut() {
            let record = InteractionRecord {
                ts: Some(iso8601_now()),
                location: ctx.location.clone(),
                activity: ctx.activity.clone(),
                ability: proposal.ability.clone(),
                accepted,
                score_after: Some(score_after),
            };
            serde_json::to_writer(&mut *log, &record)?;
            writeln!(log)?;
        }
    }

    info!(
        cycles = summary.cycles,
        held_back = summary.held_back,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "simulation finished"
    );
    Ok(summary)
}

fn format_scores<A: Rng>(agent: &ProactiveAgent<A>, ctx: &Context) -> String {
    agent
        .entries_for(ctx)
        .iter()
        .map(|(ability, e)| format!("{ability}={:.2}({})", e.score, e.acceptance_count))
        .collect::<Vec<_>>()
        .join(" ")
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ansprache_core::record::read_jsonl;
    use ansprache_core::{AgentConfig, SimilarityTable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn kitchen_config() -> AgentConfig {
        AgentConfig {
            locations: vec!["kitchen".into()],
            activities: vec!["cleaning".into()],
            abilities: vec!["wipe".into(), "sweep".into()],
            ..AgentConfig::default()
        }
    }

    fn agent() -> ProactiveAgent {
        let table = SimilarityTable::from_json_str(r#"{"wipe": {"sweep": 0.5}}"#).unwrap();
        ProactiveAgent::seeded(&kitchen_config(), table, 9).unwrap()
    }

    #[test]
    fn gate_threshold_bounds() {
        let ctx = Context::new("kitchen", "cleaning");
        let mut always = RandomGate::new(0.0, StdRng::seed_from_u64(1));
        let mut never = RandomGate::new(1.0, StdRng::seed_from_u64(1));
        for _ in 0..100 {
            assert!(always.should_initiate(&ctx));
            assert!(!never.should_initiate(&ctx));
        }
    }

    #[test]
    fn gate_is_roughly_fair_at_one_half() {
        let ctx = Context::new("kitchen", "cleaning");
        let mut gate = RandomGate::new(0.5, StdRng::seed_from_u64(3));
        let opened = (0..1000).filter(|_| gate.should_initiate(&ctx)).count();
        assert!((350..650).contains(&opened), "opened {opened} of 1000");
    }

    #[test]
    fn replay_yields_recorded_answers_then_stops() {
        let records = read_jsonl(Cursor::new(
            "{\"location\":\"k\",\"activity\":\"c\",\"ability\":\"wipe\",\"accepted\":true}\n\
             {\"location\":\"k\",\"activity\":\"c\",\"ability\":\"sweep\",\"accepted\":false}\n",
        ))
        .unwrap();
        let mut replay = ReplayResponder::from_records(&records);
        let p = Proposal {
            context: Context::new("k", "c"),
            ability: "wipe".into(),
            score: 1.0,
            why: "max score".into(),
        };
        assert_eq!(replay.respond(&p), Some(true));
        assert_eq!(replay.respond(&p), Some(false));
        assert_eq!(replay.respond(&p), None);
    }

    #[test]
    fn interactive_reads_y_and_n_until_eof() {
        let input = Cursor::new("y\nN\nY\n");
        let mut prompt = Vec::new();
        let mut responder = InteractiveResponder::new(input, &mut prompt);
        let p = Proposal {
            context: Context::new("k", "c"),
            ability: "wipe".into(),
            score: 1.0,
            why: "max score".into(),
        };
        assert_eq!(responder.respond(&p), Some(true));
        assert_eq!(responder.respond(&p), Some(false));
        assert_eq!(responder.respond(&p), Some(true));
        assert_eq!(responder.respond(&p), None);
        drop(responder);
        assert!(String::from_utf8_lossy(&prompt).contains("accept: y"));
    }

    #[test]
    fn simulated_responder_extremes() {
        let p = Proposal {
            context: Context::new("k", "c"),
            ability: "wipe".into(),
            score: 1.0,
            why: "max score".into(),
        };
        let mut yes = SimulatedResponder::new(1.0, StdRng::seed_from_u64(0)).unwrap();
        let mut no = SimulatedResponder::new(0.0, StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(yes.respond(&p), Some(true));
        assert_eq!(no.respond(&p), Some(false));
    }

    #[test]
    fn simulated_responder_refuses_bad_probability() {
        for p in [f64::NAN, f64::INFINITY, -0.1, 1.5] {
            assert!(SimulatedResponder::new(p, StdRng::seed_from_u64(0)).is_err());
        }
    }

    #[test]
    fn scripted_run_learns_and_logs() {
        let mut agent = agent();
        let contexts = kitchen_config().contexts();
        let mut gate = |_: &Context| true;
        let mut script = vec![true, false, true].into_iter();
        let mut responses = move |_: &Proposal| script.next();
        let mut sampler = StdRng::seed_from_u64(0);
        let mut out = Vec::new();
        let mut log = Vec::new();

        let summary = run_simulation(
            &mut agent,
            &mut gate,
            &mut responses,
            &contexts,
            &mut sampler,
            10,
            &mut out,
            Some(&mut log as &mut dyn Write),
        )
        .unwrap();

        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert!(summary.exhausted);
        assert!(agent.pending().is_none());

        let records = read_jsonl(Cursor::new(log)).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.ts.is_some() && r.score_after.is_some()));
        assert_eq!(
            records.iter().map(|r| r.accepted).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        let narration = String::from_utf8(out).unwrap();
        assert!(narration.contains("Shall I help you with"));
        assert!(narration.contains("declined."));
    }

    #[test]
    fn closed_gate_never_proposes() {
        let mut agent = agent();
        let contexts = kitchen_config().contexts();
        let mut gate = |_: &Context| false;
        let mut responses = |_: &Proposal| -> Option<bool> { panic!("no proposal expected") };
        let mut sampler = StdRng::seed_from_u64(0);
        let mut out = Vec::new();

        let summary = run_simulation(
            &mut agent,
            &mut gate,
            &mut responses,
            &contexts,
            &mut sampler,
            5,
            &mut out,
            None,
        )
        .unwrap();

        assert_eq!(summary.held_back, 5);
        assert_eq!(summary.proposals(), 0);
        let snap = agent.snapshot();
        assert_eq!(snap["contexts"]["kitchen/cleaning"]["wipe"]["score"], serde_json::json!(1.0));
    }

    #[test]
    fn empty_context_list_is_an_error() {
        let mut agent = agent();
        let mut gate = |_: &Context| true;
        let mut responses = |_: &Proposal| Some(true);
        let mut sampler = StdRng::seed_from_u64(0);
        let mut out = Vec::new();
        let res = run_simulation(
            &mut agent,
            &mut gate,
            &mut responses,
            &[],
            &mut sampler,
            1,
            &mut out,
            None,
        );
        assert!(res.is_err());
    }
}
