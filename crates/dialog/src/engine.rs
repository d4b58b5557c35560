//! The transition function.
//!
//! [`Engine::advance`] consumes one line of user text, mutates the session,
//! and returns the side effects as an ordered [`Action`] list. The caller
//! (the webhook dispatcher) executes them while holding the user's lane
//! lock, so one inbound event is one atomic read-compute-write.
//!
//! Rule order, highest priority first: menu commands, then the agent-chat
//! stop keyword, then agent-chat relay, then field collection, then the
//! idle fallback.

use std::collections::BTreeMap;

use confab_events::EndReason;

use crate::{
    error::{Error, Result},
    payload::{ChatLogPayload, CustomerPayload, PaymentPayload, Submission, is_phone_shaped, parse_amount},
    prompts::{self, command},
    state::{DialogState, Flow, Session},
};

/// Stop keyword used when none is configured.
pub const DEFAULT_STOP_KEYWORD: &str = "stop";

// ── Actions ─────────────────────────────────────────────────────────────────

/// One side effect, to be executed in list order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send `text` to the user; `menu` attaches the main-menu keyboard.
    Reply { text: String, menu: bool },
    /// Call the flow's downstream service and report its outcome to the
    /// user before moving on to the next action.
    Submit(Submission),
    /// Publish on the agent event bus.
    Publish(Signal),
}

impl Action {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply {
            text: text.into(),
            menu: false,
        }
    }

    pub fn reply_with_menu(text: impl Into<String>) -> Self {
        Self::Reply {
            text: text.into(),
            menu: true,
        }
    }
}

/// Bus notification requested by the engine. The dispatcher stamps the user
/// identity and timestamp when turning it into a wire event.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The user entered agent handoff.
    Opened,
    /// A user message to relay to the dashboards.
    Inbound { text: String },
    /// The handoff ended.
    Closed { reason: EndReason },
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Pure dialog state machine, parameterized by the reserved stop keyword.
#[derive(Debug, Clone)]
pub struct Engine {
    stop_keyword: String,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_KEYWORD)
    }
}

impl Engine {
    pub fn new(stop_keyword: impl Into<String>) -> Self {
        Self {
            stop_keyword: stop_keyword.into(),
        }
    }

    pub fn stop_keyword(&self) -> &str {
        &self.stop_keyword
    }

    /// Handle a `conversation_started` greeting.
    ///
    /// Always resets: replaying the greeting mid-flow drops the flow, so no
    /// stale fields can leak into whatever the user starts next.
    pub fn greet(&self, session: &mut Session) -> Vec<Action> {
        session.reset();
        vec![Action::reply_with_menu(prompts::WELCOME)]
    }

    /// Handle one line of user text.
    pub fn advance(&self, session: &mut Session, text: &str) -> Result<Vec<Action>> {
        // Menu commands win over any in-progress flow.
        match text {
            command::START_NEW_CUSTOMER => {
                session.begin(Flow::Customer);
                return Ok(vec![Action::reply(prompts::ASK_CUSTOMER_NAME)]);
            },
            command::START_RECORD_PAYMENT => {
                session.begin(Flow::Payment);
                return Ok(vec![Action::reply(prompts::ASK_PAYMENT_USER_ID)]);
            },
            command::START_SUBMIT_CHATLOG => {
                session.begin(Flow::Chatlog);
                return Ok(vec![Action::reply(prompts::ASK_CHATLOG_VIBER_ID)]);
            },
            command::TRIGGER_SIMULATE_FAILURE => {
                session.reset();
                return Ok(vec![
                    Action::reply(prompts::SIMULATE_STARTING),
                    Action::Submit(Submission::SimulateFailure),
                    Action::reply_with_menu(prompts::MENU_FOLLOW_UP),
                ]);
            },
            command::TALK_TO_AGENT => {
                session.enter_agent_chat();
                return Ok(vec![
                    Action::Publish(Signal::Opened),
                    Action::reply(prompts::agent_handoff(&self.stop_keyword)),
                ]);
            },
            _ => {},
        }

        match session.state {
            DialogState::TalkingToAgent if text == self.stop_keyword => {
                session.reset();
                Ok(vec![
                    Action::reply_with_menu(prompts::USER_ENDED_CHAT),
                    Action::Publish(Signal::Closed {
                        reason: EndReason::User,
                    }),
                ])
            },
            DialogState::TalkingToAgent => Ok(vec![
                Action::Publish(Signal::Inbound {
                    text: text.to_string(),
                }),
                Action::reply(prompts::AGENT_RELAY_ACK),
            ]),
            state if state.is_collecting() => self.collect(session, state, text),
            _ => Ok(vec![Action::reply_with_menu(prompts::IDLE_FALLBACK)]),
        }
    }

    /// Validate and store one field, then advance within the flow. On the
    /// flow's last field, hand the completed payload off for submission.
    fn collect(&self, session: &mut Session, state: DialogState, text: &str) -> Result<Vec<Action>> {
        let Some(value) = normalize(state, text) else {
            // Bad input self-loops: state and fields stay untouched.
            return Ok(vec![Action::reply(prompts::invalid_input(state))]);
        };

        let key = state.field_key().ok_or_else(|| {
            Error::message(format!("collection state {state:?} has no field key"))
        })?;
        session.fields.insert(key.to_string(), value.clone());

        if let Some(next) = state.next_in_flow() {
            session.state = next;
            return Ok(vec![Action::reply(next_prompt(next, &value))]);
        }

        let flow = state
            .flow()
            .ok_or_else(|| Error::message(format!("collection state {state:?} has no flow")))?;
        let submission = build_submission(flow, &session.fields)?;

        // The session is idle again whatever the submit outcome turns out
        // to be; failures are reported to the user, never retried.
        session.reset();
        Ok(vec![
            Action::reply(prompts::submitting(flow)),
            Action::Submit(submission),
            Action::reply_with_menu(prompts::MENU_FOLLOW_UP),
        ])
    }
}

/// Apply the state's validation rule, returning the canonical form to store.
fn normalize(state: DialogState, text: &str) -> Option<String> {
    let trimmed = text.trim();
    match state {
        DialogState::CollectingCustomerPhone | DialogState::CollectingChatlogViberId => {
            is_phone_shaped(trimmed).then(|| trimmed.to_string())
        },
        DialogState::CollectingPaymentAmount => parse_amount(trimmed).map(|v| v.to_string()),
        _ => (!trimmed.is_empty()).then(|| trimmed.to_string()),
    }
}

fn next_prompt(next: DialogState, previous: &str) -> String {
    match next {
        DialogState::CollectingCustomerPhone => prompts::ask_customer_phone(previous),
        DialogState::CollectingCustomerRegion => prompts::ask_customer_region(previous),
        DialogState::CollectingPaymentAmount => prompts::ask_payment_amount(previous),
        DialogState::CollectingPaymentMethod => prompts::ask_payment_method(previous),
        DialogState::CollectingPaymentReferenceId => prompts::ask_payment_reference(previous),
        DialogState::CollectingChatlogMessage => prompts::ask_chatlog_message(previous),
        // next_in_flow never yields anything else.
        _ => prompts::IDLE_FALLBACK.to_string(),
    }
}

fn build_submission(flow: Flow, fields: &BTreeMap<String, String>) -> Result<Submission> {
    Ok(match flow {
        Flow::Customer => Submission::Customer(CustomerPayload::from_fields(fields)?),
        Flow::Payment => Submission::Payment(PaymentPayload::from_fields(fields)?),
        Flow::Chatlog => Submission::ChatLog(ChatLogPayload::from_fields(fields)?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::default()
    }

    /// `fields` keys must stay inside the active flow's schema; outside any
    /// flow there must be no fields at all.
    fn assert_fields_within_schema(session: &Session) {
        match session.state.flow() {
            Some(flow) => {
                for key in session.fields.keys() {
                    assert!(
                        flow.field_keys().contains(&key.as_str()),
                        "field `{key}` outside {} schema in {:?}",
                        flow.name(),
                        session.state
                    );
                }
            },
            None => assert!(
                session.fields.is_empty(),
                "fields {:?} present outside any flow in {:?}",
                session.fields,
                session.state
            ),
        }
    }

    fn submissions(actions: &[Action]) -> Vec<Submission> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Submit(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    fn signals(actions: &[Action]) -> Vec<Signal> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Publish(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn payment_flow_collects_and_submits_once() {
        let engine = engine();
        let mut session = Session::new();
        let mut all_submissions = Vec::new();

        for input in ["start_record_payment", "U1", "25000", "KBZ Pay", "REF1"] {
            let actions = engine.advance(&mut session, input).unwrap();
            all_submissions.extend(submissions(&actions));
            assert_fields_within_schema(&session);
        }

        assert_eq!(
            all_submissions,
            vec![Submission::Payment(PaymentPayload {
                user_id: "U1".into(),
                amount: 25000,
                method: "KBZ Pay".into(),
                reference_id: "REF1".into(),
            })]
        );
        assert_eq!(session.state, DialogState::Idle);
        assert!(session.fields.is_empty());
    }

    #[test]
    fn invalid_amount_reprompts_without_touching_state() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_record_payment").unwrap();
        engine.advance(&mut session, "U1").unwrap();
        let before = session.clone();

        let actions = engine.advance(&mut session, "abc").unwrap();

        assert_eq!(session, before);
        assert_eq!(session.state, DialogState::CollectingPaymentAmount);
        assert_eq!(
            actions,
            vec![Action::reply(prompts::INVALID_AMOUNT)]
        );
    }

    #[test]
    fn agent_handoff_emits_open_then_inbound() {
        let engine = engine();
        let mut session = Session::new();

        let first = engine.advance(&mut session, "talk_to_agent").unwrap();
        assert_eq!(signals(&first), vec![Signal::Opened]);
        assert_eq!(session.state, DialogState::TalkingToAgent);

        let second = engine.advance(&mut session, "hello").unwrap();
        assert_eq!(
            signals(&second),
            vec![Signal::Inbound {
                text: "hello".into()
            }]
        );
        assert_eq!(session.state, DialogState::TalkingToAgent);
    }

    #[test]
    fn stop_keyword_closes_the_handoff() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "talk_to_agent").unwrap();

        let actions = engine.advance(&mut session, "stop").unwrap();

        assert_eq!(session.state, DialogState::Idle);
        assert!(session.fields.is_empty());
        assert_eq!(
            signals(&actions),
            vec![Signal::Closed {
                reason: EndReason::User
            }]
        );
    }

    #[test]
    fn stop_keyword_is_plain_text_outside_handoff() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_new_customer").unwrap();

        engine.advance(&mut session, "stop").unwrap();

        // In a collection state the keyword is just a (valid) name.
        assert_eq!(session.state, DialogState::CollectingCustomerPhone);
        assert_eq!(session.fields.get("name").map(String::as_str), Some("stop"));
    }

    #[test]
    fn menu_commands_preempt_an_active_flow() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_new_customer").unwrap();
        engine.advance(&mut session, "Aye Chan").unwrap();

        engine.advance(&mut session, "start_record_payment").unwrap();

        assert_eq!(session.state, DialogState::CollectingPaymentUserId);
        assert!(session.fields.is_empty(), "old flow's fields must not leak");
    }

    #[test]
    fn greeting_resets_a_mid_flow_session() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_new_customer").unwrap();
        engine.advance(&mut session, "Aye Chan").unwrap();

        let actions = engine.greet(&mut session);

        assert_eq!(session.state, DialogState::Idle);
        assert!(session.fields.is_empty());
        assert_eq!(actions, vec![Action::reply_with_menu(prompts::WELCOME)]);
    }

    #[test]
    fn customer_flow_submits_the_collected_record() {
        let engine = engine();
        let mut session = Session::new();
        let mut all = Vec::new();

        for input in ["start_new_customer", "Aye Chan", "+959123456", "Yangon"] {
            let actions = engine.advance(&mut session, input).unwrap();
            all.extend(submissions(&actions));
            assert_fields_within_schema(&session);
        }

        assert_eq!(
            all,
            vec![Submission::Customer(CustomerPayload {
                name: "Aye Chan".into(),
                phone: "+959123456".into(),
                region: "Yangon".into(),
            })]
        );
        assert_eq!(session.state, DialogState::Idle);
    }

    #[test]
    fn chatlog_flow_validates_the_viber_id() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_submit_chatlog").unwrap();

        let rejected = engine.advance(&mut session, "abc").unwrap();
        assert_eq!(rejected, vec![Action::reply(prompts::INVALID_VIBER_ID)]);
        assert_eq!(session.state, DialogState::CollectingChatlogViberId);
        assert!(session.fields.is_empty());

        engine.advance(&mut session, "+959777").unwrap();
        assert_eq!(session.state, DialogState::CollectingChatlogMessage);

        let actions = engine.advance(&mut session, "the product arrived late").unwrap();
        let submitted = submissions(&actions);
        assert_eq!(submitted.len(), 1);
        let Submission::ChatLog(ref log) = submitted[0] else {
            panic!("expected a chatlog submission");
        };
        assert_eq!(log.viber_id, "+959777");
        assert_eq!(log.message, "the product arrived late");
        assert_eq!(log.r#type, "user_input");
        assert_eq!(session.state, DialogState::Idle);
    }

    #[test]
    fn blank_input_reprompts_in_text_states() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_new_customer").unwrap();

        let actions = engine.advance(&mut session, "   ").unwrap();

        assert_eq!(session.state, DialogState::CollectingCustomerName);
        assert!(session.fields.is_empty());
        assert_eq!(
            actions,
            vec![Action::reply(prompts::invalid_input(
                DialogState::CollectingCustomerName
            ))]
        );
    }

    #[test]
    fn idle_chatter_reprompts_with_the_menu() {
        let engine = engine();
        let mut session = Session::new();

        let actions = engine.advance(&mut session, "hello there").unwrap();

        assert_eq!(session.state, DialogState::Idle);
        assert_eq!(
            actions,
            vec![Action::reply_with_menu(prompts::IDLE_FALLBACK)]
        );
    }

    #[test]
    fn simulate_failure_fires_mid_flow_and_returns_to_idle() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_new_customer").unwrap();
        engine.advance(&mut session, "Aye Chan").unwrap();

        let actions = engine
            .advance(&mut session, "trigger_simulate_failure")
            .unwrap();

        assert_eq!(session.state, DialogState::Idle);
        assert!(session.fields.is_empty());
        assert_eq!(submissions(&actions), vec![Submission::SimulateFailure]);
    }

    #[test]
    fn talk_to_agent_clears_collected_fields() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_record_payment").unwrap();
        engine.advance(&mut session, "U1").unwrap();

        engine.advance(&mut session, "talk_to_agent").unwrap();

        assert_eq!(session.state, DialogState::TalkingToAgent);
        assert!(session.fields.is_empty());
        assert_fields_within_schema(&session);
    }

    #[test]
    fn relay_loop_stays_in_handoff_across_messages() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "talk_to_agent").unwrap();

        for text in ["first", "second", "third"] {
            let actions = engine.advance(&mut session, text).unwrap();
            assert_eq!(
                signals(&actions),
                vec![Signal::Inbound { text: text.into() }]
            );
            assert_eq!(session.state, DialogState::TalkingToAgent);
        }
    }

    #[test]
    fn amounts_are_stored_in_canonical_form() {
        let engine = engine();
        let mut session = Session::new();
        engine.advance(&mut session, "start_record_payment").unwrap();
        engine.advance(&mut session, "U1").unwrap();

        engine.advance(&mut session, "  25000 ").unwrap();

        assert_eq!(
            session.fields.get("amount").map(String::as_str),
            Some("25000")
        );
    }

    #[test]
    fn fields_stay_inside_the_schema_across_a_mixed_walk() {
        let engine = engine();
        let mut session = Session::new();
        let walk = [
            "hello",
            "start_new_customer",
            "Aye Chan",
            "start_submit_chatlog",
            "+959777",
            "talk_to_agent",
            "are you there?",
            "stop",
            "start_record_payment",
            "U9",
            "not-a-number",
            "700",
            "Wave Money",
            "REF9",
        ];
        for input in walk {
            engine.advance(&mut session, input).unwrap();
            assert_fields_within_schema(&session);
        }
        assert_eq!(session.state, DialogState::Idle);
        assert!(session.fields.is_empty());
    }
}
