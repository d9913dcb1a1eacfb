//! Conversation orchestration.
//!
//! One call to [`FlightAgent::handle`] takes a chat message through the
//! whole pipeline: interpret the text, normalize the date, search, render
//! the reply, record history. Calls are independent of each other.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::amadeus::SearchResult;
use crate::domain::{AirportCode, FlightOffer, ParsedQuery, TravelDate, interpret, normalize};
use crate::history::{HistoryStore, NewSearch};
use crate::reply::format_reply;

/// Something that can look up flight offers.
///
/// Implementations must not fail past this boundary: every problem is
/// reported through the returned [`SearchResult`].
#[async_trait]
pub trait OfferSource: Send + Sync {
    async fn search(
        &self,
        origin: &AirportCode,
        destination: &AirportCode,
        date: &TravelDate,
    ) -> SearchResult;
}

/// Everything produced for one chat message.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// What was understood from the message.
    pub query: ParsedQuery,
    /// The normalized departure date.
    pub date: TravelDate,
    /// The structured search outcome.
    pub result: SearchResult,
    /// The rendered chat reply.
    pub response: String,
    /// Id of the stored agent message, when storing it succeeded.
    pub message_id: Option<Uuid>,
}

impl AgentReply {
    /// Offers found, empty on failure.
    pub fn flights(&self) -> &[FlightOffer] {
        self.result.as_deref().unwrap_or_default()
    }
}

/// The flight-search assistant.
#[derive(Clone)]
pub struct FlightAgent {
    source: Arc<dyn OfferSource>,
    history: Arc<dyn HistoryStore>,
}

impl FlightAgent {
    pub fn new(source: Arc<dyn OfferSource>, history: Arc<dyn HistoryStore>) -> Self {
        Self { source, history }
    }

    /// The history store this agent writes to.
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Answer one chat message from `user_id`, resolving dates against `today`.
    ///
    /// History writes that fail are logged and otherwise ignored.
    pub async fn handle(&self, user_id: Uuid, text: &str, today: NaiveDate) -> AgentReply {
        if let Err(e) = self
            .history
            .record_message(user_id, text.to_string(), true, Vec::new())
            .await
        {
            warn!(%user_id, error = %e, "failed to record user message");
        }

        let query = interpret(text);
        let date = normalize(&query.date_expression, today);
        info!(
            origin = %query.origin,
            destination = %query.destination,
            %date,
            "handling flight query"
        );

        let result = self
            .source
            .search(&query.origin, &query.destination, &date)
            .await;
        let response = format_reply(&result);

        if let Ok(offers) = &result {
            let search = NewSearch {
                user_id,
                query: text.to_string(),
                origin: query.origin.clone(),
                destination: query.destination.clone(),
                date: query.date_expression.clone(),
                results: offers.clone(),
            };
            if let Err(e) = self.history.record_search(search).await {
                warn!(%user_id, error = %e, "failed to record search");
            }
        }

        let flights = result.as_ref().map(Vec::clone).unwrap_or_default();
        let message_id = match self
            .history
            .record_message(user_id, response.clone(), false, flights)
            .await
        {
            Ok(message) => Some(message.id),
            Err(e) => {
                warn!(%user_id, error = %e, "failed to record agent message");
                None
            }
        };

        AgentReply {
            query,
            date,
            result,
            response,
            message_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::amadeus::SearchError;
    use crate::domain::Price;
    use crate::history::{ChatMessage, HistoryError, InMemoryHistory, SearchRecord};

    /// Offer source that replays a fixed outcome and records its calls.
    struct ScriptedSource {
        outcome: SearchResult,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedSource {
        fn new(outcome: SearchResult) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl OfferSource for ScriptedSource {
        async fn search(
            &self,
            origin: &AirportCode,
            destination: &AirportCode,
            date: &TravelDate,
        ) -> SearchResult {
            self.calls.lock().unwrap().push((
                origin.to_string(),
                destination.to_string(),
                date.to_string(),
            ));
            self.outcome.clone()
        }
    }

    /// History store whose every write fails.
    struct BrokenHistory;

    #[async_trait]
    impl HistoryStore for BrokenHistory {
        async fn record_message(
            &self,
            _user_id: Uuid,
            _message: String,
            _is_user: bool,
            _flights: Vec<FlightOffer>,
        ) -> Result<ChatMessage, HistoryError> {
            Err(HistoryError::Unavailable("disk full".into()))
        }

        async fn record_search(&self, _search: NewSearch) -> Result<SearchRecord, HistoryError> {
            Err(HistoryError::Unavailable("disk full".into()))
        }

        async fn chat_history(
            &self,
            _user_id: Uuid,
            _limit: usize,
        ) -> Result<Vec<ChatMessage>, HistoryError> {
            Ok(Vec::new())
        }

        async fn clear_chat(&self, _user_id: Uuid) -> Result<usize, HistoryError> {
            Ok(0)
        }

        async fn search_history(
            &self,
            _user_id: Uuid,
            _limit: usize,
        ) -> Result<Vec<SearchRecord>, HistoryError> {
            Ok(Vec::new())
        }
    }

    fn today() -> NaiveDate {
        // A Wednesday.
        NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
    }

    fn offer() -> FlightOffer {
        FlightOffer {
            airline: "AI".into(),
            price: Price::new("5230.00", "INR"),
            departure_time: "06:15".into(),
            arrival_time: "08:25".into(),
            duration: "2h 10m".into(),
            flight_number: "AI 665".into(),
            origin: AirportCode::new("BLR"),
            destination: AirportCode::new("GOI"),
            date: TravelDate::Resolved(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
        }
    }

    #[tokio::test]
    async fn success_is_searched_formatted_and_recorded() {
        let source = ScriptedSource::new(Ok(vec![offer()]));
        let history = Arc::new(InMemoryHistory::new());
        let agent = FlightAgent::new(source.clone(), history.clone());
        let user = Uuid::new_v4();

        let reply = agent
            .handle(user, "flights from blr to goi next friday", today())
            .await;

        assert_eq!(
            source.calls.lock().unwrap().as_slice(),
            &[("BLR".to_string(), "GOI".to_string(), "2024-03-15".to_string())]
        );
        assert_eq!(reply.flights().len(), 1);
        assert!(reply.response.contains("1. **AI** AI 665"));
        assert!(reply.message_id.is_some());

        let chat = history.chat_history(user, 50).await.unwrap();
        assert_eq!(chat.len(), 2);
        assert!(chat[0].is_user);
        assert_eq!(chat[0].message, "flights from blr to goi next friday");
        assert!(!chat[1].is_user);
        assert_eq!(chat[1].flights.len(), 1);
        assert_eq!(Some(chat[1].id), reply.message_id);

        let searches = history.search_history(user, 20).await.unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].date, "next friday");
        assert_eq!(searches[0].origin.as_str(), "BLR");
    }

    #[tokio::test]
    async fn failure_records_chat_but_not_search() {
        let source = ScriptedSource::new(Err(SearchError::NoValidOffers));
        let history = Arc::new(InMemoryHistory::new());
        let agent = FlightAgent::new(source, history.clone());
        let user = Uuid::new_v4();

        let reply = agent.handle(user, "anything", today()).await;

        assert!(reply.flights().is_empty());
        assert!(
            reply
                .response
                .ends_with("Error: No valid flight data could be processed")
        );
        assert_eq!(history.chat_history(user, 50).await.unwrap().len(), 2);
        assert!(history.search_history(user, 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn defaults_apply_to_vague_queries() {
        let source = ScriptedSource::new(Err(SearchError::NoAccessToken));
        let agent = FlightAgent::new(source.clone(), Arc::new(InMemoryHistory::new()));

        let reply = agent.handle(Uuid::new_v4(), "show me something", today()).await;

        assert_eq!(reply.query.origin.as_str(), "DEL");
        assert_eq!(reply.query.destination.as_str(), "BOM");
        assert_eq!(reply.date.to_string(), "2024-03-14");
        assert_eq!(source.calls.lock().unwrap()[0].2, "2024-03-14");
    }

    #[tokio::test]
    async fn history_failures_do_not_block_reply() {
        let source = ScriptedSource::new(Ok(vec![offer()]));
        let agent = FlightAgent::new(source, Arc::new(BrokenHistory));

        let reply = agent
            .handle(Uuid::new_v4(), "from BLR to GOI today", today())
            .await;

        assert_eq!(reply.flights().len(), 1);
        assert!(reply.response.starts_with("🛫 I found these flights"));
        assert!(reply.message_id.is_none());
    }
}
