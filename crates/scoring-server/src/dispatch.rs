//! Method-call dispatch.
//!
//! A call moves through fixed stages and stops at the first failure:
//!
//! | Stage | Failure |
//! |-------|---------|
//! | `Received` | envelope validation (422) |
//! | `EnvelopeValidated` | authentication (403) |
//! | `Authenticated` | unknown method (404), argument validation (422) |
//! | `MethodValidated` | store fault (500) |
//! | `Completed` | - |

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::{json, Map, Value};

use scoring_core::{
    ApiError, ApiResult, AuthContext, Authenticator, ClientsInterestsRequest, MethodRequest,
    OnlineScoreRequest, RequestContext, RequestSchema, CLIENTS_INTERESTS, MISSING_PAIRS_MESSAGE,
    ONLINE_SCORE,
};
use scoring_store::Store;

use crate::scoring::Scorer;

/// Score returned to admin callers without consulting the scorer.
pub const ADMIN_SCORE: u32 = 42;

/// How far a call got before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DispatchStage {
    /// Body parsed, nothing checked yet.
    Received,
    /// The envelope passed its schema.
    EnvelopeValidated,
    /// The token matched.
    Authenticated,
    /// The method exists and its arguments passed validation.
    MethodValidated,
    /// A result was produced.
    Completed,
}

impl DispatchStage {
    /// Returns the stage name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::EnvelopeValidated => "envelope_validated",
            Self::Authenticated => "authenticated",
            Self::MethodValidated => "method_validated",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates, authenticates and routes method calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    authenticator: Authenticator,
    scorer: Scorer,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared store.
    pub fn new(authenticator: Authenticator, store: Arc<dyn Store>) -> Self {
        Self {
            authenticator,
            scorer: Scorer::new(store),
        }
    }

    /// Returns the authenticator.
    pub const fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Dispatches one call against the current clock.
    ///
    /// Records the method, `has`, `nclients` and the final code in `ctx`.
    pub async fn dispatch(
        &self,
        body: &Map<String, Value>,
        ctx: &mut RequestContext,
    ) -> ApiResult<Value> {
        self.dispatch_at(body, ctx, Utc::now()).await
    }

    /// Dispatches one call as if it arrived at `now`.
    ///
    /// `now` is read on the local clock: it selects the admin token hour and
    /// the date that birthdays are measured against.
    pub async fn dispatch_at(
        &self,
        body: &Map<String, Value>,
        ctx: &mut RequestContext,
        now: DateTime<Utc>,
    ) -> ApiResult<Value> {
        let mut stage = DispatchStage::Received;
        let result = self.run(body, ctx, now, &mut stage).await;

        match &result {
            Ok(_) => ctx.set_code(200),
            Err(err) => {
                ctx.set_code(err.code());
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    stage = %stage,
                    error = %err,
                    "dispatch stopped"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        body: &Map<String, Value>,
        ctx: &mut RequestContext,
        now: DateTime<Utc>,
        stage: &mut DispatchStage,
    ) -> ApiResult<Value> {
        let request = MethodRequest::parse(body)?;
        ctx.set_method(request.method.as_str());
        *stage = DispatchStage::EnvelopeValidated;

        let local = now.with_timezone(&Local);
        let auth = self.authenticator.authenticate_at(&request, local)?;
        *stage = DispatchStage::Authenticated;

        let today = local.date_naive();
        let result = match request.method.as_str() {
            ONLINE_SCORE => self.online_score(&request, auth, ctx, today, stage).await,
            CLIENTS_INTERESTS => self.clients_interests(&request, ctx, today, stage).await,
            other => Err(ApiError::unknown_method(other)),
        }?;

        *stage = DispatchStage::Completed;
        Ok(result)
    }

    async fn online_score(
        &self,
        request: &MethodRequest,
        auth: AuthContext,
        ctx: &mut RequestContext,
        today: NaiveDate,
        stage: &mut DispatchStage,
    ) -> ApiResult<Value> {
        let args = OnlineScoreRequest::parse_on(&request.arguments, today)?;
        ctx.set_has(request.argument_names());

        if !args.has_complete_pair() {
            return Err(ApiError::invalid_arguments(MISSING_PAIRS_MESSAGE));
        }
        *stage = DispatchStage::MethodValidated;

        if auth.is_admin {
            return Ok(json!({ "score": ADMIN_SCORE }));
        }

        let score = self.scorer.get_score(&args).await;
        Ok(json!({ "score": score }))
    }

    async fn clients_interests(
        &self,
        request: &MethodRequest,
        ctx: &mut RequestContext,
        today: NaiveDate,
        stage: &mut DispatchStage,
    ) -> ApiResult<Value> {
        let args = ClientsInterestsRequest::parse_on(&request.arguments, today)?;
        ctx.set_nclients(args.client_ids.len());
        *stage = DispatchStage::MethodValidated;

        let mut interests = Map::new();
        for &client_id in &args.client_ids {
            let list = self.scorer.get_interests(client_id).await?;
            interests.insert(client_id.to_string(), Value::from(list));
        }

        Ok(Value::Object(interests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scoring_store::MemoryStore;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn dispatcher_with(store: Arc<MemoryStore>) -> Dispatcher {
        Dispatcher::new(Authenticator::default(), store)
    }

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn user_call(method: &str, arguments: Value) -> Map<String, Value> {
        let token = Authenticator::default().user_token("horns&hoofs", "h&f");
        body(json!({
            "account": "horns&hoofs",
            "login": "h&f",
            "method": method,
            "token": token,
            "arguments": arguments,
        }))
    }

    fn admin_call(method: &str, arguments: Value) -> Map<String, Value> {
        let token = Authenticator::default().admin_token_at(fixed_now().with_timezone(&Local));
        body(json!({
            "account": "horns&hoofs",
            "login": "admin",
            "method": method,
            "token": token,
            "arguments": arguments,
        }))
    }

    async fn call(dispatcher: &Dispatcher, body: &Map<String, Value>) -> (ApiResult<Value>, RequestContext) {
        let mut ctx = RequestContext::new();
        let result = dispatcher.dispatch_at(body, &mut ctx, fixed_now()).await;
        (result, ctx)
    }

    #[test]
    fn test_stage_order() {
        assert!(DispatchStage::Received < DispatchStage::EnvelopeValidated);
        assert!(DispatchStage::MethodValidated < DispatchStage::Completed);
        assert_eq!(DispatchStage::Authenticated.to_string(), "authenticated");
    }

    #[tokio::test]
    async fn test_empty_envelope_is_invalid() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let (result, ctx) = call(&dispatcher, &Map::new()).await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), 422);
        assert_eq!(err.response_text(), "login: Field is required");
        assert_eq!(ctx.code(), Some(422));
        assert!(ctx.method().is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_forbidden() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let mut request = user_call(ONLINE_SCORE, json!({"phone": "79175002040", "email": "a@b"}));
        request.insert("token".to_string(), json!("sdd"));

        let (result, ctx) = call(&dispatcher, &request).await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
        assert_eq!(ctx.code(), Some(403));
        assert_eq!(ctx.method(), Some(ONLINE_SCORE));
    }

    #[tokio::test]
    async fn test_admin_token_from_another_hour_is_forbidden() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let request = admin_call(ONLINE_SCORE, json!({"phone": "79175002040", "email": "a@b"}));

        let mut ctx = RequestContext::new();
        let later = fixed_now() + chrono::Duration::hours(1);
        let result = dispatcher.dispatch_at(&request, &mut ctx, later).await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let (result, ctx) = call(&dispatcher, &user_call("delete_everything", json!({}))).await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), 404);
        assert!(err.response_message().is_none());
        assert_eq!(ctx.code(), Some(404));
    }

    #[tokio::test]
    async fn test_online_score_regular_user() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let arguments = json!({
            "phone": "79175002040",
            "email": "stupnikov@otus.ru",
            "first_name": "Stanislav",
            "last_name": "Stupnikov",
            "birthday": "01.01.1990",
            "gender": 1,
        });
        let (result, ctx) = call(&dispatcher, &user_call(ONLINE_SCORE, arguments)).await;

        let response = result.unwrap();
        assert_eq!(response["score"].as_f64(), Some(5.0));
        assert_eq!(ctx.code(), Some(200));

        let mut has = ctx.has().unwrap().to_vec();
        has.sort();
        assert_eq!(
            has,
            vec!["birthday", "email", "first_name", "gender", "last_name", "phone"]
        );
    }

    #[tokio::test]
    async fn test_online_score_admin() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let request = admin_call(ONLINE_SCORE, json!({"phone": 79_175_002_040_u64, "email": "a@b"}));
        let (result, _) = call(&dispatcher, &request).await;

        assert_eq!(result.unwrap(), json!({"score": 42}));
    }

    #[tokio::test]
    async fn test_online_score_missing_pairs() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let request = user_call(ONLINE_SCORE, json!({"phone": "79175002040", "first_name": "a"}));
        let (result, ctx) = call(&dispatcher, &request).await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), 422);
        assert_eq!(err.response_text(), MISSING_PAIRS_MESSAGE);
        assert_eq!(ctx.has().map(<[String]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_online_score_invalid_argument() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let request = user_call(ONLINE_SCORE, json!({"phone": "89175002040", "email": "a@b"}));
        let (result, ctx) = call(&dispatcher, &request).await;

        assert_eq!(
            result.unwrap_err().response_text(),
            "phone: Phone must start with 7"
        );
        assert!(ctx.has().is_none());
    }

    #[tokio::test]
    async fn test_online_score_gender_unknown_completes_pair() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let request = user_call(ONLINE_SCORE, json!({"gender": 0, "birthday": "01.01.2000"}));
        let (result, _) = call(&dispatcher, &request).await;

        assert_eq!(result.unwrap()["score"].as_f64(), Some(1.5));
    }

    #[tokio::test]
    async fn test_clients_interests() {
        let store = Arc::new(MemoryStore::new());
        store.set("i:1", br#"["cars", "pets"]"#).await.unwrap();
        store.set("i:2", br#"["books"]"#).await.unwrap();
        let dispatcher = dispatcher_with(store);

        let request = user_call(CLIENTS_INTERESTS, json!({"client_ids": [1, 2, 3], "date": "19.07.2017"}));
        let (result, ctx) = call(&dispatcher, &request).await;

        assert_eq!(
            result.unwrap(),
            json!({"1": ["cars", "pets"], "2": ["books"], "3": []})
        );
        assert_eq!(ctx.nclients(), Some(3));
    }

    #[tokio::test]
    async fn test_clients_interests_admin_gets_same_data() {
        let store = Arc::new(MemoryStore::new());
        store.set("i:5", br#"["music"]"#).await.unwrap();
        let dispatcher = dispatcher_with(store);

        let (result, _) = call(&dispatcher, &admin_call(CLIENTS_INTERESTS, json!({"client_ids": [5]}))).await;
        assert_eq!(result.unwrap(), json!({"5": ["music"]}));
    }

    #[tokio::test]
    async fn test_clients_interests_empty_ids() {
        let dispatcher = dispatcher_with(Arc::new(MemoryStore::new()));
        let (result, ctx) = call(&dispatcher, &user_call(CLIENTS_INTERESTS, json!({"client_ids": []}))).await;

        assert_eq!(
            result.unwrap_err().response_text(),
            "client_ids: Field cannot be empty"
        );
        assert!(ctx.nclients().is_none());
    }

    #[tokio::test]
    async fn test_clients_interests_malformed_store_value() {
        let store = Arc::new(MemoryStore::new());
        store.set("i:1", b"not json").await.unwrap();
        let dispatcher = dispatcher_with(store);

        let (result, ctx) = call(&dispatcher, &user_call(CLIENTS_INTERESTS, json!({"client_ids": [1]}))).await;
        let err = result.unwrap_err();
        assert_eq!(err.code(), 500);
        assert_eq!(err.response_text(), "Internal Server Error");
        assert_eq!(ctx.code(), Some(500));
    }
}
