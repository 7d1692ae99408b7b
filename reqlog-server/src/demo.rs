//! `WidgetsApi`: a small in-memory API used to drive the middleware.
//!
//! Routes are resolved with a `matchit` radix router per method. HEAD is
//! served by the GET routes; the body is stripped later by `HeadOverride`.

use async_trait::async_trait;
use http::Method;
use matchit::Router as MatchitRouter;
use reqlog_core::LogValue;
use reqlog_middleware::{App, ErrorSignal, Exception, Halt, RequestEnv, Response, RouteInfo};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::warn;

const OWNER: &str = "WidgetsAPI";

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("param is missing: {0}")]
    MissingParam(&'static str),

    #[error("widget store unavailable")]
    StorePoisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    List,
    Show,
    Create,
}

impl Endpoint {
    fn route_info(self) -> RouteInfo {
        let path = match self {
            Endpoint::List | Endpoint::Create => vec!["widgets".to_string()],
            Endpoint::Show => vec!["widgets".to_string(), "/:id".to_string()],
        };
        RouteInfo::new("/", path, OWNER)
    }
}

#[derive(Debug, Clone)]
struct Widget {
    name: String,
    retired: bool,
}

pub struct WidgetsApi {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    widgets: Mutex<BTreeMap<i64, Widget>>,
}

impl WidgetsApi {
    pub fn new() -> Self {
        let mut routes: HashMap<Method, MatchitRouter<Endpoint>> = HashMap::new();
        let table = [
            (Method::GET, "/widgets", Endpoint::List),
            (Method::GET, "/widgets/{id}", Endpoint::Show),
            (Method::POST, "/widgets", Endpoint::Create),
        ];
        for (method, uri, endpoint) in table {
            let router = routes.entry(method.clone()).or_insert_with(MatchitRouter::new);
            if let Err(e) = router.insert(uri, endpoint) {
                warn!(uri = %uri, method = %method, error = %e, "Failed to insert route");
            }
        }

        let widgets = BTreeMap::from([
            (1, Widget { name: "sprocket".into(), retired: false }),
            (2, Widget { name: "gear".into(), retired: false }),
            (3, Widget { name: "flywheel".into(), retired: true }),
        ]);

        Self {
            routes,
            widgets: Mutex::new(widgets),
        }
    }

    /// Match `env` against the route table, filling in its route metadata and
    /// path parameters. Must run before the request enters the logger.
    pub fn resolve(&self, env: &mut RequestEnv) -> bool {
        let Some((endpoint, params)) = self.lookup(&env.method, &env.path) else {
            return false;
        };
        env.route = Some(endpoint.route_info());
        for (key, value) in params {
            env.params.insert(key, LogValue::from(value));
        }
        true
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Endpoint, Vec<(String, String)>)> {
        let method = if *method == Method::HEAD { &Method::GET } else { method };
        let matched = self.routes.get(method)?.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((*matched.value, params))
    }

    fn list(&self) -> Result<Response, Halt> {
        let widgets = self.widgets.lock().map_err(|_| store_poisoned())?;
        let items: Vec<_> = widgets
            .iter()
            .filter(|(_, w)| !w.retired)
            .map(|(id, w)| json!({"id": id, "name": w.name}))
            .collect();
        Ok(Response::json(200, &json!(items)))
    }

    fn show(&self, env: &RequestEnv) -> Result<Response, Halt> {
        let raw = env.params.get("id").map(LogValue::to_text).unwrap_or_default();
        let id: i64 = raw.parse().map_err(Exception::from_error)?;

        let widgets = self.widgets.lock().map_err(|_| store_poisoned())?;
        match widgets.get(&id) {
            None => Err(ErrorSignal::new(404).with_message("not found").into()),
            Some(w) if w.retired => Ok(Response::json(
                410,
                &json!({"code": "WidgetRetired", "error": format!("widget {id} is retired")}),
            )),
            Some(w) => Ok(Response::json(200, &json!({"id": id, "name": w.name}))),
        }
    }

    fn create(&self, env: &RequestEnv) -> Result<Response, Halt> {
        let params = env.request_params();
        let name = params
            .get("name")
            .and_then(LogValue::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Exception::from_error(DemoError::MissingParam("name")))?;

        let mut widgets = self.widgets.lock().map_err(|_| store_poisoned())?;
        let id = widgets.keys().next_back().copied().unwrap_or(0) + 1;
        widgets.insert(
            id,
            Widget {
                name: name.to_string(),
                retired: false,
            },
        );
        Ok(Response::json(201, &json!({"id": id, "name": name})))
    }
}

impl Default for WidgetsApi {
    fn default() -> Self {
        Self::new()
    }
}

fn store_poisoned() -> Halt {
    Exception::from_error(DemoError::StorePoisoned).into()
}

#[async_trait]
impl App for WidgetsApi {
    async fn call(&self, env: &mut RequestEnv) -> Result<Response, Halt> {
        let Some((endpoint, _)) = self.lookup(&env.method, &env.path) else {
            return Err(ErrorSignal::new(404).with_message("not found").into());
        };
        match endpoint {
            Endpoint::List => self.list(),
            Endpoint::Show => self.show(env),
            Endpoint::Create => self.create(env),
        }
    }
}
